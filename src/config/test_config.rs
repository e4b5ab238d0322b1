use super::{Config, Logs, Map, MapBox, Soak};
use std::time::Duration;

/// Creates a new test configuration.
pub fn new_test_config() -> Config {
    Config {
        managedmap: MapBox {
            env: super::TEST.to_string(),
            logs: Some(Logs {
                level: Some("debug".to_string()),
            }),
            map: Some(Map {
                timeout: Some(Duration::from_millis(50)),
                access_budget: Some(4),
            }),
            soak: Some(Soak {
                writers: Some(2),
                readers: Some(2),
                removers: Some(1),
                keys: Some(32),
                duration: Some(Duration::from_millis(100)),
                report_interval: Some(Duration::from_millis(20)),
                close_timeout: Some(Duration::from_secs(5)),
            }),
        },
    }
}
