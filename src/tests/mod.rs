//! Scenario tests for the managed map.
//!
//! This module contains end-to-end tests that verify budget and timeout
//! expiration, removal, the closed-map contract and concurrent access.

mod cases_concurrent_test;

pub mod support;
