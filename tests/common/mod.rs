//! Common test utilities and helpers
//!
//! Shared fixtures for the integration suites: temporary checkouts with a
//! `.repo` control directory, real git source trees, and a recording mirror
//! executor.
#![allow(dead_code)]

pub mod mock_services;
pub mod test_fixtures;
