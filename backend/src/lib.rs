//! Loyalty portal core: dashboard aggregation and notification reconciliation.
//!
//! - [`domain`] holds the business logic and its ports.
//! - [`outbound`] holds the reqwest adapters implementing those ports.
//! - [`settings`] loads runtime configuration.

pub mod domain;
pub mod outbound;
pub mod settings;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
