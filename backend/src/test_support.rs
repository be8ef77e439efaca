//! Test utilities for the loyalty dashboard crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`). Only
//! compiled for tests and with the `test-support` feature.

pub mod fixtures;
pub mod gateway;
pub mod notifications;
pub mod runtime;

pub use gateway::ScriptedGateway;
pub use notifications::{RecordingCommand, RecordingSettingsStore, ScriptedFeed};
pub use runtime::{ImmediateSleeper, MutableClock, NoJitter, RecordingSleeper};

use std::sync::{Mutex, MutexGuard};

pub(crate) fn lock<'a, T>(mutex: &'a Mutex<T>, name: &str) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(_) => panic!("{name} mutex poisoned"),
    }
}
