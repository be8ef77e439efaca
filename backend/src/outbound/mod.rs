//! Outbound adapters implementing domain ports for the upstream services.
//!
//! - **http**: reqwest adapter for the REST collaborators and notification
//!   commands.
//! - **push**: reqwest streaming adapter for the live notification channel.
//!
//! Adapters translate between transport payloads and domain types. They
//! contain no business logic.

pub mod http;
pub mod push;

#[cfg(test)]
mod test_server;
