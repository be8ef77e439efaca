//! REST adapter for the account upstreams and notification commands.

mod dto;
mod errors;
mod gateway;

pub(crate) use dto::NotificationDto;
pub(crate) use errors::{body_preview, map_status_error};
pub use gateway::HttpAccountGateway;
