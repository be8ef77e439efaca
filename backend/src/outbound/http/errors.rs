//! Mapping of reqwest failures and HTTP statuses onto upstream causes.

use reqwest::StatusCode;

use crate::domain::ports::UpstreamCause;

pub(crate) fn map_transport_error(error: &reqwest::Error) -> UpstreamCause {
    if error.is_timeout() {
        UpstreamCause::timeout(error.to_string())
    } else {
        UpstreamCause::transport(error.to_string())
    }
}

pub(crate) fn map_status_error(status: StatusCode, body: &[u8]) -> UpstreamCause {
    let body_preview = body_preview(body);
    let message = if body_preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), body_preview)
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => UpstreamCause::unauthorized(message),
        StatusCode::NOT_FOUND => UpstreamCause::not_found(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            UpstreamCause::timeout(message)
        }
        _ => UpstreamCause::status(status.as_u16(), body_preview),
    }
}

pub(crate) fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
