//! Reqwest-backed push channel.
//!
//! One subscription is one long-lived `GET` whose body is a newline-delimited
//! stream of notification objects. The stream ends when the server closes the
//! body; reconnecting is the reconciler's job.

use std::fmt::Display;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::future;
use futures_util::stream::{Stream, StreamExt};
use reqwest::{Client, StatusCode, Url};
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tokio_util::io::StreamReader;

use crate::domain::Notification;
use crate::domain::NotificationId;
use crate::domain::ports::{
    AuthContext, FeedError, NotificationFeed, NotificationStream, RejectedBy, SessionInvalidated,
};
use crate::outbound::http::{NotificationDto, body_preview, map_status_error};

const USER_AGENT: &str = concat!("loyalty-dashboard/", env!("CARGO_PKG_VERSION"));
const NDJSON: &str = "application/x-ndjson";
/// Longest accepted line; a server that never sends `\n` cannot grow the
/// buffer past this.
const MAX_LINE_BYTES: usize = 256 * 1024;

/// Push channel reached over a streaming HTTP response.
pub struct HttpNotificationFeed {
    client: Client,
    stream_url: Url,
    auth: Arc<dyn AuthContext>,
}

impl HttpNotificationFeed {
    /// Build a feed that gives up on connecting after `connect_timeout`.
    ///
    /// Established subscriptions carry no overall timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        stream_url: Url,
        connect_timeout: Duration,
        auth: Arc<dyn AuthContext>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            stream_url,
            auth,
        })
    }

    fn subscription_url(&self, resume_after: Option<&NotificationId>) -> Url {
        let mut url = self.stream_url.clone();
        if let Some(id) = resume_after {
            url.query_pairs_mut().append_pair("after", id.as_str());
        }
        url
    }
}

#[async_trait]
impl NotificationFeed for HttpNotificationFeed {
    async fn connect(
        &self,
        resume_after: Option<&NotificationId>,
    ) -> Result<NotificationStream, FeedError> {
        let mut request = self
            .client
            .get(self.subscription_url(resume_after))
            .header(reqwest::header::ACCEPT, NDJSON);
        if let Some(token) = self.auth.bearer_token() {
            request = request.bearer_auth(token.expose());
        }

        let response = request
            .send()
            .await
            .map_err(|error| FeedError::connect(error.to_string()))?;
        let status = response.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            self.auth.invalidate(SessionInvalidated {
                rejected_by: RejectedBy::PushChannel,
            });
            return Err(FeedError::unauthorized(format!("status {}", status.as_u16())));
        }
        if !status.is_success() {
            let body = match response.bytes().await {
                Ok(body) => body,
                Err(error) => {
                    tracing::debug!(%error, %status, "push channel error body unreadable");
                    Bytes::new()
                }
            };
            return Err(FeedError::connect(
                map_status_error(status, body.as_ref()).to_string(),
            ));
        }

        tracing::debug!(
            resume_after = ?resume_after.map(NotificationId::as_str),
            "push channel open"
        );
        Ok(notification_frames(response.bytes_stream()).boxed())
    }
}

/// Turn a chunked body into decoded notifications, one per non-blank line.
///
/// A transport failure or an oversized line is yielded once and ends the
/// stream. Malformed JSON on a single line does not.
fn notification_frames<S, E>(body: S) -> impl Stream<Item = Result<Notification, FeedError>>
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let reader = StreamReader::new(
        body.map(|chunk| chunk.map_err(|error| io::Error::other(error.to_string()))),
    );
    FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_LINE_BYTES))
        .filter_map(|line| future::ready(frame(line)))
}

fn frame(line: Result<String, LinesCodecError>) -> Option<Result<Notification, FeedError>> {
    match line {
        Ok(line) if line.trim().is_empty() => None,
        Ok(line) => Some(decode_line(line.as_bytes())),
        Err(LinesCodecError::MaxLineLengthExceeded) => Some(Err(FeedError::decode(format!(
            "line longer than {MAX_LINE_BYTES} bytes"
        )))),
        Err(LinesCodecError::Io(error)) if error.kind() == io::ErrorKind::InvalidData => {
            Some(Err(FeedError::decode(error.to_string())))
        }
        Err(LinesCodecError::Io(error)) => Some(Err(FeedError::transport(error.to_string()))),
    }
}

fn decode_line(line: &[u8]) -> Result<Notification, FeedError> {
    serde_json::from_slice::<NotificationDto>(line)
        .map(NotificationDto::into_domain)
        .map_err(|error| FeedError::decode(format!("{error}: {}", body_preview(line))))
}

#[cfg(test)]
#[path = "http_feed_tests.rs"]
mod tests;
