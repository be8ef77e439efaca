//! Ambient authentication capability injected into every outbound adapter.

use std::fmt;

use zeroize::Zeroizing;

use crate::domain::Source;

/// Bearer token wiped from memory on drop.
#[derive(Clone)]
pub struct BearerToken(Zeroizing<String>);

impl BearerToken {
    /// Wrap a raw token.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(Zeroizing::new(raw.into()))
    }

    /// Borrow the raw token for building an `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(..)")
    }
}

/// Where a session rejection was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectedBy {
    /// One of the REST upstreams.
    Upstream(Source),
    /// The push channel.
    PushChannel,
}

/// Event emitted when an upstream rejects the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionInvalidated {
    /// Where the rejection happened.
    pub rejected_by: RejectedBy,
}

/// Port giving adapters the current credentials and a way to report their
/// rejection.
pub trait AuthContext: Send + Sync {
    /// Token to send with the next request, if a session exists.
    fn bearer_token(&self) -> Option<BearerToken>;

    /// Report that the session was rejected; implementations drop the token
    /// and notify whoever owns the session.
    fn invalidate(&self, event: SessionInvalidated);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_does_not_leak_token() {
        let token = BearerToken::new("s3cret");
        assert_eq!(format!("{token:?}"), "BearerToken(..)");
        assert_eq!(token.expose(), "s3cret");
    }
}
