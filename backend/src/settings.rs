//! Portal configuration loaded via OrthoConfig.
//!
//! Values layer CLI flags over `PORTAL_*` environment variables over config
//! files. Every field is optional; [`PortalSettings::resolve`] applies the
//! defaults and validates the result.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::domain::ports::BearerToken;
use crate::domain::{FailurePolicy, ParseFailurePolicyError, PortalConfig, ReconnectPolicy};

const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/";
const PUSH_STREAM_PATH: &str = "notifications/stream";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_AGGREGATE_DEADLINE_MS: u64 = 3_000;
const DEFAULT_RECONNECT_INITIAL_MS: u64 = 500;
const DEFAULT_RECONNECT_MAX_MS: u64 = 30_000;

/// Raw configuration values.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "PORTAL")]
pub struct PortalSettings {
    /// Base URL of the REST collaborators.
    pub api_base_url: Option<String>,
    /// URL of the push channel; derived from the API base URL when unset.
    pub push_url: Option<String>,
    /// Per-request transport timeout in milliseconds.
    pub request_timeout_ms: Option<u64>,
    /// Deadline shared by all sources of one aggregation, in milliseconds.
    pub aggregate_deadline_ms: Option<u64>,
    /// `partial` or `all-or-nothing`.
    pub failure_policy: Option<String>,
    /// First reconnect delay in milliseconds.
    pub reconnect_initial_ms: Option<u64>,
    /// Reconnect delay cap in milliseconds.
    pub reconnect_max_ms: Option<u64>,
    /// Bearer token for an already signed-in member.
    pub auth_token: Option<String>,
}

/// Configuration problems detected while resolving [`PortalSettings`].
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A URL field did not parse.
    #[error("{field} is not a valid URL: {source}")]
    InvalidUrl {
        /// Setting name.
        field: &'static str,
        /// Parser failure.
        #[source]
        source: url::ParseError,
    },
    /// The API base URL cannot carry path segments.
    #[error("api_base_url must be an http(s) URL, got {0}")]
    UnsupportedBaseUrl(String),
    /// The failure policy label was not recognised.
    #[error(transparent)]
    InvalidPolicy(#[from] ParseFailurePolicyError),
    /// A duration setting was zero.
    #[error("{field} must be greater than zero")]
    ZeroDuration {
        /// Setting name.
        field: &'static str,
    },
    /// The reconnect cap is below the initial delay.
    #[error("reconnect_max_ms ({max_ms}) must not be below reconnect_initial_ms ({initial_ms})")]
    BackoffBounds {
        /// Configured initial delay.
        initial_ms: u64,
        /// Configured cap.
        max_ms: u64,
    },
}

/// Validated settings ready for wiring.
#[derive(Debug, Clone)]
pub struct ResolvedSettings {
    /// Base URL of the REST collaborators, always ending in `/`.
    pub api_base_url: Url,
    /// Push channel URL.
    pub push_url: Url,
    /// Per-request transport timeout.
    pub request_timeout: Duration,
    /// Portal behaviour.
    pub portal: PortalConfig,
    /// Token for an already signed-in member.
    pub auth_token: Option<BearerToken>,
}

impl PortalSettings {
    /// Apply defaults and validate every field.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] naming the first invalid field.
    pub fn resolve(&self) -> Result<ResolvedSettings, SettingsError> {
        let api_base_url = self.api_base_url()?;
        let push_url = match self.push_url.as_deref() {
            Some(raw) => parse_url("push_url", raw)?,
            None => api_base_url
                .join(PUSH_STREAM_PATH)
                .map_err(|source| SettingsError::InvalidUrl {
                    field: "push_url",
                    source,
                })?,
        };
        let policy = self
            .failure_policy
            .as_deref()
            .map(str::parse::<FailurePolicy>)
            .transpose()?
            .unwrap_or_default();
        let initial_ms = positive(
            "reconnect_initial_ms",
            self.reconnect_initial_ms,
            DEFAULT_RECONNECT_INITIAL_MS,
        )?;
        let max_ms = positive(
            "reconnect_max_ms",
            self.reconnect_max_ms,
            DEFAULT_RECONNECT_MAX_MS,
        )?;
        if max_ms < initial_ms {
            return Err(SettingsError::BackoffBounds { initial_ms, max_ms });
        }

        Ok(ResolvedSettings {
            api_base_url,
            push_url,
            request_timeout: Duration::from_millis(positive(
                "request_timeout_ms",
                self.request_timeout_ms,
                DEFAULT_REQUEST_TIMEOUT_MS,
            )?),
            portal: PortalConfig {
                policy,
                aggregate_deadline: Duration::from_millis(positive(
                    "aggregate_deadline_ms",
                    self.aggregate_deadline_ms,
                    DEFAULT_AGGREGATE_DEADLINE_MS,
                )?),
                reconnect: ReconnectPolicy {
                    initial_backoff: Duration::from_millis(initial_ms),
                    max_backoff: Duration::from_millis(max_ms),
                },
            },
            auth_token: self
                .auth_token
                .as_deref()
                .filter(|token| !token.trim().is_empty())
                .map(BearerToken::new),
        })
    }

    fn api_base_url(&self) -> Result<Url, SettingsError> {
        let raw = self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL);
        let mut url = parse_url("api_base_url", raw)?;
        if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
            return Err(SettingsError::UnsupportedBaseUrl(raw.to_owned()));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }
}

fn parse_url(field: &'static str, raw: &str) -> Result<Url, SettingsError> {
    Url::parse(raw).map_err(|source| SettingsError::InvalidUrl { field, source })
}

fn positive(field: &'static str, value: Option<u64>, default: u64) -> Result<u64, SettingsError> {
    match value.unwrap_or(default) {
        0 => Err(SettingsError::ZeroDuration { field }),
        millis => Ok(millis),
    }
}
