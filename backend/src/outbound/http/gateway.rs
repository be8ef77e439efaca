//! Reqwest-backed adapter for the REST collaborators.
//!
//! This adapter owns transport details only: URL building, bearer auth,
//! per-request timeouts derived from the caller's deadline, HTTP error mapping
//! and JSON decoding into domain values.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use tokio::time::Instant;

use super::dto::{
    CampaignsDto, CartDto, CouponsDto, NotificationDto, PaymentMethodDto, PointsDto, ProfileDto,
    RewardsDto,
};
use super::errors::{map_status_error, map_transport_error};
use crate::domain::ports::{
    AccountGateway, AuthContext, FetchOptions, NotificationCommand, RejectedBy,
    SessionInvalidated, UpstreamCause, UpstreamError, UpstreamResult,
};
use crate::domain::{
    CampaignDigest, CartDigest, CouponDigest, Notification, NotificationId, PaymentMethodSummary,
    PointsBalance, ProfileData, RewardsDigest, Source,
};

const USER_AGENT: &str = concat!("loyalty-dashboard/", env!("CARGO_PKG_VERSION"));

/// Gateway performing JSON requests against one API base URL.
pub struct HttpAccountGateway {
    client: Client,
    base_url: Url,
    auth: Arc<dyn AuthContext>,
}

impl HttpAccountGateway {
    /// Build an adapter whose requests never run longer than `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        base_url: Url,
        timeout: Duration,
        auth: Arc<dyn AuthContext>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            base_url,
            auth,
        })
    }

    fn endpoint(&self, source: Source, segments: &[&str]) -> UpstreamResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                UpstreamError::new(
                    source,
                    UpstreamCause::transport(format!(
                        "base URL {} cannot carry a path",
                        self.base_url
                    )),
                )
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(
        &self,
        source: Source,
        method: Method,
        url: Url,
        options: &FetchOptions,
    ) -> UpstreamResult<RequestBuilder> {
        let mut request = self
            .client
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(deadline) = options.deadline {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(UpstreamError::new(source, UpstreamCause::deadline_exceeded()));
            }
            request = request.timeout(remaining);
        }
        if let Some(token) = self.auth.bearer_token() {
            request = request.bearer_auth(token.expose());
        }
        Ok(request)
    }

    async fn execute(&self, source: Source, request: RequestBuilder) -> UpstreamResult<Vec<u8>> {
        let response = request
            .send()
            .await
            .map_err(|error| UpstreamError::new(source, map_transport_error(&error)))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|error| UpstreamError::new(source, map_transport_error(&error)))?;
        if !status.is_success() {
            let error = UpstreamError::new(source, map_status_error(status, body.as_ref()));
            if error.is_auth() {
                self.auth.invalidate(SessionInvalidated {
                    rejected_by: RejectedBy::Upstream(source),
                });
            }
            return Err(error);
        }
        Ok(body.to_vec())
    }

    async fn get_json<D: DeserializeOwned>(
        &self,
        source: Source,
        segments: &[&str],
        options: &FetchOptions,
    ) -> UpstreamResult<D> {
        let url = self.endpoint(source, segments)?;
        let request = self.request(source, Method::GET, url, options)?;
        let body = self.execute(source, request).await?;
        serde_json::from_slice(&body).map_err(|error| {
            UpstreamError::new(
                source,
                UpstreamCause::decode(format!("invalid {source} payload: {error}")),
            )
        })
    }

    async fn send_command(
        &self,
        method: Method,
        segments: &[&str],
    ) -> UpstreamResult<()> {
        let source = Source::Notifications;
        let url = self.endpoint(source, segments)?;
        let request = self.request(source, method, url, &FetchOptions::default())?;
        self.execute(source, request).await.map(|_| ())
    }
}

fn invariant_violation(source: Source, message: String) -> UpstreamError {
    UpstreamError::new(source, UpstreamCause::decode(message))
}

#[async_trait]
impl AccountGateway for HttpAccountGateway {
    async fn fetch_profile(&self, options: &FetchOptions) -> UpstreamResult<ProfileData> {
        let dto: ProfileDto = self
            .get_json(Source::Profile, &["users", "profile"], options)
            .await?;
        dto.into_domain()
            .map_err(|message| invariant_violation(Source::Profile, message))
    }

    async fn fetch_points(&self, options: &FetchOptions) -> UpstreamResult<PointsBalance> {
        let dto: PointsDto = self
            .get_json(Source::Points, &["users", "points"], options)
            .await?;
        Ok(dto.into_domain())
    }

    async fn fetch_coupons(&self, options: &FetchOptions) -> UpstreamResult<CouponDigest> {
        let dto: CouponsDto = self
            .get_json(Source::Coupons, &["coupons", "available"], options)
            .await?;
        Ok(dto.into_domain())
    }

    async fn fetch_campaigns(&self, options: &FetchOptions) -> UpstreamResult<CampaignDigest> {
        let dto: CampaignsDto = self
            .get_json(Source::Campaigns, &["campaigns", "active"], options)
            .await?;
        Ok(dto.into_domain())
    }

    async fn fetch_rewards(&self, options: &FetchOptions) -> UpstreamResult<RewardsDigest> {
        let dto: RewardsDto = self
            .get_json(Source::Rewards, &["rewards", "available"], options)
            .await?;
        Ok(dto.into_domain())
    }

    async fn fetch_notifications(
        &self,
        options: &FetchOptions,
    ) -> UpstreamResult<Vec<Notification>> {
        let dtos: Vec<NotificationDto> = self
            .get_json(Source::Notifications, &["notifications"], options)
            .await?;
        Ok(dtos.into_iter().map(NotificationDto::into_domain).collect())
    }

    async fn fetch_cart(&self, options: &FetchOptions) -> UpstreamResult<CartDigest> {
        let dto: CartDto = self.get_json(Source::Cart, &["cart"], options).await?;
        Ok(dto.into_domain())
    }

    async fn fetch_payment_methods(
        &self,
        options: &FetchOptions,
    ) -> UpstreamResult<Vec<PaymentMethodSummary>> {
        let dtos: Vec<PaymentMethodDto> = self
            .get_json(Source::PaymentMethods, &["payments", "methods"], options)
            .await?;
        Ok(dtos.into_iter().map(PaymentMethodDto::into_domain).collect())
    }
}

#[async_trait]
impl NotificationCommand for HttpAccountGateway {
    async fn mark_read(&self, id: &NotificationId) -> UpstreamResult<()> {
        self.send_command(Method::PUT, &["notifications", id.as_str(), "read"])
            .await
    }

    async fn delete(&self, id: &NotificationId) -> UpstreamResult<()> {
        self.send_command(Method::DELETE, &["notifications", id.as_str()])
            .await
    }
}

#[cfg(test)]
#[path = "gateway_tests.rs"]
mod tests;
