//! Runner: wires the adapters, builds one dashboard snapshot, then follows the
//! notification feed until interrupted.

use std::sync::Arc;

use color_eyre::eyre::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use loyalty_dashboard::domain::ports::DiscardingSettingsStore;
use loyalty_dashboard::domain::{AccountPortal, FeedState, PortalPorts, SessionState};
use loyalty_dashboard::outbound::http::HttpAccountGateway;
use loyalty_dashboard::outbound::push::HttpNotificationFeed;
use loyalty_dashboard::settings::PortalSettings;
use ortho_config::OrthoConfig;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = PortalSettings::load_from_iter(std::env::args_os())
        .wrap_err("failed to load portal settings")?
        .resolve()
        .wrap_err("invalid portal settings")?;

    let session = Arc::new(SessionState::new(settings.auth_token.clone()));
    let gateway = Arc::new(
        HttpAccountGateway::new(
            settings.api_base_url.clone(),
            settings.request_timeout,
            session.clone(),
        )
        .wrap_err("failed to build upstream client")?,
    );
    let feed = Arc::new(
        HttpNotificationFeed::new(
            settings.push_url.clone(),
            settings.request_timeout,
            session.clone(),
        )
        .wrap_err("failed to build push client")?,
    );
    let portal = AccountPortal::new(
        PortalPorts {
            gateway: gateway.clone(),
            command: gateway,
            feed,
            settings_store: Arc::new(DiscardingSettingsStore),
            session,
        },
        settings.portal,
    );

    match portal.aggregate().await {
        Ok(snapshot) => info!(
            points = snapshot.points,
            level = %snapshot.membership_level,
            degraded = snapshot.is_degraded(),
            failed_sources = ?snapshot.source_errors.keys().collect::<Vec<_>>(),
            "dashboard snapshot published"
        ),
        Err(error) => warn!(
            %error,
            session_expired = error.is_session_expired(),
            retryable = error.is_retryable(),
            "dashboard unavailable"
        ),
    }

    let handle = portal.subscribe_notifications(|view| {
        info!(
            unread = view.unread_count,
            total = view.notifications.len(),
            "notifications updated"
        );
    });
    let mut state = handle.state_updates();
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.wrap_err("failed to listen for ctrl-c")?;
            info!("interrupted; stopping notification feed");
        }
        _ = state.wait_for(|state| *state == FeedState::SessionExpired) => {
            warn!("push channel rejected the session; stopping");
        }
    }
    handle.cancel().await;
    Ok(())
}
