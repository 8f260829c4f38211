//! Healthwatch - health dashboard client
//!
//! Polls a health backend through a deadline-bounded request gateway and
//! reports outcomes as short-lived notifications.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod gateway;
pub mod io;
pub mod models;
pub mod notifications;
pub mod render;
pub mod state;

pub use config::{load_config, Config};
pub use dashboard::Dashboard;
pub use error::{HealthwatchError, Result};
pub use gateway::RequestGateway;
pub use notifications::{Notification, NotificationCenter, NotificationId, Severity};

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::io::{HttpClient, ReqwestHttpClient};

/// Wire a dashboard for `config` on top of the given HTTP client
pub fn build_dashboard(config: &Config, http: Arc<dyn HttpClient>) -> Result<Dashboard> {
    config.validate()?;

    let gateway = Arc::new(RequestGateway::new(config.base_url.clone(), http));
    let notifications = NotificationCenter::with_options(
        config.notifications.display_duration(),
        config.notifications.max_live,
    );
    let state = state::new_state_handle(config.project_name.clone(), config.period_limit as usize);

    Ok(Dashboard::new(gateway, notifications, state, config))
}

/// Poll the configured project until Ctrl-C, logging samples and toasts
pub async fn watch(config: Config) -> Result<()> {
    let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new());
    let dashboard = build_dashboard(&config, http)?;
    let cancel = CancellationToken::new();

    // Setup shutdown handler
    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        cancel_for_signal.cancel();
    });

    let renderer = render::spawn_toast_renderer(dashboard.notifications(), cancel.clone());

    tracing::info!(
        "Watching '{}' at {}",
        dashboard.project_name(),
        dashboard.gateway().base_url()
    );

    // Blocks until cancelled
    dashboard.run(cancel).await;

    if let Err(e) = renderer.await {
        tracing::error!("Toast renderer task failed: {}", e);
    }
    tracing::info!("Stopped watching '{}'", dashboard.project_name());

    Ok(())
}
