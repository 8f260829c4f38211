//! Dashboard: composes the request gateway with the notification center
//!
//! The gateway never reports anything to the user on its own. Every outcome
//! the user should see is turned into a toast here.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::gateway::RequestGateway;
use crate::models::{HealthResultsResponse, HealthSample, HealthSettings, HealthSettingsUpdate};
use crate::notifications::NotificationCenter;
use crate::state::StateHandle;

/// Backend default for projects that have no stored settings
pub const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_millis(5000);

const MIN_POLLING_INTERVAL: Duration = Duration::from_millis(250);

/// Polls one project and keeps the shared state current
pub struct Dashboard {
    gateway: Arc<RequestGateway>,
    notifications: NotificationCenter,
    state: StateHandle,
    project_name: String,
    timeout: Duration,
    period_limit: u32,
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("project_name", &self.project_name)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Dashboard {
    pub fn new(
        gateway: Arc<RequestGateway>,
        notifications: NotificationCenter,
        state: StateHandle,
        config: &Config,
    ) -> Self {
        Self {
            gateway,
            notifications,
            state,
            project_name: config.project_name.clone(),
            timeout: config.request_timeout(),
            period_limit: config.period_limit,
        }
    }

    pub fn gateway(&self) -> &RequestGateway {
        &self.gateway
    }

    pub fn state(&self) -> &StateHandle {
        &self.state
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    /// Fetch and cache the project's settings
    pub async fn load_settings(&self) -> crate::Result<HealthSettings> {
        match self
            .gateway
            .fetch_settings(&self.project_name, self.timeout)
            .await
        {
            Ok(settings) => {
                tracing::debug!("Loaded settings for '{}': {:?}", self.project_name, settings);
                self.state.write().await.apply_settings(settings.clone());
                Ok(settings)
            }
            Err(e) => {
                tracing::warn!("Loading settings for '{}' failed: {}", self.project_name, e);
                self.notifications
                    .error(format!("Could not load settings: {}", e.summary()));
                Err(e)
            }
        }
    }

    /// Push a partial update; the returned settings replace the cached copy
    pub async fn apply_settings(
        &self,
        mut update: HealthSettingsUpdate,
    ) -> crate::Result<HealthSettings> {
        update.project_name = self.project_name.clone();
        if update.is_empty() {
            tracing::debug!("Empty settings update for '{}'", self.project_name);
        }

        match self.gateway.update_settings(&update, self.timeout).await {
            Ok(settings) => {
                self.state.write().await.apply_settings(settings.clone());
                self.notifications.success("Settings saved");
                Ok(settings)
            }
            Err(e) => {
                tracing::warn!("Saving settings for '{}' failed: {}", self.project_name, e);
                self.notifications
                    .error(format!("Could not save settings: {}", e.summary()));
                Err(e)
            }
        }
    }

    /// Fetch the latest period window. Returns the number of samples kept.
    ///
    /// Only the first failure of a streak raises a toast, so a backend that
    /// stays down does not flood the user at every poll.
    pub async fn refresh(&self) -> crate::Result<usize> {
        let limit = {
            let state = self.state.read().await;
            let max_points = state
                .settings
                .as_ref()
                .map(|s| s.max_points)
                .unwrap_or(self.period_limit);
            self.period_limit.min(max_points).max(1)
        };

        match self
            .gateway
            .fetch_period(&self.project_name, limit, self.timeout, None)
            .await
        {
            Ok(response) => {
                let samples: Vec<HealthSample> = response.samples();
                let mut state = self.state.write().await;
                let recovered = state.consecutive_errors > 0;
                state.replace_samples(samples, current_epoch_ms());
                if recovered {
                    tracing::info!("Backend for '{}' reachable again", self.project_name);
                    self.notifications.info("Health data is updating again");
                }
                Ok(state.samples.len())
            }
            Err(e) => {
                let mut state = self.state.write().await;
                state.record_error(e.to_string());
                if state.consecutive_errors == 1 {
                    tracing::warn!("Refreshing '{}' failed: {}", self.project_name, e);
                    self.notifications
                        .error(format!("Could not refresh health data: {}", e.summary()));
                } else {
                    tracing::debug!(
                        "Refreshing '{}' failed ({} in a row): {}",
                        self.project_name,
                        state.consecutive_errors,
                        e
                    );
                }
                Err(e)
            }
        }
    }

    /// Delete the project's stored results and clear the local history
    pub async fn truncate(&self) -> crate::Result<()> {
        match self
            .gateway
            .truncate_results(&self.project_name, self.timeout)
            .await
        {
            Ok(()) => {
                self.state.write().await.clear_samples();
                self.notifications.success("Health results deleted");
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Truncating '{}' failed: {}", self.project_name, e);
                self.notifications
                    .error(format!("Could not delete results: {}", e.summary()));
                Err(e)
            }
        }
    }

    pub async fn result_rows(&self, limit: u32) -> crate::Result<HealthResultsResponse> {
        self.gateway
            .fetch_result_rows(&self.project_name, limit, self.timeout)
            .await
            .inspect_err(|e| {
                self.notifications
                    .error(format!("Could not load results: {}", e.summary()));
            })
    }

    /// Refresh on the configured interval until `cancel` fires.
    ///
    /// When auto-refresh is off the loop only waits, so a later settings change
    /// takes effect at the next tick.
    ///
    /// Until settings have loaded the loop polls with the backend defaults and
    /// retries the settings fetch at every tick.
    pub async fn run(&self, cancel: CancellationToken) {
        if self.state.read().await.settings.is_none() {
            if let Err(e) = self.load_settings().await {
                tracing::info!(
                    "Polling '{}' with default settings until they load: {}",
                    self.project_name,
                    e
                );
            }
        }

        loop {
            let (auto_refresh, interval) = self.polling().await;
            if auto_refresh && self.refresh().await.is_ok() {
                tracing::info!("{}", crate::render::summary(&*self.state.read().await));
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = cancel.cancelled() => {
                    tracing::debug!("Polling loop for '{}' cancelled", self.project_name);
                    break;
                }
            }

            if self.state.read().await.settings.is_none() {
                self.retry_settings().await;
            }
        }
    }

    /// Settings fetch for the polling loop. Failures were already reported
    /// once by `load_settings`, so they are only logged here.
    async fn retry_settings(&self) {
        match self
            .gateway
            .fetch_settings(&self.project_name, self.timeout)
            .await
        {
            Ok(settings) => {
                tracing::info!("Loaded settings for '{}' on retry", self.project_name);
                self.state.write().await.apply_settings(settings);
            }
            Err(e) => {
                tracing::debug!("Settings for '{}' still unavailable: {}", self.project_name, e);
            }
        }
    }

    async fn polling(&self) -> (bool, Duration) {
        let state = self.state.read().await;
        match &state.settings {
            Some(settings) => (
                settings.auto_refresh,
                Duration::from_millis(settings.polling_interval_ms).max(MIN_POLLING_INTERVAL),
            ),
            None => (true, DEFAULT_POLLING_INTERVAL),
        }
    }
}

fn current_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
