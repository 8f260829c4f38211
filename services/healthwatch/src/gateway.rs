//! Deadline-bounded request layer for the health backend
//!
//! Every operation performs exactly one HTTP call. A cancellation token is
//! armed when the call starts and fired by a timer task once the timeout
//! elapses; the call and the token race, and whichever finishes first decides
//! the outcome. The timer is disarmed when the call settles, whatever the
//! outcome.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::io::{HttpClient, HttpResponse};
use crate::models::{
    HealthPeriodResponse, HealthResultsResponse, HealthSettings, HealthSettingsUpdate,
    HealthTruncateRequest,
};
use crate::{HealthwatchError, Result};

/// Backend endpoints used by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Period,
    Settings,
    UpdateSettings,
    TruncateResults,
    ResultRows,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Period => "/api/health/period",
            Endpoint::Settings | Endpoint::UpdateSettings => "/api/settings/health-polling",
            Endpoint::TruncateResults => "/api/health/results/truncate",
            Endpoint::ResultRows => "/api/health/results",
        }
    }

    pub fn method(&self) -> &'static str {
        match self {
            Endpoint::Period | Endpoint::Settings | Endpoint::ResultRows => "GET",
            Endpoint::UpdateSettings => "PUT",
            Endpoint::TruncateResults => "POST",
        }
    }

    /// Whether a retry layer may safely repeat this call.
    /// Truncation is destructive and must never be repeated automatically.
    pub fn is_idempotent(&self) -> bool {
        !matches!(self, Endpoint::TruncateResults)
    }
}

/// A cancellation token plus the timer task that fires it
struct Deadline {
    token: CancellationToken,
    timer: JoinHandle<()>,
    armed: Arc<AtomicUsize>,
}

impl Deadline {
    fn arm(timeout: Duration, armed: &Arc<AtomicUsize>) -> Self {
        let token = CancellationToken::new();
        let fire = token.clone();
        armed.fetch_add(1, Ordering::SeqCst);
        let timer = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            fire.cancel();
        });

        Self {
            token,
            timer,
            armed: Arc::clone(armed),
        }
    }
}

impl Drop for Deadline {
    fn drop(&mut self) {
        self.timer.abort();
        self.armed.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Client for the health backend
pub struct RequestGateway {
    base_url: String,
    http: Arc<dyn HttpClient>,
    armed: Arc<AtomicUsize>,
}

impl std::fmt::Debug for RequestGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestGateway")
            .field("base_url", &self.base_url)
            .field("armed_deadlines", &self.armed_deadlines())
            .finish()
    }
}

impl RequestGateway {
    pub fn new(base_url: impl Into<String>, http: Arc<dyn HttpClient>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        tracing::debug!("Created RequestGateway for {}", base_url);
        Self {
            base_url,
            http,
            armed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Number of deadline timers currently armed. Zero whenever no call is in flight.
    pub fn armed_deadlines(&self) -> usize {
        self.armed.load(Ordering::SeqCst)
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    /// Fetch a window of aggregated samples, newest first
    pub async fn fetch_period(
        &self,
        project_name: &str,
        limit: u32,
        timeout: Duration,
        since: Option<DateTime<Utc>>,
    ) -> Result<HealthPeriodResponse> {
        let url = self.url(Endpoint::Period);
        let limit = limit.to_string();
        let since = since.map(|s| s.to_rfc3339_opts(SecondsFormat::Millis, true));
        let mut query = vec![("project_name", project_name), ("limit", limit.as_str())];
        if let Some(since) = &since {
            query.push(("since", since.as_str()));
        }

        let response = self
            .send(Endpoint::Period, timeout, self.http.get(&url, &query))
            .await?;
        parse(Endpoint::Period, &response)
    }

    pub async fn fetch_settings(
        &self,
        project_name: &str,
        timeout: Duration,
    ) -> Result<HealthSettings> {
        let url = self.url(Endpoint::Settings);
        let query = [("project_name", project_name)];

        let response = self
            .send(Endpoint::Settings, timeout, self.http.get(&url, &query))
            .await?;
        parse(Endpoint::Settings, &response)
    }

    /// Apply a partial update and return the backend's full settings
    pub async fn update_settings(
        &self,
        update: &HealthSettingsUpdate,
        timeout: Duration,
    ) -> Result<HealthSettings> {
        let url = self.url(Endpoint::UpdateSettings);
        let body = serde_json::to_value(update)?;

        let response = self
            .send(
                Endpoint::UpdateSettings,
                timeout,
                self.http.put_json(&url, &body),
            )
            .await?;
        parse(Endpoint::UpdateSettings, &response)
    }

    /// Delete every stored result for a project. Any response body is ignored.
    pub async fn truncate_results(&self, project_name: &str, timeout: Duration) -> Result<()> {
        let url = self.url(Endpoint::TruncateResults);
        let body = serde_json::to_value(HealthTruncateRequest {
            project_name: project_name.to_string(),
        })?;

        self.send(
            Endpoint::TruncateResults,
            timeout,
            self.http.post_json(&url, &body),
        )
        .await?;
        Ok(())
    }

    /// Fetch the most recent raw result rows
    pub async fn fetch_result_rows(
        &self,
        project_name: &str,
        limit: u32,
        timeout: Duration,
    ) -> Result<HealthResultsResponse> {
        let url = self.url(Endpoint::ResultRows);
        let limit = limit.to_string();
        let query = [("project_name", project_name), ("limit", limit.as_str())];

        let response = self
            .send(Endpoint::ResultRows, timeout, self.http.get(&url, &query))
            .await?;
        parse(Endpoint::ResultRows, &response)
    }

    /// Race `request` against a deadline and normalize the outcome.
    ///
    /// The losing side is dropped: a late response after the deadline is never
    /// observed, and a deadline after the response has nothing left to cancel.
    async fn send<F>(
        &self,
        endpoint: Endpoint,
        timeout: Duration,
        request: F,
    ) -> Result<HttpResponse>
    where
        F: Future<Output = Result<HttpResponse>>,
    {
        tracing::debug!(
            "{} {} (timeout {}ms)",
            endpoint.method(),
            endpoint.path(),
            timeout.as_millis()
        );

        let deadline = Deadline::arm(timeout, &self.armed);
        let outcome = tokio::select! {
            biased;
            _ = deadline.token.cancelled() => Err(HealthwatchError::Timeout(timeout)),
            result = request => result,
        };
        drop(deadline);

        let response = match outcome {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("{} {} failed: {}", endpoint.method(), endpoint.path(), e);
                return Err(e);
            }
        };

        if !response.is_success() {
            tracing::debug!(
                "{} {} returned status {}",
                endpoint.method(),
                endpoint.path(),
                response.status
            );
            return Err(HealthwatchError::HttpStatus {
                status: response.status,
                body: response.body,
            });
        }

        Ok(response)
    }
}

fn parse<T: DeserializeOwned>(endpoint: Endpoint, response: &HttpResponse) -> Result<T> {
    serde_json::from_str(&response.body)
        .map_err(|e| HealthwatchError::Parse(format!("{}: {}", endpoint.path(), e)))
}
