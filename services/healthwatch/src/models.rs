//! Wire types for the health backend and the client-side sample view

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One aggregated day from `/api/health/period`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthPeriodItem {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub ok: bool,
    pub status_text: String,
    pub elasticsearch: String,
    pub latency_ms: u64,
    pub failure_count: u64,
    pub total_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthPeriodResponse {
    pub project_name: String,
    pub limit: u32,
    pub results: Vec<HealthPeriodItem>,
}

/// Per-project polling settings, as stored by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthSettings {
    pub project_name: String,
    pub polling_interval_ms: u64,
    pub auto_refresh: bool,
    pub max_points: u32,
}

/// Partial settings update. Fields left as `None` are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthSettingsUpdate {
    pub project_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polling_interval_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_refresh: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_points: Option<u32>,
}

impl HealthSettingsUpdate {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            ..Self::default()
        }
    }

    pub fn polling_interval_ms(mut self, value: u64) -> Self {
        self.polling_interval_ms = Some(value);
        self
    }

    pub fn auto_refresh(mut self, value: bool) -> Self {
        self.auto_refresh = Some(value);
        self
    }

    pub fn max_points(mut self, value: u32) -> Self {
        self.max_points = Some(value);
        self
    }

    /// True when no field besides `project_name` is set
    pub fn is_empty(&self) -> bool {
        self.polling_interval_ms.is_none()
            && self.auto_refresh.is_none()
            && self.max_points.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthTruncateRequest {
    pub project_name: String,
}

/// One raw check result from `/api/health/results`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResultRow {
    pub id: i64,
    pub project_name: String,
    pub created_at: DateTime<Utc>,
    pub ok: bool,
    pub status_text: String,
    pub elasticsearch: String,
    pub latency_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResultsResponse {
    pub project_name: String,
    pub limit: u32,
    pub results: Vec<HealthResultRow>,
}

/// A health check result as the dashboard displays it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSample {
    pub timestamp: DateTime<Utc>,
    pub ok: bool,
    pub status_text: String,
    pub backend_detail: String,
    pub latency_ms: u64,
    pub failure_count: Option<u64>,
    pub total_count: Option<u64>,
}

impl From<&HealthPeriodItem> for HealthSample {
    fn from(item: &HealthPeriodItem) -> Self {
        Self {
            timestamp: item.created_at,
            ok: item.ok,
            status_text: item.status_text.clone(),
            backend_detail: item.elasticsearch.clone(),
            latency_ms: item.latency_ms,
            failure_count: Some(item.failure_count),
            total_count: Some(item.total_count),
        }
    }
}

impl From<&HealthResultRow> for HealthSample {
    fn from(row: &HealthResultRow) -> Self {
        Self {
            timestamp: row.created_at,
            ok: row.ok,
            status_text: row.status_text.clone(),
            backend_detail: row.elasticsearch.clone(),
            latency_ms: row.latency_ms,
            failure_count: None,
            total_count: None,
        }
    }
}

impl HealthPeriodResponse {
    pub fn samples(&self) -> Vec<HealthSample> {
        self.results.iter().map(HealthSample::from).collect()
    }
}
