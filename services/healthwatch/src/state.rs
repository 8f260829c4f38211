//! Shared dashboard state: cached settings and the bounded sample history

use std::collections::VecDeque;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::models::{HealthSample, HealthSettings};

/// What the dashboard currently shows for one project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardState {
    pub project_name: String,
    pub settings: Option<HealthSettings>,
    pub samples: VecDeque<HealthSample>,
    pub max_points: usize,
    pub last_refresh_epoch_ms: u64,
    pub last_error: Option<String>,
    pub consecutive_errors: u32,
}

impl DashboardState {
    pub fn new(project_name: impl Into<String>, max_points: usize) -> Self {
        Self {
            project_name: project_name.into(),
            settings: None,
            samples: VecDeque::with_capacity(max_points),
            max_points,
            last_refresh_epoch_ms: 0,
            last_error: None,
            consecutive_errors: 0,
        }
    }

    /// Replace the cached settings with the backend's authoritative copy
    pub fn apply_settings(&mut self, settings: HealthSettings) {
        self.max_points = settings.max_points as usize;
        self.settings = Some(settings);
        self.trim();
    }

    /// Replace the history with a freshly fetched window
    pub fn replace_samples(&mut self, samples: Vec<HealthSample>, now_ms: u64) {
        self.samples = samples.into();
        self.trim();
        self.last_refresh_epoch_ms = now_ms;
        self.last_error = None;
        self.consecutive_errors = 0;
    }

    /// Record a failed refresh. Previously fetched samples are kept.
    pub fn record_error(&mut self, error: impl Into<String>) {
        self.last_error = Some(error.into());
        self.consecutive_errors += 1;
    }

    pub fn clear_samples(&mut self) {
        self.samples.clear();
    }

    fn trim(&mut self) {
        while self.samples.len() > self.max_points {
            self.samples.pop_back();
        }
    }

    /// Share of ok samples, if any are present
    pub fn availability(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let ok = self.samples.iter().filter(|s| s.ok).count();
        Some(ok as f64 / self.samples.len() as f64)
    }
}

/// Thread-safe shared state handle
pub type StateHandle = Arc<RwLock<DashboardState>>;

pub fn new_state_handle(project_name: impl Into<String>, max_points: usize) -> StateHandle {
    Arc::new(RwLock::new(DashboardState::new(project_name, max_points)))
}
