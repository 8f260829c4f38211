//! BDD test world for the healthwatch client

use std::time::Duration;

use cucumber::World;
use healthwatch::models::{HealthPeriodResponse, HealthResultsResponse, HealthSettings};
use healthwatch::{Dashboard, HealthwatchError, NotificationCenter, NotificationId, RequestGateway};

use crate::backend::MockBackend;

#[derive(Debug, Default, World)]
pub struct HealthwatchWorld {
    // Backend and gateway
    pub backend: Option<MockBackend>,
    pub gateway: Option<RequestGateway>,
    pub timeout: Option<Duration>,

    // Outcome of the last gateway call
    pub period: Option<HealthPeriodResponse>,
    pub settings: Option<HealthSettings>,
    pub rows: Option<HealthResultsResponse>,
    pub last_error: Option<HealthwatchError>,
    pub elapsed: Option<Duration>,

    // Notifications
    pub center: Option<NotificationCenter>,
    pub toast_ids: Vec<NotificationId>,
    pub last_dismissed: Option<bool>,

    // Dashboard composition
    pub dashboard: Option<Dashboard>,
}

impl HealthwatchWorld {
    pub fn backend(&self) -> &MockBackend {
        self.backend.as_ref().expect("backend not started")
    }

    pub fn center(&self) -> &NotificationCenter {
        self.center.as_ref().expect("notification center not set")
    }

    pub fn request_timeout(&self) -> Duration {
        self.timeout.unwrap_or(Duration::from_secs(5))
    }

    /// Clear the outcome of the previous call before making a new one
    pub fn reset_outcome(&mut self) {
        self.period = None;
        self.settings = None;
        self.rows = None;
        self.last_error = None;
        self.elapsed = None;
    }
}
