//! Terminal rendering of samples, rows and toasts

use std::collections::HashSet;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::models::{HealthResultRow, HealthSample, HealthSettings};
use crate::notifications::{Notification, NotificationCenter, NotificationId, Severity};
use crate::state::DashboardState;

pub fn sample_line(sample: &HealthSample) -> String {
    let status = if sample.ok { "OK  " } else { "FAIL" };
    let counters = match (sample.failure_count, sample.total_count) {
        (Some(failures), Some(total)) => format!(" {}/{} failed", failures, total),
        _ => String::new(),
    };
    format!(
        "{} {} {:>6}ms {} ({}){}",
        sample.timestamp.format("%Y-%m-%d %H:%M:%S"),
        status,
        sample.latency_ms,
        sample.status_text,
        sample.backend_detail,
        counters
    )
}

pub fn row_line(row: &HealthResultRow) -> String {
    format!("#{:<8} {}", row.id, sample_line(&HealthSample::from(row)))
}

pub fn settings_block(settings: &HealthSettings) -> String {
    format!(
        "project:          {}\npolling interval: {}ms\nauto refresh:     {}\nmax points:       {}",
        settings.project_name,
        settings.polling_interval_ms,
        settings.auto_refresh,
        settings.max_points
    )
}

/// One-line summary of the dashboard after a refresh
pub fn summary(state: &DashboardState) -> String {
    let latest = match state.samples.front() {
        Some(sample) => sample_line(sample),
        None => "no samples".to_string(),
    };
    match state.availability() {
        Some(ratio) => format!(
            "'{}': {} samples, {:.1}% ok, latest {}",
            state.project_name,
            state.samples.len(),
            ratio * 100.0,
            latest
        ),
        None => format!("'{}': {}", state.project_name, latest),
    }
}

pub fn toast_line(notification: &Notification) -> String {
    format!("[{}] {}", notification.severity, notification.message)
}

/// Log a toast at the level matching its severity
pub fn show_toast(notification: &Notification) {
    match notification.severity {
        Severity::Error => tracing::warn!("{}", toast_line(notification)),
        Severity::Success | Severity::Info => tracing::info!("{}", toast_line(notification)),
    }
}

/// Log every toast once, as it appears, until `cancel` fires
pub fn spawn_toast_renderer(
    center: &NotificationCenter,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let mut live = center.subscribe();
    tokio::spawn(async move {
        let mut shown: HashSet<NotificationId> = HashSet::new();
        loop {
            tokio::select! {
                changed = live.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = cancel.cancelled() => break,
            }

            let current = live.borrow_and_update().clone();
            for notification in newly_shown(&mut shown, &current) {
                show_toast(notification);
            }
        }
    })
}

/// Toasts in `current` not yet in `shown`. Ids no longer live are forgotten.
fn newly_shown<'a>(
    shown: &mut HashSet<NotificationId>,
    current: &'a [Notification],
) -> Vec<&'a Notification> {
    shown.retain(|id| current.iter().any(|n| n.id == *id));
    current.iter().filter(|n| shown.insert(n.id)).collect()
}
