//! BDD step definitions for the request gateway feature

use std::sync::Arc;
use std::time::{Duration, Instant};

use cucumber::{given, then, when};
use healthwatch::io::{HttpClient, ReqwestHttpClient};
use healthwatch::models::{HealthSettings, HealthSettingsUpdate};
use healthwatch::{HealthwatchError, RequestGateway};

use crate::backend::{Behavior, MockBackend};
use crate::world::HealthwatchWorld;

fn gateway_for(base_url: &str) -> RequestGateway {
    let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new());
    RequestGateway::new(base_url, http)
}

fn gateway(world: &HealthwatchWorld) -> &RequestGateway {
    world.gateway.as_ref().expect("gateway not set")
}

fn record<T>(
    world: &mut HealthwatchWorld,
    started: Instant,
    outcome: healthwatch::Result<T>,
) -> Option<T> {
    world.elapsed = Some(started.elapsed());
    match outcome {
        Ok(value) => Some(value),
        Err(e) => {
            world.last_error = Some(e);
            None
        }
    }
}

fn last_error(world: &HealthwatchWorld) -> &HealthwatchError {
    world
        .last_error
        .as_ref()
        .expect("expected the call to fail, but it succeeded")
}

#[given("a running health backend")]
async fn running_backend(world: &mut HealthwatchWorld) {
    let backend = MockBackend::start().await;
    world.gateway = Some(gateway_for(&backend.base_url));
    world.backend = Some(backend);
}

#[given("a backend address that refuses connections")]
fn refusing_backend(world: &mut HealthwatchWorld) {
    world.gateway = Some(gateway_for("http://127.0.0.1:1"));
}

#[given(expr = "a request timeout of {int} ms")]
fn request_timeout(world: &mut HealthwatchWorld, ms: u64) {
    world.timeout = Some(Duration::from_millis(ms));
}

#[given(expr = "the backend responds with status {int}")]
fn backend_status(world: &mut HealthwatchWorld, status: u16) {
    world.backend().set_behavior(Behavior::Status(status));
}

#[given("the backend responds with a body that is not JSON")]
fn backend_not_json(world: &mut HealthwatchWorld) {
    world.backend().set_behavior(Behavior::NotJson);
}

#[given("the backend never responds")]
fn backend_hangs(world: &mut HealthwatchWorld) {
    world.backend().set_behavior(Behavior::Hang);
}

#[given(expr = "project {string} has {int} health results with {int} failing")]
fn seeded_results(world: &mut HealthwatchWorld, project: String, count: usize, failing: usize) {
    world.backend().seed_results(&project, count, failing);
}

#[given(expr = "project {string} has polling interval {int} ms and max points {int}")]
fn stored_settings(world: &mut HealthwatchWorld, project: String, interval: u64, max_points: u32) {
    world.backend().store_settings(HealthSettings {
        project_name: project,
        polling_interval_ms: interval,
        auto_refresh: true,
        max_points,
    });
}

#[when(expr = "I fetch the period for project {string} with limit {int}")]
async fn fetch_period(world: &mut HealthwatchWorld, project: String, limit: u32) {
    world.reset_outcome();
    let started = Instant::now();
    let outcome = gateway(world)
        .fetch_period(&project, limit, world.request_timeout(), None)
        .await;
    world.period = record(world, started, outcome);
}

#[when(expr = "I fetch the settings for project {string}")]
async fn fetch_settings(world: &mut HealthwatchWorld, project: String) {
    world.reset_outcome();
    let started = Instant::now();
    let outcome = gateway(world)
        .fetch_settings(&project, world.request_timeout())
        .await;
    world.settings = record(world, started, outcome);
}

#[when(expr = "I update project {string} with auto refresh disabled")]
async fn disable_auto_refresh(world: &mut HealthwatchWorld, project: String) {
    world.reset_outcome();
    let update = HealthSettingsUpdate::new(project).auto_refresh(false);
    let started = Instant::now();
    let outcome = gateway(world)
        .update_settings(&update, world.request_timeout())
        .await;
    world.settings = record(world, started, outcome);
}

#[when(expr = "I send an empty settings update for project {string}")]
async fn empty_update(world: &mut HealthwatchWorld, project: String) {
    world.reset_outcome();
    let update = HealthSettingsUpdate::new(project);
    let started = Instant::now();
    let outcome = gateway(world)
        .update_settings(&update, world.request_timeout())
        .await;
    world.settings = record(world, started, outcome);
}

#[when(expr = "I truncate the results for project {string}")]
async fn truncate(world: &mut HealthwatchWorld, project: String) {
    world.reset_outcome();
    let started = Instant::now();
    let outcome = gateway(world)
        .truncate_results(&project, world.request_timeout())
        .await;
    record(world, started, outcome);
}

#[when(expr = "I fetch {int} result rows for project {string}")]
async fn fetch_rows(world: &mut HealthwatchWorld, limit: u32, project: String) {
    world.reset_outcome();
    let started = Instant::now();
    let outcome = gateway(world)
        .fetch_result_rows(&project, limit, world.request_timeout())
        .await;
    world.rows = record(world, started, outcome);
}

#[then("the call should succeed")]
fn call_succeeded(world: &mut HealthwatchWorld) {
    assert!(
        world.last_error.is_none(),
        "expected success, got {:?}",
        world.last_error
    );
}

#[then(expr = "the call should fail with HTTP status {int}")]
fn failed_with_status(world: &mut HealthwatchWorld, status: u16) {
    assert_eq!(last_error(world).status_code(), Some(status));
}

#[then("the call should fail with a parse error")]
fn failed_with_parse(world: &mut HealthwatchWorld) {
    let err = last_error(world);
    assert!(matches!(err, HealthwatchError::Parse(_)), "got {:?}", err);
}

#[then("the call should fail with a timeout")]
fn failed_with_timeout(world: &mut HealthwatchWorld) {
    let err = last_error(world);
    assert!(err.is_timeout(), "got {:?}", err);
}

#[then("the call should fail with a transport error")]
fn failed_with_transport(world: &mut HealthwatchWorld) {
    let err = last_error(world);
    assert!(matches!(err, HealthwatchError::Transport(_)), "got {:?}", err);
}

#[then(expr = "the call should have taken at least {int} ms")]
fn took_at_least(world: &mut HealthwatchWorld, ms: u64) {
    let elapsed = world.elapsed.expect("no call made");
    assert!(elapsed >= Duration::from_millis(ms), "took {:?}", elapsed);
}

#[then(expr = "the call should have finished within {int} ms")]
fn finished_within(world: &mut HealthwatchWorld, ms: u64) {
    let elapsed = world.elapsed.expect("no call made");
    assert!(elapsed < Duration::from_millis(ms), "took {:?}", elapsed);
}

#[then("no deadline timers should remain armed")]
fn no_armed_deadlines(world: &mut HealthwatchWorld) {
    assert_eq!(gateway(world).armed_deadlines(), 0);
}

#[then(expr = "the backend should have received {int} request(s)")]
fn backend_requests(world: &mut HealthwatchWorld, count: usize) {
    assert_eq!(world.backend().requests(), count);
}

#[then(expr = "the settings should have polling interval {int} ms")]
fn settings_interval(world: &mut HealthwatchWorld, interval: u64) {
    let settings = world.settings.as_ref().expect("no settings returned");
    assert_eq!(settings.polling_interval_ms, interval);
}

#[then("auto refresh should be enabled")]
fn auto_refresh_enabled(world: &mut HealthwatchWorld) {
    let settings = world.settings.as_ref().expect("no settings returned");
    assert!(settings.auto_refresh);
}

#[then("auto refresh should be disabled")]
fn auto_refresh_disabled(world: &mut HealthwatchWorld) {
    let settings = world.settings.as_ref().expect("no settings returned");
    assert!(!settings.auto_refresh);
}

#[then(expr = "max points should be {int}")]
fn settings_max_points(world: &mut HealthwatchWorld, max_points: u32) {
    let settings = world.settings.as_ref().expect("no settings returned");
    assert_eq!(settings.max_points, max_points);
}

#[then(expr = "the period should contain {int} item(s)")]
fn period_items(world: &mut HealthwatchWorld, count: usize) {
    let period = world.period.as_ref().expect("no period returned");
    assert_eq!(period.results.len(), count);
}

#[then("the period should be newest first")]
fn period_newest_first(world: &mut HealthwatchWorld) {
    let period = world.period.as_ref().expect("no period returned");
    assert!(period
        .results
        .windows(2)
        .all(|pair| pair[0].created_at >= pair[1].created_at));
}

#[then(expr = "the backend should have {int} results for project {string}")]
fn backend_result_count(world: &mut HealthwatchWorld, count: usize, project: String) {
    assert_eq!(world.backend().result_count(&project), count);
}

#[then(expr = "there should be {int} result row(s)")]
fn result_rows(world: &mut HealthwatchWorld, count: usize) {
    let rows = world.rows.as_ref().expect("no rows returned");
    assert_eq!(rows.results.len(), count);
}

#[then(expr = "the backend settings for project {string} should have max points {int}")]
fn backend_max_points(world: &mut HealthwatchWorld, project: String, max_points: u32) {
    assert_eq!(world.backend().settings_for(&project).max_points, max_points);
}

#[then(expr = "the backend should have received at least {int} requests")]
fn backend_requests_at_least(world: &mut HealthwatchWorld, count: usize) {
    let received = world.backend().requests();
    assert!(received >= count, "received {} requests", received);
}
