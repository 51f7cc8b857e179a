//! Behavior-driven tests for refresh cycles against a scripted upstream.
//!
//! These tests verify what a cycle publishes, how it paces requests, and that a
//! failing platform never leaves a partial snapshot behind.

use std::time::Duration;

use fragstat_core::{
    CircuitState, GameMode, Platform, RateLimiter, RefreshCoordinator, RefreshRequest, SourceMode,
};
use fragstat_tests::{live_config, mode_stats, ok, stats_body, status, Arc, ScriptedHttpClient};
use serde_json::json;

fn console_and_pc() -> RefreshRequest {
    RefreshRequest::new(
        [Platform::Gamepad, Platform::KeyboardMouse],
        [GameMode::Solo, GameMode::Duo],
    )
    .expect("valid request")
}

// =============================================================================
// Refresh: Healthy Upstream
// =============================================================================

#[tokio::test(start_paused = true)]
async fn when_every_platform_answers_the_cycle_publishes_a_live_snapshot() {
    // Given: An upstream with stats for console and PC
    let client = Arc::new(
        ScriptedHttpClient::new()
            .script(
                "gamepad",
                vec![ok(stats_body("gamepad", &[("solo", mode_stats(120, 60, 6))]))],
            )
            .script(
                "keyboardMouse",
                vec![ok(stats_body("keyboardMouse", &[("duo", mode_stats(80, 40, 8))]))],
            ),
    );
    let coordinator =
        RefreshCoordinator::from_config(&live_config(), client.clone()).expect("live config");

    // When: One refresh cycle runs
    let snapshot = coordinator.refresh(&console_and_pc()).await.expect("cycle should succeed");

    // Then: The snapshot covers every requested cell and becomes the latest
    assert!(snapshot.is_live());
    assert_eq!(snapshot.cells().count(), 4);
    let console_solo = snapshot
        .record(Platform::Gamepad, GameMode::Solo)
        .expect("console solo record");
    assert_eq!(console_solo.id, "test_player_gamepad_solo");
    assert_eq!(console_solo.kills, 120);
    assert_eq!(console_solo.top1, 6);
    assert!((console_solo.win_ratio - 0.1).abs() < 1e-9);

    // Modes absent upstream are zeroed, not dropped
    let console_duo = snapshot
        .record(Platform::Gamepad, GameMode::Duo)
        .expect("console duo record");
    assert_eq!(console_duo.kills, 0);
    assert_eq!(console_duo.matches, 0);

    assert_eq!(coordinator.latest(), Some(snapshot));
    assert_eq!(coordinator.health().circuit_state, CircuitState::Closed);
}

#[tokio::test(start_paused = true)]
async fn when_a_cycle_spans_platforms_requests_are_spaced_by_the_rate_limiter() {
    // Given: A healthy upstream
    let client = Arc::new(
        ScriptedHttpClient::new()
            .script("gamepad", vec![ok(stats_body("gamepad", &[]))])
            .script("keyboardMouse", vec![ok(stats_body("keyboardMouse", &[]))]),
    );
    let coordinator =
        RefreshCoordinator::from_config(&live_config(), client.clone()).expect("live config");

    // When: A two-platform cycle runs
    coordinator.refresh(&console_and_pc()).await.expect("cycle should succeed");

    // Then: Consecutive requests are at least the minimum interval apart
    let requests = client.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[1].1 - requests[0].1 >= Duration::from_millis(500));

    // And: Every request carries the key and targets its own platform bucket
    for (request, _) in &requests {
        assert_eq!(request.headers.get("authorization").map(String::as_str), Some("test-key"));
        assert_eq!(request.query_param("name"), Some("test_player"));
    }
    assert_eq!(requests[0].0.query_param("image"), Some("gamepad"));
    assert_eq!(requests[1].0.query_param("image"), Some("keyboardMouse"));
}

#[tokio::test(start_paused = true)]
async fn when_cycles_run_back_to_back_spacing_holds_across_the_boundary() {
    // Given: An upstream answering two single-platform cycles
    let client = Arc::new(ScriptedHttpClient::new().script(
        "gamepad",
        vec![ok(stats_body("gamepad", &[])), ok(stats_body("gamepad", &[]))],
    ));
    let coordinator =
        RefreshCoordinator::from_config(&live_config(), client.clone()).expect("live config");
    let request =
        RefreshRequest::new([Platform::Gamepad], [GameMode::Solo]).expect("valid request");

    // When: The second cycle starts right after the first one completes
    coordinator.refresh(&request).await.expect("first cycle succeeds");
    coordinator.refresh(&request).await.expect("second cycle succeeds");

    // Then: The first request of cycle two still waits out the minimum interval
    let requests = client.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[1].1 - requests[0].1 >= Duration::from_millis(500));
}

#[tokio::test(start_paused = true)]
async fn when_coordinators_share_a_rate_limiter_they_share_its_grants() {
    // Given: Two coordinators wired to one limiter and one upstream
    let client = Arc::new(ScriptedHttpClient::new().script(
        "gamepad",
        vec![ok(stats_body("gamepad", &[])), ok(stats_body("gamepad", &[]))],
    ));
    let shared = Arc::new(RateLimiter::new(Duration::from_millis(500)));
    let first = RefreshCoordinator::from_config(&live_config(), client.clone())
        .expect("live config")
        .with_rate_limiter(Arc::clone(&shared));
    let second = RefreshCoordinator::from_config(&live_config(), client.clone())
        .expect("live config")
        .with_rate_limiter(Arc::clone(&shared));
    let request =
        RefreshRequest::new([Platform::Gamepad], [GameMode::Solo]).expect("valid request");

    // When: Each coordinator runs one cycle
    first.refresh(&request).await.expect("first coordinator succeeds");
    second.refresh(&request).await.expect("second coordinator succeeds");

    // Then: The second coordinator's request is spaced from the first one's
    let requests = client.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[1].1 - requests[0].1 >= Duration::from_millis(500));
    assert_eq!(shared.last_grant().await, Some(requests[1].1));
}

#[tokio::test(start_paused = true)]
async fn when_upstream_sends_corrupt_numbers_records_hold_zeros() {
    // Given: A payload with negative, null and non-numeric counters
    let body = stats_body(
        "gamepad",
        &[(
            "solo",
            json!({
                "kills": -12,
                "matches": null,
                "wins": "many",
                "winRate": 250.0,
                "score": 900
            }),
        )],
    );
    let client = Arc::new(ScriptedHttpClient::new().script("gamepad", vec![ok(body)]));
    let coordinator = RefreshCoordinator::from_config(&live_config(), client).expect("live config");
    let request =
        RefreshRequest::new([Platform::Gamepad], [GameMode::Solo]).expect("valid request");

    // When: The cycle runs
    let snapshot = coordinator.refresh(&request).await.expect("cycle should succeed");

    // Then: Bad counters become zero and ratios stay within bounds
    let record = snapshot
        .record(Platform::Gamepad, GameMode::Solo)
        .expect("solo record");
    assert_eq!(record.kills, 0);
    assert_eq!(record.matches, 0);
    assert_eq!(record.top1, 0);
    assert_eq!(record.score, 900);
    assert!(record.win_ratio <= 1.0);
    record.validate().expect("sanitized record is valid");
}

// =============================================================================
// Refresh: Failing Platform
// =============================================================================

#[tokio::test(start_paused = true)]
async fn when_the_second_platform_keeps_failing_no_partial_snapshot_is_published() {
    // Given: Console answers, PC returns 500 on every attempt
    let client = Arc::new(
        ScriptedHttpClient::new()
            .script("gamepad", vec![ok(stats_body("gamepad", &[]))])
            .script("keyboardMouse", vec![status(500), status(500), status(500)]),
    );
    let coordinator =
        RefreshCoordinator::from_config(&live_config(), client.clone()).expect("live config");

    // When: The cycle runs
    let error = coordinator
        .refresh(&console_and_pc())
        .await
        .expect_err("cycle must fail");

    // Then: The cycle fails as a whole after the retry budget is spent
    assert_eq!(error.code(), "refresh.retries_exhausted");
    assert_eq!(client.request_count_for("gamepad"), 1);
    assert_eq!(client.request_count_for("keyboardMouse"), 3);

    // And: Nothing was published, and the breaker saw exactly one failure
    assert!(coordinator.latest().is_none());
    let health = coordinator.health();
    assert_eq!(health.consecutive_failures, 1);
    assert_eq!(health.circuit_state, CircuitState::Closed);
    assert!(health.last_error.is_some());
}

#[tokio::test(start_paused = true)]
async fn when_a_later_cycle_fails_the_previous_snapshot_stays_current() {
    // Given: One good cycle, then an upstream that only errors
    let client = Arc::new(
        ScriptedHttpClient::new().script(
            "gamepad",
            vec![
                ok(stats_body("gamepad", &[("solo", mode_stats(10, 5, 1))])),
                status(503),
                status(503),
                status(503),
            ],
        ),
    );
    let coordinator = RefreshCoordinator::from_config(&live_config(), client).expect("live config");
    let request =
        RefreshRequest::new([Platform::Gamepad], [GameMode::Solo]).expect("valid request");
    let first = coordinator.refresh(&request).await.expect("first cycle succeeds");

    // When: The next cycle fails
    coordinator.refresh(&request).await.expect_err("second cycle fails");

    // Then: Readers still see the first snapshot
    assert_eq!(coordinator.latest(), Some(first));
    assert_eq!(coordinator.health().consecutive_failures, 1);
}

// =============================================================================
// Refresh: Synthetic Source
// =============================================================================

#[tokio::test(start_paused = true)]
async fn when_the_synthetic_source_is_configured_no_request_leaves_the_process() {
    // Given: Synthetic mode without any API key
    let config = fragstat_core::StatsConfig::new(fragstat_tests::player())
        .with_source(SourceMode::Synthetic);
    let client = Arc::new(ScriptedHttpClient::new());
    let coordinator =
        RefreshCoordinator::from_config(&config, client.clone()).expect("synthetic config");

    // When: A cycle covers all three platforms
    let request =
        RefreshRequest::new(Platform::ALL, [GameMode::Solo, GameMode::Duo, GameMode::Squad])
            .expect("valid request");
    let snapshot = coordinator.refresh(&request).await.expect("synthetic cycle succeeds");

    // Then: Data is present, flagged as not live, and no HTTP call was made
    assert!(!snapshot.is_live());
    assert_eq!(snapshot.cells().count(), 9);
    assert!(snapshot.cells().any(|(_, _, record)| record.kills > 0));
    assert_eq!(client.request_count(), 0);
}
