//! Batch audit tests against an in-memory catalog

mod helper;

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use tempfile::NamedTempFile;

use app_version_audit::config::{AuditConfig, MAX_BATCH_ERRORS, RateLimitConfig};
use app_version_audit::inventory::{exclude_managed, load_inventory};
use app_version_audit::pipeline::{AppStatus, AuditPipeline, PipelineError, check_outdated};
use helper::{StubCatalog, StubFailure, apps};

fn config(batch_size: usize, max_workers: usize) -> AuditConfig {
    AuditConfig {
        batch_size,
        max_workers,
        rate_limit: RateLimitConfig {
            enabled: false,
            ..RateLimitConfig::default()
        },
        ..AuditConfig::default()
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn reports_outdated_and_missing_apps() {
    let catalog = StubCatalog::new().with_entry("firefox", "101.0");

    let records = check_outdated(
        Arc::new(catalog),
        apps(&[("GhostApp", "1.0"), ("Firefox", "100.0")]),
        50,
        4,
    )
    .await
    .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].name, "Firefox");
    assert_eq!(records[0].status, AppStatus::Outdated);
    assert_eq!(records[0].latest_version.as_deref(), Some("101.0"));
    assert_eq!(records[1].name, "GhostApp");
    assert_eq!(records[1].status, AppStatus::NotFound);
}

#[tokio::test(flavor = "multi_thread")]
async fn aborts_after_three_failed_batches_and_skips_the_rest() {
    let catalog = Arc::new(StubCatalog::new().failing_with(StubFailure::Unavailable));
    let inventory: Vec<(String, String)> = (0..10)
        .map(|i| (format!("app-{i}"), "1.0".to_string()))
        .collect();

    let result = AuditPipeline::new(catalog.clone(), config(2, 1))
        .check_outdated(inventory)
        .await;

    assert!(matches!(
        result,
        Err(PipelineError::Systemic { failures, .. }) if failures == MAX_BATCH_ERRORS
    ));
    // Each failed batch stops at its first app; later batches never start
    assert_eq!(catalog.lookups(), MAX_BATCH_ERRORS);
}

#[tokio::test(flavor = "multi_thread")]
async fn abort_stops_batches_that_are_still_running() {
    let catalog = Arc::new(
        StubCatalog::new()
            .with_delay(Duration::from_millis(30))
            .with_failure("fail-0", StubFailure::Unavailable)
            .with_failure("fail-1", StubFailure::Unavailable)
            .with_failure("fail-2", StubFailure::Unavailable),
    );
    // Batches of six: three start with a failing app, the fourth never fails
    let mut inventory = Vec::new();
    for batch in 0..4 {
        for i in 0..6 {
            let name = if batch < 3 && i == 0 {
                format!("fail-{batch}")
            } else {
                format!("slow-{batch}-{i}")
            };
            inventory.push((name, "1.0".to_string()));
        }
    }

    let result = AuditPipeline::new(catalog.clone(), config(6, 4))
        .check_outdated(inventory)
        .await;
    assert!(matches!(result, Err(PipelineError::Systemic { .. })));

    tokio::time::sleep(Duration::from_millis(400)).await;

    // The healthy batch gives up at its next app instead of finishing all six
    assert!(catalog.lookups() < 3 + 6, "{}", catalog.lookups());
}

#[tokio::test(flavor = "multi_thread")]
async fn transient_failures_are_recorded_per_app() {
    let catalog = StubCatalog::new()
        .with_entry("slack", "4.36.0")
        .with_entry("zoom", "6.0.0")
        .with_failure("slack", StubFailure::InvalidResponse);

    let records = AuditPipeline::new(Arc::new(catalog), config(10, 2))
        .check_outdated(apps(&[("Slack", "4.30.0"), ("zoom", "5.17.0")]))
        .await
        .unwrap();

    assert_eq!(records[0].name, "zoom");
    assert_eq!(records[0].status, AppStatus::Outdated);
    assert_eq!(records[1].name, "Slack");
    assert_eq!(records[1].status, AppStatus::Error);
    assert_eq!(
        records[1].error.as_deref(),
        Some("Invalid response: Unexpected status: 502 (slack)")
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn slow_lookups_time_out_without_failing_the_batch() {
    let catalog = StubCatalog::new()
        .with_entry("firefox", "101.0")
        .with_delay(Duration::from_millis(500))
        .with_timeout(Duration::from_millis(20));

    let records = AuditPipeline::new(Arc::new(catalog), config(10, 1))
        .check_outdated(apps(&[("Firefox", "100.0"), ("Slack", "4.0")]))
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.status == AppStatus::Error));
}

#[tokio::test(flavor = "multi_thread")]
async fn never_runs_more_batches_than_workers() {
    let catalog = Arc::new(StubCatalog::new().with_delay(Duration::from_millis(20)));
    let inventory: Vec<(String, String)> = (0..8)
        .map(|i| (format!("app-{i}"), "1.0".to_string()))
        .collect();

    let records = AuditPipeline::new(catalog.clone(), config(1, 2))
        .check_outdated(inventory)
        .await
        .unwrap();

    assert_eq!(records.len(), 8);
    assert_eq!(catalog.lookups(), 8);
    assert!(catalog.max_in_flight() <= 2, "{}", catalog.max_in_flight());
}

#[tokio::test(flavor = "multi_thread")]
async fn audits_inventory_file_without_managed_apps() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"[
            {{"name": "Visual Studio Code", "version": "1.80.0"}},
            {{"name": "Google Chrome", "version": "120.0.6099.109"}},
            {{"name": "iTerm", "version": "3.4.23"}},
            {{"name": "Visual Studio Code", "version": "1.70.0"}},
            {{"name": "Arc", "version": "1.30.0 (47112)"}}
        ]"#
    )
    .unwrap();

    let catalog = StubCatalog::new()
        .with_entry("visual-studio-code", "1.85.0")
        .with_entry("iterm2", "3.4.23")
        .with_entry("arc", "1.30.0");

    let inventory = load_inventory(file.path()).unwrap();
    let inventory = exclude_managed(inventory, &["google-chrome".to_string()], 75);
    let records = AuditPipeline::new(Arc::new(catalog), config(2, 2))
        .check_outdated(inventory)
        .await
        .unwrap();

    let summary: Vec<(&str, Option<&str>, AppStatus)> = records
        .iter()
        .map(|r| (r.name.as_str(), r.catalog_name.as_deref(), r.status))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("Visual Studio Code", Some("visual-studio-code"), AppStatus::Outdated),
            ("Arc", Some("arc"), AppStatus::Newer),
            ("iTerm", Some("iterm2"), AppStatus::UpToDate),
        ]
    );
}
