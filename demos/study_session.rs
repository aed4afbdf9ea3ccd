//! Study Session Example
//!
//! Walks one simulated participant pair through a reading study: events are
//! logged as they happen, results are recorded per trial, the remote mirror
//! is flushed, and the session is exported as JSON and CSV.
//!
//! Run with: cargo run --example study_session
//! Set RUST_LOG=debug to see mirror activity.

use std::time::Duration;

use anyhow::Context;
use serde_json::{json, Map, Value};
use study_tracker::config::RemoteConfig;
use study_tracker::local::MemoryLocalStore;
use study_tracker::logging::init_logging;
use study_tracker::record::{TrialResult, UiVersion};
use study_tracker::remote::{MemoryRemoteStore, RemoteConnection};
use study_tracker::Tracker;

fn payload(value: Value) -> Option<Map<String, Value>> {
    value.as_object().cloned()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    println!("=== Study Tracker: Reading Session ===\n");

    // -------------------------------------------------------------------------
    // 1. Probe the remote backend
    // -------------------------------------------------------------------------
    println!("1. Connecting remote mirror...");

    let config = RemoteConfig::new("https://reading-study.example.firebaseio.com")
        .with_project_id("reading-study");
    let connection = RemoteConnection::connect(Some(&config), |_| {
        Ok(MemoryRemoteStore::with_latency(Duration::from_millis(5)))
    });
    println!("   Remote status: {:?}", connection.status());

    let tracker = Tracker::new(MemoryLocalStore::new(), connection);

    // -------------------------------------------------------------------------
    // 2. Run two trials, one per arm
    // -------------------------------------------------------------------------
    println!("\n2. Recording trials...");

    let trials = [
        ("p-001", UiVersion::A, 142.0, 88.0, 4_u32),
        ("p-002", UiVersion::B, 117.0, 96.0, 1_u32),
    ];

    for (participant, version, secs, scroll, clicks) in trials {
        tracker.log_event(
            "reading_started",
            payload(json!({ "participantId": participant, "uiVersion": version.as_str() })),
        )?;

        let result = TrialResult::builder(participant, version.clone())
            .article("art-7", "politics, local")
            .reading_time_sec(secs)
            .max_scroll_depth(scroll)
            .distraction_clicks(clicks)
            .focus_mode(version == UiVersion::B, secs * 0.6)
            .comprehension_score(0.8)
            .perceived(4.0, 4.5)
            .completed_at(chrono::Utc::now())
            .build();
        tracker.record(&result)?;

        tracker.log_event(
            "quiz_submitted",
            payload(json!({ "participantId": participant })),
        )?;
        println!("   {participant} (UI {version}): {secs}s, {scroll}% scrolled");
    }

    // -------------------------------------------------------------------------
    // 3. Drain the mirror and compare copies
    // -------------------------------------------------------------------------
    println!("\n3. Flushing remote mirror...");

    tracker.flush().await;
    let stats = tracker.mirror_stats();
    println!(
        "   Mirrored: {} ok, {} failed, {} pending",
        stats.completed,
        stats.failed,
        stats.pending()
    );
    println!("   Local results:  {}", tracker.read_all().len());
    println!("   Remote results: {}", tracker.read_all_remote().await.len());
    println!("   Local events:   {}", tracker.events().len());

    // -------------------------------------------------------------------------
    // 4. Export
    // -------------------------------------------------------------------------
    println!("\n4. Exporting...");

    let summary = tracker.summary();
    println!("   Summary: {}", serde_json::to_string(&summary)?);

    let dir = std::env::temp_dir().join("study_tracker_demo");
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("creating export directory {}", dir.display()))?;

    let doc_path = tracker.save_document(&dir)?;
    let csv_path = tracker.save_table(&dir)?;
    println!("   Document: {}", doc_path.display());
    println!("   Table:    {}", csv_path.display());
    println!("\n{}", tracker.export_table()?);

    // -------------------------------------------------------------------------
    // 5. End the session
    // -------------------------------------------------------------------------
    println!("\n5. Clearing session data...");

    tracker.clear_all()?;
    tracker.shutdown().await;
    println!("   Local results after clear: {}", tracker.read_all().len());

    println!("\n=== Session complete ===");
    Ok(())
}
