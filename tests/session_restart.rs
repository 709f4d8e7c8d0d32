// tests/session_restart.rs
#![cfg(unix)]

mod common;
use crate::common::builders::ConfigFileBuilder;
use crate::common::fake_rebuild::RecordingRebuild;
use crate::common::{ignore_nothing, init_tracing};

use std::error::Error;
use std::fs;
use std::os::unix::fs::symlink;

use tempfile::TempDir;
use tokio::sync::oneshot;
use tokio::time::{sleep, timeout, Duration};

use linkwatch::engine::{WatchSession, WatchSettings};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn new_symlinked_directory_restarts_and_rebuilds() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let root = dir.path().canonicalize()?;
    let source = root.join("site");
    let notes = root.join("shared/notes");
    fs::create_dir_all(&source)?;
    fs::create_dir_all(&notes)?;
    fs::write(notes.join("n.md"), "note")?;

    let cfg = ConfigFileBuilder::new()
        .source(".")
        .symlink_roots(&["."])
        .force_polling(true)
        .poll_interval_ms(50)
        .debounce_ms(50)
        .restart_on_new_symlink(true)
        .build();
    let settings = WatchSettings::from_config(&cfg, &source);
    assert!(settings.dispatch.report_new_symlinks);

    let (hook, log) = RecordingRebuild::new();
    let session = WatchSession::new(settings, ignore_nothing(), hook);
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let task = tokio::spawn(async move {
        session
            .run_until(async {
                let _ = stop_rx.await;
            })
            .await
    });

    sleep(Duration::from_millis(200)).await;
    let link = source.join("_notes");
    symlink(&notes, &link)?;

    let rebuilt_link = timeout(Duration::from_secs(10), async {
        loop {
            if log.calls().iter().any(|c| c.paths.contains(&link)) {
                break;
            }
            sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
    assert!(rebuilt_link.is_ok(), "no rebuild mentioned the new link");

    let _ = stop_tx.send(());
    let summary = timeout(Duration::from_secs(10), task).await???;
    assert!(summary.restarts >= 1, "summary: {summary:?}");
    Ok(())
}

#[tokio::test]
async fn session_stops_on_shutdown_without_restarts() -> TestResult {
    let dir = TempDir::new()?;
    let source = dir.path().canonicalize()?;

    let cfg = ConfigFileBuilder::new()
        .symlink_roots(&[])
        .force_polling(true)
        .poll_interval_ms(50)
        .build();
    let settings = WatchSettings::from_config(&cfg, &source);

    let (hook, log) = RecordingRebuild::new();
    let session = WatchSession::new(settings, ignore_nothing(), hook);

    session.rebuild_now(Vec::new()).await?;
    assert_eq!(log.count(), 1);

    let summary = session
        .run_until(sleep(Duration::from_millis(200)))
        .await?;
    assert_eq!(summary.restarts, 0);
    assert_eq!(summary.lost_notices, 0);
    Ok(())
}

#[tokio::test]
async fn missing_symlink_root_aborts_session_by_default() -> TestResult {
    let dir = TempDir::new()?;
    let source = dir.path().canonicalize()?;

    let cfg = ConfigFileBuilder::new()
        .symlink_roots(&["_posts"])
        .force_polling(true)
        .build();
    let settings = WatchSettings::from_config(&cfg, &source);

    let (hook, _log) = RecordingRebuild::new();
    let session = WatchSession::new(settings, ignore_nothing(), hook);

    let result = session.run_until(std::future::pending::<()>()).await;
    assert!(result.is_err());
    Ok(())
}
