// tests/dispatch_synthetic.rs
//
// Dispatcher behaviour over a synthetic event source with paused time, so
// debounce deadlines can be asserted exactly.

mod common;
use crate::common::builders::posts_scenario;
use crate::common::fake_rebuild::RecordingRebuild;
use crate::common::{changed, ignore_nothing, ignore_under, init_tracing, modified, roots};

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::{sleep, timeout, Duration, Instant};

use linkwatch::errors::LinkwatchError;
use linkwatch::fs::mock::MockFileSystem;
use linkwatch::fs::FileSystem;
use linkwatch::resolve::WatchOrigin;
use linkwatch::watch::{
    spawn_with_source, ChangeKind, DispatchNotice, DispatchOptions, WatchSignal,
};

type TestResult = Result<(), Box<dyn Error>>;

const WINDOW: Duration = Duration::from_millis(100);

fn options() -> DispatchOptions {
    DispatchOptions {
        debounce: WINDOW,
        ..DispatchOptions::default()
    }
}

fn mock_fs() -> Arc<dyn FileSystem> {
    Arc::new(posts_scenario())
}

fn site_roots() -> linkwatch::resolve::WatchRootSet {
    roots(&[
        ("/proj/src", WatchOrigin::Primary),
        ("/proj/src/_posts", WatchOrigin::Discovered),
    ])
}

#[tokio::test(start_paused = true)]
async fn burst_of_events_rebuilds_once_after_last_plus_window() -> TestResult {
    init_tracing();
    let (tx, rx) = mpsc::unbounded_channel();
    let (hook, log) = RecordingRebuild::new();
    let (handle, _notices) =
        spawn_with_source(rx, &site_roots(), mock_fs(), ignore_nothing(), hook, options());

    let mut last_sent = Instant::now();
    for i in 0..5 {
        tx.send(modified(&format!("/proj/src/post{i}.md")))?;
        last_sent = Instant::now();
        sleep(Duration::from_millis(30)).await;
    }

    sleep(Duration::from_secs(2)).await;

    let calls = log.calls();
    assert_eq!(calls.len(), 1, "expected exactly one rebuild: {calls:?}");
    let delay = calls[0].started - last_sent;
    assert!(
        delay >= WINDOW && delay < WINDOW + Duration::from_millis(5),
        "rebuild fired {delay:?} after the last event"
    );
    assert_eq!(calls[0].paths.len(), 5);

    handle.stop().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn quiet_gap_longer_than_window_splits_bursts() -> TestResult {
    let (tx, rx) = mpsc::unbounded_channel();
    let (hook, log) = RecordingRebuild::new();
    let (handle, _notices) =
        spawn_with_source(rx, &site_roots(), mock_fs(), ignore_nothing(), hook, options());

    tx.send(modified("/proj/src/a.md"))?;
    sleep(WINDOW * 3).await;
    tx.send(modified("/proj/src/b.md"))?;
    sleep(WINDOW * 3).await;

    let calls = log.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].paths, vec![PathBuf::from("/proj/src/a.md")]);
    assert_eq!(calls[1].paths, vec![PathBuf::from("/proj/src/b.md")]);

    handle.stop().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn ignored_events_never_open_a_burst() -> TestResult {
    let (tx, rx) = mpsc::unbounded_channel();
    let (hook, log) = RecordingRebuild::new();
    let (handle, _notices) = spawn_with_source(
        rx,
        &site_roots(),
        mock_fs(),
        ignore_under("/proj/src/_site"),
        hook,
        options(),
    );

    for i in 0..10 {
        tx.send(modified(&format!("/proj/src/_site/page{i}.html")))?;
        sleep(Duration::from_millis(20)).await;
    }
    sleep(Duration::from_secs(1)).await;
    assert_eq!(log.count(), 0);

    // A mixed burst rebuilds with only the qualifying path.
    tx.send(modified("/proj/src/_site/index.html"))?;
    tx.send(modified("/proj/src/about.md"))?;
    sleep(Duration::from_secs(1)).await;

    let calls = log.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].paths, vec![PathBuf::from("/proj/src/about.md")]);

    handle.stop().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn events_during_slow_rebuild_cause_exactly_one_more() -> TestResult {
    init_tracing();
    let (tx, rx) = mpsc::unbounded_channel();
    let (hook, log) = RecordingRebuild::with_delay(Duration::from_millis(500));
    let (handle, _notices) =
        spawn_with_source(rx, &site_roots(), mock_fs(), ignore_nothing(), hook, options());

    tx.send(modified("/proj/src/a.md"))?;
    // First rebuild starts at +100ms and runs until +600ms.
    sleep(Duration::from_millis(200)).await;
    assert_eq!(log.count(), 0, "first rebuild still running");

    tx.send(modified("/proj/src/b.md"))?;
    sleep(Duration::from_millis(100)).await;
    tx.send(modified("/proj/src/c.md"))?;

    sleep(Duration::from_secs(3)).await;

    let calls = log.calls();
    assert_eq!(calls.len(), 2, "one rebuild per burst: {calls:?}");
    assert_eq!(log.max_in_flight(), 1);
    assert!(calls[1].started >= calls[0].finished);
    assert_eq!(
        calls[1].paths,
        vec![PathBuf::from("/proj/src/b.md"), PathBuf::from("/proj/src/c.md")]
    );

    handle.stop().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn stop_drops_pending_burst_and_is_idempotent() -> TestResult {
    let (tx, rx) = mpsc::unbounded_channel();
    let (hook, log) = RecordingRebuild::new();
    let (handle, _notices) =
        spawn_with_source(rx, &site_roots(), mock_fs(), ignore_nothing(), hook, options());

    tx.send(modified("/proj/src/a.md"))?;
    sleep(Duration::from_millis(10)).await;

    assert!(handle.is_running().await);
    handle.stop().await;
    handle.stop().await;
    assert!(!handle.is_running().await);

    // Nothing is read or flushed after stop.
    let _ = tx.send(modified("/proj/src/b.md"));
    sleep(Duration::from_secs(1)).await;
    assert_eq!(log.count(), 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn closed_source_flushes_then_exits() -> TestResult {
    let (tx, rx) = mpsc::unbounded_channel();
    let (hook, log) = RecordingRebuild::new();
    let (handle, mut notices) =
        spawn_with_source(rx, &site_roots(), mock_fs(), ignore_nothing(), hook, options());

    tx.send(modified("/proj/src/a.md"))?;
    drop(tx);

    timeout(Duration::from_secs(5), log.wait_for(1)).await?;
    // The loop drops its notice sender when it exits.
    assert!(timeout(Duration::from_secs(5), notices.recv()).await?.is_none());
    assert!(!handle.is_running().await);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn deleting_a_root_reports_watch_lost() -> TestResult {
    let (tx, rx) = mpsc::unbounded_channel();
    let (hook, log) = RecordingRebuild::new();
    let (handle, mut notices) =
        spawn_with_source(rx, &site_roots(), mock_fs(), ignore_nothing(), hook, options());

    tx.send(changed("/proj/src/_posts", ChangeKind::Deleted))?;

    let notice = timeout(Duration::from_secs(1), notices.recv())
        .await?
        .ok_or("notice channel closed")?;
    match notice {
        DispatchNotice::Lost(LinkwatchError::WatchLost { path, .. }) => {
            assert_eq!(path, PathBuf::from("/proj/src/_posts"));
        }
        other => panic!("expected WatchLost, got {other:?}"),
    }

    // Watching continues on the remaining root.
    tx.send(modified("/proj/src/index.md"))?;
    sleep(Duration::from_secs(1)).await;
    assert!(log.count() >= 1);
    assert!(handle.is_running().await);

    handle.stop().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn backend_failures_surface_as_notices() -> TestResult {
    let (tx, rx) = mpsc::unbounded_channel();
    let (hook, log) = RecordingRebuild::new();
    let (handle, mut notices) =
        spawn_with_source(rx, &site_roots(), mock_fs(), ignore_nothing(), hook, options());

    tx.send(WatchSignal::Failed {
        paths: Vec::new(),
        reason: "queue overflow".to_string(),
    })?;
    tx.send(WatchSignal::Failed {
        paths: vec![PathBuf::from("/proj/src/_posts")],
        reason: "permission denied".to_string(),
    })?;

    let first = timeout(Duration::from_secs(1), notices.recv()).await?;
    assert!(matches!(
        first,
        Some(DispatchNotice::Lost(LinkwatchError::WatchBackend(ref r))) if r == "queue overflow"
    ));
    let second = timeout(Duration::from_secs(1), notices.recv()).await?;
    assert!(matches!(
        second,
        Some(DispatchNotice::Lost(LinkwatchError::WatchLost { ref path, .. }))
            if path == Path::new("/proj/src/_posts")
    ));

    // Failures alone never trigger a rebuild.
    sleep(Duration::from_secs(1)).await;
    assert_eq!(log.count(), 0);
    handle.stop().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn new_symlinked_directory_is_reported() -> TestResult {
    let fs = posts_scenario();
    fs.add_dir("/data/notes");
    fs.add_symlink("/proj/src/_notes", "/data/notes");
    let fs: Arc<dyn FileSystem> = Arc::new(fs);

    let (tx, rx) = mpsc::unbounded_channel();
    let (hook, log) = RecordingRebuild::new();
    let opts = DispatchOptions {
        report_new_symlinks: true,
        ..options()
    };
    let (handle, mut notices) =
        spawn_with_source(rx, &site_roots(), fs, ignore_nothing(), hook, opts);

    // A plain new file is not a symlinked directory.
    tx.send(changed("/proj/src/new.md", ChangeKind::Created))?;
    tx.send(changed("/proj/src/_notes", ChangeKind::Created))?;

    let notice = timeout(Duration::from_secs(1), notices.recv()).await?;
    assert!(matches!(
        notice,
        Some(DispatchNotice::SymlinkAdded(ref p)) if p == Path::new("/proj/src/_notes")
    ));

    // The link creation still counts as a change.
    sleep(Duration::from_secs(1)).await;
    assert_eq!(log.count(), 1);
    assert!(notices.try_recv().is_err());

    handle.stop().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn new_symlinks_are_not_reported_unless_enabled() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_dir("/proj/src");
    fs.add_dir("/data/notes");
    fs.add_symlink("/proj/src/_notes", "/data/notes");

    let (tx, rx) = mpsc::unbounded_channel();
    let (hook, _log) = RecordingRebuild::new();
    let (handle, mut notices) = spawn_with_source(
        rx,
        &roots(&[("/proj/src", WatchOrigin::Primary)]),
        Arc::new(fs),
        ignore_nothing(),
        hook,
        options(),
    );

    tx.send(changed("/proj/src/_notes", ChangeKind::Created))?;
    sleep(Duration::from_secs(1)).await;
    assert!(notices.try_recv().is_err());

    handle.stop().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn failing_rebuild_does_not_stop_dispatching() -> TestResult {
    use crate::common::fake_rebuild::FailingRebuild;
    use std::sync::atomic::Ordering;

    let (tx, rx) = mpsc::unbounded_channel();
    let (hook, attempts) = FailingRebuild::new();
    let (handle, _notices) =
        spawn_with_source(rx, &site_roots(), mock_fs(), ignore_nothing(), hook, options());

    tx.send(modified("/proj/src/a.md"))?;
    sleep(Duration::from_secs(1)).await;
    tx.send(modified("/proj/src/b.md"))?;
    sleep(Duration::from_secs(1)).await;

    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    assert!(handle.is_running().await);
    handle.stop().await;
    Ok(())
}
