// tests/dispatch_polling.rs
//
// End-to-end over the real filesystem with the polling backend. These use
// real time, so assertions wait with generous timeouts.
#![cfg(unix)]

mod common;
use crate::common::fake_rebuild::{RebuildLog, RecordingRebuild};
use crate::common::{ignore_nothing, init_tracing};

use std::error::Error;
use std::fs;
use std::os::unix::fs::symlink;
use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout, Duration};

use linkwatch::resolve::resolve;
use linkwatch::types::WatchMode;
use linkwatch::watch::{
    spawn_dispatcher, subscribe, ChangeKind, DispatchOptions, GlobIgnore, IgnorePredicate,
    WatchSignal,
};

type TestResult = Result<(), Box<dyn Error>>;

const POLL: Duration = Duration::from_millis(100);

fn polling() -> DispatchOptions {
    DispatchOptions {
        debounce: Duration::from_millis(50),
        mode: WatchMode::Polling,
        poll_interval: POLL,
        report_new_symlinks: false,
    }
}

async fn wait_until<F: Fn() -> bool>(cond: F) -> bool {
    timeout(Duration::from_secs(10), async {
        while !cond() {
            sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .is_ok()
}

fn any_call_mentions(log: &RebuildLog, name: &str) -> bool {
    log.calls()
        .iter()
        .flat_map(|c| c.paths.iter())
        .any(|p| p.file_name().is_some_and(|n| n == name))
}

#[tokio::test]
async fn write_in_source_triggers_rebuild_within_poll_interval() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let source = dir.path().canonicalize()?;
    fs::write(source.join("index.md"), "# home")?;

    let roots = resolve(&source, &[], &[])?;
    let (hook, log) = RecordingRebuild::new();
    let (handle, _notices) = spawn_dispatcher(&roots, ignore_nothing(), hook, polling())?;

    // Let the first scan settle before changing anything.
    sleep(POLL * 2).await;
    fs::write(source.join("new-post.md"), "hello")?;

    assert!(
        wait_until(|| any_call_mentions(&log, "new-post.md")).await,
        "no rebuild observed for new-post.md"
    );

    handle.stop().await;
    Ok(())
}

#[tokio::test]
async fn write_behind_symlinked_directory_triggers_rebuild() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let root = dir.path().canonicalize()?;
    let source = root.join("site");
    let posts = root.join("elsewhere/posts");
    fs::create_dir_all(&source)?;
    fs::create_dir_all(&posts)?;
    symlink(&posts, source.join("_posts"))?;

    let roots = resolve(&source, &[source.join("_posts")], &[])?;
    assert_eq!(roots.len(), 2);

    let (hook, log) = RecordingRebuild::new();
    let (handle, _notices) = spawn_dispatcher(&roots, ignore_nothing(), hook, polling())?;

    sleep(POLL * 2).await;
    // Written through the link target, not through the source tree.
    fs::write(posts.join("2024-01-01-hello.md"), "hello")?;

    assert!(
        wait_until(|| any_call_mentions(&log, "2024-01-01-hello.md")).await,
        "change behind the symlink was not seen"
    );

    handle.stop().await;
    Ok(())
}

#[tokio::test]
async fn write_behind_symlinked_directory_is_reported_once() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let root = dir.path().canonicalize()?;
    let source = root.join("site");
    let data = root.join("data");
    fs::create_dir_all(&source)?;
    fs::create_dir_all(&data)?;
    symlink(&data, source.join("_posts"))?;

    let roots = resolve(&source, &[source.join("_posts")], &[])?;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let subscription = subscribe(&roots, WatchMode::Polling, POLL, tx)?;
    assert_eq!(subscription.mode(), WatchMode::Polling);
    assert!(subscription.is_watching(&source));
    assert!(subscription.is_watching(&source.join("_posts")));

    sleep(POLL * 2).await;
    fs::write(data.join("once.md"), "hello")?;
    sleep(POLL * 5).await;

    let mut created = 0;
    while let Ok(signal) = rx.try_recv() {
        if let WatchSignal::Changed(ev) = signal {
            if ev.kind == ChangeKind::Created && ev.path.file_name().is_some_and(|n| n == "once.md")
            {
                created += 1;
            }
        }
    }
    assert_eq!(created, 1, "the source root must not also scan through _posts");

    drop(subscription);
    Ok(())
}

#[tokio::test]
async fn ignored_output_directory_does_not_rebuild() -> TestResult {
    let dir = TempDir::new()?;
    let source = dir.path().canonicalize()?;
    fs::create_dir_all(source.join("_site"))?;

    let roots = resolve(&source, &[], &[])?;
    let ignored: Arc<dyn IgnorePredicate> = Arc::new(GlobIgnore::new(
        &source,
        &["_site".to_string(), "_site/**".to_string()],
    )?);
    let (hook, log) = RecordingRebuild::new();
    let (handle, _notices) = spawn_dispatcher(&roots, ignored, hook, polling())?;

    sleep(POLL * 2).await;
    fs::write(source.join("_site/index.html"), "<html/>")?;
    sleep(POLL * 5).await;
    assert_eq!(log.count(), 0);

    fs::write(source.join("about.md"), "about")?;
    assert!(wait_until(|| log.count() >= 1).await);
    assert!(!any_call_mentions(&log, "index.html"));

    handle.stop().await;
    Ok(())
}

#[tokio::test]
async fn spawn_fails_for_unwatchable_root() {
    let roots = {
        let mut set = linkwatch::resolve::WatchRootSet::new();
        set.insert(
            Path::new("/definitely/not/here/linkwatch"),
            linkwatch::resolve::WatchOrigin::Extra,
        );
        set
    };
    let (hook, _log) = RecordingRebuild::new();

    let native = DispatchOptions::default();
    assert!(spawn_dispatcher(&roots, ignore_nothing(), hook, native).is_err());
}
