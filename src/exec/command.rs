// src/exec/command.rs

//! Shell-command rebuild hook.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::exec::backend::{RebuildFuture, RebuildHook};
use crate::watch::PendingBurst;

/// Outcome of one build command invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    Success,
    Failed(i32),
}

/// Runs a shell command in the source directory on every flush.
///
/// The command inherits stdout so build output reaches the terminal;
/// stderr is forwarded line by line to the log at debug level. A non-zero
/// exit is logged and remembered in [`CommandRebuild::last_outcome`] but
/// does not stop the watcher.
#[derive(Debug)]
pub struct CommandRebuild {
    cmd: String,
    cwd: PathBuf,
    runs: u64,
    last_outcome: Option<BuildOutcome>,
}

impl CommandRebuild {
    pub fn new(cmd: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            cmd: cmd.into(),
            cwd: cwd.into(),
            runs: 0,
            last_outcome: None,
        }
    }

    pub fn cmd(&self) -> &str {
        &self.cmd
    }

    pub fn runs(&self) -> u64 {
        self.runs
    }

    pub fn last_outcome(&self) -> Option<BuildOutcome> {
        self.last_outcome
    }

    async fn run_once(&mut self, burst: &PendingBurst) -> Result<BuildOutcome> {
        self.runs += 1;
        let run = self.runs;
        info!(
            run,
            cmd = %self.cmd,
            paths = burst.path_count(),
            "starting build"
        );

        // Build a shell command appropriate for the platform.
        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&self.cmd);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&self.cmd);
            c
        };

        cmd.current_dir(&self.cwd)
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let started = Instant::now();
        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning build command '{}'", self.cmd))?;

        // Always consume stderr so buffers don't fill; log at debug.
        let stderr_task = child.stderr.take().map(|stderr| {
            tokio::spawn(async move {
                let reader = BufReader::new(stderr);
                let mut lines = reader.lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(run, "stderr: {}", line);
                }
            })
        });

        let status = child
            .wait()
            .await
            .with_context(|| format!("waiting for build command '{}'", self.cmd))?;

        if let Some(task) = stderr_task {
            let _ = task.await;
        }

        let code = status.code().unwrap_or(-1);
        let elapsed_ms = started.elapsed().as_millis() as u64;
        let outcome = if status.success() {
            info!(run, elapsed_ms, "build finished");
            BuildOutcome::Success
        } else {
            warn!(run, exit_code = code, elapsed_ms, "build failed");
            BuildOutcome::Failed(code)
        };
        Ok(outcome)
    }
}

impl RebuildHook for CommandRebuild {
    fn rebuild<'a>(&'a mut self, burst: &'a PendingBurst) -> RebuildFuture<'a> {
        Box::pin(async move {
            let outcome = self.run_once(burst).await?;
            self.last_outcome = Some(outcome);
            Ok(())
        })
    }
}
