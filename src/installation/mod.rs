// Installation logic
//
// Database script execution, archive deployment, permission fix-ups and the
// runtime properties file, sequenced by the orchestrator.

pub mod files;
pub mod orchestrator;
pub mod permissions;
pub mod properties;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;

use crate::models::DbEngine;

pub use orchestrator::{InstallContext, InstallOutcome, Installer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: Option<i32>,
    pub stderr: String,
    pub duration_ms: u128,
}

impl CommandOutput {
    /// Exit code 0. Termination by signal (no code) is a failure.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs the database creation script.
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    async fn run(&self, script: &Path) -> Result<CommandOutput>;
}

/// Runs scripts as child processes.
///
/// stdin/stdout are inherited so scripts can talk to the operator; stderr is
/// echoed live and captured for the failure report. No timeout is applied.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessScriptRunner;

#[async_trait]
impl ScriptRunner for ProcessScriptRunner {
    async fn run(&self, script: &Path) -> Result<CommandOutput> {
        run_script(script).await
    }
}

/// Location of the database creation script for `engine` under `script_root`.
pub fn db_script_path(engine: DbEngine, script_root: &Path) -> PathBuf {
    match engine {
        DbEngine::Postgres => script_root
            .join("Postgres")
            .join("production")
            .join("db_create.sh"),
        DbEngine::SqlServer => script_root
            .join("SQLserver")
            .join("installation")
            .join("rebuild_all.bat"),
    }
}

/// Run `script` with its own directory as the working directory.
pub async fn run_script(script: &Path) -> Result<CommandOutput> {
    let started = Instant::now();
    let workdir = script
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    info!(
        "[PHASE: database] [STEP: script] run_script entered (script={:?}, cwd={:?})",
        script, workdir
    );

    let mut cmd = Command::new(script);
    cmd.current_dir(workdir)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::piped());

    let mut child = cmd
        .spawn()
        .with_context(|| format!("Failed to start database script {:?}", script))?;

    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow::anyhow!("Failed to capture stderr of {:?}", script))?;

    let stderr_task = tokio::spawn(async move {
        let mut captured = String::new();
        let mut lines = BufReader::new(stderr).lines();
        let mut echo = tokio::io::stderr();
        while let Some(line) = lines.next_line().await? {
            echo.write_all(line.as_bytes()).await?;
            echo.write_all(b"\n").await?;
            if !captured.is_empty() {
                captured.push('\n');
            }
            captured.push_str(&line);
        }
        echo.flush().await?;
        Ok::<String, std::io::Error>(captured)
    });

    let status = child
        .wait()
        .await
        .with_context(|| format!("Waiting for database script {:?} failed", script))?;

    let stderr_str = stderr_task
        .await
        .context("stderr join failed")?
        .context("stderr read failed")?;

    let out = CommandOutput {
        exit_code: status.code(),
        stderr: stderr_str,
        duration_ms: started.elapsed().as_millis(),
    };

    if out.success() {
        info!(
            "[PHASE: database] [STEP: script] run_script exit ok (duration_ms={})",
            out.duration_ms
        );
    } else {
        warn!(
            "[PHASE: database] [STEP: script] run_script failed (exit_code={:?}, duration_ms={}, stderr_len={})",
            out.exit_code,
            out.duration_ms,
            out.stderr.len()
        );
    }
    debug!(
        "[PHASE: database] [STEP: script] captured stderr: {}",
        out.stderr
    );

    Ok(out)
}
