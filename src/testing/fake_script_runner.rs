use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::installation::{CommandOutput, ScriptRunner};

/// Records script invocations and answers with a fixed result.
pub struct FakeScriptRunner {
    exit_code: Option<i32>,
    stderr: String,
    spawn_error: Option<String>,
    invoked: Mutex<Vec<PathBuf>>,
}

impl FakeScriptRunner {
    pub fn succeeding() -> Self {
        Self::failing(0, "")
    }

    pub fn failing(exit_code: i32, stderr: &str) -> Self {
        Self {
            exit_code: Some(exit_code),
            stderr: stderr.to_string(),
            spawn_error: None,
            invoked: Mutex::new(Vec::new()),
        }
    }

    /// Behaves like a script that cannot be started at all.
    pub fn unstartable(message: &str) -> Self {
        Self {
            exit_code: None,
            stderr: String::new(),
            spawn_error: Some(message.to_string()),
            invoked: Mutex::new(Vec::new()),
        }
    }

    pub fn invoked(&self) -> Vec<PathBuf> {
        self.invoked.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScriptRunner for FakeScriptRunner {
    async fn run(&self, script: &Path) -> Result<CommandOutput> {
        self.invoked.lock().unwrap().push(script.to_path_buf());
        if let Some(message) = &self.spawn_error {
            anyhow::bail!("Failed to start database script {:?}: {}", script, message);
        }
        Ok(CommandOutput {
            exit_code: self.exit_code,
            stderr: self.stderr.clone(),
            duration_ms: 0,
        })
    }
}
