// Installation orchestrator
//
// Drives one installer run: resolve every setting, persist them, confirm with
// the operator, create the database, then deploy archives and write the
// startup properties. Steps after a failed database script are skipped.

use anyhow::{Context, Result};
use log::{error, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use super::files::deploy_archives;
use super::permissions::widen_sql_server_permissions;
use super::properties::write_properties_file;
use super::{db_script_path, CommandOutput, ScriptRunner};
use crate::config::resolver::EnvLookup;
use crate::config::{ConfigStore, ResolveError, RetryPolicy, Setting, SettingResolver};
use crate::models::{DbEngine, ResolvedSettings};
use crate::ui::Prompter;
use crate::utils::path_resolver::normalize_path;

const ODBC_REMINDER: &str =
    " Remember to create an ODBC datasource as per the installation instructions, before running the RIF.";

/// Where and how the installer was started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallContext {
    /// Packaged base directory (holds `install.toml`, `warfiles/`, the scripts when bundled).
    pub base_dir: PathBuf,
    pub working_dir: PathBuf,
    /// Packaged, non-development install.
    pub bundled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Operator gave an empty reply at the confirmation.
    Aborted,
    /// Database script failed; nothing was deployed.
    DatabaseFailed { errors: String },
    Completed { properties_file: PathBuf },
}

pub struct Installer<'a> {
    ctx: InstallContext,
    store: &'a mut ConfigStore,
    prompter: &'a mut dyn Prompter,
    console: &'a mut dyn Write,
    runner: &'a dyn ScriptRunner,
    env: Option<EnvLookup<'a>>,
    retry: RetryPolicy,
}

impl<'a> Installer<'a> {
    pub fn new(
        ctx: InstallContext,
        store: &'a mut ConfigStore,
        prompter: &'a mut dyn Prompter,
        console: &'a mut dyn Write,
        runner: &'a dyn ScriptRunner,
    ) -> Self {
        Installer {
            ctx,
            store,
            prompter,
            console,
            runner,
            env: None,
            retry: RetryPolicy::Unbounded,
        }
    }

    pub fn with_env_lookup(mut self, env: EnvLookup<'a>) -> Self {
        self.env = Some(env);
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub async fn run(self) -> Result<InstallOutcome> {
        let started = Instant::now();
        let Installer {
            ctx,
            store,
            prompter,
            console,
            runner,
            env,
            retry,
        } = self;

        info!(
            "[PHASE: installation] [STEP: start] Installer run started (base={:?}, bundled={})",
            ctx.base_dir, ctx.bundled
        );
        writeln!(console, "Base path is {}", ctx.base_dir.display())?;

        let settings = {
            let mut resolver = SettingResolver::new(
                &mut *store,
                &mut *prompter,
                &mut *console,
                ctx.working_dir.clone(),
            )
            .with_retry_policy(retry);
            if let Some(env) = env {
                resolver = resolver.with_env_lookup(env);
            }
            resolve_settings(&ctx, &mut resolver).context("Failed to resolve installation settings")?
        };

        store.flush().context("Failed to save installer settings")?;
        match serde_json::to_string(&settings) {
            Ok(json) => info!("[PHASE: settings] [STEP: resolved] {}", json),
            Err(e) => warn!(
                "[PHASE: settings] [STEP: resolved] Could not serialize settings: {}",
                e
            ),
        }

        writeln!(console, "{}", settings.summary())?;
        write!(console, "Continue? [No]: ")?;
        console.flush()?;
        let reply = prompter
            .confirm()
            .context("Failed to read the confirmation reply")?;
        if reply.is_empty() {
            info!("[PHASE: installation] [STEP: confirm] Operator declined; nothing installed");
            return Ok(InstallOutcome::Aborted);
        }
        info!("[PHASE: installation] [STEP: confirm] Operator confirmed");

        if settings.db_engine == DbEngine::SqlServer {
            let updated = widen_sql_server_permissions(&ctx.base_dir).await;
            info!(
                "[PHASE: database] [STEP: permissions] {} SQL Server data paths opened",
                updated
            );
        }

        let script = db_script_path(settings.db_engine, &settings.script_root);
        let script_dir = script.parent().unwrap_or_else(|| Path::new("."));
        writeln!(
            console,
            "About to run {}; switching to {}",
            script.display(),
            script_dir.display()
        )?;
        console.flush()?;

        let output = match runner.run(&script).await {
            Ok(output) => output,
            Err(e) => {
                error!(
                    "[PHASE: database] [STEP: script] Database script could not be run: {:#}",
                    e
                );
                CommandOutput {
                    exit_code: None,
                    stderr: format!("{:#}", e),
                    duration_ms: 0,
                }
            }
        };

        if !output.success() {
            error!(
                "[PHASE: database] [STEP: script] Database creation failed (exit_code={:?})",
                output.exit_code
            );
            writeln!(
                console,
                "Something went wrong with creating the database. \n\tErrors: {}",
                output.stderr
            )?;
            writeln!(console, "Database not created")?;
            return Ok(InstallOutcome::DatabaseFailed {
                errors: output.stderr,
            });
        }

        deploy_archives(&settings)
            .await
            .context("Failed to deploy the web archives")?;
        let properties_file = write_properties_file(store, &settings)?;

        let mut message = String::from("Installation complete.");
        if settings.db_engine == DbEngine::SqlServer {
            message.push_str(ODBC_REMINDER);
        }
        writeln!(console, "{}", message)?;

        info!(
            "[PHASE: installation] [STEP: complete] Installation complete (duration_ms={})",
            started.elapsed().as_millis()
        );
        Ok(InstallOutcome::Completed { properties_file })
    }
}

/// Resolve every setting in prompt order and build the run's snapshot.
pub fn resolve_settings(
    ctx: &InstallContext,
    resolver: &mut SettingResolver<'_>,
) -> Result<ResolvedSettings, ResolveError> {
    let development_mode = if ctx.bundled {
        info!("[PHASE: settings] [STEP: resolve] Packaged install; development mode off");
        false
    } else {
        resolver.resolve_flag(Setting::DevelopmentMode)?
    };

    let db_code = resolver.resolve_text(Setting::DbType)?;
    if !DbEngine::is_known_code(&db_code) {
        warn!(
            "[PHASE: settings] [STEP: resolve] Unknown database type '{}'; using PostgreSQL",
            db_code
        );
    }
    let db_engine = DbEngine::from_code(&db_code);

    let script_root = if ctx.bundled {
        resolver.record_derived(Setting::ScriptHome, &ctx.base_dir);
        ctx.base_dir.clone()
    } else {
        resolver.resolve_path(Setting::ScriptHome)?
    };

    let tomcat_home = resolver.resolve_path(Setting::TomcatHome)?;

    let war_dir = if development_mode {
        let cwd = normalize_path("", &ctx.working_dir);
        cwd.parent().map(Path::to_path_buf).unwrap_or(cwd)
    } else {
        ctx.base_dir.join("warfiles")
    };
    resolver.record_derived(Setting::WarFilesLocation, &war_dir);

    let extract_dir = resolver.resolve_path(Setting::ExtractDirectory)?;

    Ok(ResolvedSettings {
        development_mode,
        db_engine,
        script_root,
        tomcat_home,
        war_dir,
        extract_dir,
    })
}
