// RIF console installer
// Main library entry point

pub mod config;
pub mod installation;
pub mod models;
pub mod ui;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

use anyhow::{Context, Result};
use log::{error, info, warn};
use std::path::{Path, PathBuf};

use config::{ConfigStore, StorePaths};
use installation::{InstallContext, InstallOutcome, Installer, ProcessScriptRunner};
use ui::TerminalPrompter;
use utils::transcript::InstallLog;

/// Options taken from the command line.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub bundled: bool,
    pub base_dir: Option<PathBuf>,
    /// Operator transcript, appended to.
    pub log_file: PathBuf,
    /// Mirror diagnostic log records to stdout.
    pub verbose: bool,
}

/// Initialize logging system with dual format (JSON + human-readable)
fn init_logging(log_dir: &Path, with_stdout: bool) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(log_dir)?;

    let timestamp = chrono::Utc::now().format("%Y-%m-%d-%H%M%S");

    // JSON log file for structured parsing
    let json_log_file = log_dir.join(format!("installer-{}.log", timestamp));

    // Human-readable log file (.txt)
    let txt_log_file = log_dir.join(format!("installer-{}.txt", timestamp));

    // Stdout stays off unless asked for; the operator console is the transcript.
    let mut dispatch = fern::Dispatch::new().level(log::LevelFilter::Debug);

    if with_stdout {
        dispatch = dispatch.chain(
            fern::Dispatch::new()
                .level(log::LevelFilter::Info)
                .format(move |out, message, record| {
                    let timestamp_local = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
                    let message_str = format!("{}", message);
                    let (phase, step, cleaned_message) =
                        utils::logging::parse_log_metadata(&message_str);
                    let txt_line = utils::logging::format_human_readable_log(
                        &timestamp_local.to_string(),
                        record.level(),
                        record.target(),
                        &cleaned_message,
                        phase.as_deref(),
                        step.as_deref(),
                    );
                    out.finish(format_args!("{}", txt_line));
                })
                .chain(std::io::stdout()),
        );
    }

    dispatch = dispatch
        .chain(
            fern::Dispatch::new()
                .format(move |out, message, record| {
                    let timestamp_utc = chrono::Utc::now().to_rfc3339();
                    let message_str = format!("{}", message);
                    let (phase, step, cleaned_message) =
                        utils::logging::parse_log_metadata(&message_str);
                    let json_line = utils::logging::format_json_log(
                        &timestamp_utc,
                        record.level(),
                        record.target(),
                        &cleaned_message,
                        phase.as_deref(),
                        step.as_deref(),
                    );
                    out.finish(format_args!("{}\n", json_line));
                })
                .chain(fern::log_file(json_log_file)?),
        )
        .chain(
            fern::Dispatch::new()
                .format(move |out, message, record| {
                    let timestamp_local = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
                    let message_str = format!("{}", message);
                    let (phase, step, cleaned_message) =
                        utils::logging::parse_log_metadata(&message_str);
                    let txt_line = utils::logging::format_human_readable_log(
                        &timestamp_local.to_string(),
                        record.level(),
                        record.target(),
                        &cleaned_message,
                        phase.as_deref(),
                        step.as_deref(),
                    );
                    out.finish(format_args!("{}\n", txt_line));
                })
                .chain(fern::log_file(txt_log_file)?),
        );

    dispatch.apply()?;

    log::info!(
        "[PHASE: initialization] Logging initialized, log directory: {:?}",
        log_dir
    );
    Ok(())
}

/// Run the installer to completion and return the process exit code.
pub fn run(options: RunOptions) -> i32 {
    match run_installer(&options) {
        Ok(InstallOutcome::Completed { properties_file }) => {
            info!(
                "[PHASE: shutdown] Installer finished (properties={:?})",
                properties_file
            );
            0
        }
        Ok(InstallOutcome::Aborted) => {
            info!("[PHASE: shutdown] Installer aborted by operator");
            0
        }
        Ok(InstallOutcome::DatabaseFailed { .. }) => {
            warn!("[PHASE: shutdown] Installer stopped: database not created");
            1
        }
        Err(e) => {
            error!("[PHASE: shutdown] Installer failed: {:#}", e);
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

fn run_installer(options: &RunOptions) -> Result<InstallOutcome> {
    let installer_home = utils::path_resolver::resolve_installer_home()?;
    let log_dir = utils::path_resolver::resolve_log_folder(&installer_home)?;
    if let Err(e) = init_logging(&log_dir, options.verbose) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    info!(
        "[PHASE: initialization] Installer starting at {}",
        chrono::Utc::now()
    );

    let base_dir =
        utils::path_resolver::resolve_base_folder(options.bundled, options.base_dir.as_deref())?;
    let working_dir =
        std::env::current_dir().context("Failed to determine the current directory")?;

    let mut store = ConfigStore::initialize(&StorePaths::new(&base_dir, &installer_home))
        .context("Failed to load installer configuration")?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;

    let ctx = InstallContext {
        base_dir,
        working_dir,
        bundled: options.bundled,
    };
    let mut prompter = TerminalPrompter::stdin();
    let runner = ProcessScriptRunner;

    InstallLog::scoped(&options.log_file, |transcript| {
        runtime.block_on(Installer::new(ctx, &mut store, &mut prompter, transcript, &runner).run())
    })
}
