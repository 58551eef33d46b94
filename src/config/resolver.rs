// Setting resolver
//
// Resolves one setting at a time: current value (user layer, then defaults),
// operator prompt with that value as default, optional environment fallback,
// coercion by setting kind, and write-back into the user layer. Flushing the
// store is left to the caller.

use log::{info, warn};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::settings::{flag_text, parse_flag};
use super::{ConfigError, ConfigStore, Setting, SettingKind};
use crate::ui::Prompter;
use crate::utils::path_resolver::normalize_path;

/// Environment lookup used for fallbacks; injectable so tests never touch the real environment.
pub type EnvLookup<'a> = Box<dyn Fn(&str) -> Option<String> + 'a>;

/// How many times a setting with an environment fallback is asked for before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    Unbounded,
    Bounded(usize),
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Prompt for '{label}' failed: {source}")]
    Prompt {
        label: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write to the console: {0}")]
    Console(#[source] io::Error),

    #[error("No value obtained for '{label}' after {attempts} attempts")]
    Stalled { label: &'static str, attempts: usize },
}

pub struct SettingResolver<'a> {
    store: &'a mut ConfigStore,
    prompter: &'a mut dyn Prompter,
    console: &'a mut dyn Write,
    env: EnvLookup<'a>,
    working_dir: PathBuf,
    retry: RetryPolicy,
}

impl<'a> SettingResolver<'a> {
    pub fn new(
        store: &'a mut ConfigStore,
        prompter: &'a mut dyn Prompter,
        console: &'a mut dyn Write,
        working_dir: PathBuf,
    ) -> Self {
        SettingResolver {
            store,
            prompter,
            console,
            env: Box::new(|name: &str| std::env::var(name).ok()),
            working_dir,
            retry: RetryPolicy::Unbounded,
        }
    }

    pub fn with_env_lookup(mut self, env: EnvLookup<'a>) -> Self {
        self.env = env;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Value offered as the prompt default: user layer, then defaults, then empty.
    pub fn current_value(&self, setting: Setting) -> Result<String, ResolveError> {
        Ok(self
            .store
            .get(setting.section(), setting.key())?
            .unwrap_or_default())
    }

    /// Resolve a setting kept as text.
    pub fn resolve_text(&mut self, setting: Setting) -> Result<String, ResolveError> {
        let reply = self.obtain_reply(setting)?;
        let value = reply.trim().to_string();
        self.record(setting, &value);
        Ok(value)
    }

    /// Resolve a setting to an absolute, canonical path.
    pub fn resolve_path(&mut self, setting: Setting) -> Result<PathBuf, ResolveError> {
        let reply = self.obtain_reply(setting)?;
        let path = normalize_path(&reply, &self.working_dir);
        self.record(setting, &path.to_string_lossy());
        Ok(path)
    }

    /// Resolve a yes/no setting. Unrecognised replies are asked again.
    pub fn resolve_flag(&mut self, setting: Setting) -> Result<bool, ResolveError> {
        loop {
            let reply = self.obtain_reply(setting)?;
            match parse_flag(&reply) {
                Some(value) => {
                    self.record(setting, flag_text(value));
                    return Ok(value);
                }
                None => {
                    writeln!(
                        self.console,
                        "Please answer yes or no for {} (got '{}').",
                        setting.label(),
                        reply.trim()
                    )
                    .map_err(ResolveError::Console)?;
                }
            }
        }
    }

    /// Record a path the installer derived itself instead of asking for.
    pub fn record_derived(&mut self, setting: Setting, path: &Path) {
        debug_assert_eq!(setting.kind(), SettingKind::Path);
        self.record(setting, &path.to_string_lossy());
    }

    fn obtain_reply(&mut self, setting: Setting) -> Result<String, ResolveError> {
        let current = self.current_value(setting)?;
        let mut reply = self.ask(setting, &current)?;

        let Some(env_name) = setting.env_fallback() else {
            return Ok(reply);
        };

        let mut attempts = 1;
        while reply.trim().is_empty() {
            if let Some(value) = (self.env)(env_name).filter(|v| !v.trim().is_empty()) {
                info!(
                    "[PHASE: settings] [STEP: env_fallback] {} taken from {}",
                    setting.key(),
                    env_name
                );
                reply = value;
                break;
            }

            warn!(
                "[PHASE: settings] [STEP: env_fallback] {} unset and no value given for {} (attempt={})",
                env_name,
                setting.key(),
                attempts
            );
            writeln!(
                self.console,
                "{} is not set in the environment and no value given for {}.",
                env_name,
                setting.label()
            )
            .map_err(ResolveError::Console)?;

            if let RetryPolicy::Bounded(max) = self.retry {
                if attempts >= max {
                    return Err(ResolveError::Stalled {
                        label: setting.label(),
                        attempts,
                    });
                }
            }

            attempts += 1;
            reply = self.ask(setting, &current)?;
        }

        Ok(reply)
    }

    fn ask(&mut self, setting: Setting, current: &str) -> Result<String, ResolveError> {
        write!(self.console, "{} [{}]: ", setting.label(), current)
            .and_then(|()| self.console.flush())
            .map_err(ResolveError::Console)?;

        let reply = self
            .prompter
            .ask(setting.label(), current)
            .map_err(|source| ResolveError::Prompt {
                label: setting.label(),
                source,
            })?;

        if reply.trim().is_empty() {
            Ok(current.to_string())
        } else {
            Ok(reply)
        }
    }

    fn record(&mut self, setting: Setting, value: &str) {
        info!(
            "[PHASE: settings] [STEP: resolve] {} = {}",
            setting.key(),
            value
        );
        self.store.set(setting.section(), setting.key(), value);
    }
}
