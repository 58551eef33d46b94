// Layered configuration store
//
// Owns the packaged defaults (read-only) and the per-user overrides (read-write).
// Lookups prefer the user layer; writes only touch the user layer and reach
// disk on `flush`.

use log::{debug, info};
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{ConfigError, ConfigLayer};

/// Packaged defaults file, found in the installer base directory.
pub const DEFAULTS_FILE_NAME: &str = "install.toml";

/// User settings file, found in the per-user installer home.
pub const USER_FILE_NAME: &str = "rifInstall.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    pub defaults_file: PathBuf,
    pub installer_home: PathBuf,
    pub user_file: PathBuf,
}

impl StorePaths {
    pub fn new(base_dir: &Path, installer_home: &Path) -> Self {
        StorePaths {
            defaults_file: base_dir.join(DEFAULTS_FILE_NAME),
            installer_home: installer_home.to_path_buf(),
            user_file: installer_home.join(USER_FILE_NAME),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigStore {
    defaults: ConfigLayer,
    user: ConfigLayer,
    user_file: PathBuf,
}

impl ConfigStore {
    /// Create the installer home and an empty user file if needed, then load both layers.
    ///
    /// A missing or malformed defaults file is fatal. A missing user file is an empty layer.
    pub fn initialize(paths: &StorePaths) -> Result<Self, ConfigError> {
        info!(
            "[PHASE: configuration] [STEP: initialize] Loading configuration (defaults={:?}, user={:?})",
            paths.defaults_file, paths.user_file
        );

        fs::create_dir_all(&paths.installer_home).map_err(|source| ConfigError::Write {
            path: paths.installer_home.clone(),
            source,
        })?;

        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&paths.user_file)
            .map_err(|source| ConfigError::Write {
                path: paths.user_file.clone(),
                source,
            })?;

        let defaults_text =
            fs::read_to_string(&paths.defaults_file).map_err(|source| ConfigError::Read {
                path: paths.defaults_file.clone(),
                source,
            })?;
        let defaults = ConfigLayer::parse(
            &defaults_text,
            &paths.defaults_file.display().to_string(),
        )?;

        let user_text = match fs::read_to_string(&paths.user_file) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: paths.user_file.clone(),
                    source,
                })
            }
        };
        let user = ConfigLayer::parse(&user_text, &paths.user_file.display().to_string())?;

        debug!(
            "[PHASE: configuration] [STEP: initialize] Layers loaded (default_main={}, user_main={})",
            defaults.has_section(super::MAIN_SECTION),
            user.has_section(super::MAIN_SECTION)
        );

        Ok(ConfigStore::from_layers(
            defaults,
            user,
            paths.user_file.clone(),
        ))
    }

    pub fn from_layers(defaults: ConfigLayer, user: ConfigLayer, user_file: PathBuf) -> Self {
        ConfigStore {
            defaults,
            user,
            user_file,
        }
    }

    /// Effective value: user layer, then packaged defaults, then `None`.
    ///
    /// Each layer substitutes references against itself.
    pub fn get(&self, section: &str, key: &str) -> Result<Option<String>, ConfigError> {
        if self.user.contains(section, key) {
            return self.user.get(section, key);
        }
        self.defaults.get(section, key)
    }

    /// Record a value in the user layer (in memory only).
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        debug!(
            "[PHASE: configuration] [STEP: set] [{}] {} updated in user layer",
            section, key
        );
        self.user.set(section, key, value);
    }

    /// Rewrite the user settings file with the full in-memory user layer.
    pub fn flush(&self) -> Result<(), ConfigError> {
        let text = self.user.to_toml_string()?;
        fs::write(&self.user_file, text).map_err(|source| ConfigError::Write {
            path: self.user_file.clone(),
            source,
        })?;

        info!(
            "[PHASE: configuration] [STEP: flush] User settings written to {:?}",
            self.user_file
        );
        Ok(())
    }

    pub fn defaults(&self) -> &ConfigLayer {
        &self.defaults
    }

    pub fn user(&self) -> &ConfigLayer {
        &self.user
    }
}
