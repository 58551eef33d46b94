// Installer configuration
//
// Two TOML layers (packaged defaults + per-user overrides), the closed set of
// installer settings, and the interactive resolver that combines them.

pub mod layer;
pub mod resolver;
pub mod settings;
pub mod store;

use std::path::PathBuf;
use thiserror::Error;

pub use layer::ConfigLayer;
pub use resolver::{ResolveError, RetryPolicy, SettingResolver};
pub use settings::{Setting, SettingKind};
pub use store::{ConfigStore, StorePaths};

/// Section holding the enumerated installer settings.
pub const MAIN_SECTION: &str = "MAIN";

/// Section whose entries are copied verbatim into the runtime properties file.
pub const NOPROMPT_SECTION: &str = "NOPROMPT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write configuration file {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed configuration in {origin}: {message}")]
    Parse { origin: String, message: String },

    #[error("Failed to render the user settings: {0}")]
    Serialize(String),

    #[error("Bad value substitution for [{section}] {key}: {message}")]
    Interpolation {
        section: String,
        key: String,
        message: String,
    },

    #[error("Section [{0}] is missing from the packaged defaults")]
    MissingSection(String),
}
