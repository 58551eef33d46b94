// Resolved installation settings
//
// Built once per run after every prompt has been answered; read-only from then on.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::config::settings::flag_text;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DbEngine {
    Postgres,
    SqlServer,
}

impl DbEngine {
    /// Map a `db_type` code. `ms` is SQL Server; anything else is PostgreSQL.
    pub fn from_code(code: &str) -> Self {
        if code.trim() == "ms" {
            DbEngine::SqlServer
        } else {
            DbEngine::Postgres
        }
    }

    pub fn is_known_code(code: &str) -> bool {
        matches!(code.trim(), "ms" | "pg")
    }

    pub fn display_name(self) -> &'static str {
        match self {
            DbEngine::Postgres => "PostgreSQL",
            DbEngine::SqlServer => "Microsoft SQL Server",
        }
    }

    /// Configuration section holding the engine's runtime properties.
    pub fn section_name(self) -> &'static str {
        match self {
            DbEngine::Postgres => "POSTGRES",
            DbEngine::SqlServer => "MSSQL",
        }
    }
}

impl fmt::Display for DbEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedSettings {
    pub development_mode: bool,
    pub db_engine: DbEngine,
    pub script_root: PathBuf,
    pub tomcat_home: PathBuf,
    pub war_dir: PathBuf,
    pub extract_dir: PathBuf,
}

impl ResolvedSettings {
    /// Summary shown before the go/no-go question.
    pub fn summary(&self) -> String {
        format!(
            "About to install with the following settings:\
             \n\tDevelopment mode: {}\
             \n\tDB: {}\
             \n\tScripts directory: {}\
             \n\tTomcat home directory: {}\
             \n\tWAR files directory: {}\
             \n\tExtract directory: {}",
            flag_text(self.development_mode),
            self.db_engine,
            self.script_root.display(),
            self.tomcat_home.display(),
            self.war_dir.display(),
            self.extract_dir.display()
        )
    }
}
