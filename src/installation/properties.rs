// RIF startup properties
//
// Flat `key = value` file read by the RIF services when Tomcat starts them.
// Engine keys come from the engine's section of the packaged defaults, each
// overridable from the same section of the user settings. NOPROMPT entries
// are copied from the packaged defaults only.

use anyhow::{Context, Result};
use log::{debug, info};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::{ConfigError, ConfigStore, NOPROMPT_SECTION};
use crate::models::{DbEngine, ResolvedSettings};
use crate::utils::logging::mask_property_value;

pub const PROPERTIES_FILE_NAME: &str = "RIFServiceStartupProperties.properties";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyLine {
    pub key: String,
    pub value: String,
}

impl PropertyLine {
    fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        PropertyLine {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for PropertyLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.key, self.value)
    }
}

pub fn properties_file_path(tomcat_home: &Path) -> PathBuf {
    tomcat_home.join("conf").join(PROPERTIES_FILE_NAME)
}

/// Build the property lines in output order.
pub fn generate_properties(
    store: &ConfigStore,
    engine: DbEngine,
    extract_dir: &Path,
) -> Result<Vec<PropertyLine>, ConfigError> {
    let section_name = engine.section_name();
    let engine_section = store
        .defaults()
        .section(section_name)
        .ok_or_else(|| ConfigError::MissingSection(section_name.to_string()))?;

    let mut lines = Vec::new();
    for key in engine_section.keys() {
        let value = store.get(section_name, key)?.unwrap_or_default();
        lines.push(PropertyLine::new(format!("database.{}", key), value));
    }

    lines.push(PropertyLine::new(
        "extractDirectory",
        extract_dir.to_string_lossy(),
    ));

    if let Some(noprompt) = store.defaults().section(NOPROMPT_SECTION) {
        for key in noprompt.keys() {
            let value = store
                .defaults()
                .get(NOPROMPT_SECTION, key)?
                .unwrap_or_default();
            lines.push(PropertyLine::new(key, value));
        }
    }

    Ok(lines)
}

pub fn render_properties(lines: &[PropertyLine]) -> String {
    lines.iter().map(|line| format!("{}\n", line)).collect()
}

/// Write the properties file under Tomcat's `conf/`, replacing any previous one.
pub fn write_properties_file(store: &ConfigStore, settings: &ResolvedSettings) -> Result<PathBuf> {
    let lines = generate_properties(store, settings.db_engine, &settings.extract_dir)
        .context("Failed to build the RIF startup properties")?;

    for line in &lines {
        debug!(
            "[PHASE: installation] [STEP: properties] {} = {}",
            line.key,
            mask_property_value(&line.key, &line.value)
        );
    }

    let path = properties_file_path(&settings.tomcat_home);
    if let Some(conf_dir) = path.parent() {
        std::fs::create_dir_all(conf_dir)
            .with_context(|| format!("Failed to create {:?}", conf_dir))?;
    }
    std::fs::write(&path, render_properties(&lines))
        .with_context(|| format!("Failed to write {:?}", path))?;

    info!(
        "[PHASE: installation] [STEP: properties] Wrote {} properties to {:?}",
        lines.len(),
        path
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLayer;
    use tempfile::TempDir;

    const DEFAULTS: &str = r#"
[MAIN]
db_type = "pg"

[POSTGRES]
driverClassName = "org.postgresql.Driver"
host = "localhost"
port = "5432"
jdbcURL = "jdbc:postgresql://${host}:${port}/sahsuland"

[MSSQL]
driverClassName = "com.microsoft.sqlserver.jdbc.SQLServerDriver"
host = "localhost"

[NOPROMPT]
maximumMapAreasAllowedForSingleDisplay = "200"
webApplicationDirectory = "RIF4"
"#;

    fn store(user: &str) -> ConfigStore {
        ConfigStore::from_layers(
            ConfigLayer::parse(DEFAULTS, "defaults").expect("defaults"),
            ConfigLayer::parse(user, "user").expect("user"),
            PathBuf::from("unused.toml"),
        )
    }

    fn keys(lines: &[PropertyLine]) -> Vec<&str> {
        lines.iter().map(|l| l.key.as_str()).collect()
    }

    #[test]
    fn engine_keys_follow_default_order_then_extract_then_noprompt() {
        let lines =
            generate_properties(&store(""), DbEngine::Postgres, Path::new("/data/extract"))
                .expect("generate");

        assert_eq!(
            keys(&lines),
            vec![
                "database.driverClassName",
                "database.host",
                "database.port",
                "database.jdbcURL",
                "extractDirectory",
                "maximumMapAreasAllowedForSingleDisplay",
                "webApplicationDirectory",
            ]
        );
        assert_eq!(lines[3].value, "jdbc:postgresql://localhost:5432/sahsuland");
        assert_eq!(lines[4].value, "/data/extract");
    }

    #[test]
    fn user_engine_values_override_defaults() {
        let lines = generate_properties(
            &store("[POSTGRES]\nhost = \"10.0.0.5\"\n"),
            DbEngine::Postgres,
            Path::new("/x"),
        )
        .expect("generate");

        assert_eq!(lines[1], PropertyLine::new("database.host", "10.0.0.5"));
        assert_eq!(lines[2], PropertyLine::new("database.port", "5432"));
    }

    #[test]
    fn user_only_keys_are_not_emitted() {
        let lines = generate_properties(
            &store("[POSTGRES]\nextra = \"nope\"\n"),
            DbEngine::Postgres,
            Path::new("/x"),
        )
        .expect("generate");

        assert!(!keys(&lines).contains(&"database.extra"));
        assert_eq!(keys(&lines).iter().filter(|k| k.starts_with("database.")).count(), 4);
    }

    #[test]
    fn noprompt_ignores_user_layer() {
        let lines = generate_properties(
            &store("[NOPROMPT]\nwebApplicationDirectory = \"HACKED\"\n"),
            DbEngine::Postgres,
            Path::new("/x"),
        )
        .expect("generate");

        let web = lines
            .iter()
            .find(|l| l.key == "webApplicationDirectory")
            .expect("present");
        assert_eq!(web.value, "RIF4");
    }

    #[test]
    fn engine_selects_section() {
        let lines = generate_properties(&store(""), DbEngine::SqlServer, Path::new("/x"))
            .expect("generate");
        assert_eq!(
            lines[0].value,
            "com.microsoft.sqlserver.jdbc.SQLServerDriver"
        );
        assert_eq!(keys(&lines).iter().filter(|k| k.starts_with("database.")).count(), 2);
    }

    #[test]
    fn missing_engine_section_is_reported() {
        let store = ConfigStore::from_layers(
            ConfigLayer::parse("[MAIN]\ndb_type = \"ms\"\n", "defaults").expect("defaults"),
            ConfigLayer::new(),
            PathBuf::from("unused.toml"),
        );
        assert!(matches!(
            generate_properties(&store, DbEngine::SqlServer, Path::new("/x")),
            Err(ConfigError::MissingSection(name)) if name == "MSSQL"
        ));
    }

    #[test]
    fn packaged_defaults_produce_a_complete_file() {
        let store = ConfigStore::from_layers(
            ConfigLayer::parse(include_str!("../../install.toml"), "install.toml")
                .expect("packaged defaults"),
            ConfigLayer::new(),
            PathBuf::from("unused.toml"),
        );
        let lines =
            generate_properties(&store, DbEngine::Postgres, Path::new("/x")).expect("generate");
        let url = lines
            .iter()
            .find(|l| l.key == "database.jdbcURL")
            .expect("jdbcURL");
        assert_eq!(url.value, "jdbc:postgresql://localhost:5432/sahsuland");
        assert!(keys(&lines).contains(&"webApplicationDirectory"));
    }

    #[test]
    fn render_writes_one_line_per_property() {
        let text = render_properties(&[
            PropertyLine::new("database.host", "localhost"),
            PropertyLine::new("extractDirectory", "/data"),
        ]);
        assert_eq!(text, "database.host = localhost\nextractDirectory = /data\n");
    }

    #[test]
    fn write_replaces_previous_file() {
        let dir = TempDir::new().expect("tempdir");
        let tomcat = dir.path().join("tomcat");
        let path = properties_file_path(&tomcat);
        std::fs::create_dir_all(path.parent().expect("parent")).expect("conf");
        std::fs::write(&path, "stale.key = 1\n".repeat(50)).expect("stale");

        let settings = ResolvedSettings {
            development_mode: false,
            db_engine: DbEngine::Postgres,
            script_root: PathBuf::from("/unused"),
            tomcat_home: tomcat.clone(),
            war_dir: PathBuf::from("/unused"),
            extract_dir: PathBuf::from("/data/extract"),
        };

        let written = write_properties_file(&store(""), &settings).expect("write");
        let text = std::fs::read_to_string(&written).expect("read");
        assert!(!text.contains("stale.key"));
        assert!(text.starts_with("database.driverClassName = org.postgresql.Driver\n"));
        assert!(text.contains("extractDirectory = /data/extract\n"));
    }
}
