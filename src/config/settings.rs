// Installer settings
//
// The closed set of values the installer asks for. Every setting lives in the
// MAIN section of both configuration layers.

use super::MAIN_SECTION;

/// Environment variable consulted when no Tomcat home has been given.
pub const TOMCAT_HOME_ENV: &str = "CATALINA_HOME";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Setting {
    DevelopmentMode,
    DbType,
    ScriptHome,
    TomcatHome,
    WarFilesLocation,
    ExtractDirectory,
}

/// How a reply is interpreted and persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKind {
    /// Persisted as the literal text `True` or `False`.
    Flag,
    /// Resolved to an absolute, canonical filesystem path.
    Path,
    /// Stored as typed, surrounding whitespace removed.
    Text,
}

impl Setting {
    pub const ALL: [Setting; 6] = [
        Setting::DevelopmentMode,
        Setting::DbType,
        Setting::ScriptHome,
        Setting::TomcatHome,
        Setting::WarFilesLocation,
        Setting::ExtractDirectory,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Setting::DevelopmentMode => "development_mode",
            Setting::DbType => "db_type",
            Setting::ScriptHome => "script_home",
            Setting::TomcatHome => "tomcat_home",
            Setting::WarFilesLocation => "war_files_location",
            Setting::ExtractDirectory => "extract_directory",
        }
    }

    /// Prompt label shown to the operator.
    pub fn label(self) -> &'static str {
        match self {
            Setting::DevelopmentMode => "Development mode?",
            Setting::DbType => "Database type",
            Setting::ScriptHome => "Directory for SQL scripts",
            Setting::TomcatHome => "Home directory for Tomcat",
            Setting::WarFilesLocation => "Directory containing the WAR files",
            Setting::ExtractDirectory => "Directory for files extracted by studies",
        }
    }

    pub fn kind(self) -> SettingKind {
        match self {
            Setting::DevelopmentMode => SettingKind::Flag,
            Setting::DbType => SettingKind::Text,
            Setting::ScriptHome
            | Setting::TomcatHome
            | Setting::WarFilesLocation
            | Setting::ExtractDirectory => SettingKind::Path,
        }
    }

    pub fn section(self) -> &'static str {
        MAIN_SECTION
    }

    /// Environment variable that may supply the value when it would otherwise be empty.
    /// Settings with a fallback are never finalized empty.
    pub fn env_fallback(self) -> Option<&'static str> {
        match self {
            Setting::TomcatHome => Some(TOMCAT_HOME_ENV),
            _ => None,
        }
    }
}

/// Interpret a yes/no style reply. Returns `None` for anything unrecognised.
pub fn parse_flag(reply: &str) -> Option<bool> {
    match reply.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "t" | "true" | "on" | "1" => Some(true),
        "n" | "no" | "f" | "false" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Persisted spelling of a flag.
pub fn flag_text(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_unique() {
        let mut keys: Vec<&str> = Setting::ALL.iter().map(|s| s.key()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), Setting::ALL.len());
    }

    #[test]
    fn only_tomcat_home_has_an_environment_fallback() {
        for setting in Setting::ALL {
            let expected = if setting == Setting::TomcatHome {
                Some("CATALINA_HOME")
            } else {
                None
            };
            assert_eq!(setting.env_fallback(), expected, "{:?}", setting);
        }
    }

    #[test]
    fn parse_flag_accepts_the_usual_spellings() {
        for yes in ["y", "Yes", "TRUE", "t", "on", "1", " True "] {
            assert_eq!(parse_flag(yes), Some(true), "{:?}", yes);
        }
        for no in ["n", "NO", "false", "F", "off", "0"] {
            assert_eq!(parse_flag(no), Some(false), "{:?}", no);
        }
        for junk in ["", "maybe", "2", "yess"] {
            assert_eq!(parse_flag(junk), None, "{:?}", junk);
        }
    }

    #[test]
    fn flag_text_uses_capitalised_literals() {
        assert_eq!(flag_text(true), "True");
        assert_eq!(flag_text(false), "False");
    }
}
