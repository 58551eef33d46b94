// Configuration layer
//
// One TOML document read as ordered sections of ordered string values.
// Values may reference other keys of the same layer:
//   ${key}          same section
//   ${SECTION:key}  another section
//   $$              a literal '$'

use regex::Regex;

use super::ConfigError;

/// Maximum nesting of `${...}` references before a lookup is rejected.
pub const MAX_INTERPOLATION_DEPTH: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    name: String,
    entries: Vec<(String, String)>,
}

impl Section {
    pub fn new(name: impl Into<String>) -> Self {
        Section {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    /// Uninterpolated value for `key`.
    pub fn get_raw(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get_raw(key).is_some()
    }

    /// Keys in file order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    fn insert(&mut self, key: &str, value: String) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    sections: Vec<Section>,
}

impl ConfigLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a layer from TOML text. `origin` names the source in error messages.
    pub fn parse(text: &str, origin: &str) -> Result<Self, ConfigError> {
        let parse_error = |message: String| ConfigError::Parse {
            origin: origin.to_string(),
            message,
        };

        let table: toml::Table = text
            .parse()
            .map_err(|e: toml::de::Error| parse_error(e.to_string()))?;

        let mut layer = ConfigLayer::new();
        for (name, item) in table {
            let toml::Value::Table(entries) = item else {
                return Err(parse_error(format!(
                    "'{}' is not inside a [section]",
                    name
                )));
            };

            let mut section = Section::new(name.as_str());
            for (key, value) in entries {
                let text = scalar_text(&value).ok_or_else(|| {
                    parse_error(format!(
                        "[{}] {} must be a plain value, not an array or table",
                        name, key
                    ))
                })?;
                section.insert(&key, text);
            }
            layer.sections.push(section);
        }

        Ok(layer)
    }

    /// Render the layer as TOML, every value written as a string.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        let mut root = toml::Table::new();
        for section in &self.sections {
            let mut entries = toml::Table::new();
            for (key, value) in &section.entries {
                entries.insert(key.clone(), toml::Value::String(value.clone()));
            }
            root.insert(section.name.clone(), toml::Value::Table(entries));
        }

        toml::to_string(&root).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.section(name).is_some()
    }

    pub fn get_raw(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section).and_then(|s| s.get_raw(key))
    }

    pub fn contains(&self, section: &str, key: &str) -> bool {
        self.get_raw(section, key).is_some()
    }

    /// Interpolated value for `[section] key`, `None` when the key is absent.
    pub fn get(&self, section: &str, key: &str) -> Result<Option<String>, ConfigError> {
        let Some(raw) = self.get_raw(section, key) else {
            return Ok(None);
        };

        self.interpolate(section, raw, 1)
            .map(Some)
            .map_err(|message| ConfigError::Interpolation {
                section: section.to_string(),
                key: key.to_string(),
                message,
            })
    }

    /// Store `value` literally; any `$` is escaped so a later `get` returns it unchanged.
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        self.set_raw(section, key, value.replace('$', "$$"));
    }

    /// Store `value` as written, keeping any `${...}` references live.
    pub fn set_raw(&mut self, section: &str, key: &str, value: String) {
        match self.sections.iter_mut().find(|s| s.name == section) {
            Some(existing) => existing.insert(key, value),
            None => {
                let mut created = Section::new(section);
                created.insert(key, value);
                self.sections.push(created);
            }
        }
    }

    fn interpolate(&self, section: &str, raw: &str, depth: usize) -> Result<String, String> {
        if depth > MAX_INTERPOLATION_DEPTH {
            return Err(format!(
                "references nest deeper than {} levels (circular reference?)",
                MAX_INTERPOLATION_DEPTH
            ));
        }

        let reference_re = Regex::new(r"^\$\{([^}:]+)(?::([^}:]+))?\}")
            .map_err(|e| format!("internal error compiling reference pattern: {}", e))?;

        let mut out = String::with_capacity(raw.len());
        let mut rest = raw;
        while let Some(pos) = rest.find('$') {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];

            if let Some(after) = tail.strip_prefix("$$") {
                out.push('$');
                rest = after;
                continue;
            }

            let caps = reference_re.captures(tail).ok_or_else(|| {
                format!(
                    "'$' must be followed by '$' or '{{name}}', found: {:?}",
                    tail
                )
            })?;

            let (target_section, target_key) = match (caps.get(1), caps.get(2)) {
                (Some(sec), Some(key)) => (sec.as_str(), key.as_str()),
                (Some(key), None) => (section, key.as_str()),
                _ => return Err(format!("malformed reference: {:?}", tail)),
            };

            let target_raw = self.get_raw(target_section, target_key).ok_or_else(|| {
                format!(
                    "'{}' references undefined key [{}] {}",
                    &caps[0], target_section, target_key
                )
            })?;

            out.push_str(&self.interpolate(target_section, target_raw, depth + 1)?);
            rest = &tail[caps[0].len()..];
        }
        out.push_str(rest);

        Ok(out)
    }
}

fn scalar_text(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Float(f) => Some(f.to_string()),
        toml::Value::Boolean(b) => Some(b.to_string()),
        toml::Value::Datetime(d) => Some(d.to_string()),
        toml::Value::Array(_) | toml::Value::Table(_) => None,
    }
}
