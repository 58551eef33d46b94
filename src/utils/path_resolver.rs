use anyhow::{Context, Result};
use log::debug;
use std::path::{Component, Path, PathBuf};

/// Per-user installer home, relative to the user's home directory.
pub const INSTALLER_HOME_DIR: &str = ".rif";

/// Resolve deployment folder (absolute path)
pub fn resolve_deployment_folder() -> Result<PathBuf> {
    // Prefer the folder where the EXE is running from (packaged installs ship their files beside it)
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(dir) = exe_path.parent() {
            return Ok(dir.to_path_buf());
        }
    }

    // Fallback: current working directory
    std::env::current_dir().context("Failed to determine the current directory")
}

/// Resolve the installer base folder: explicit override, then the packaged
/// folder when bundled, then the working directory.
pub fn resolve_base_folder(bundled: bool, override_dir: Option<&Path>) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("Failed to determine the current directory")?;

    let base = match override_dir {
        Some(dir) => normalize_path(&dir.to_string_lossy(), &cwd),
        None if bundled => resolve_deployment_folder()?,
        None => cwd,
    };

    debug!(
        "[PHASE: initialization] [STEP: base_path] Base folder resolved (bundled={}, base={:?})",
        bundled, base
    );
    Ok(base)
}

/// Resolve the per-user installer home (`~/.rif`). Not created here.
pub fn resolve_installer_home() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Unable to determine the user's home directory"))?;
    Ok(home.join(INSTALLER_HOME_DIR))
}

/// Resolve log folder (absolute path), creating it if needed.
pub fn resolve_log_folder(installer_home: &Path) -> Result<PathBuf> {
    let log_dir = installer_home.join("logs");
    std::fs::create_dir_all(&log_dir)
        .map_err(|e| anyhow::anyhow!("Failed to create log folder {:?}: {}", log_dir, e))?;
    Ok(log_dir)
}

/// Turn an operator-supplied path into an absolute, canonical one.
///
/// Relative input is taken against `working_dir`. The longest existing prefix is
/// canonicalised (symlinks resolved); any non-existent remainder is appended as-is.
/// Empty input resolves to `working_dir`.
pub fn normalize_path(raw: &str, working_dir: &Path) -> PathBuf {
    let trimmed = raw.trim();
    let joined = if trimmed.is_empty() {
        working_dir.to_path_buf()
    } else {
        working_dir.join(trimmed)
    };

    let lexical = lexically_normalize(&joined);

    let mut existing = lexical.clone();
    let mut remainder: Vec<std::ffi::OsString> = Vec::new();
    loop {
        if let Ok(canonical) = existing.canonicalize() {
            let mut out = canonical;
            for part in remainder.iter().rev() {
                out.push(part);
            }
            return out;
        }
        match (existing.file_name().map(|n| n.to_os_string()), existing.parent()) {
            (Some(name), Some(parent)) => {
                remainder.push(name);
                existing = parent.to_path_buf();
            }
            _ => return lexical,
        }
    }
}

fn lexically_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // ".." at the root stays at the root
                if !out.pop() && !out.has_root() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn normalize_path_makes_relative_input_absolute() {
        let dir = TempDir::new().expect("tempdir");
        std::fs::create_dir_all(dir.path().join("scripts")).expect("mkdir");
        let canonical_root = dir.path().canonicalize().expect("canonical");

        let resolved = normalize_path(" scripts ", dir.path());
        assert_eq!(resolved, canonical_root.join("scripts"));
    }

    #[test]
    fn normalize_path_keeps_non_existent_tail() {
        let dir = TempDir::new().expect("tempdir");
        let canonical_root = dir.path().canonicalize().expect("canonical");

        let resolved = normalize_path("extract/./studies/../out", dir.path());
        assert_eq!(resolved, canonical_root.join("extract").join("out"));
    }

    #[test]
    fn normalize_path_empty_input_is_working_dir() {
        let dir = TempDir::new().expect("tempdir");
        let canonical_root = dir.path().canonicalize().expect("canonical");
        assert_eq!(normalize_path("", dir.path()), canonical_root);
        assert_eq!(normalize_path("   ", dir.path()), canonical_root);
    }

    #[test]
    fn normalize_path_keeps_absolute_input() {
        let dir = TempDir::new().expect("tempdir");
        let other = TempDir::new().expect("tempdir");
        let canonical_other = other.path().canonicalize().expect("canonical");

        let raw = other.path().join("tomcat").to_string_lossy().to_string();
        assert_eq!(normalize_path(&raw, dir.path()), canonical_other.join("tomcat"));
    }

    #[cfg(unix)]
    #[test]
    fn normalize_path_resolves_symlinks() {
        let dir = TempDir::new().expect("tempdir");
        let real = dir.path().join("real");
        std::fs::create_dir_all(&real).expect("mkdir");
        std::os::unix::fs::symlink(&real, dir.path().join("link")).expect("symlink");

        let resolved = normalize_path("link/conf", dir.path());
        assert_eq!(resolved, real.canonicalize().expect("canonical").join("conf"));
    }

    #[test]
    fn resolve_log_folder_creates_logs_dir() {
        let dir = TempDir::new().expect("tempdir");
        let logs = resolve_log_folder(&dir.path().join(".rif")).expect("log folder");
        assert!(logs.is_dir());
        assert!(logs.ends_with("logs"));
    }
}
