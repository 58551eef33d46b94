//! Archive deployment helpers.
//!
//! - Async I/O only (tokio)
//! - Retry transient file lock errors (AV scanners, a Tomcat still holding the old WAR)
//! - Existing archives of the same name are overwritten
//! - SHA-256 of every deployed archive is logged

use anyhow::{Context, Result};
use log::{debug, info, warn};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::Duration;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;

use crate::models::ResolvedSettings;

/// (module directory, archive file name) for each deployed web archive.
const ARCHIVES: [(&str, &str); 4] = [
    ("rifServices", "rifServices.war"),
    ("taxonomyServices", "taxonomies.war"),
    ("statsService", "statistics.war"),
    ("rifWebApplication", "RIF40.war"),
];

/// Source paths of the archives to deploy.
///
/// Development builds leave each archive in its module's `target/` directory;
/// packaged installs ship them side by side.
pub fn archive_sources(settings: &ResolvedSettings) -> Vec<PathBuf> {
    ARCHIVES
        .iter()
        .map(|(module, file)| {
            if settings.development_mode {
                settings.war_dir.join(module).join("target").join(file)
            } else {
                settings.war_dir.join(file)
            }
        })
        .collect()
}

/// Tomcat's deployment directory.
pub fn webapps_dir(tomcat_home: &Path) -> PathBuf {
    tomcat_home.join("webapps")
}

/// Copy every archive into Tomcat's `webapps/`. Returns the deployed paths.
pub async fn deploy_archives(settings: &ResolvedSettings) -> Result<Vec<PathBuf>> {
    let started = Instant::now();
    let target_dir = webapps_dir(&settings.tomcat_home);
    tokio::fs::create_dir_all(&target_dir)
        .await
        .with_context(|| format!("Failed to create {:?}", target_dir))?;

    let mut deployed = Vec::new();
    for src in archive_sources(settings) {
        let file_name = src
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("Archive path has no file name: {:?}", src))?;
        let dst = target_dir.join(file_name);
        let label = file_name.to_string_lossy().to_string();

        let (bytes, sha256) = copy_file_with_retries_and_sha256(&src, &dst, &label)
            .await
            .with_context(|| format!("Failed to deploy {:?} to {:?}", src, dst))?;
        info!(
            "[PHASE: installation] [STEP: deploy_archives] Deployed {} (bytes={}, sha256={})",
            label, bytes, sha256
        );
        deployed.push(dst);
    }

    info!(
        "[PHASE: installation] [STEP: deploy_archives] {} archives deployed to {:?} (duration_ms={})",
        deployed.len(),
        target_dir,
        started.elapsed().as_millis()
    );
    Ok(deployed)
}

fn is_transient_fs_error(e: &anyhow::Error) -> bool {
    let msg = e.to_string().to_ascii_lowercase();
    msg.contains("used by another process")
        || msg.contains("in use")
        || msg.contains("resource busy")
        || msg.contains("temporarily")
        || msg.contains("temporary")
        || msg.contains("timed out")
}

/// Copy one file, retrying transient failures, returning `(bytes_written, sha256_hex)`.
///
/// Caller must create parent directory.
pub async fn copy_file_with_retries_and_sha256(
    src: &Path,
    dst: &Path,
    label: &str,
) -> Result<(u64, String)> {
    debug!(
        "[PHASE: installation] [STEP: files] copy_file_with_retries_and_sha256 entered (label={}, src={:?}, dst={:?})",
        label, src, dst
    );

    let retry_strategy = ExponentialBackoff::from_millis(200)
        .factor(2)
        .max_delay(Duration::from_secs(2))
        .take(2)
        .map(jitter);

    RetryIf::spawn(
        retry_strategy,
        || copy_file_once_and_sha256(src, dst),
        |e: &anyhow::Error| {
            let transient = is_transient_fs_error(e);
            warn!(
                "[PHASE: installation] [STEP: files] copy failed (label={}, transient={}, err={:#})",
                label, transient, e
            );
            transient
        },
    )
    .await
}

async fn copy_file_once_and_sha256(src: &Path, dst: &Path) -> Result<(u64, String)> {
    let mut src_f = tokio::fs::File::open(src)
        .await
        .with_context(|| format!("open src failed: {:?}", src))?;
    let mut dst_f = tokio::fs::File::create(dst)
        .await
        .with_context(|| format!("create dst failed: {:?}", dst))?;

    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 64 * 1024];
    let mut total: u64 = 0;

    loop {
        let n = src_f.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        dst_f.write_all(&buf[..n]).await?;
        total = total.saturating_add(n as u64);
    }
    dst_f.flush().await?;

    let digest = hasher.finalize();
    let sha256 = digest
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<String>();
    Ok((total, sha256))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DbEngine;
    use tempfile::TempDir;

    fn settings(development_mode: bool, war_dir: &Path, tomcat_home: &Path) -> ResolvedSettings {
        ResolvedSettings {
            development_mode,
            db_engine: DbEngine::Postgres,
            script_root: PathBuf::from("/unused"),
            tomcat_home: tomcat_home.to_path_buf(),
            war_dir: war_dir.to_path_buf(),
            extract_dir: PathBuf::from("/unused"),
        }
    }

    #[test]
    fn development_archives_come_from_module_targets() {
        let s = settings(true, Path::new("/src/rif"), Path::new("/opt/tomcat"));
        assert_eq!(
            archive_sources(&s),
            vec![
                PathBuf::from("/src/rif/rifServices/target/rifServices.war"),
                PathBuf::from("/src/rif/taxonomyServices/target/taxonomies.war"),
                PathBuf::from("/src/rif/statsService/target/statistics.war"),
                PathBuf::from("/src/rif/rifWebApplication/target/RIF40.war"),
            ]
        );
    }

    #[test]
    fn packaged_archives_sit_side_by_side() {
        let s = settings(false, Path::new("/srv/rif/warfiles"), Path::new("/opt/tomcat"));
        let names: Vec<PathBuf> = archive_sources(&s);
        assert_eq!(names.len(), 4);
        assert!(names
            .iter()
            .all(|p| p.parent() == Some(Path::new("/srv/rif/warfiles"))));
    }

    #[tokio::test]
    async fn deploy_overwrites_existing_archives() {
        let dir = TempDir::new().expect("tempdir");
        let war_dir = dir.path().join("warfiles");
        let tomcat = dir.path().join("tomcat");
        std::fs::create_dir_all(&war_dir).expect("war dir");
        std::fs::create_dir_all(tomcat.join("webapps")).expect("webapps");
        for (_, file) in ARCHIVES {
            std::fs::write(war_dir.join(file), format!("new {}", file)).expect("write war");
        }
        std::fs::write(tomcat.join("webapps").join("RIF40.war"), "stale").expect("stale");

        let deployed = deploy_archives(&settings(false, &war_dir, &tomcat))
            .await
            .expect("deploy");

        assert_eq!(deployed.len(), 4);
        assert_eq!(
            std::fs::read_to_string(tomcat.join("webapps").join("RIF40.war")).expect("read"),
            "new RIF40.war"
        );
    }

    #[tokio::test]
    async fn deploy_creates_webapps_directory() {
        let dir = TempDir::new().expect("tempdir");
        let war_dir = dir.path().join("warfiles");
        let tomcat = dir.path().join("tomcat");
        std::fs::create_dir_all(&war_dir).expect("war dir");
        for (_, file) in ARCHIVES {
            std::fs::write(war_dir.join(file), file).expect("write war");
        }

        deploy_archives(&settings(false, &war_dir, &tomcat))
            .await
            .expect("deploy");
        assert!(tomcat.join("webapps").join("statistics.war").is_file());
    }

    #[tokio::test]
    async fn missing_archive_fails_deployment() {
        let dir = TempDir::new().expect("tempdir");
        let err = deploy_archives(&settings(false, &dir.path().join("empty"), dir.path()))
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("rifServices.war"));
    }

    #[tokio::test]
    async fn copy_reports_size_and_digest() {
        let dir = TempDir::new().expect("tempdir");
        let src = dir.path().join("a.war");
        let dst = dir.path().join("b.war");
        std::fs::write(&src, b"abc").expect("write");

        let (bytes, sha) = copy_file_with_retries_and_sha256(&src, &dst, "a.war")
            .await
            .expect("copy");
        assert_eq!(bytes, 3);
        assert_eq!(
            sha,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(std::fs::read(&dst).expect("read"), b"abc");
    }
}
