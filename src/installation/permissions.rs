// SQL Server data file permissions
//
// The SQL Server load scripts read lookup CSVs and write into a backup
// directory as the database service account, so those paths are opened up
// before the scripts run. Best-effort: on Windows clearing the read-only flag
// does not grant the service account access, and failures never stop the
// installation.

use log::{info, warn};
use std::path::{Path, PathBuf};

/// Paths, relative to the installer base directory, that the SQL Server scripts need writable.
pub fn sql_server_data_paths(base_dir: &Path) -> Vec<PathBuf> {
    let geo_path = base_dir.join("GeospatialData").join("tileMaker");
    let backup_path = base_dir.join("SQLserver").join("production");

    let mut paths: Vec<PathBuf> = (1..=4)
        .map(|level| geo_path.join(format!("mssql_lookup_sahsu_grd_level{}.csv", level)))
        .collect();
    paths.push(backup_path);
    paths
}

/// Make every SQL Server data path world read/write (directories also traversable).
/// Returns how many were updated.
pub async fn widen_sql_server_permissions(base_dir: &Path) -> usize {
    let mut updated = 0;
    for path in sql_server_data_paths(base_dir) {
        match make_world_writable(&path).await {
            Ok(()) => {
                updated += 1;
                info!(
                    "[PHASE: database] [STEP: permissions] Opened permissions on {:?}",
                    path
                );
            }
            Err(e) => warn!(
                "[PHASE: database] [STEP: permissions] Could not change permissions on {:?}: {}",
                path, e
            ),
        }
    }
    updated
}

#[cfg(unix)]
async fn make_world_writable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mode = if tokio::fs::metadata(path).await?.is_dir() {
        0o777
    } else {
        0o666
    };
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).await
}

#[cfg(not(unix))]
async fn make_world_writable(path: &Path) -> std::io::Result<()> {
    let mut perms = tokio::fs::metadata(path).await?.permissions();
    #[allow(clippy::permissions_set_readonly_false)]
    perms.set_readonly(false);
    tokio::fs::set_permissions(path, perms).await
}
