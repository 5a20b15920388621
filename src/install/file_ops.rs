//! Atomic, create-only file writes.
//!
//! Artifacts are never overwritten: an existing path is reported and left
//! alone. New files are written to a sibling temp file with their final mode
//! already applied, synced, then renamed into place, so a restricted file is
//! never visible with wider permissions.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};

use crate::error::SetupError;

/// What happened to a managed artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    Created,
    AlreadyPresent,
}

/// Create `path` with `content` and `mode` unless something already exists there.
pub fn create_if_absent(path: &Path, content: &str, mode: u32) -> Result<FileOutcome, SetupError> {
    // Any directory entry counts, including a dangling symlink.
    if fs::symlink_metadata(path).is_ok() {
        return Ok(FileOutcome::AlreadyPresent);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| SetupError::io(parent, e))?;
    }

    write_file_atomic(path, content, mode)?;
    Ok(FileOutcome::Created)
}

/// Write file atomically to prevent corruption
fn write_file_atomic(path: &Path, content: &str, mode: u32) -> Result<(), SetupError> {
    let temp_path = temp_path_for(path);

    {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(mode)
            .open(&temp_path)
            .map_err(|e| SetupError::io(&temp_path, e))?;

        // The creation mode is filtered by the umask; pin it explicitly.
        file.set_permissions(fs::Permissions::from_mode(mode))
            .map_err(|e| SetupError::io(&temp_path, e))?;

        file.write_all(content.as_bytes())
            .map_err(|e| SetupError::io(&temp_path, e))?;

        file.sync_all().map_err(|e| SetupError::io(&temp_path, e))?;
    }

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        SetupError::io(path, e)
    })?;

    Ok(())
}

/// `/etc/rsyncd.conf` -> `/etc/.rsyncd.conf.tmp`
fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.tmp"))
}
