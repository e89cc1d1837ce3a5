use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::EditResult;

/// Writes `content` to `path` through a temporary file and rename, so readers
/// never observe partial content. Writes are allowed to create the target;
/// backups only apply when there is an existing file to preserve.
pub fn write_atomic(path: &Path, content: &str, backup: bool) -> EditResult<()> {
    let existing = path.exists();
    let tmp_path = unique_tmp_path(path);
    {
        let mut file = File::create(&tmp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
    }

    #[cfg(unix)]
    if existing {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(metadata) = fs::metadata(path) {
            let mode = metadata.permissions().mode();
            let _ = fs::set_permissions(&tmp_path, fs::Permissions::from_mode(mode));
        }
    }

    if backup && existing {
        let backup_path = path.with_extension("bak");
        if let Err(err) = fs::copy(path, &backup_path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(err.into());
        }
    }

    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err.into());
    }

    Ok(())
}

fn unique_tmp_path(path: &Path) -> PathBuf {
    let mut counter = 0u32;
    loop {
        let candidate = if counter == 0 {
            path.with_extension("tmp")
        } else {
            path.with_extension(format!("tmp{counter}"))
        };

        if !candidate.exists() {
            return candidate;
        }

        counter += 1;
    }
}
