use crate::error::CreatorGraphError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Temporary sibling path used while an artifact is being written
pub fn temp_path_for(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "artifact".into());
    name.push(".tmp");
    dest.with_file_name(name)
}

/// Write `bytes` to `dest` through a temporary file and a rename, so the
/// destination either holds the complete new content or is left untouched
pub fn write_atomic(dest: &Path, bytes: &[u8]) -> Result<(), CreatorGraphError> {
    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CreatorGraphError::export(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    // Write to temporary file first
    let temp_path = temp_path_for(dest);
    let result = (|| -> std::io::Result<()> {
        let mut file = std::fs::File::create(&temp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        Ok(())
    })();

    if let Err(e) = result {
        let _ = std::fs::remove_file(&temp_path);
        return Err(CreatorGraphError::export(format!(
            "Failed to write {}: {}",
            temp_path.display(),
            e
        )));
    }

    // Rename to final destination
    std::fs::rename(&temp_path, dest).map_err(|e| {
        let _ = std::fs::remove_file(&temp_path);
        CreatorGraphError::export(format!(
            "Failed to move {} into place: {}",
            dest.display(),
            e
        ))
    })?;

    debug!("Wrote {} bytes to {}", bytes.len(), dest.display());
    Ok(())
}
