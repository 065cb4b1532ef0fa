//! Filesystem helpers for output directories and partial renders.

use std::io;
use std::path::Path;
use tokio::fs;

/// Create `dir` (and parents) if it does not exist yet.
///
/// # Example
///
/// ```ignore
/// use snapclip_media::fs_utils::ensure_dir;
///
/// ensure_dir("out/clips").await?;
/// ```
pub async fn ensure_dir(dir: impl AsRef<Path>) -> io::Result<()> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        tracing::debug!("Creating output directory {}", dir.display());
        fs::create_dir_all(dir).await?;
    }
    Ok(())
}

/// Remove a partially written output file.
///
/// Returns `true` if a file was removed. Missing files are not an error.
pub async fn remove_partial_output(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();
    match fs::remove_file(path).await {
        Ok(()) => {
            tracing::debug!("Removed partial output {}", path.display());
            true
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => false,
        Err(e) => {
            tracing::warn!("Failed to remove partial output {}: {}", path.display(), e);
            false
        }
    }
}
