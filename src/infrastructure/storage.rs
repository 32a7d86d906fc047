use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use crate::domain::error::{AppError, Result};

fn io_err(msg: impl Into<String>) -> AppError {
    AppError::IoError(msg.into())
}

pub async fn ensure_data_dir(data_dir: &Path) -> Result<PathBuf> {
    ensure_dir(data_dir).await?;
    Ok(data_dir.to_path_buf())
}

async fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .await
        .map_err(|e| io_err(format!("Failed to create dir {}: {e}", path.display())))
}

/// Read a whole file, `None` when it does not exist
pub async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_err(format!("Failed to read {}: {e}", path.display()))),
    }
}

/// Write through a temp file in the same directory, then rename over the target
pub async fn atomic_write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent).await?;
    }

    let tmp_path = path.with_extension(format!("tmp-{}", Uuid::new_v4()));
    fs::write(&tmp_path, bytes).await.map_err(|e| {
        io_err(format!(
            "Failed to write temp file {}: {e}",
            tmp_path.display()
        ))
    })?;

    if let Err(e) = fs::rename(&tmp_path, path).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(io_err(format!(
            "Failed to rename temp file {} to {}: {e}",
            tmp_path.display(),
            path.display()
        )));
    }

    Ok(())
}

/// Remove a file, ignoring one that is already gone
pub async fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(io_err(format!("Failed to remove {}: {e}", path.display()))),
    }
}
