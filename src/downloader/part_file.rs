// SPDX-License-Identifier: GPL-3.0-only
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::downloader::error::DownloadError;
use crate::utils::sanitize_filename;

/// Hidden sibling of the destination that receives the body.
///
/// The file is removed when dropped unless `commit` moved it into place.
pub struct PartFile {
    file: File,
    path: TempPath,
    destination: PathBuf,
    written: u64,
}

impl PartFile {
    /// Create `.<name>.<random>.part` in the destination's directory
    pub async fn create(destination: &Path) -> Result<Self, DownloadError> {
        let target = destination.to_path_buf();
        let (std_file, path) = tokio::task::spawn_blocking(move || create_part(&target))
            .await
            .map_err(|e| {
                DownloadError::filesystem("create part file for", destination, std::io::Error::other(e))
            })??;

        Ok(Self {
            file: File::from_std(std_file),
            path,
            destination: destination.to_path_buf(),
            written: 0,
        })
    }

    pub async fn write(&mut self, chunk: &[u8]) -> Result<(), DownloadError> {
        self.file
            .write_all(chunk)
            .await
            .map_err(|e| DownloadError::filesystem("write", &self.destination, e))?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush, sync, close and atomically rename over the destination
    pub async fn commit(mut self) -> Result<u64, DownloadError> {
        self.file
            .flush()
            .await
            .map_err(|e| DownloadError::filesystem("flush", &self.destination, e))?;
        self.file
            .sync_all()
            .await
            .map_err(|e| DownloadError::filesystem("sync", &self.destination, e))?;

        let Self {
            file,
            path,
            destination,
            written,
        } = self;
        drop(file);

        path.persist(&destination)
            .map_err(|e| DownloadError::filesystem("move into place", &destination, e.error))?;

        Ok(written)
    }
}

fn create_part(destination: &Path) -> Result<(std::fs::File, TempPath), DownloadError> {
    let file_name = destination
        .file_name()
        .and_then(|n| n.to_str())
        .map(sanitize_filename)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| {
            DownloadError::InvalidDestination(format!("{} does not name a file", destination.display()))
        })?;

    let parent = match destination.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let prefix = format!(".{}.", file_name);
    let mut builder = tempfile::Builder::new();
    builder.prefix(&prefix).suffix(".part");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // Same mode a plain create would get; the umask still applies
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }

    let named = builder
        .tempfile_in(parent)
        .map_err(|e| DownloadError::filesystem("create part file for", destination, e))?;

    // Overwriting keeps the mode the destination already had
    if let Ok(existing) = std::fs::metadata(destination) {
        if existing.is_file() {
            named
                .as_file()
                .set_permissions(existing.permissions())
                .map_err(|e| DownloadError::filesystem("copy permissions of", destination, e))?;
        }
    }

    Ok(named.into_parts())
}
