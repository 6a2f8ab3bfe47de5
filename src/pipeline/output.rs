//! Output placement: derive the PDF path and write it atomically.
//!
//! The download lands in a hidden `.part` file next to the destination and is
//! renamed over it only once the whole body has arrived. A failed or
//! interrupted download therefore never leaves a truncated PDF behind, and
//! never clobbers a source `.pdf` that is being re-converted in place.

use crate::error::ConvertError;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

/// The output path for `input`: its extension replaced by `format`.
///
/// `docs/a.docx` → `docs/a.pdf`, `a.tar.gz` → `a.tar.pdf`, `a.pdf` → `a.pdf`.
pub fn output_path_for(input: &Path, format: &str) -> PathBuf {
    input.with_extension(format)
}

/// A download in progress, committed to its destination by rename.
///
/// Dropping a `PartFile` without calling [`PartFile::commit`] deletes the
/// partial data.
pub struct PartFile {
    temp: NamedTempFile,
    file: tokio::fs::File,
    dest: PathBuf,
}

impl PartFile {
    /// Create an empty part file in the destination's directory.
    ///
    /// A destination that is a symlink is resolved first, so the commit
    /// replaces the link's target and the link itself survives.
    pub fn create(dest: &Path) -> Result<Self, ConvertError> {
        let resolved = resolve_link(dest);
        let dest = resolved.as_path();
        let write_err = |source| ConvertError::OutputWriteFailed {
            path: dest.to_path_buf(),
            source,
        };

        let dir = match dest.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let temp = tempfile::Builder::new()
            .prefix(".ccpdf-")
            .suffix(".part")
            .tempfile_in(dir)
            .map_err(write_err)?;

        // Keep the permissions of a file we are about to replace; otherwise
        // the 0600 of the temp file would leak into the result.
        if let Ok(meta) = std::fs::metadata(dest) {
            std::fs::set_permissions(temp.path(), meta.permissions()).map_err(write_err)?;
        } else {
            set_default_permissions(temp.path()).map_err(write_err)?;
        }

        let file = temp.reopen().map_err(write_err)?;
        Ok(Self {
            temp,
            file: tokio::fs::File::from_std(file),
            dest: dest.to_path_buf(),
        })
    }

    /// The sink to stream the download into.
    pub fn writer(&mut self) -> &mut tokio::fs::File {
        &mut self.file
    }

    pub fn destination(&self) -> &Path {
        &self.dest
    }

    /// Flush, sync and rename over the destination. Returns the file size.
    pub async fn commit(mut self) -> Result<u64, ConvertError> {
        let dest = self.dest.clone();
        let write_err = |source| ConvertError::OutputWriteFailed {
            path: dest.clone(),
            source,
        };

        self.file.flush().await.map_err(write_err)?;
        self.file.sync_all().await.map_err(write_err)?;
        let len = self.file.metadata().await.map_err(write_err)?.len();
        drop(self.file);

        self.temp
            .persist(&self.dest)
            .map_err(|e| write_err(e.error))?;
        Ok(len)
    }
}

/// The file a symlinked `dest` points at; `dest` itself otherwise, or when
/// the link is dangling.
fn resolve_link(dest: &Path) -> PathBuf {
    match std::fs::symlink_metadata(dest) {
        Ok(meta) if meta.file_type().is_symlink() => {
            std::fs::canonicalize(dest).unwrap_or_else(|_| dest.to_path_buf())
        }
        _ => dest.to_path_buf(),
    }
}

#[cfg(unix)]
fn set_default_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_default_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
