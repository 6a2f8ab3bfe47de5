//! Progress-callback trait for per-file conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConverterConfigBuilder::progress_callback`] to receive
//! events as the run walks the directory and converts each file.
//!
//! The CLI uses this to drive its progress bar and to print the status
//! lines announced before the blocking wait and before the download.
//!
//! # Example
//!
//! ```rust
//! use cloudconvert_pdf::{ConversionProgressCallback, ConverterConfig, Stage};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! struct Announce;
//!
//! impl ConversionProgressCallback for Announce {
//!     fn on_stage(&self, path: &Path, stage: Stage) {
//!         eprintln!("{}: {}", path.display(), stage);
//!     }
//! }
//!
//! let config = ConverterConfig::builder()
//!     .progress_callback(Arc::new(Announce))
//!     .build()
//!     .unwrap();
//! ```

use crate::output::ConvertedFile;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// The remote steps of a single file conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Creating the job and sending the file bytes.
    Uploading,
    /// Blocked until the export task finishes.
    Waiting,
    /// Fetching the converted file from the export URL.
    Downloading,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Uploading => "Uploading the file",
            Stage::Waiting => "Waiting for the export task to complete",
            Stage::Downloading => "Downloading the converted file",
        };
        f.write_str(s)
    }
}

/// Called by the walker and the converter as a run progresses.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Files are processed one at a time, but the trait is
/// `Send + Sync` so a callback can be shared with other tasks.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once after the directory walk, before the first conversion.
    fn on_run_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called before a file's job is created.
    ///
    /// `index` is 1-based.
    fn on_file_start(&self, index: usize, total_files: usize, path: &Path) {
        let _ = (index, total_files, path);
    }

    /// Called when a file enters a new remote stage.
    fn on_stage(&self, path: &Path, stage: Stage) {
        let _ = (path, stage);
    }

    /// Called when a file has been converted and written.
    fn on_file_complete(&self, index: usize, total_files: usize, file: &ConvertedFile) {
        let _ = (index, total_files, file);
    }

    /// Called for a file left alone by [`crate::SameExtensionPolicy::Skip`].
    fn on_file_skipped(&self, index: usize, total_files: usize, path: &Path) {
        let _ = (index, total_files, path);
    }

    /// Called once after every file has been converted.
    ///
    /// Not called when a file fails: the run aborts with the error instead.
    fn on_run_complete(&self, total_files: usize, converted: usize) {
        let _ = (total_files, converted);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConverterConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
