//! Result types returned by the converter and the directory walker.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One successfully converted file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertedFile {
    /// The file that was uploaded.
    pub source: PathBuf,
    /// Where the converted PDF was written.
    pub output: PathBuf,
    /// Remote job id, useful when reporting problems to the service.
    pub job_id: String,
    /// Size of the written output in bytes.
    pub bytes: u64,
}

impl ConvertedFile {
    /// True when the conversion replaced its own source file.
    pub fn overwrote_source(&self) -> bool {
        self.source == self.output
    }
}

/// Summary of a directory run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    /// The walked directory.
    pub directory: PathBuf,
    /// Number of files whose name matched the target extension.
    pub matched: usize,
    /// Converted files, in processing order.
    pub converted: Vec<ConvertedFile>,
    /// Files left alone by [`crate::SameExtensionPolicy::Skip`].
    pub skipped: Vec<PathBuf>,
    /// Wall-clock duration of the whole run.
    pub duration_ms: u64,
}

impl RunSummary {
    /// Total bytes written across all outputs.
    pub fn total_bytes(&self) -> u64 {
        self.converted.iter().map(|f| f.bytes).sum()
    }
}
