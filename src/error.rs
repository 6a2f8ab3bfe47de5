//! Error type for the cloudconvert-pdf library.
//!
//! Every failure is fatal for the file being converted and, because the
//! directory walk has no continue-on-error policy, for the whole run. The
//! variants are grouped by where the failure originates so callers (and the
//! CLI) can tell a configuration problem from a remote-service problem:
//!
//! * configuration — missing API key, invalid builder values
//! * filesystem — input missing/unreadable, walk failure, output write failure
//! * remote service — HTTP/API errors, unexpected job shape, failed tasks,
//!   wait timeout
//! * download — fetching the converted bytes from the export URL

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// All errors returned by the cloudconvert-pdf library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Configuration errors ──────────────────────────────────────────────
    /// No API key in the environment or the `.env` settings file.
    #[error(
        "CloudConvert API key is not configured.\n\
Set CLOUDCONVERT_API_KEY in the environment or in a .env file."
    )]
    MissingApiKey,

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Filesystem errors ─────────────────────────────────────────────────
    /// Input file or directory was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The walk root exists but is not a directory.
    #[error("Not a directory: '{path}'")]
    NotADirectory { path: PathBuf },

    /// Recursive directory traversal failed part-way.
    #[error("Failed to walk '{path}': {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// Could not read the input file for upload.
    #[error("Failed to read input file '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write the output PDF.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Remote service errors ─────────────────────────────────────────────
    /// Transport-level failure talking to the API.
    #[error("Request to CloudConvert failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API rejected the key (HTTP 401/403).
    #[error("CloudConvert rejected the API key (HTTP {status}): {message}")]
    Unauthorized { status: u16, message: String },

    /// The API returned a non-success status.
    #[error("CloudConvert API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The API answered with a body we could not decode.
    #[error("Unexpected response from CloudConvert: {0}")]
    InvalidResponse(String),

    /// The created job does not contain a task with the expected role name.
    #[error("Job {job_id} has no task named '{name}'")]
    MissingTask { job_id: String, name: String },

    /// The upload task carries no upload form to post the file to.
    #[error("Upload task {task_id} has no upload form")]
    NoUploadForm { task_id: String },

    /// The export task finished without any downloadable file.
    #[error("Export task {task_id} finished without an exported file")]
    NoExportedFile { task_id: String },

    /// A task ended in the `error` state.
    #[error("Task {task} failed ({code}): {message}")]
    TaskFailed {
        task: String,
        code: String,
        message: String,
    },

    /// The task did not finish within the configured wait timeout.
    #[error("Timed out after {:.1}s waiting for task {task} (last status: {last_status})", .waited.as_secs_f64())]
    WaitTimeout {
        task: String,
        waited: Duration,
        last_status: String,
    },

    // ── Download errors ───────────────────────────────────────────────────
    /// Fetching the converted bytes from the export URL failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },
}

impl ConvertError {
    /// True for errors raised before any network call is possible.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingApiKey | Self::InvalidConfig(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_api_key_names_the_variable() {
        let msg = ConvertError::MissingApiKey.to_string();
        assert!(msg.contains("CLOUDCONVERT_API_KEY"), "got: {msg}");
    }

    #[test]
    fn wait_timeout_display() {
        let e = ConvertError::WaitTimeout {
            task: "export-1".into(),
            waited: Duration::from_millis(2500),
            last_status: "processing".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("2.5s"), "got: {msg}");
        assert!(msg.contains("export-1"));
        assert!(msg.contains("processing"));
    }

    #[test]
    fn missing_task_display() {
        let e = ConvertError::MissingTask {
            job_id: "job-9".into(),
            name: "upload-file".into(),
        };
        assert!(e.to_string().contains("upload-file"));
        assert!(e.to_string().contains("job-9"));
    }

    #[test]
    fn task_failed_display() {
        let e = ConvertError::TaskFailed {
            task: "convert-to-pdf".into(),
            code: "INVALID_CONVERSION_TYPE".into(),
            message: "unsupported input".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("INVALID_CONVERSION_TYPE"));
        assert!(msg.contains("unsupported input"));
    }

    #[test]
    fn configuration_errors_are_flagged() {
        assert!(ConvertError::MissingApiKey.is_configuration());
        assert!(ConvertError::InvalidConfig("x".into()).is_configuration());
        assert!(!ConvertError::NoExportedFile {
            task_id: "t".into()
        }
        .is_configuration());
    }
}
