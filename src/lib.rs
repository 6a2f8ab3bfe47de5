//! # cloudconvert-pdf
//!
//! Walk a directory and convert every matching file to PDF through the
//! [CloudConvert](https://cloudconvert.com) job API.
//!
//! ## Pipeline Overview
//!
//! ```text
//! directory
//!  │
//!  ├─ 1. Credential  CLOUDCONVERT_API_KEY from env / .env (fails fast)
//!  ├─ 2. Walk        every file ending in `.{target_extension}`, any depth
//!  └─ for each file, strictly one after another:
//!      ├─ 3. Job      upload-file → convert-to-pdf → export-file
//!      ├─ 4. Upload   multipart POST to the upload task's form
//!      ├─ 5. Wait     poll the export task until `finished` (bounded)
//!      └─ 6. Output   download next to the source as `<stem>.pdf`
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cloudconvert_pdf::{run, ConverterConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads CLOUDCONVERT_API_KEY (a .env file in the working directory works too)
//!     let config = ConverterConfig::default();
//!     let summary = run("docs", &config).await?;
//!     eprintln!("converted {} files", summary.converted.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Testing against a fake service
//!
//! Every entry point takes the client as a [`CloudApi`] value. Implement the
//! trait on a test double and pass it to [`convert_file`] or
//! [`convert_directory`]; nothing in the crate reaches for a global client.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `ccpdf` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod api;
pub mod config;
pub mod convert;
pub mod credentials;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod walk;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use api::{CloudApi, HttpClient};
pub use config::{ConverterConfig, ConverterConfigBuilder, SameExtensionPolicy, WaitPolicy};
pub use convert::convert_file;
pub use credentials::{ApiKey, Endpoint};
pub use error::ConvertError;
pub use output::{ConvertedFile, RunSummary};
pub use pipeline::output::output_path_for;
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
pub use walk::{convert_directory, find_matching_files, run, run_with};
