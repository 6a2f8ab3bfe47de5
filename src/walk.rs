//! Directory walk: find matching files and convert them one after another.
//!
//! The walk is collected up front, before the first conversion, so that
//! outputs written during the run (`a.docx` → `a.pdf`) are never picked up
//! as new inputs, and every match is converted exactly once.
//!
//! There is no continue-on-error policy: the first failing file aborts the
//! run and its error is returned.

use crate::api::{CloudApi, HttpClient};
use crate::config::{ConverterConfig, SameExtensionPolicy};
use crate::convert::convert_file;
use crate::credentials::{self, ApiKey, Endpoint};
use crate::error::ConvertError;
use crate::output::RunSummary;
use crate::pipeline::output::output_path_for;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};
use walkdir::WalkDir;

/// True when the file name of `path` ends with `.{extension}`.
///
/// Case-sensitive; `a.pdf` matches `pdf`, `a.PDF` and `apdf` do not.
/// Compared on the raw name bytes, so names that are not valid UTF-8 still
/// match.
pub fn matches_extension(path: &Path, extension: &str) -> bool {
    path.file_name()
        .map(|n| n.as_encoded_bytes())
        .and_then(|n| n.strip_suffix(extension.as_bytes()))
        .is_some_and(|rest| rest.ends_with(b"."))
}

/// Recursively list every regular file under `dir` whose name ends with
/// `.{extension}`, in traversal order.
///
/// Symlinks to files are included; symlinked directories are not descended.
pub fn find_matching_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, ConvertError> {
    let meta = std::fs::metadata(dir).map_err(|_| ConvertError::FileNotFound {
        path: dir.to_path_buf(),
    })?;
    if !meta.is_dir() {
        return Err(ConvertError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(|source| ConvertError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;

        let is_file = entry.file_type().is_file()
            || (entry.path_is_symlink() && entry.path().is_file());
        if is_file && matches_extension(entry.path(), extension) {
            files.push(entry.into_path());
        }
    }

    debug!(
        "Found {} '.{}' files under {}",
        files.len(),
        extension,
        dir.display()
    );
    Ok(files)
}

/// Convert every matching file under `dir`, sequentially.
pub async fn convert_directory<A>(
    api: &A,
    dir: impl AsRef<Path>,
    config: &ConverterConfig,
) -> Result<RunSummary, ConvertError>
where
    A: CloudApi + ?Sized,
{
    let dir = dir.as_ref();
    let start = Instant::now();
    let files = find_matching_files(dir, &config.target_extension)?;
    let total = files.len();
    info!("Converting {} files under {}", total, dir.display());

    let cb = config.progress_callback.as_ref();
    if let Some(cb) = cb {
        cb.on_run_start(total);
    }

    let mut summary = RunSummary {
        directory: dir.to_path_buf(),
        matched: total,
        ..Default::default()
    };

    for (i, path) in files.iter().enumerate() {
        let index = i + 1;

        if config.same_extension == SameExtensionPolicy::Skip
            && output_path_for(path, &config.output_format) == *path
        {
            info!("Skipping {} (already .{})", path.display(), config.output_format);
            if let Some(cb) = cb {
                cb.on_file_skipped(index, total, path);
            }
            summary.skipped.push(path.clone());
            continue;
        }

        if let Some(cb) = cb {
            cb.on_file_start(index, total, path);
        }
        let converted = convert_file(api, path, config).await?;
        if let Some(cb) = cb {
            cb.on_file_complete(index, total, &converted);
        }
        summary.converted.push(converted);
    }

    summary.duration_ms = start.elapsed().as_millis() as u64;
    if let Some(cb) = cb {
        cb.on_run_complete(total, summary.converted.len());
    }
    info!(
        "Run complete: {}/{} converted, {} skipped, {}ms",
        summary.converted.len(),
        total,
        summary.skipped.len(),
        summary.duration_ms
    );

    Ok(summary)
}

/// Load the credential, build a client, and convert `dir`.
///
/// The key is read through `lookup` before `connect` is called, so a
/// missing key fails without a client ever existing and without the
/// directory being read.
pub async fn run_with<A, L, C>(
    dir: impl AsRef<Path>,
    config: &ConverterConfig,
    lookup: L,
    connect: C,
) -> Result<RunSummary, ConvertError>
where
    A: CloudApi,
    L: Fn(&str) -> Option<String>,
    C: FnOnce(ApiKey, Endpoint) -> Result<A, ConvertError>,
{
    let key = ApiKey::from_lookup(&lookup)?;
    let endpoint = Endpoint::from_lookup(&lookup);
    debug!("Using API endpoint {}", endpoint.base_url());
    let api = connect(key, endpoint)?;
    convert_directory(&api, dir, config).await
}

/// [`run_with`] over the process environment (after loading `.env`) and
/// the real HTTP client.
pub async fn run(
    dir: impl AsRef<Path>,
    config: &ConverterConfig,
) -> Result<RunSummary, ConvertError> {
    credentials::load_dotenv();
    run_with(dir, config, credentials::env_lookup, |key, endpoint| {
        HttpClient::new(key, &endpoint, config)
    })
    .await
}
