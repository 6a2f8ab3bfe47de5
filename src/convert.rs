//! Single-file conversion: upload → convert → export → download.
//!
//! [`convert_file`] drives one remote job from creation to the written PDF.
//! It takes the API client as an argument so the same code runs against the
//! real service and against a fake in tests.

use crate::api::CloudApi;
use crate::config::ConverterConfig;
use crate::error::ConvertError;
use crate::output::ConvertedFile;
use crate::pipeline::job::{job_request, ConversionJob};
use crate::pipeline::output::{output_path_for, PartFile};
use crate::pipeline::wait::wait_for_task;
use crate::progress::Stage;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Convert one local file to PDF through the remote service.
///
/// The result is written to the input path with its extension replaced by
/// the configured output format (`a.docx` → `a.pdf`). When the input already
/// has that extension it is replaced in place.
///
/// # Steps
/// 1. Create the job (upload, convert, export tasks)
/// 2. Resolve the job's tasks by role
/// 3. Re-fetch the upload task and send the file
/// 4. Wait for the export task to finish
/// 5. Re-fetch the export task and take its first file URL
/// 6. Download to the output path
///
/// # Errors
/// Any failure is returned as-is; nothing is retried and the remote job is
/// not cleaned up. The output file is only touched after a complete download.
pub async fn convert_file<A>(
    api: &A,
    input: impl AsRef<Path>,
    config: &ConverterConfig,
) -> Result<ConvertedFile, ConvertError>
where
    A: CloudApi + ?Sized,
{
    let input = input.as_ref();
    let start = Instant::now();
    check_readable(input)?;
    info!("Converting {}", input.display());

    let stage = |s: Stage| {
        if let Some(ref cb) = config.progress_callback {
            cb.on_stage(input, s);
        }
    };

    // ── Step 1–2: Create the job, resolve its tasks ──────────────────────
    stage(Stage::Uploading);
    let job = api.create_job(&job_request(config)).await?;
    let job = ConversionJob::try_from(job)?;
    debug!("Created job {} for {}", job.id, input.display());

    // ── Step 3: Upload ───────────────────────────────────────────────────
    // The creation response only carries task stubs; the upload form is
    // read from the refreshed task.
    let upload_task = api.get_task(&job.upload.id).await?;
    api.upload(&upload_task, input).await?;
    debug!("Uploaded {} to task {}", input.display(), upload_task.id);

    // ── Step 4: Wait ─────────────────────────────────────────────────────
    info!("Waiting for the export task to complete");
    stage(Stage::Waiting);
    wait_for_task(api, &job.export.id, &config.wait).await?;

    // ── Step 5: Locate the exported file ─────────────────────────────────
    let export_task = api.get_task(&job.export.id).await?;
    let file = export_task
        .first_file()
        .ok_or_else(|| ConvertError::NoExportedFile {
            task_id: export_task.id.clone(),
        })?;

    // ── Step 6: Download ─────────────────────────────────────────────────
    info!("Downloading the converted file");
    stage(Stage::Downloading);
    let output = output_path_for(input, &config.output_format);
    let mut part = PartFile::create(&output)?;
    api.download(&file.url, part.writer()).await?;
    let bytes = part.commit().await?;

    info!(
        "Converted and downloaded: {} ({} bytes, {}ms)",
        output.display(),
        bytes,
        start.elapsed().as_millis()
    );

    Ok(ConvertedFile {
        source: input.to_path_buf(),
        output,
        job_id: job.id,
        bytes,
    })
}

/// Fail early, before any job is created, if the input cannot be read.
fn check_readable(path: &Path) -> Result<(), ConvertError> {
    match std::fs::File::open(path) {
        Ok(_) if path.is_dir() => Err(ConvertError::FileNotFound {
            path: path.to_path_buf(),
        }),
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(ConvertError::PermissionDenied {
                path: path.to_path_buf(),
            })
        }
        Err(_) => Err(ConvertError::FileNotFound {
            path: path.to_path_buf(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_reported() {
        let err = check_readable(Path::new("/definitely/not/here.pdf")).unwrap_err();
        assert!(matches!(err, ConvertError::FileNotFound { .. }));
    }

    #[test]
    fn directory_is_not_a_readable_file() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(check_readable(dir.path()).is_err());
    }

    #[test]
    fn existing_file_is_readable() {
        let dir = tempfile::TempDir::new().unwrap();
        let p = dir.path().join("a.pdf");
        std::fs::write(&p, b"%PDF").unwrap();
        assert!(check_readable(&p).is_ok());
    }
}
