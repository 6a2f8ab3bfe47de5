//! The three-task job graph: upload → convert → export.
//!
//! The service returns a job's tasks as an unordered list. [`ConversionJob`]
//! resolves that list once, by role name, into a record with one field per
//! role; everything downstream reads the fields and never searches again.

use crate::api::{Job, JobRequest, Task, TaskSpec};
use crate::config::ConverterConfig;
use crate::error::ConvertError;
use std::collections::BTreeMap;

/// Role name of the `import/upload` task.
pub const UPLOAD_TASK: &str = "upload-file";
/// Role name of the `convert` task.
pub const CONVERT_TASK: &str = "convert-to-pdf";
/// Role name of the `export/url` task.
pub const EXPORT_TASK: &str = "export-file";

/// Tag attached to every job so runs are recognisable in the dashboard.
pub const JOB_TAG: &str = "ccpdf";

/// Build the job request for one file.
///
/// ```text
/// upload-file (import/upload)
///     └─▶ convert-to-pdf (convert, output_format)
///             └─▶ export-file (export/url)
/// ```
pub fn job_request(config: &ConverterConfig) -> JobRequest {
    let mut convert = TaskSpec::new("convert").input(UPLOAD_TASK);
    convert.output_format = Some(config.output_format.clone());
    convert.input_format = config.input_format.clone();

    let mut tasks = BTreeMap::new();
    tasks.insert(UPLOAD_TASK.to_string(), TaskSpec::new("import/upload"));
    tasks.insert(CONVERT_TASK.to_string(), convert);
    tasks.insert(
        EXPORT_TASK.to_string(),
        TaskSpec::new("export/url").input(CONVERT_TASK),
    );

    JobRequest {
        tasks,
        tag: Some(JOB_TAG.to_string()),
    }
}

/// A created job with its tasks resolved by role.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionJob {
    pub id: String,
    pub upload: Task,
    pub convert: Task,
    pub export: Task,
}

impl TryFrom<Job> for ConversionJob {
    type Error = ConvertError;

    fn try_from(job: Job) -> Result<Self, Self::Error> {
        let Job { id, tasks, .. } = job;

        let mut upload = None;
        let mut convert = None;
        let mut export = None;
        for task in tasks {
            let slot = match task.name.as_str() {
                UPLOAD_TASK => &mut upload,
                CONVERT_TASK => &mut convert,
                EXPORT_TASK => &mut export,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(task);
            }
        }

        let missing = |name: &str| ConvertError::MissingTask {
            job_id: id.clone(),
            name: name.to_string(),
        };
        let upload = upload.ok_or_else(|| missing(UPLOAD_TASK))?;
        let convert = convert.ok_or_else(|| missing(CONVERT_TASK))?;
        let export = export.ok_or_else(|| missing(EXPORT_TASK))?;

        Ok(Self {
            id,
            upload,
            convert,
            export,
        })
    }
}
