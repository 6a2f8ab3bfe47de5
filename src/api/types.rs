//! Wire types for the CloudConvert v2 job/task API.
//!
//! Only the fields this crate reads are modelled; everything else in the
//! responses is ignored. Unknown task statuses deserialize to
//! [`TaskStatus::Unknown`] instead of failing the whole response.

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Every API response wraps its payload in `{"data": …}`.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub data: T,
}

/// Error body returned with non-2xx responses.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

// ── Requests ─────────────────────────────────────────────────────────────

/// Body of `POST /jobs`: a graph of named tasks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRequest {
    pub tasks: BTreeMap<String, TaskSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

/// One task definition inside a [`JobRequest`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskSpec {
    /// e.g. `import/upload`, `convert`, `export/url`.
    pub operation: String,
    /// Names of the tasks this one consumes.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub input: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_format: Option<String>,
}

impl TaskSpec {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            input: Vec::new(),
            input_format: None,
            output_format: None,
        }
    }

    pub fn input(mut self, task_name: impl Into<String>) -> Self {
        self.input.push(task_name.into());
        self
    }
}

// ── Responses ────────────────────────────────────────────────────────────

/// A created job with its task stubs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Job {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

/// A single task as returned by `GET /tasks/{id}` or inside a job.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Task {
    pub id: String,
    /// Role name given in the job request (`upload-file`, …).
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub operation: String,
    #[serde(default)]
    pub status: TaskStatus,
    /// Machine-readable error code when `status` is `error`.
    #[serde(default)]
    pub code: Option<String>,
    /// Human-readable error message when `status` is `error`.
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub result: Option<TaskResult>,
}

impl Task {
    /// The upload form of an `import/upload` task, if the service sent one.
    pub fn upload_form(&self) -> Option<&UploadForm> {
        self.result.as_ref().and_then(|r| r.form.as_ref())
    }

    /// The first exported file of an `export/url` task.
    pub fn first_file(&self) -> Option<&ExportedFile> {
        self.result.as_ref().and_then(|r| r.files.first())
    }

    /// Label used in errors and logs: the role name, or the id.
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    /// Error describing why this task ended in the `error` state.
    pub fn failure(&self) -> ConvertError {
        ConvertError::TaskFailed {
            task: self.label().to_string(),
            code: self.code.clone().unwrap_or_else(|| "UNKNOWN".to_string()),
            message: self
                .message
                .clone()
                .unwrap_or_else(|| "no message from service".to_string()),
        }
    }
}

/// Lifecycle of a remote task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Waiting,
    Processing,
    Finished,
    Error,
    #[serde(other)]
    Unknown,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Finished | TaskStatus::Error)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Waiting => "waiting",
            TaskStatus::Processing => "processing",
            TaskStatus::Finished => "finished",
            TaskStatus::Error => "error",
            TaskStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Task output payload.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct TaskResult {
    /// Upload target for `import/upload` tasks.
    #[serde(default)]
    pub form: Option<UploadForm>,
    /// Downloadable files for `export/url` tasks.
    #[serde(default)]
    pub files: Vec<ExportedFile>,
}

/// Where and how to POST the file for an upload task.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UploadForm {
    pub url: String,
    /// Form fields that must precede the `file` part.
    #[serde(default)]
    pub parameters: serde_json::Map<String, serde_json::Value>,
}

/// One file produced by an export task.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExportedFile {
    pub filename: String,
    #[serde(default)]
    pub size: Option<u64>,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn job_response_parses() {
        let body = json!({
            "data": {
                "id": "6559c281-ea4e-4aa8-8a72-5e1d1e5d1c2a",
                "status": "waiting",
                "tasks": [
                    {
                        "id": "t-up",
                        "name": "upload-file",
                        "operation": "import/upload",
                        "status": "waiting",
                        "result": {
                            "form": {
                                "url": "https://storage.example/upload",
                                "parameters": { "expires": 1700000000, "signature": "abc" }
                            }
                        }
                    },
                    { "id": "t-conv", "name": "convert-to-pdf", "operation": "convert", "status": "waiting", "result": null },
                    { "id": "t-exp", "name": "export-file", "operation": "export/url", "status": "waiting" }
                ]
            }
        });
        let env: Envelope<Job> = serde_json::from_value(body).unwrap();
        let job = env.data;
        assert_eq!(job.tasks.len(), 3);
        let form = job.tasks[0].upload_form().unwrap();
        assert_eq!(form.url, "https://storage.example/upload");
        assert_eq!(form.parameters["signature"], "abc");
        assert!(job.tasks[1].result.is_none());
    }

    #[test]
    fn export_task_parses_files() {
        let body = json!({
            "id": "t-exp",
            "name": "export-file",
            "status": "finished",
            "result": { "files": [ { "filename": "a.pdf", "size": 1234, "url": "https://dl.example/a.pdf" } ] }
        });
        let task: Task = serde_json::from_value(body).unwrap();
        assert_eq!(task.status, TaskStatus::Finished);
        let file = task.first_file().unwrap();
        assert_eq!(file.filename, "a.pdf");
        assert_eq!(file.size, Some(1234));
    }

    #[test]
    fn unknown_status_is_tolerated() {
        let task: Task =
            serde_json::from_value(json!({ "id": "x", "status": "paused" })).unwrap();
        assert_eq!(task.status, TaskStatus::Unknown);
        assert!(!task.status.is_terminal());
    }

    #[test]
    fn failure_uses_code_and_message() {
        let task: Task = serde_json::from_value(json!({
            "id": "x",
            "name": "convert-to-pdf",
            "status": "error",
            "code": "CONVERSION_FAILED",
            "message": "bad file"
        }))
        .unwrap();
        let msg = task.failure().to_string();
        assert!(msg.contains("convert-to-pdf"));
        assert!(msg.contains("CONVERSION_FAILED"));
        assert!(msg.contains("bad file"));
    }

    #[test]
    fn task_spec_omits_empty_fields() {
        let spec = TaskSpec::new("import/upload");
        let v = serde_json::to_value(&spec).unwrap();
        assert_eq!(v, json!({ "operation": "import/upload" }));
    }
}
