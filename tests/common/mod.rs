//! In-memory stand-in for the CloudConvert API.
//!
//! Jobs are numbered `job-1`, `job-2`, … and their tasks are
//! `<job>-upload`, `<job>-convert`, `<job>-export`. The "converted" PDF is
//! `%PDF-converted\n` followed by the uploaded bytes, so tests can tell which
//! input produced which output.

#![allow(dead_code)]

use async_trait::async_trait;
use cloudconvert_pdf::api::{
    ExportedFile, Job, JobRequest, Task, TaskResult, TaskStatus, UploadForm,
};
use cloudconvert_pdf::pipeline::job::{CONVERT_TASK, EXPORT_TASK, UPLOAD_TASK};
use cloudconvert_pdf::{CloudApi, ConvertError, ConverterConfig};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::io::{AsyncWrite, AsyncWriteExt};

pub const PDF_PREFIX: &[u8] = b"%PDF-converted\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateJob,
    GetTask(String),
    Upload { task_id: String, path: PathBuf },
    Download(String),
}

/// How the export task of a job ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Export {
    #[default]
    Finish,
    /// Ends in `error`.
    Fail,
    /// Stays `processing` forever.
    Never,
    /// Finishes with an empty file list.
    NoFiles,
}

#[derive(Default)]
pub struct FakeCloud {
    /// Role names left out of created jobs.
    pub omit_tasks: Vec<&'static str>,
    /// Polls answered with `processing` before the export task finishes.
    pub export_polls: usize,
    pub export: Export,
    /// Only apply `export` to this job number (1-based); others finish.
    pub export_only_on_job: Option<usize>,
    pub fail_download: bool,

    pub jobs: AtomicUsize,
    pub calls: Mutex<Vec<Call>>,
    pub polls: Mutex<HashMap<String, usize>>,
    pub uploads: Mutex<HashMap<String, Vec<u8>>>,
    pub requests: Mutex<Vec<JobRequest>>,
}

impl FakeCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn job_of(task_id: &str) -> &str {
        task_id.rsplit_once('-').map(|(job, _)| job).unwrap_or(task_id)
    }

    fn job_number(job_id: &str) -> usize {
        job_id
            .trim_start_matches("job-")
            .parse()
            .unwrap_or_default()
    }

    fn export_mode(&self, job_id: &str) -> Export {
        match self.export_only_on_job {
            Some(n) if n != Self::job_number(job_id) => Export::Finish,
            _ => self.export,
        }
    }

    fn task(id: String, name: &str, status: TaskStatus) -> Task {
        Task {
            id,
            name: name.to_string(),
            operation: String::new(),
            status,
            code: None,
            message: None,
            result: None,
        }
    }

    fn upload_task(&self, job_id: &str) -> Task {
        let mut task = Self::task(format!("{job_id}-upload"), UPLOAD_TASK, TaskStatus::Waiting);
        let mut parameters = serde_json::Map::new();
        parameters.insert("signature".into(), serde_json::json!("sig"));
        task.operation = "import/upload".into();
        task.result = Some(TaskResult {
            form: Some(UploadForm {
                url: format!("https://storage.test/{job_id}"),
                parameters,
            }),
            files: vec![],
        });
        task
    }

    fn export_task(&self, job_id: &str) -> Task {
        let id = format!("{job_id}-export");
        let polls = {
            let mut polls = self.polls.lock().unwrap();
            let n = polls.entry(id.clone()).or_default();
            *n += 1;
            *n
        };

        let mode = self.export_mode(job_id);
        if mode == Export::Never || polls <= self.export_polls {
            return Self::task(id, EXPORT_TASK, TaskStatus::Processing);
        }

        match mode {
            Export::Fail => {
                let mut t = Self::task(id, EXPORT_TASK, TaskStatus::Error);
                t.code = Some("CONVERSION_FAILED".into());
                t.message = Some("the file could not be converted".into());
                t
            }
            Export::NoFiles => {
                let mut t = Self::task(id, EXPORT_TASK, TaskStatus::Finished);
                t.result = Some(TaskResult::default());
                t
            }
            _ => {
                let mut t = Self::task(id, EXPORT_TASK, TaskStatus::Finished);
                t.result = Some(TaskResult {
                    form: None,
                    files: vec![ExportedFile {
                        filename: "out.pdf".into(),
                        size: None,
                        url: format!("https://dl.test/{job_id}/out.pdf"),
                    }],
                });
                t
            }
        }
    }
}

#[async_trait]
impl CloudApi for FakeCloud {
    async fn create_job(&self, request: &JobRequest) -> Result<Job, ConvertError> {
        self.record(Call::CreateJob);
        self.requests.lock().unwrap().push(request.clone());

        let n = self.jobs.fetch_add(1, Ordering::SeqCst) + 1;
        let job_id = format!("job-{n}");
        let tasks = [
            (UPLOAD_TASK, format!("{job_id}-upload")),
            (CONVERT_TASK, format!("{job_id}-convert")),
            (EXPORT_TASK, format!("{job_id}-export")),
        ]
        .into_iter()
        .filter(|(name, _)| !self.omit_tasks.contains(name))
        .map(|(name, id)| Self::task(id, name, TaskStatus::Waiting))
        .collect();

        Ok(Job {
            id: job_id,
            status: Some("waiting".into()),
            tasks,
        })
    }

    async fn get_task(&self, task_id: &str) -> Result<Task, ConvertError> {
        self.record(Call::GetTask(task_id.to_string()));
        let job_id = Self::job_of(task_id).to_string();
        if task_id.ends_with("-upload") {
            Ok(self.upload_task(&job_id))
        } else if task_id.ends_with("-export") {
            Ok(self.export_task(&job_id))
        } else {
            Err(ConvertError::Api {
                status: 404,
                message: format!("no such task {task_id}"),
            })
        }
    }

    async fn upload(&self, task: &Task, path: &Path) -> Result<(), ConvertError> {
        self.record(Call::Upload {
            task_id: task.id.clone(),
            path: path.to_path_buf(),
        });
        if task.upload_form().is_none() {
            return Err(ConvertError::NoUploadForm {
                task_id: task.id.clone(),
            });
        }
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ConvertError::InputReadFailed {
                path: path.to_path_buf(),
                source,
            })?;
        self.uploads
            .lock()
            .unwrap()
            .insert(Self::job_of(&task.id).to_string(), bytes);
        Ok(())
    }

    async fn download(
        &self,
        url: &str,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64, ConvertError> {
        self.record(Call::Download(url.to_string()));

        let job_id = url
            .trim_start_matches("https://dl.test/")
            .split('/')
            .next()
            .unwrap_or_default()
            .to_string();

        let mut body = PDF_PREFIX.to_vec();
        body.extend(self.uploads.lock().unwrap().get(&job_id).cloned().unwrap_or_default());

        if self.fail_download {
            // Half the body arrives before the connection drops.
            sink.write_all(&body[..body.len() / 2]).await.ok();
            return Err(ConvertError::DownloadFailed {
                url: url.to_string(),
                reason: "connection reset".into(),
            });
        }

        sink.write_all(&body).await.map_err(|e| ConvertError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(body.len() as u64)
    }
}

/// Route library logs to the test harness; `RUST_LOG` picks the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Config with a fast poll schedule for tests.
pub fn fast_config() -> ConverterConfig {
    ConverterConfig::builder()
        .poll_interval_ms(1)
        .max_poll_interval_ms(4)
        .wait_timeout_secs(10)
        .build()
        .unwrap()
}

/// Expected output bytes for an input with `content`.
pub fn converted(content: &[u8]) -> Vec<u8> {
    let mut v = PDF_PREFIX.to_vec();
    v.extend_from_slice(content);
    v
}

/// Names of leftover `.part` files under `dir`.
pub fn part_files(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.ends_with(".part"))
        .collect()
}
