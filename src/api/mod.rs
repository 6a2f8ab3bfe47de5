//! The remote conversion service boundary.
//!
//! [`CloudApi`] is the seam between the conversion pipeline and the network:
//! the pipeline only ever talks to a `&dyn CloudApi`-shaped value passed in
//! by the caller, never to a global client. [`HttpClient`] is the real
//! implementation for the CloudConvert v2 REST API; tests substitute a fake.
//!
//! ```text
//! create_job ──▶ get_task(upload) ──▶ upload ──▶ get_task(export)… ──▶ download
//!  POST /jobs     GET /tasks/{id}     POST form   GET /tasks/{id}      GET url
//! ```

pub mod http;
pub mod types;

pub use http::HttpClient;
pub use types::{
    ExportedFile, Job, JobRequest, Task, TaskResult, TaskSpec, TaskStatus, UploadForm,
};

use crate::error::ConvertError;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncWrite;

/// Operations the converter needs from the remote service.
#[async_trait]
pub trait CloudApi: Send + Sync {
    /// Create a job from a task graph; returns the job with its task stubs.
    async fn create_job(&self, request: &JobRequest) -> Result<Job, ConvertError>;

    /// Fetch the current state of a task.
    async fn get_task(&self, task_id: &str) -> Result<Task, ConvertError>;

    /// Send the bytes of `path` to an `import/upload` task.
    async fn upload(&self, task: &Task, path: &Path) -> Result<(), ConvertError>;

    /// Fetch `url` into `sink`, returning the number of bytes written.
    async fn download(
        &self,
        url: &str,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64, ConvertError>;
}

#[async_trait]
impl<T: CloudApi + ?Sized> CloudApi for Arc<T> {
    async fn create_job(&self, request: &JobRequest) -> Result<Job, ConvertError> {
        (**self).create_job(request).await
    }

    async fn get_task(&self, task_id: &str) -> Result<Task, ConvertError> {
        (**self).get_task(task_id).await
    }

    async fn upload(&self, task: &Task, path: &Path) -> Result<(), ConvertError> {
        (**self).upload(task, path).await
    }

    async fn download(
        &self,
        url: &str,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64, ConvertError> {
        (**self).download(url, sink).await
    }
}
