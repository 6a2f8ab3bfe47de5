//! `reqwest`-backed [`CloudApi`] implementation for CloudConvert v2.
//!
//! API calls carry the bearer key; the upload form URL and the export URL
//! are pre-signed storage URLs and are requested without it.

use super::types::{ApiErrorBody, Envelope, Job, JobRequest, Task};
use super::CloudApi;
use crate::config::ConverterConfig;
use crate::credentials::{ApiKey, Endpoint};
use crate::error::ConvertError;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use std::path::Path;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// HTTP client for the CloudConvert API.
pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
    api_key: ApiKey,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key)
            .finish()
    }
}

impl HttpClient {
    /// Build a client for `endpoint` using the config's request timeout.
    pub fn new(
        api_key: ApiKey,
        endpoint: &Endpoint,
        config: &ConverterConfig,
    ) -> Result<Self, ConvertError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("ccpdf/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: endpoint.base_url().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl CloudApi for HttpClient {
    async fn create_job(&self, request: &JobRequest) -> Result<Job, ConvertError> {
        let url = self.url("jobs");
        debug!("POST {}", url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(self.api_key.expose())
            .json(request)
            .send()
            .await?;
        decode_data(response).await
    }

    async fn get_task(&self, task_id: &str) -> Result<Task, ConvertError> {
        let url = self.url(&format!("tasks/{task_id}"));
        debug!("GET {}", url);
        let response = self
            .http
            .get(&url)
            .bearer_auth(self.api_key.expose())
            .send()
            .await?;
        decode_data(response).await
    }

    async fn upload(&self, task: &Task, path: &Path) -> Result<(), ConvertError> {
        let form_spec = task.upload_form().ok_or_else(|| ConvertError::NoUploadForm {
            task_id: task.id.clone(),
        })?;

        let read_err = |source| ConvertError::InputReadFailed {
            path: path.to_path_buf(),
            source,
        };
        let file = tokio::fs::File::open(path).await.map_err(read_err)?;
        let len = file.metadata().await.map_err(read_err)?.len();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        // Storage backends validate the signed fields, so they must come
        // before the file part.
        let mut form = Form::new();
        for (key, value) in &form_spec.parameters {
            let value = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            form = form.text(key.clone(), value);
        }
        let part = Part::stream_with_length(reqwest::Body::from(file), len).file_name(file_name);
        form = form.part("file", part);

        debug!("POST {} ({} bytes)", form_spec.url, len);
        let response = self.http.post(&form_spec.url).multipart(form).send().await?;
        let status = response.status();
        if status.is_success() || status.is_redirection() {
            return Ok(());
        }
        Err(error_from_response(response).await)
    }

    async fn download(
        &self,
        url: &str,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64, ConvertError> {
        let failed = |reason: String| ConvertError::DownloadFailed {
            url: url.to_string(),
            reason,
        };

        debug!("GET {}", url);
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(failed(format!("HTTP {}", response.status())));
        }

        let mut written: u64 = 0;
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| failed(e.to_string()))?;
            sink.write_all(&chunk)
                .await
                .map_err(|e| failed(format!("writing output: {e}")))?;
            written += chunk.len() as u64;
        }
        sink.flush()
            .await
            .map_err(|e| failed(format!("writing output: {e}")))?;

        Ok(written)
    }
}

/// Check the status, then unwrap the `{"data": …}` envelope.
async fn decode_data<T: DeserializeOwned>(response: Response) -> Result<T, ConvertError> {
    if !response.status().is_success() {
        return Err(error_from_response(response).await);
    }
    let text = response.text().await?;
    serde_json::from_str::<Envelope<T>>(&text)
        .map(|env| env.data)
        .map_err(|e| ConvertError::InvalidResponse(e.to_string()))
}

async fn error_from_response(response: Response) -> ConvertError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = api_message(&body);
    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        ConvertError::Unauthorized {
            status: status.as_u16(),
            message,
        }
    } else {
        ConvertError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

/// Pull `message` (and `code`) out of an error body, falling back to the raw text.
fn api_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(ApiErrorBody {
            message: Some(message),
            code: Some(code),
        }) => format!("{message} ({code})"),
        Ok(ApiErrorBody {
            message: Some(message),
            code: None,
        }) => message,
        _ if body.trim().is_empty() => "empty response body".to_string(),
        _ => body.trim().chars().take(200).collect(),
    }
}
