use engine_logging::{engine_debug, engine_trace};
use futures_util::StreamExt;
use merger_core::{ArchiveFile, JobHandle, RemoteStatus, ARCHIVE_CONTENT_TYPE};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Artifact, ClientSettings, FailureKind, ServiceError, StatusReply};

/// The remote processing service, as seen by the job controller.
#[async_trait::async_trait]
pub trait ProcessingService: Send + Sync {
    /// Uploads the archive and returns where the service stored it.
    async fn upload(&self, file: &ArchiveFile) -> Result<JobHandle, ServiceError>;

    /// Asks the service to start processing a previously uploaded archive.
    async fn start_processing(&self, zip_path: &str) -> Result<(), ServiceError>;

    /// Reads the status of the running job.
    async fn query_status(&self) -> Result<StatusReply, ServiceError>;

    /// Fetches one of the artifacts of a completed job.
    async fn download(&self, artifact: Artifact) -> Result<Vec<u8>, ServiceError>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    zip_path: String,
    #[serde(default)]
    file_count: u32,
}

#[derive(Debug, Serialize)]
struct ProcessRequest<'a> {
    zip_path: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// [`ProcessingService`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpService {
    settings: ClientSettings,
    client: reqwest::Client,
}

impl HttpService {
    pub fn new(settings: ClientSettings) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ServiceError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    fn endpoint(&self, route: &str) -> Result<Url, ServiceError> {
        let mut base = self.settings.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        Url::parse(&base)
            .and_then(|url| url.join(route))
            .map_err(|err| ServiceError::new(FailureKind::InvalidUrl, err.to_string()))
    }
}

#[async_trait::async_trait]
impl ProcessingService for HttpService {
    async fn upload(&self, file: &ArchiveFile) -> Result<JobHandle, ServiceError> {
        let url = self.endpoint("upload")?;
        let bytes = tokio::fs::read(&file.path)
            .await
            .map_err(|err| ServiceError::new(FailureKind::Io, err.to_string()))?;
        engine_debug!("Uploading {} bytes to {}", bytes.len(), url);

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file.name.clone())
            .mime_str(ARCHIVE_CONTENT_TYPE)
            .map_err(map_reqwest_error)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;
        let body: UploadResponse = read_json(response).await?;

        Ok(JobHandle {
            zip_path: body.zip_path,
            file_count: body.file_count,
        })
    }

    async fn start_processing(&self, zip_path: &str) -> Result<(), ServiceError> {
        let url = self.endpoint("process")?;
        let payload = serde_json::to_vec(&ProcessRequest { zip_path })
            .map_err(|err| ServiceError::new(FailureKind::Decode, err.to_string()))?;

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn query_status(&self) -> Result<StatusReply, ServiceError> {
        let url = self.endpoint("status")?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            engine_trace!("Status not written yet");
            return Ok(StatusReply::NotYetAvailable);
        }
        let response = ensure_success(response).await?;
        let status: RemoteStatus = read_json(response).await?;
        Ok(StatusReply::Ready(status))
    }

    async fn download(&self, artifact: Artifact) -> Result<Vec<u8>, ServiceError> {
        let url = self.endpoint(artifact.route())?;
        let max_bytes = self.settings.max_download_bytes;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;

        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(ServiceError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(content_len),
                    },
                    format!("{artifact} is too large"),
                ));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(ServiceError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(next_len),
                    },
                    format!("{artifact} is too large"),
                ));
            }
            bytes.extend_from_slice(&chunk);
        }
        engine_debug!("Downloaded {} ({} bytes)", artifact, bytes.len());
        Ok(bytes)
    }
}

/// Turns a non-success response into a definite failure carrying the body's
/// `error` field, or the status text when the body has none.
async fn ensure_success(response: Response) -> Result<Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.bytes().await.unwrap_or_default();
    let message = serde_json::from_slice::<ErrorBody>(&body)
        .ok()
        .and_then(|body| body.error)
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_default();
    Err(ServiceError::new(
        FailureKind::HttpStatus(status.as_u16()),
        message,
    ))
}

async fn read_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, ServiceError> {
    let body = response.bytes().await.map_err(map_reqwest_error)?;
    serde_json::from_slice(&body)
        .map_err(|err| ServiceError::new(FailureKind::Decode, err.to_string()))
}

fn map_reqwest_error(err: reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        return ServiceError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ServiceError::new(FailureKind::Decode, err.to_string());
    }
    ServiceError::new(FailureKind::Network, err.to_string())
}
