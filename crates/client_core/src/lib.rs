use std::path::Path;

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Body, Client, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::{ChartKind, ChartUrl, ReportUrl, ServerFilename},
    protocol::{
        ClearResponse, Envelope, GenerateChartRequest, GenerateChartResponse,
        GenerateReportRequest, GenerateReportResponse, UploadResponse, CLEAR_PATH,
        GENERATE_CHART_PATH, GENERATE_REPORT_PATH, UPLOAD_FIELD, UPLOAD_PATH,
    },
};
use tracing::{debug, info, warn};
use url::Url;

pub mod config;
pub mod controller;
pub mod error;
pub mod progress;

pub use controller::{ActionOutcome, MessageKind, PageController, PageView, SessionState};
pub use error::ClientError;
pub use progress::ProgressSink;

use progress::{progress_body_stream, UPLOAD_CHUNK_BYTES};

const DEFAULT_UPLOAD_MESSAGE: &str = "File uploaded successfully.";

/// A file picked by the user, read into memory ahead of upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub async fn load(path: &Path) -> Result<Self, ClientError> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self { name, bytes })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub filename: ServerFilename,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartOutcome {
    pub chart_url: ChartUrl,
}

/// File name to save a downloaded report under: the last path segment of
/// its URL, or `report.pdf` when the URL ends in a slash.
pub fn report_file_name(reference: &str) -> String {
    reference
        .split(['?', '#'])
        .next()
        .and_then(|path| path.rsplit('/').next())
        .filter(|name| !name.is_empty())
        .unwrap_or("report.pdf")
        .to_string()
}

/// The four page endpoints plus raw asset fetches.
#[async_trait]
pub trait ChartService: Send + Sync {
    async fn upload(
        &self,
        file: SelectedFile,
        progress: ProgressSink,
    ) -> Result<UploadOutcome, ClientError>;
    async fn generate_chart(
        &self,
        kind: ChartKind,
        filename: &ServerFilename,
    ) -> Result<ChartOutcome, ClientError>;
    async fn clear(&self) -> Result<String, ClientError>;
    async fn generate_report(
        &self,
        filename: &ServerFilename,
        charts: &[ChartUrl],
    ) -> Result<ReportUrl, ClientError>;
    /// GET a server-provided reference (chart image, report) as bytes.
    async fn fetch(&self, reference: &str) -> Result<Vec<u8>, ClientError>;
}

#[derive(Debug, Clone)]
pub struct ChartServiceClient {
    http: Client,
    base_url: Url,
}

impl ChartServiceClient {
    pub fn new(server_url: &str) -> Result<Self, ClientError> {
        Self::with_http_client(Client::new(), server_url)
    }

    pub fn with_http_client(http: Client, server_url: &str) -> Result<Self, ClientError> {
        let mut normalized = server_url.trim().to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        let base_url = Url::parse(&normalized).map_err(|source| ClientError::InvalidUrl {
            url: server_url.to_string(),
            source,
        })?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves a server-provided reference the way a browser would resolve
    /// it against the page origin.
    pub fn resolve(&self, reference: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(reference)
            .map_err(|source| ClientError::InvalidUrl {
                url: reference.to_string(),
                source,
            })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.resolve(path.trim_start_matches('/'))
    }

    async fn post_json<B, R>(&self, path: &str, body: Option<&B>) -> Result<R, ClientError>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned + Envelope,
    {
        let url = self.endpoint(path)?;
        let mut request = self.http.post(url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        debug!(path, status = status.as_u16(), len = bytes.len(), "service response");

        // Error statuses still carry a JSON envelope worth surfacing.
        let envelope: R = match serde_json::from_slice(&bytes) {
            Ok(envelope) => envelope,
            Err(err) if status.is_success() => return Err(ClientError::Decode(err.to_string())),
            Err(_) => return Err(ClientError::HttpStatus(status.as_u16())),
        };
        Ok(envelope.into_result()?)
    }
}

#[async_trait]
impl ChartService for ChartServiceClient {
    async fn upload(
        &self,
        file: SelectedFile,
        progress: ProgressSink,
    ) -> Result<UploadOutcome, ClientError> {
        let url = self.endpoint(UPLOAD_PATH)?;
        let total = file.bytes.len() as u64;
        let mime = mime_guess::from_path(&file.name).first_or_octet_stream();
        info!(file = %file.name, bytes = total, "uploading data file");

        let body = Body::wrap_stream(progress_body_stream(file.bytes, UPLOAD_CHUNK_BYTES, progress));
        let part = Part::stream_with_length(body, total)
            .file_name(file.name)
            .mime_str(mime.as_ref())?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        let response = self.http.post(url).multipart(form).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            warn!(status = status.as_u16(), "upload rejected by transport status");
            return Err(ClientError::HttpStatus(status.as_u16()));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|err| ClientError::Decode(err.to_string()))?;
        let body = body.into_result()?;
        let filename = body
            .filename
            .ok_or_else(|| ClientError::Decode("upload response missing filename".to_string()))?;
        Ok(UploadOutcome {
            filename,
            message: body
                .message
                .unwrap_or_else(|| DEFAULT_UPLOAD_MESSAGE.to_string()),
        })
    }

    async fn generate_chart(
        &self,
        kind: ChartKind,
        filename: &ServerFilename,
    ) -> Result<ChartOutcome, ClientError> {
        let request = GenerateChartRequest {
            kind,
            filename: filename.clone(),
        };
        let body: GenerateChartResponse = self
            .post_json(GENERATE_CHART_PATH, Some(&request))
            .await?;
        let chart_url = body
            .chart_url
            .ok_or_else(|| ClientError::Decode("chart response missing chart_url".to_string()))?;
        info!(kind = %kind, chart_url = %chart_url, "chart generated");
        Ok(ChartOutcome { chart_url })
    }

    async fn clear(&self) -> Result<String, ClientError> {
        let body: ClearResponse = self.post_json::<(), _>(CLEAR_PATH, None).await?;
        Ok(body.message.unwrap_or_default())
    }

    async fn generate_report(
        &self,
        filename: &ServerFilename,
        charts: &[ChartUrl],
    ) -> Result<ReportUrl, ClientError> {
        let request = GenerateReportRequest {
            filename: filename.clone(),
            charts: charts.to_vec(),
        };
        let body: GenerateReportResponse = self
            .post_json(GENERATE_REPORT_PATH, Some(&request))
            .await?;
        body.report_url
            .ok_or_else(|| ClientError::Decode("report response missing report_url".to_string()))
    }

    async fn fetch(&self, reference: &str) -> Result<Vec<u8>, ClientError> {
        let url = self.resolve(reference)?;
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::HttpStatus(status.as_u16()));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
