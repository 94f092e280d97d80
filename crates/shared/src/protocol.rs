use serde::{Deserialize, Serialize};

use crate::{
    domain::{ChartKind, ChartUrl, ReportUrl, ServerFilename},
    error::{ApiError, ResponseStatus},
};

/// Multipart field name the upload endpoint reads the file from.
pub const UPLOAD_FIELD: &str = "file";

pub const UPLOAD_PATH: &str = "/upload";
pub const GENERATE_CHART_PATH: &str = "/generate_chart";
pub const CLEAR_PATH: &str = "/clear";
pub const GENERATE_REPORT_PATH: &str = "/generate_report";

/// Common `{status, message}` shape of every JSON response.
pub trait Envelope: Sized {
    fn status(&self) -> ResponseStatus;
    fn message(&self) -> Option<&str>;

    /// Splits a response into its success payload or the service's error.
    fn into_result(self) -> Result<Self, ApiError> {
        if self.status().is_success() {
            Ok(self)
        } else {
            let message = self
                .message()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or("The service reported an unspecified error.")
                .to_string();
            Err(ApiError::new(message))
        }
    }
}

macro_rules! impl_envelope {
    ($name:ident) => {
        impl Envelope for $name {
            fn status(&self) -> ResponseStatus {
                self.status
            }

            fn message(&self) -> Option<&str> {
                self.message.as_deref()
            }
        }
    };
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<ServerFilename>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateChartRequest {
    #[serde(rename = "type")]
    pub kind: ChartKind,
    pub filename: ServerFilename,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateChartResponse {
    #[serde(default)]
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_url: Option<ChartUrl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_filename: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearResponse {
    #[serde(default)]
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateReportRequest {
    pub filename: ServerFilename,
    pub charts: Vec<ChartUrl>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateReportResponse {
    #[serde(default)]
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_url: Option<ReportUrl>,
}

impl_envelope!(UploadResponse);
impl_envelope!(GenerateChartResponse);
impl_envelope!(ClearResponse);
impl_envelope!(GenerateReportResponse);
