//! Backend commands queued from UI to backend worker.

use shared::domain::ChartKind;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCommand {
    Upload { path: Option<PathBuf> },
    GenerateChart { kind: ChartKind },
    Clear,
    DownloadReport,
    FetchChartImage { url: String },
    SaveReport { url: String },
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::Upload { .. } => "upload",
            BackendCommand::GenerateChart { .. } => "generate_chart",
            BackendCommand::Clear => "clear",
            BackendCommand::DownloadReport => "download_report",
            BackendCommand::FetchChartImage { .. } => "fetch_chart_image",
            BackendCommand::SaveReport { .. } => "save_report",
        }
    }
}
