//! Page controller: binds user actions to service calls and reflects the
//! results through a [`PageView`].

use std::sync::Arc;

use shared::domain::{ChartKind, ChartUrl, ServerFilename};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{error::ClientError, ChartService, ProgressSink, SelectedFile};

pub const SELECT_FILE_ALERT: &str = "Please select a file to upload.";
pub const UPLOAD_FIRST_ALERT: &str = "Please upload a file first.";
pub const NO_CHARTS_ALERT: &str =
    "Please generate at least one chart before downloading the report.";
pub const UPLOAD_HTTP_FAILURE: &str = "Upload failed. Please try again.";
pub const UPLOAD_TRANSPORT_FAILURE: &str = "An error occurred during the upload.";
pub const CLEAR_FAILURE: &str = "An error occurred while clearing files.";
pub const REPORT_FAILURE: &str = "An error occurred while generating the report.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Success,
    Danger,
}

/// Everything the controller is allowed to do to the page.
pub trait PageView {
    fn show_message(&mut self, text: &str, kind: MessageKind);
    fn clear_message(&mut self);
    /// Blocking notice for actions refused before any request is made.
    fn alert(&mut self, text: &str);
    fn set_progress_visible(&mut self, visible: bool);
    fn set_progress(&mut self, percent: u8);
    fn set_chart_controls_visible(&mut self, visible: bool);
    /// `None` clears the chart surface.
    fn display_chart(&mut self, chart_url: Option<&str>);
    fn reset_file_input(&mut self);
    fn navigate(&mut self, url: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Succeeded,
    /// Refused locally; no request was issued.
    Blocked,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    uploaded_filename: Option<ServerFilename>,
    chart_urls: Vec<ChartUrl>,
}

impl SessionState {
    pub fn uploaded_filename(&self) -> Option<&ServerFilename> {
        self.uploaded_filename.as_ref()
    }

    pub fn chart_urls(&self) -> &[ChartUrl] {
        &self.chart_urls
    }
}

pub struct PageController<S, V> {
    service: S,
    view: V,
    session: SessionState,
}

impl<S: ChartService, V: PageView> PageController<S, V> {
    pub fn new(service: S, view: V) -> Self {
        Self {
            service,
            view,
            session: SessionState::default(),
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub async fn upload(&mut self, selection: Option<SelectedFile>) -> ActionOutcome {
        let Some(file) = selection else {
            self.view.alert(SELECT_FILE_ALERT);
            return ActionOutcome::Blocked;
        };

        self.view.set_progress_visible(true);
        self.view.set_progress(0);
        self.view.clear_message();
        self.view.set_chart_controls_visible(false);
        self.session.chart_urls.clear();
        self.view.display_chart(None);

        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<u8>();
        let sink: ProgressSink = Arc::new(move |pct| {
            let _ = progress_tx.send(pct);
        });

        let mut upload = self.service.upload(file, sink);
        let result = loop {
            tokio::select! {
                Some(pct) = progress_rx.recv() => self.view.set_progress(pct),
                result = &mut upload => break result,
            }
        };
        drop(upload);
        while let Ok(pct) = progress_rx.try_recv() {
            self.view.set_progress(pct);
        }

        match result {
            Ok(outcome) => {
                info!(filename = %outcome.filename, "upload accepted");
                self.view.show_message(&outcome.message, MessageKind::Success);
                self.session.uploaded_filename = Some(outcome.filename);
                self.view.set_chart_controls_visible(true);
                ActionOutcome::Succeeded
            }
            Err(err) => {
                warn!(error = %err, "upload failed");
                let message = match &err {
                    ClientError::HttpStatus(_) => UPLOAD_HTTP_FAILURE,
                    ClientError::Rejected(api) => api.message.as_str(),
                    _ => UPLOAD_TRANSPORT_FAILURE,
                };
                self.view.show_message(message, MessageKind::Danger);
                ActionOutcome::Failed
            }
        }
    }

    pub async fn generate_chart(&mut self, kind: ChartKind) -> ActionOutcome {
        let Some(filename) = self.session.uploaded_filename.clone() else {
            self.view.alert(UPLOAD_FIRST_ALERT);
            return ActionOutcome::Blocked;
        };

        match self.service.generate_chart(kind, &filename).await {
            Ok(outcome) => {
                let message = format!("{} generated successfully.", kind.title());
                self.view.show_message(&message, MessageKind::Success);
                self.view.display_chart(Some(outcome.chart_url.as_str()));
                self.session.chart_urls.push(outcome.chart_url);
                debug!(charts = self.session.chart_urls.len(), "chart appended to session");
                ActionOutcome::Succeeded
            }
            Err(err) => {
                warn!(kind = %kind, error = %err, "chart generation failed");
                let fallback = format!("An error occurred while generating the {}.", kind.label());
                self.report_failure(&err, &fallback);
                ActionOutcome::Failed
            }
        }
    }

    pub async fn clear(&mut self) -> ActionOutcome {
        match self.service.clear().await {
            Ok(message) => {
                info!("server-side files cleared");
                self.view.show_message(&message, MessageKind::Success);
                self.session = SessionState::default();
                self.view.display_chart(None);
                self.view.set_chart_controls_visible(false);
                self.view.reset_file_input();
                ActionOutcome::Succeeded
            }
            Err(err) => {
                warn!(error = %err, "clear failed");
                self.report_failure(&err, CLEAR_FAILURE);
                ActionOutcome::Failed
            }
        }
    }

    pub async fn download_report(&mut self) -> ActionOutcome {
        if self.session.chart_urls.is_empty() {
            self.view.alert(NO_CHARTS_ALERT);
            return ActionOutcome::Blocked;
        }
        let filename = self
            .session
            .uploaded_filename
            .clone()
            .unwrap_or_else(|| ServerFilename::new(""));

        match self
            .service
            .generate_report(&filename, &self.session.chart_urls)
            .await
        {
            Ok(report_url) => {
                info!(report_url = %report_url, "report ready");
                self.view.navigate(report_url.as_str());
                ActionOutcome::Succeeded
            }
            Err(err) => {
                warn!(error = %err, "report generation failed");
                self.report_failure(&err, REPORT_FAILURE);
                ActionOutcome::Failed
            }
        }
    }

    fn report_failure(&mut self, err: &ClientError, fallback: &str) {
        let message = err.service_message().unwrap_or(fallback);
        self.view.show_message(message, MessageKind::Danger);
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
