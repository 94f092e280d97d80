//! Terminal rendition of the page.

use std::io::Write;

use client_core::{MessageKind, PageView};
use url::Url;

const PROGRESS_WIDTH: usize = 30;

pub struct TerminalView<W: Write> {
    out: W,
    base_url: Url,
    progress_visible: bool,
    chart_controls_visible: bool,
    displayed_chart: Option<String>,
    pending_navigation: Option<String>,
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W, base_url: Url) -> Self {
        Self {
            out,
            base_url,
            progress_visible: false,
            chart_controls_visible: false,
            displayed_chart: None,
            pending_navigation: None,
        }
    }

    pub fn chart_controls_visible(&self) -> bool {
        self.chart_controls_visible
    }

    #[cfg(test)]
    pub fn displayed_chart(&self) -> Option<&str> {
        self.displayed_chart.as_deref()
    }

    /// Report URL the controller asked to open, if any, consumed once.
    pub fn take_navigation(&mut self) -> Option<String> {
        self.pending_navigation.take()
    }

    pub fn line(&mut self, text: &str) {
        let _ = writeln!(self.out, "{text}");
        let _ = self.out.flush();
    }

    fn absolute(&self, reference: &str) -> String {
        self.base_url
            .join(reference)
            .map(|url| url.to_string())
            .unwrap_or_else(|_| reference.to_string())
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    #[cfg(test)]
    pub fn take_output(&mut self) -> W
    where
        W: Default,
    {
        std::mem::take(&mut self.out)
    }
}

pub fn progress_bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) * PROGRESS_WIDTH / 100;
    format!(
        "[{}{}] {percent:>3}%",
        "#".repeat(filled),
        ".".repeat(PROGRESS_WIDTH - filled)
    )
}

impl<W: Write> PageView for TerminalView<W> {
    fn show_message(&mut self, text: &str, kind: MessageKind) {
        if self.progress_visible {
            let _ = writeln!(self.out);
            self.progress_visible = false;
        }
        let tag = match kind {
            MessageKind::Success => "ok",
            MessageKind::Danger => "error",
        };
        self.line(&format!("[{tag}] {text}"));
    }

    fn clear_message(&mut self) {}

    fn alert(&mut self, text: &str) {
        self.line(&format!("(!) {text}"));
    }

    fn set_progress_visible(&mut self, visible: bool) {
        self.progress_visible = visible;
    }

    fn set_progress(&mut self, percent: u8) {
        if self.progress_visible {
            let _ = write!(self.out, "\rUploading {}", progress_bar(percent));
            let _ = self.out.flush();
        }
    }

    fn set_chart_controls_visible(&mut self, visible: bool) {
        if visible && !self.chart_controls_visible {
            self.line("Chart commands available: bar, pie, line, report");
        }
        self.chart_controls_visible = visible;
    }

    fn display_chart(&mut self, chart_url: Option<&str>) {
        self.displayed_chart = chart_url.map(|url| self.absolute(url));
        if let Some(url) = self.displayed_chart.clone() {
            self.line(&format!("Chart: {url}"));
        }
    }

    fn reset_file_input(&mut self) {}

    fn navigate(&mut self, url: &str) {
        self.pending_navigation = Some(url.to_string());
    }
}
