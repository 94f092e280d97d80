//! `PageView` that forwards every page change to the UI thread.

use client_core::{MessageKind, PageView};
use crossbeam_channel::Sender;

use crate::controller::events::UiEvent;

pub struct BridgeView {
    ui_tx: Sender<UiEvent>,
}

impl BridgeView {
    pub fn new(ui_tx: Sender<UiEvent>) -> Self {
        Self { ui_tx }
    }

    fn emit(&self, event: UiEvent) {
        if let Err(err) = self.ui_tx.try_send(event) {
            tracing::warn!("dropping ui event: {err}");
        }
    }
}

impl PageView for BridgeView {
    fn show_message(&mut self, text: &str, kind: MessageKind) {
        self.emit(UiEvent::Message {
            text: text.to_string(),
            kind,
        });
    }

    fn clear_message(&mut self) {
        self.emit(UiEvent::ClearMessage);
    }

    fn alert(&mut self, text: &str) {
        self.emit(UiEvent::Alert(text.to_string()));
    }

    fn set_progress_visible(&mut self, visible: bool) {
        self.emit(UiEvent::ProgressVisible(visible));
    }

    fn set_progress(&mut self, percent: u8) {
        self.emit(UiEvent::Progress(percent));
    }

    fn set_chart_controls_visible(&mut self, visible: bool) {
        self.emit(UiEvent::ChartControlsVisible(visible));
    }

    fn display_chart(&mut self, chart_url: Option<&str>) {
        self.emit(UiEvent::DisplayChart(chart_url.map(str::to_string)));
    }

    fn reset_file_input(&mut self) {
        self.emit(UiEvent::ResetFileInput);
    }

    fn navigate(&mut self, url: &str) {
        self.emit(UiEvent::Navigate(url.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use crossbeam_channel::bounded;

    use super::*;

    #[test]
    fn forwards_page_changes_in_order() {
        let (tx, rx) = bounded(8);
        let mut view = BridgeView::new(tx);
        view.set_progress_visible(true);
        view.set_progress(40);
        view.display_chart(Some("/static/uploads/bar_chart_sales.png"));
        view.navigate("/download_report/report_sales.pdf");

        let events: Vec<UiEvent> = rx.try_iter().collect();
        assert!(matches!(events[0], UiEvent::ProgressVisible(true)));
        assert!(matches!(events[1], UiEvent::Progress(40)));
        assert!(
            matches!(&events[2], UiEvent::DisplayChart(Some(url)) if url == "/static/uploads/bar_chart_sales.png")
        );
        assert!(
            matches!(&events[3], UiEvent::Navigate(url) if url == "/download_report/report_sales.pdf")
        );
    }

    #[test]
    fn full_ui_queue_drops_events_instead_of_blocking() {
        let (tx, rx) = bounded(1);
        let mut view = BridgeView::new(tx);
        view.set_progress(10);
        view.set_progress(20);
        assert_eq!(rx.try_iter().count(), 1);
    }
}
