use std::path::PathBuf;

use client_core::MessageKind;
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use egui::TextureHandle;
use shared::domain::ChartKind;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{PreviewImage, UiError, UiErrorContext, UiEvent};
use crate::controller::orchestration::dispatch_backend_command;

const SUCCESS_COLOR: egui::Color32 = egui::Color32::from_rgb(25, 135, 84);
const DANGER_COLOR: egui::Color32 = egui::Color32::from_rgb(220, 53, 69);

#[derive(Debug, Clone)]
pub struct StartupConfig {
    pub server_url: String,
}

enum ChartSurface {
    Empty,
    Loading { url: String },
    Decoded { url: String, image: PreviewImage },
    Ready {
        url: String,
        texture: TextureHandle,
        size: egui::Vec2,
    },
    Failed { url: String, reason: String },
}

impl ChartSurface {
    fn url(&self) -> Option<&str> {
        match self {
            ChartSurface::Empty => None,
            ChartSurface::Loading { url }
            | ChartSurface::Decoded { url, .. }
            | ChartSurface::Ready { url, .. }
            | ChartSurface::Failed { url, .. } => Some(url.as_str()),
        }
    }
}

pub struct ChartDeckApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    server_url: String,
    status: String,
    busy: bool,
    selected_file: Option<PathBuf>,
    message: Option<(String, MessageKind)>,
    alert: Option<String>,
    progress_visible: bool,
    progress: u8,
    chart_controls_visible: bool,
    chart: ChartSurface,
}

impl ChartDeckApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        config: StartupConfig,
    ) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            server_url: config.server_url,
            status: "Starting...".to_string(),
            busy: false,
            selected_file: None,
            message: None,
            alert: None,
            progress_visible: false,
            progress: 0,
            chart_controls_visible: false,
            chart: ChartSurface::Empty,
        }
    }

    fn dispatch(&mut self, cmd: BackendCommand) {
        dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status);
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            self.apply_event(event);
        }
    }

    fn apply_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::Info(message) => self.status = message,
            UiEvent::Error(err) => {
                tracing::warn!(category = ?err.category(), context = ?err.context(), "{}", err.message());
                self.status = err.status_text();
            }
            UiEvent::Message { text, kind } => self.message = Some((text, kind)),
            UiEvent::ClearMessage => self.message = None,
            UiEvent::Alert(text) => self.alert = Some(text),
            UiEvent::ProgressVisible(visible) => self.progress_visible = visible,
            UiEvent::Progress(percent) => self.progress = percent.min(100),
            UiEvent::ChartControlsVisible(visible) => self.chart_controls_visible = visible,
            UiEvent::DisplayChart(None) => self.chart = ChartSurface::Empty,
            UiEvent::DisplayChart(Some(url)) => {
                self.chart = ChartSurface::Loading { url: url.clone() };
                self.dispatch(BackendCommand::FetchChartImage { url });
            }
            UiEvent::ResetFileInput => self.selected_file = None,
            UiEvent::Navigate(url) => {
                self.status = "Downloading report...".to_string();
                self.dispatch(BackendCommand::SaveReport { url });
            }
            UiEvent::ChartImageLoaded { url, image } => {
                // A newer chart may have replaced the one this image belongs to.
                if self.chart.url() == Some(url.as_str()) {
                    self.chart = ChartSurface::Decoded { url, image };
                }
            }
            UiEvent::ChartImageFailed { url, reason } => {
                if self.chart.url() == Some(url.as_str()) {
                    self.status =
                        UiError::from_message(UiErrorContext::ChartPreview, reason.clone())
                            .status_text();
                    self.chart = ChartSurface::Failed { url, reason };
                }
            }
            UiEvent::Busy(busy) => self.busy = busy,
        }
    }

    fn upload_textures(&mut self, ctx: &egui::Context) {
        if !matches!(self.chart, ChartSurface::Decoded { .. }) {
            return;
        }
        let ChartSurface::Decoded { url, image } =
            std::mem::replace(&mut self.chart, ChartSurface::Empty)
        else {
            return;
        };
        let color_image =
            egui::ColorImage::from_rgba_unmultiplied([image.width, image.height], &image.rgba);
        let texture = ctx.load_texture(
            format!("chart:{url}"),
            color_image,
            egui::TextureOptions::LINEAR,
        );
        self.chart = ChartSurface::Ready {
            url,
            texture,
            size: egui::vec2(image.width as f32, image.height as f32),
        };
    }

    fn show_upload_form(&mut self, ui: &mut egui::Ui) {
        ui.heading("Upload data");
        ui.horizontal(|ui| {
            if ui.button("Choose file...").clicked() {
                if let Some(path) = rfd::FileDialog::new()
                    .add_filter("Data files", &["csv", "xlsx"])
                    .pick_file()
                {
                    self.selected_file = Some(path);
                }
            }
            let chosen = self
                .selected_file
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "No file chosen".to_string());
            ui.label(chosen);

            if ui
                .add_enabled(!self.busy, egui::Button::new("Upload"))
                .clicked()
            {
                let path = self.selected_file.clone();
                self.dispatch(BackendCommand::Upload { path });
            }
        });

        if self.progress_visible {
            ui.add(
                egui::ProgressBar::new(f32::from(self.progress) / 100.0)
                    .text(format!("{}%", self.progress)),
            );
        }
    }

    fn show_message_banner(&mut self, ui: &mut egui::Ui) {
        let Some((text, kind)) = self.message.clone() else {
            return;
        };
        let color = match kind {
            MessageKind::Success => SUCCESS_COLOR,
            MessageKind::Danger => DANGER_COLOR,
        };
        egui::Frame::group(ui.style())
            .stroke(egui::Stroke::new(1.0, color))
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.colored_label(color, text);
                    if ui.small_button("x").on_hover_text("Dismiss").clicked() {
                        self.message = None;
                    }
                });
            });
    }

    fn show_chart_controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if self.chart_controls_visible {
                for kind in ChartKind::ALL {
                    if ui
                        .add_enabled(!self.busy, egui::Button::new(kind.title()))
                        .clicked()
                    {
                        self.dispatch(BackendCommand::GenerateChart { kind });
                    }
                }
                if ui
                    .add_enabled(!self.busy, egui::Button::new("Download Report"))
                    .clicked()
                {
                    self.dispatch(BackendCommand::DownloadReport);
                }
            }
            if ui
                .add_enabled(!self.busy, egui::Button::new("Clear"))
                .clicked()
            {
                self.dispatch(BackendCommand::Clear);
            }
        });
    }

    fn show_chart_canvas(&self, ui: &mut egui::Ui) {
        egui::Frame::canvas(ui.style()).show(ui, |ui| {
            let available = ui.available_size();
            ui.set_min_size(available);
            match &self.chart {
                ChartSurface::Empty => {
                    ui.centered_and_justified(|ui| {
                        ui.weak("No chart yet");
                    });
                }
                ChartSurface::Loading { .. } | ChartSurface::Decoded { .. } => {
                    ui.centered_and_justified(|ui| {
                        ui.spinner();
                    });
                }
                ChartSurface::Ready { texture, size, .. } => {
                    let scale = (available.x / size.x).min(available.y / size.y).min(1.0);
                    ui.centered_and_justified(|ui| {
                        ui.add(egui::Image::new(texture).fit_to_exact_size(*size * scale));
                    });
                }
                ChartSurface::Failed { url, reason } => {
                    ui.colored_label(DANGER_COLOR, format!("Could not load {url}: {reason}"));
                }
            }
        });
    }

    fn show_alert(&mut self, ctx: &egui::Context) {
        let Some(text) = self.alert.clone() else {
            return;
        };
        egui::Window::new("Notice")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(text);
                if ui.button("OK").clicked() {
                    self.alert = None;
                }
            });
    }
}

impl eframe::App for ChartDeckApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();
        self.upload_textures(ctx);

        egui::TopBottomPanel::top("title_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Data Visualization");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.weak(&self.server_url);
                });
            });
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if self.busy {
                    ui.spinner();
                }
                ui.label(&self.status);
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_upload_form(ui);
            ui.add_space(6.0);
            self.show_message_banner(ui);
            ui.add_space(6.0);
            self.show_chart_controls(ui);
            ui.separator();
            self.show_chart_canvas(ui);
        });

        self.show_alert(ctx);

        ctx.request_repaint_after(std::time::Duration::from_millis(100));
    }
}
