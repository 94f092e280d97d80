//! Runtime bridge between UI command queue and backend event intake.

use std::thread;

use client_core::{
    report_file_name, ChartService, ChartServiceClient, PageController, SelectedFile,
};
use crossbeam_channel::{Receiver, Sender};

use crate::backend_bridge::{commands::BackendCommand, view::BridgeView};
use crate::controller::events::{PreviewImage, UiError, UiErrorContext, UiEvent};

const MAX_PREVIEW_DIMENSION: u32 = 1600;

pub fn launch(server_url: String, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let client = match ChartServiceClient::new(&server_url) {
                Ok(client) => client,
                Err(err) => {
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                        UiErrorContext::BackendStartup,
                        err.to_string(),
                    )));
                    tracing::error!(server_url = %server_url, "invalid server url: {err}");
                    return;
                }
            };
            let mut page = PageController::new(client, BridgeView::new(ui_tx.clone()));
            let _ = ui_tx.try_send(UiEvent::Info(format!("Connected to {server_url}")));

            while let Ok(cmd) = cmd_rx.recv() {
                tracing::debug!(command = cmd.name(), "processing backend command");
                let _ = ui_tx.try_send(UiEvent::Busy(true));
                match cmd {
                    BackendCommand::Upload { path } => {
                        let selection = match path {
                            None => None,
                            Some(path) => match SelectedFile::load(&path).await {
                                Ok(file) => Some(file),
                                Err(err) => {
                                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                                        UiErrorContext::SelectFile,
                                        err.to_string(),
                                    )));
                                    let _ = ui_tx.try_send(UiEvent::Busy(false));
                                    continue;
                                }
                            },
                        };
                        page.upload(selection).await;
                    }
                    BackendCommand::GenerateChart { kind } => {
                        page.generate_chart(kind).await;
                    }
                    BackendCommand::Clear => {
                        page.clear().await;
                    }
                    BackendCommand::DownloadReport => {
                        page.download_report().await;
                    }
                    BackendCommand::FetchChartImage { url } => {
                        let event = match page.service().fetch(&url).await {
                            Ok(bytes) => match decode_preview_image(&bytes) {
                                Ok(image) => UiEvent::ChartImageLoaded { url, image },
                                Err(reason) => UiEvent::ChartImageFailed { url, reason },
                            },
                            Err(err) => UiEvent::ChartImageFailed {
                                url,
                                reason: err.to_string(),
                            },
                        };
                        let _ = ui_tx.try_send(event);
                    }
                    BackendCommand::SaveReport { url } => {
                        save_report(page.service(), &url, &ui_tx).await;
                    }
                }
                let _ = ui_tx.try_send(UiEvent::Busy(false));
            }
            tracing::info!("ui command channel closed; backend worker exiting");
        });
    });
}

async fn save_report(client: &ChartServiceClient, url: &str, ui_tx: &Sender<UiEvent>) {
    let bytes = match client.fetch(url).await {
        Ok(bytes) => bytes,
        Err(err) => {
            let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                UiErrorContext::SaveReport,
                err.to_string(),
            )));
            return;
        }
    };

    let mut dialog = rfd::FileDialog::new().set_file_name(report_file_name(url));
    if let Some(dir) = dirs::download_dir() {
        dialog = dialog.set_directory(dir);
    }
    let Some(path) = dialog.save_file() else {
        let _ = ui_tx.try_send(UiEvent::Info("Report download cancelled".to_string()));
        return;
    };

    match tokio::fs::write(&path, bytes).await {
        Ok(()) => {
            tracing::info!(path = %path.display(), "report saved");
            let _ = ui_tx.try_send(UiEvent::Info(format!(
                "Saved report to {}",
                path.display()
            )));
        }
        Err(err) => {
            let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                UiErrorContext::SaveReport,
                format!("failed to write '{}': {err}", path.display()),
            )));
        }
    }
}

pub fn decode_preview_image(bytes: &[u8]) -> Result<PreviewImage, String> {
    let dynamic = image::load_from_memory(bytes).map_err(|err| err.to_string())?;
    let resized = if dynamic.width().max(dynamic.height()) > MAX_PREVIEW_DIMENSION {
        dynamic
            .thumbnail(MAX_PREVIEW_DIMENSION, MAX_PREVIEW_DIMENSION)
            .to_rgba8()
    } else {
        dynamic.to_rgba8()
    };
    let width = resized.width() as usize;
    let height = resized.height() as usize;
    Ok(PreviewImage {
        width,
        height,
        rgba: resized.into_raw(),
    })
}
