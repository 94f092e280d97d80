use std::path::PathBuf;

mod backend_bridge;
mod controller;
mod ui;

use clap::Parser;
use client_core::config::{load_settings, normalize_server_url};
use crossbeam_channel::bounded;
use eframe::egui;

use backend_bridge::commands::BackendCommand;
use controller::events::UiEvent;
use ui::{ChartDeckApp, StartupConfig};

#[derive(Parser, Debug)]
#[command(name = "chartdeck_gui", about = "Desktop page for the chart service")]
struct Args {
    /// Base URL of the chart service.
    #[arg(long)]
    server_url: Option<String>,
    /// Settings file (defaults to ./chartdeck.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(server_url) = args.server_url {
        settings.server_url = normalize_server_url(&server_url);
    }

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(64);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(1024);
    backend_bridge::runtime::launch(settings.server_url.clone(), cmd_rx, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Chartdeck")
            .with_inner_size([1024.0, 760.0])
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };
    let startup = StartupConfig {
        server_url: settings.server_url,
    };
    eframe::run_native(
        "Chartdeck",
        options,
        Box::new(|_cc| Ok(Box::new(ChartDeckApp::new(cmd_tx, ui_rx, startup)))),
    )
    .map_err(|err| anyhow::anyhow!("failed to run desktop window: {err}"))
}
