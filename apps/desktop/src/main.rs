use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    config::{load_settings, normalize_server_url, prepare_report_dir},
    report_file_name, ActionOutcome, ChartService, ChartServiceClient, PageController,
    SelectedFile,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

mod command;
mod view;

use command::{parse_command, split_script, ShellCommand, HELP};
use view::TerminalView;

type Page<W> = PageController<ChartServiceClient, TerminalView<W>>;

#[derive(Parser, Debug)]
#[command(name = "chartdeck", about = "Upload data files and collect charts into a report")]
struct Args {
    /// Base URL of the chart service.
    #[arg(long)]
    server_url: Option<String>,
    /// Settings file (defaults to ./chartdeck.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Where downloaded reports are written.
    #[arg(long)]
    report_dir: Option<PathBuf>,
    /// Commands separated by ';' to run instead of an interactive shell.
    #[arg(long)]
    script: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(server_url) = args.server_url {
        settings.server_url = normalize_server_url(&server_url);
    }
    if let Some(report_dir) = args.report_dir {
        settings.report_dir = report_dir;
    }
    tracing::info!(server_url = %settings.server_url, "starting chartdeck shell");

    let client = ChartServiceClient::new(&settings.server_url)
        .with_context(|| format!("invalid server url '{}'", settings.server_url))?;
    let view = TerminalView::new(io::stdout(), client.base_url().clone());
    let mut page = PageController::new(client, view);

    match args.script {
        Some(script) => {
            let failures = run_script(&mut page, &script, &settings.report_dir).await;
            if failures > 0 {
                anyhow::bail!("{failures} command(s) failed");
            }
        }
        None => {
            page.view_mut().line(HELP);
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                print!("chartdeck> ");
                io::stdout().flush()?;
                let Some(line) = lines.next_line().await? else {
                    break;
                };
                if let Step::Quit = run_line(&mut page, &line, &settings.report_dir).await {
                    break;
                }
            }
        }
    }

    Ok(())
}

enum Step {
    Continue(ActionOutcome),
    Quit,
}

/// Runs `;`-separated commands in order and returns how many failed.
async fn run_script<W: Write>(page: &mut Page<W>, script: &str, report_dir: &Path) -> usize {
    let mut failures = 0usize;
    for line in split_script(script) {
        match run_line(page, line, report_dir).await {
            Step::Continue(ActionOutcome::Failed) => failures += 1,
            Step::Continue(_) => {}
            Step::Quit => break,
        }
    }
    failures
}

async fn run_line<W: Write>(page: &mut Page<W>, line: &str, report_dir: &Path) -> Step {
    let command = match parse_command(line) {
        Ok(Some(command)) => command,
        Ok(None) => return Step::Continue(ActionOutcome::Succeeded),
        Err(err) => {
            page.view_mut().line(&err);
            return Step::Continue(ActionOutcome::Failed);
        }
    };

    let outcome = match command {
        ShellCommand::Upload(path) => {
            let selection = match path {
                None => None,
                Some(path) => match SelectedFile::load(&path).await {
                    Ok(file) => Some(file),
                    Err(err) => {
                        page.view_mut()
                            .line(&format!("cannot read '{}': {err}", path.display()));
                        return Step::Continue(ActionOutcome::Failed);
                    }
                },
            };
            page.upload(selection).await
        }
        ShellCommand::Chart(kind) => page.generate_chart(kind).await,
        ShellCommand::Clear => page.clear().await,
        ShellCommand::Report => {
            let outcome = page.download_report().await;
            if let Some(url) = page.view_mut().take_navigation() {
                if let Err(err) = save_report(page, &url, report_dir).await {
                    page.view_mut().line(&format!("failed to save report: {err:#}"));
                    return Step::Continue(ActionOutcome::Failed);
                }
            }
            outcome
        }
        ShellCommand::Status => {
            print_status(page);
            ActionOutcome::Succeeded
        }
        ShellCommand::Help => {
            page.view_mut().line(HELP);
            ActionOutcome::Succeeded
        }
        ShellCommand::Quit => return Step::Quit,
    };
    Step::Continue(outcome)
}

async fn save_report<W: Write>(page: &mut Page<W>, url: &str, report_dir: &Path) -> Result<()> {
    let bytes = page.service().fetch(url).await?;
    let dir = prepare_report_dir(report_dir)?;
    let path = dir.join(report_file_name(url));
    tokio::fs::write(&path, bytes)
        .await
        .with_context(|| format!("failed to write '{}'", path.display()))?;
    page.view_mut()
        .line(&format!("Saved report to {}", path.display()));
    Ok(())
}

fn print_status<W: Write>(page: &mut Page<W>) {
    let filename = page
        .session()
        .uploaded_filename()
        .map(|f| f.to_string())
        .unwrap_or_else(|| "(none)".to_string());
    let charts: Vec<String> = page
        .session()
        .chart_urls()
        .iter()
        .map(|url| url.to_string())
        .collect();
    let controls = page.view().chart_controls_visible();
    let view = page.view_mut();
    view.line(&format!("uploaded file: {filename}"));
    view.line(&format!(
        "chart commands: {}",
        if controls { "available" } else { "hidden" }
    ));
    if charts.is_empty() {
        view.line("charts: (none)");
    } else {
        view.line(&format!("charts ({}):", charts.len()));
        for chart in charts {
            view.line(&format!("  {chart}"));
        }
    }
}
