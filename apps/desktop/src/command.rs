//! Shell command grammar.

use std::{path::PathBuf, str::FromStr};

use shared::domain::ChartKind;

pub const HELP: &str = "\
commands:
  upload <path>   upload a CSV/XLSX file
  bar | pie | line
                  generate a chart from the uploaded file
  clear           delete uploaded files and reports on the server
  report          build the PDF report and save it locally
  status          show the current session
  help            show this text
  quit            leave the shell";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Upload(Option<PathBuf>),
    Chart(ChartKind),
    Clear,
    Report,
    Status,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<Option<ShellCommand>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "upload" => ShellCommand::Upload((!rest.is_empty()).then(|| PathBuf::from(rest))),
        "chart" => ShellCommand::Chart(ChartKind::from_str(rest).map_err(|e| e.to_string())?),
        "bar" | "pie" | "line" => {
            ShellCommand::Chart(ChartKind::from_str(word).map_err(|e| e.to_string())?)
        }
        "clear" => ShellCommand::Clear,
        "report" | "download" => ShellCommand::Report,
        "status" => ShellCommand::Status,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        other => return Err(format!("unknown command '{other}' (try 'help')")),
    };
    Ok(Some(command))
}

/// Splits a `--script` argument on `;` and newlines.
pub fn split_script(script: &str) -> impl Iterator<Item = &str> {
    script
        .split(|c| c == ';' || c == '\n')
        .map(str::trim)
        .filter(|part| !part.is_empty())
}
