use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use config::{Config, Environment, File};
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "chartdeck.toml";
pub const ENV_PREFIX: &str = "CHARTDECK";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub server_url: String,
    pub report_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5000".into(),
            report_dir: PathBuf::from("./reports"),
        }
    }
}

/// Defaults, then `chartdeck.toml` (or `path`), then `CHARTDECK__*` env vars.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    load_settings_from(path, None)
}

pub(crate) fn load_settings_from(
    path: Option<&Path>,
    env: Option<HashMap<String, String>>,
) -> anyhow::Result<Settings> {
    let defaults = Settings::default();
    let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));

    let mut settings: Settings = Config::builder()
        .set_default("server_url", defaults.server_url)?
        .set_default(
            "report_dir",
            defaults.report_dir.to_string_lossy().into_owned(),
        )?
        .add_source(File::from(file).required(path.is_some()))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .source(env),
        )
        .build()
        .with_context(|| format!("failed to load settings from '{}'", file.display()))?
        .try_deserialize()
        .context("invalid settings")?;

    settings.server_url = normalize_server_url(&settings.server_url);
    Ok(settings)
}

pub fn normalize_server_url(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return Settings::default().server_url;
    }

    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("http://{raw}")
    };
    with_scheme.trim_end_matches('/').to_string()
}

pub fn prepare_report_dir(dir: &Path) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create report directory '{}'", dir.display()))?;
    Ok(dir.to_path_buf())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
