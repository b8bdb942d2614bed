use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use migrator_client::ProgressAnimation;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "migrator.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub server_url: String,
    pub output_dir: PathBuf,
    pub progress_interval_ms: u64,
    pub animate_progress: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8080".into(),
            output_dir: PathBuf::from("."),
            progress_interval_ms: 100,
            animate_progress: true,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    server_url: Option<String>,
    output_dir: Option<PathBuf>,
    progress_interval_ms: Option<u64>,
    animate_progress: Option<bool>,
}

impl ClientSettings {
    pub fn progress_animation(&self) -> ProgressAnimation {
        if self.animate_progress {
            ProgressAnimation::new(10, Duration::from_millis(self.progress_interval_ms))
        } else {
            ProgressAnimation::disabled()
        }
    }

    fn apply_file(&mut self, raw: &str) -> anyhow::Result<()> {
        let file_cfg: FileSettings = toml::from_str(raw)?;
        if let Some(v) = file_cfg.server_url {
            self.server_url = v;
        }
        if let Some(v) = file_cfg.output_dir {
            self.output_dir = v;
        }
        if let Some(v) = file_cfg.progress_interval_ms {
            self.progress_interval_ms = v;
        }
        if let Some(v) = file_cfg.animate_progress {
            self.animate_progress = v;
        }
        Ok(())
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("MIGRATOR_SERVER_URL") {
            self.server_url = v;
        }
        if let Some(v) = lookup("MIGRATOR_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("MIGRATOR_PROGRESS_INTERVAL_MS") {
            if let Ok(parsed) = v.parse::<u64>() {
                self.progress_interval_ms = parsed;
            }
        }
        if let Some(v) = lookup("MIGRATOR_ANIMATE_PROGRESS") {
            if let Some(parsed) = parse_flag(&v) {
                self.animate_progress = parsed;
            }
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Defaults, then the TOML file, then `MIGRATOR_*` environment variables.
///
/// An explicitly named file must exist; the default `migrator.toml` is optional.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<ClientSettings> {
    load_settings_with(config_path, |key| std::env::var(key).ok())
}

fn load_settings_with(
    config_path: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<ClientSettings> {
    let mut settings = ClientSettings::default();

    let (path, required) = match config_path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };
    match fs::read_to_string(&path) {
        Ok(raw) => settings
            .apply_file(&raw)
            .with_context(|| format!("invalid settings file '{}'", path.display()))?,
        Err(err) if required => {
            return Err(err)
                .with_context(|| format!("failed to read settings file '{}'", path.display()));
        }
        Err(_) => {}
    }

    settings.apply_env(lookup);
    Ok(settings)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
