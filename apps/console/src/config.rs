use std::{fs, path::Path};

use serde::Deserialize;
use shared::domain::RecordLookup;
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "query_console.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// `None` means "not configured": discovery may fill it, otherwise the default applies.
    pub predict_url: Option<String>,
    pub service_root: Option<String>,
    pub record_lookup: RecordLookup,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            predict_url: None,
            service_root: None,
            record_lookup: RecordLookup::Positional,
            log_filter: "info".into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    predict_url: Option<String>,
    service_root: Option<String>,
    record_lookup: Option<String>,
    log_filter: Option<String>,
}

pub fn load_settings(path: &Path) -> Settings {
    load_settings_with(path, |key| std::env::var(key).ok())
}

/// File values override defaults; environment values override the file.
pub fn load_settings_with(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.predict_url {
                    settings.predict_url = Some(v);
                }
                if let Some(v) = file_cfg.service_root {
                    settings.service_root = Some(v);
                }
                if let Some(v) = file_cfg.record_lookup {
                    apply_lookup(&mut settings, &v);
                }
                if let Some(v) = file_cfg.log_filter {
                    settings.log_filter = v;
                }
            }
            Err(err) => warn!(path = %path.display(), error = %err, "ignoring unreadable config file"),
        }
    }

    if let Some(v) = env("PREDICT_URL") {
        settings.predict_url = Some(v);
    }
    if let Some(v) = env("APP__PREDICT_URL") {
        settings.predict_url = Some(v);
    }

    if let Some(v) = env("SERVICE_ROOT") {
        settings.service_root = Some(v);
    }
    if let Some(v) = env("APP__SERVICE_ROOT") {
        settings.service_root = Some(v);
    }

    if let Some(v) = env("APP__RECORD_LOOKUP") {
        apply_lookup(&mut settings, &v);
    }

    if let Some(v) = env("APP__LOG_FILTER") {
        settings.log_filter = v;
    }

    settings
}

fn apply_lookup(settings: &mut Settings, raw: &str) {
    match raw.parse() {
        Ok(lookup) => settings.record_lookup = lookup,
        Err(err) => warn!(error = %err, "keeping record lookup {}", settings.record_lookup),
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
