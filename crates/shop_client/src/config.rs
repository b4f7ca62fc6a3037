use std::{collections::HashMap, fs, path::Path, time::Duration};

use shared::domain::EventId;
use thiserror::Error;
use tracing::warn;
use url::Url;

pub const DEFAULT_SETTINGS_FILE: &str = "shop.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopSettings {
    pub api_base_url: String,
    pub event_id: Option<EventId>,
    pub search_interval_ms: u64,
    pub countdown_tick_ms: u64,
    pub request_timeout_secs: u64,
}

impl Default for ShopSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000/api/v1".into(),
            event_id: None,
            search_interval_ms: 300,
            countdown_tick_ms: 1000,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("no event configured; set event_id in shop.toml or APP__EVENT_ID")]
    MissingEvent,
    #[error("invalid api base url '{url}': {reason}")]
    InvalidApiUrl { url: String, reason: String },
    #[error("{field} must be greater than zero")]
    ZeroInterval { field: &'static str },
}

impl ShopSettings {
    pub fn search_interval(&self) -> Duration {
        Duration::from_millis(self.search_interval_ms)
    }

    pub fn countdown_tick(&self) -> Duration {
        Duration::from_millis(self.countdown_tick_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn event(&self) -> Result<EventId, SettingsError> {
        self.event_id.ok_or(SettingsError::MissingEvent)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        Url::parse(&self.api_base_url).map_err(|err| SettingsError::InvalidApiUrl {
            url: self.api_base_url.clone(),
            reason: err.to_string(),
        })?;
        if self.countdown_tick_ms == 0 {
            return Err(SettingsError::ZeroInterval {
                field: "countdown_tick_ms",
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(SettingsError::ZeroInterval {
                field: "request_timeout_secs",
            });
        }
        self.event().map(|_| ())
    }
}

pub fn load_settings() -> ShopSettings {
    load_settings_from(Path::new(DEFAULT_SETTINGS_FILE), |key| std::env::var(key).ok())
}

/// Defaults, then the flat `key = "value"` settings file, then environment.
pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> ShopSettings {
    let mut settings = ShopSettings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<HashMap<String, toml::Value>>(&raw) {
            Ok(file_cfg) => {
                let text = |key: &str| {
                    file_cfg.get(key).map(|value| match value {
                        toml::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                };
                if let Some(v) = text("api_base_url") {
                    settings.api_base_url = v;
                }
                apply_event(&mut settings, text("event_id"), "event_id");
                apply_u64(
                    &mut settings.search_interval_ms,
                    text("search_interval_ms"),
                    "search_interval_ms",
                );
                apply_u64(
                    &mut settings.countdown_tick_ms,
                    text("countdown_tick_ms"),
                    "countdown_tick_ms",
                );
                apply_u64(
                    &mut settings.request_timeout_secs,
                    text("request_timeout_secs"),
                    "request_timeout_secs",
                );
            }
            Err(err) => warn!(path = %path.display(), "ignoring unreadable settings file: {err}"),
        }
    }

    if let Some(v) = env("SHOP_API_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = env("APP__API_URL") {
        settings.api_base_url = v;
    }

    apply_event(&mut settings, env("SHOP_EVENT_ID"), "SHOP_EVENT_ID");
    apply_event(&mut settings, env("APP__EVENT_ID"), "APP__EVENT_ID");

    apply_u64(
        &mut settings.search_interval_ms,
        env("APP__SEARCH_INTERVAL_MS"),
        "APP__SEARCH_INTERVAL_MS",
    );
    apply_u64(
        &mut settings.countdown_tick_ms,
        env("APP__COUNTDOWN_TICK_MS"),
        "APP__COUNTDOWN_TICK_MS",
    );
    apply_u64(
        &mut settings.request_timeout_secs,
        env("APP__REQUEST_TIMEOUT_SECS"),
        "APP__REQUEST_TIMEOUT_SECS",
    );

    settings.api_base_url = settings.api_base_url.trim_end_matches('/').to_string();
    settings
}

fn apply_event(settings: &mut ShopSettings, raw: Option<String>, source: &str) {
    let Some(raw) = raw else {
        return;
    };
    match raw.trim().parse::<i64>() {
        Ok(id) => settings.event_id = Some(EventId(id)),
        Err(err) => warn!("ignoring invalid {source} value '{raw}': {err}"),
    }
}

fn apply_u64(target: &mut u64, raw: Option<String>, source: &str) {
    let Some(raw) = raw else {
        return;
    };
    match raw.trim().parse::<u64>() {
        Ok(parsed) => *target = parsed,
        Err(err) => warn!("ignoring invalid {source} value '{raw}': {err}"),
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
