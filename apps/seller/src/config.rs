use std::{fs, io, path::Path};

use anyhow::{bail, Context};
use client_core::StepNavigationPolicy;
use serde::Deserialize;
use url::Url;

pub const DEFAULT_CONFIG_PATH: &str = "seller.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub backend_api_url: String,
    pub access_token: Option<String>,
    pub user_id: Option<i64>,
    pub strict_step_validation: bool,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_api_url: "http://127.0.0.1:8000".into(),
            access_token: None,
            user_id: None,
            strict_step_validation: true,
            log_filter: "info".into(),
        }
    }
}

impl Settings {
    pub fn navigation_policy(&self) -> StepNavigationPolicy {
        if self.strict_step_validation {
            StepNavigationPolicy::RequireStepComplete
        } else {
            StepNavigationPolicy::Permissive
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    backend_api_url: Option<String>,
    access_token: Option<String>,
    user_id: Option<i64>,
    strict_step_validation: Option<bool>,
    log_filter: Option<String>,
}

pub fn load_settings() -> anyhow::Result<Settings> {
    let path = std::env::var("SELLER_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    load_settings_from(Path::new(&path), |key| std::env::var(key).ok())
}

/// Defaults, then the TOML file (if present), then environment overrides.
/// A missing file is skipped; any other read failure is an error.
pub fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let raw = match fs::read_to_string(path) {
        Ok(raw) => Some(raw),
        Err(err) if err.kind() == io::ErrorKind::NotFound => None,
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()))
        }
    };

    if let Some(raw) = raw {
        let file_cfg: FileSettings = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file '{}'", path.display()))?;
        if let Some(v) = file_cfg.backend_api_url {
            settings.backend_api_url = v;
        }
        if let Some(v) = file_cfg.access_token {
            settings.access_token = Some(v);
        }
        if let Some(v) = file_cfg.user_id {
            settings.user_id = Some(v);
        }
        if let Some(v) = file_cfg.strict_step_validation {
            settings.strict_step_validation = v;
        }
        if let Some(v) = file_cfg.log_filter {
            settings.log_filter = v;
        }
    }

    if let Some(v) = env("BACKEND_API_URL") {
        settings.backend_api_url = v;
    }
    if let Some(v) = env("APP__BACKEND_API_URL") {
        settings.backend_api_url = v;
    }
    if let Some(v) = env("APP__ACCESS_TOKEN") {
        settings.access_token = Some(v);
    }
    if let Some(v) = env("APP__USER_ID") {
        let parsed = v
            .parse::<i64>()
            .with_context(|| format!("APP__USER_ID must be an integer, got '{v}'"))?;
        settings.user_id = Some(parsed);
    }
    if let Some(v) = env("APP__STRICT_STEP_VALIDATION") {
        let parsed = v.parse::<bool>().with_context(|| {
            format!("APP__STRICT_STEP_VALIDATION must be 'true' or 'false', got '{v}'")
        })?;
        settings.strict_step_validation = parsed;
    }
    if let Some(v) = env("APP__LOG_FILTER") {
        settings.log_filter = v;
    }

    settings.backend_api_url = normalize_backend_url(&settings.backend_api_url)?;
    Ok(settings)
}

pub fn normalize_backend_url(raw: &str) -> anyhow::Result<String> {
    let raw = raw.trim();
    let url = Url::parse(raw).with_context(|| format!("invalid backend url '{raw}'"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("backend url must use http or https, got '{}'", url.scheme());
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}
