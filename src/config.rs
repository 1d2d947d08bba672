//! Process configuration read from the environment (and `.env`).

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::batch::DEFAULT_NOTIFY_DELAY;
use crate::whatsapp::client::DEFAULT_API_URL;
use crate::whatsapp::WhatsAppConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("{0} must be set when NOTIFY_CHANNEL=whatsapp")]
    Missing(&'static str),
}

/// Plain batch, or batch plus the HTTP upload endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Batch,
    Serve,
}

impl FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "batch" => Ok(RunMode::Batch),
            "serve" => Ok(RunMode::Serve),
            other => Err(format!("expected 'batch' or 'serve', got '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyChannel {
    Log,
    WhatsApp,
}

impl FromStr for NotifyChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "log" => Ok(NotifyChannel::Log),
            "whatsapp" => Ok(NotifyChannel::WhatsApp),
            other => Err(format!("expected 'log' or 'whatsapp', got '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Empty means any origin.
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchConfig {
    pub input_csv: PathBuf,
    pub template_pdf: PathBuf,
    pub output_dir: PathBuf,
    pub layout_file: Option<PathBuf>,
    pub notify_delay: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotifyConfig {
    pub channel: NotifyChannel,
    pub recipient: String,
    pub attach_document: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub mode: RunMode,
    pub server: ServerConfig,
    pub batch: BatchConfig,
    pub notify: NotifyConfig,
    pub whatsapp: WhatsAppConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup; unset keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let text = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let mode = parse(&get, "RUN_MODE", RunMode::Serve)?;
        let port = parse(&get, "PORT", 3000u16)?;
        let delay_ms = parse(&get, "NOTIFY_DELAY_MS", DEFAULT_NOTIFY_DELAY.as_millis() as u64)?;
        let channel = parse(&get, "NOTIFY_CHANNEL", NotifyChannel::Log)?;
        let attach_document = parse(&get, "WHATSAPP_ATTACH_DOCUMENT", false)?;

        let config = AppConfig {
            mode,
            server: ServerConfig {
                host: text("HOST", "0.0.0.0"),
                port,
                cors_allowed_origins: split_list(get("CORS_ALLOWED_ORIGINS")),
            },
            batch: BatchConfig {
                input_csv: PathBuf::from(text("INPUT_CSV", "data.csv")),
                template_pdf: PathBuf::from(text("TEMPLATE_PDF", "template.pdf")),
                output_dir: PathBuf::from(text("OUTPUT_DIR", "generated_pdfs")),
                layout_file: get("LAYOUT_FILE").map(PathBuf::from),
                notify_delay: Duration::from_millis(delay_ms),
            },
            notify: NotifyConfig {
                channel,
                recipient: text("WHATSAPP_RECIPIENT", ""),
                attach_document,
            },
            whatsapp: WhatsAppConfig {
                api_url: text("WHATSAPP_API_URL", DEFAULT_API_URL),
                token: text("WHATSAPP_TOKEN", ""),
                template_namespace: text("WHATSAPP_TEMPLATE_NAMESPACE", ""),
                template_name: text("WHATSAPP_TEMPLATE_NAME", "inspection_report"),
                language_code: text("WHATSAPP_TEMPLATE_LANGUAGE", "en"),
                body_params: split_list(get("WHATSAPP_BODY_PARAMS")),
            },
        };

        if config.notify.channel == NotifyChannel::WhatsApp {
            if config.whatsapp.token.is_empty() {
                return Err(ConfigError::Missing("WHATSAPP_TOKEN"));
            }
            if config.notify.recipient.is_empty() {
                return Err(ConfigError::Missing("WHATSAPP_RECIPIENT"));
            }
        }

        Ok(config)
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.server.host.clone(), self.server.port)
    }
}

fn parse<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(value) => {
            let parsed = value.trim().parse::<T>();
            parsed.map_err(|e| ConfigError::Invalid {
                key,
                reason: e.to_string(),
                value,
            })
        }
        None => Ok(default),
    }
}

fn split_list(value: Option<String>) -> Vec<String> {
    value
        .map(|raw| {
            raw.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}
