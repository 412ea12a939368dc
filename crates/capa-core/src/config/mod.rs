mod channels;
mod defaults;


pub use channels::*;

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::CapaError;
use defaults::*;

/// Top-level bot configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub sheets: SheetsConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub holidays: HolidayConfig,
}

/// General bot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Prefix for operational notifications (e.g. "Doraymon: [INFO] ...").
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Append-only event log, also served by `GET /api/logs`.
    #[serde(default = "default_log_file")]
    pub log_file: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Fixed offset from UTC for log timestamps and "today" (default: +7).
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            data_dir: default_data_dir(),
            log_file: default_log_file(),
            log_level: default_log_level(),
            utc_offset_hours: default_utc_offset_hours(),
        }
    }
}

/// Google Sheets source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetsConfig {
    #[serde(default)]
    pub spreadsheet_id: String,
    /// Service-account key file (JSON).
    #[serde(default = "default_credentials_path")]
    pub credentials_path: String,
    /// A1 range of the CAPA ledger tab. The tab name has a leading space.
    #[serde(default = "default_capa_range")]
    pub capa_range: String,
    #[serde(default = "default_directory_range")]
    pub directory_range: String,
    #[serde(default = "default_sheets_base_url")]
    pub base_url: String,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            credentials_path: default_credentials_path(),
            capa_range: default_capa_range(),
            directory_range: default_directory_range(),
            base_url: default_sheets_base_url(),
        }
    }
}

/// HTTP API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_api_host")]
    pub host: String,
    #[serde(default = "default_api_port")]
    pub port: u16,
    /// Bearer token for the CAPA endpoints. Empty = no auth.
    #[serde(default)]
    pub api_key: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_api_host(),
            port: default_api_port(),
            api_key: String::new(),
        }
    }
}

/// Scheduled reminder broadcasts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Local time ("HH:MM") of the daily reminder. Empty = no daily reminder.
    #[serde(default = "default_daily_time")]
    pub daily_time: String,
    /// Skip Saturdays and Sundays.
    #[serde(default = "default_true")]
    pub weekdays_only: bool,
    /// Skip national holidays (requires `[holidays]`).
    #[serde(default = "default_true")]
    pub skip_holidays: bool,
    /// Friday broadcasts, one per schedule slot.
    #[serde(default)]
    pub friday_slots: Vec<FridaySlot>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            daily_time: default_daily_time(),
            weekdays_only: true,
            skip_holidays: true,
            friday_slots: Vec::new(),
        }
    }
}

/// One Friday broadcast: PICs whose directory slot matches `slot`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FridaySlot {
    pub slot: String,
    /// Local time ("HH:MM").
    pub time: String,
}

/// Holiday calendar API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HolidayConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_holiday_url")]
    pub url: String,
}

impl Default for HolidayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: default_holiday_url(),
        }
    }
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist. Secrets can be
/// overridden from the environment afterwards.
pub fn load(path: &str) -> Result<Config, CapaError> {
    let path = Path::new(path);
    let mut config = if !path.exists() {
        info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        Config::default()
    } else {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CapaError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        parse(&content)?
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Parse configuration from TOML text.
pub fn parse(content: &str) -> Result<Config, CapaError> {
    toml::from_str(content).map_err(|e| CapaError::Config(format!("failed to parse config: {e}")))
}

/// Override secrets from the environment. Empty values are ignored.
pub(crate) fn apply_env_overrides(config: &mut Config, var: impl Fn(&str) -> Option<String>) {
    let var = |key: &str| var(key).filter(|v| !v.trim().is_empty());

    if let Some(token) = var("CAPA_TELEGRAM_BOT_TOKEN") {
        config.telegram.bot_token = token;
    }
    if let Some(chat_id) = var("CAPA_TELEGRAM_CHAT_ID") {
        config.telegram.chat_id = chat_id;
    }
    if let Some(sheet_id) = var("CAPA_SHEET_ID") {
        config.sheets.spreadsheet_id = sheet_id;
    }
    if let Some(key) = var("CAPA_API_KEY") {
        config.api.api_key = key;
    }
}
