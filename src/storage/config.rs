use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calendar::{Party, Viewer};
use crate::scheduling::clock::{
    BOLIVIA_UTC_OFFSET_HOURS, BusinessPolicy, DEFAULT_CANCELLATION_NOTICE_HOURS, DEFAULT_WINDOWS,
    HourWindow, utc_offset,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub backend: BackendConfig,
    pub identity: IdentityConfig,
    pub schedule: ScheduleConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackendConfig {
    pub base_url: String,
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IdentityConfig {
    pub fixer_id: String,
    #[serde(default)]
    pub requester_id: Option<String>,
    pub role: Party,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleConfig {
    pub utc_offset_hours: i32,
    pub backend_utc_offset_hours: i32,
    pub business_windows: Vec<HourWindow>,
    pub business_days: Vec<String>,
    pub cancellation_notice_hours: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UiConfig {
    pub theme: String,
    pub default_view: String,
    pub mobile_view: String,
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }

    pub fn load_or_create() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Self::default();
            config.save_to(&config_path)?;
            tracing::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fixer-schedule")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.request_timeout_seconds)
    }

    pub fn business_policy(&self) -> Result<BusinessPolicy, ConfigError> {
        let schedule = &self.schedule;
        let business_offset = utc_offset(schedule.utc_offset_hours).ok_or_else(|| {
            ConfigError::Invalid(format!("utc_offset_hours {} out of range", schedule.utc_offset_hours))
        })?;
        let backend_offset = utc_offset(schedule.backend_utc_offset_hours).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "backend_utc_offset_hours {} out of range",
                schedule.backend_utc_offset_hours
            ))
        })?;

        if schedule.business_windows.is_empty() {
            return Err(ConfigError::Invalid("business_windows is empty".to_string()));
        }
        if let Some(window) = schedule.business_windows.iter().find(|w| !w.is_valid()) {
            return Err(ConfigError::Invalid(format!(
                "business window {}-{} must satisfy start < end <= 24",
                window.start, window.end
            )));
        }

        let business_days = schedule
            .business_days
            .iter()
            .map(|day| {
                day.parse::<Weekday>()
                    .map_err(|_| ConfigError::Invalid(format!("unknown business day '{}'", day)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if schedule.cancellation_notice_hours < 0 {
            return Err(ConfigError::Invalid("cancellation_notice_hours must not be negative".to_string()));
        }

        Ok(BusinessPolicy {
            business_offset,
            backend_offset,
            windows: schedule.business_windows.clone(),
            business_days,
            cancellation_notice: chrono::Duration::hours(schedule.cancellation_notice_hours),
        })
    }

    pub fn viewer(&self) -> Result<Viewer, ConfigError> {
        match self.identity.role {
            Party::Fixer => Ok(Viewer::Fixer),
            Party::Requester => self
                .identity
                .requester_id
                .as_deref()
                .filter(|id| !id.trim().is_empty())
                .map(Viewer::requester)
                .ok_or_else(|| ConfigError::Invalid("role is requester but requester_id is missing".to_string())),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig {
                base_url: "http://localhost:8080".to_string(),
                request_timeout_seconds: 15,
            },
            identity: IdentityConfig {
                fixer_id: String::new(),
                requester_id: None,
                role: Party::Requester,
            },
            schedule: ScheduleConfig {
                utc_offset_hours: BOLIVIA_UTC_OFFSET_HOURS,
                backend_utc_offset_hours: 0,
                business_windows: DEFAULT_WINDOWS.to_vec(),
                business_days: ["Mon", "Tue", "Wed", "Thu", "Fri"].map(String::from).to_vec(),
                cancellation_notice_hours: DEFAULT_CANCELLATION_NOTICE_HOURS,
            },
            ui: UiConfig {
                theme: "default".to_string(),
                default_view: "Week".to_string(),
                mobile_view: "Day".to_string(),
            },
        }
    }
}
