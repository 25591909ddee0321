use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::WorkingHours;
use crate::scheduling::clock;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid working hours for {day}: {reason}")]
    InvalidHours { day: &'static str, reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingConfig {
    pub scheduling: SchedulingConfig,
    pub notifications: NotificationConfig,
    pub hours: WeekHoursConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchedulingConfig {
    pub slot_step_minutes: u32,
    pub min_gap_minutes: u32,
    pub min_appointment_minutes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationConfig {
    pub delivery_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeekHoursConfig {
    pub monday: DayHours,
    pub tuesday: DayHours,
    pub wednesday: DayHours,
    pub thursday: DayHours,
    pub friday: DayHours,
    pub saturday: DayHours,
    pub sunday: DayHours,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DayHours {
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

impl DayHours {
    fn open(start: &str, end: &str) -> Self {
        Self {
            closed: false,
            start: Some(start.to_string()),
            end: Some(end.to_string()),
        }
    }

    fn closed() -> Self {
        Self {
            closed: true,
            start: None,
            end: None,
        }
    }

    fn to_working_hours(&self, day: &'static str) -> Result<WorkingHours, ConfigError> {
        if self.closed {
            return Ok(WorkingHours::closed());
        }
        let (Some(start), Some(end)) = (&self.start, &self.end) else {
            return Err(ConfigError::InvalidHours {
                day,
                reason: "missing start or end".to_string(),
            });
        };
        let start = clock::parse_time(start).map_err(|e| ConfigError::InvalidHours {
            day,
            reason: e.to_string(),
        })?;
        let end = clock::parse_time(end).map_err(|e| ConfigError::InvalidHours {
            day,
            reason: e.to_string(),
        })?;
        WorkingHours::open(start, end).map_err(|e| ConfigError::InvalidHours {
            day,
            reason: e.to_string(),
        })
    }
}

impl BookingConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }

    pub fn load_or_create() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml(&content)
        } else {
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("salon-booking")
            .join("config.toml")
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self).expect("Failed to serialize config");
        std::fs::write(&config_path, content)?;

        Ok(())
    }

    /// Working hours for each weekday, Monday first.
    pub fn resolve_week(&self) -> Result<[WorkingHours; 7], ConfigError> {
        Ok([
            self.hours.monday.to_working_hours("monday")?,
            self.hours.tuesday.to_working_hours("tuesday")?,
            self.hours.wednesday.to_working_hours("wednesday")?,
            self.hours.thursday.to_working_hours("thursday")?,
            self.hours.friday.to_working_hours("friday")?,
            self.hours.saturday.to_working_hours("saturday")?,
            self.hours.sunday.to_working_hours("sunday")?,
        ])
    }

    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_secs(self.notifications.delivery_timeout_seconds)
    }
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            scheduling: SchedulingConfig {
                slot_step_minutes: 30,
                min_gap_minutes: 30,
                min_appointment_minutes: 15,
            },
            notifications: NotificationConfig {
                delivery_timeout_seconds: 5,
            },
            hours: WeekHoursConfig {
                monday: DayHours::closed(),
                tuesday: DayHours::open("09:00", "18:00"),
                wednesday: DayHours::open("09:00", "18:00"),
                thursday: DayHours::open("09:00", "18:00"),
                friday: DayHours::open("09:00", "18:00"),
                saturday: DayHours::open("09:00", "18:00"),
                sunday: DayHours::closed(),
            },
        }
    }
}
