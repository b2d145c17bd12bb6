//! Persistent tool settings model and file-backed manager.

use std::fs;
use std::io;
use std::path::PathBuf;

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::duration;

fn default_target_hours() -> f64 {
    8.0
}

/// Default worklog start time in `HH:MM` local format.
fn default_log_start_time() -> String {
    "09:00".to_string()
}

fn default_in_progress_statuses() -> Vec<String> {
    vec!["In Progress".to_string()]
}

fn default_review_statuses() -> Vec<String> {
    vec!["In Review".to_string()]
}

/// Settings persisted in the YAML file: tracker coordinates and credentials,
/// the daily target, the weekday mask, explicit daily tasks and the status
/// names that feed the medium and low buckets.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct Settings {
    pub jira_host: String,
    pub jira_user: String,
    pub jira_pass: String,
    #[serde(default = "default_target_hours")]
    pub target_hours: f64,
    #[serde(default = "default_log_start_time")]
    pub log_start_time: String,
    pub work_days: WorkDays,
    pub daily_tasks: Vec<DailyTask>,
    #[serde(default = "default_in_progress_statuses")]
    pub in_progress_statuses: Vec<String>,
    #[serde(default = "default_review_statuses")]
    pub review_statuses: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            jira_host: String::new(),
            jira_user: String::new(),
            jira_pass: String::new(),
            target_hours: default_target_hours(),
            log_start_time: default_log_start_time(),
            work_days: WorkDays::default(),
            daily_tasks: Vec::new(),
            in_progress_statuses: default_in_progress_statuses(),
            review_statuses: default_review_statuses(),
        }
    }
}

/// An issue that always receives a worklog of the given length first, before
/// any in-progress or review issues are considered.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DailyTask {
    pub key: String,
    pub time: String,
}

/// Weekday mask selecting which dates of a range are working days.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct WorkDays {
    pub mo: bool,
    pub tu: bool,
    pub we: bool,
    pub th: bool,
    pub fr: bool,
    pub sa: bool,
    pub su: bool,
}

impl Default for WorkDays {
    fn default() -> Self {
        Self {
            mo: true,
            tu: true,
            we: true,
            th: true,
            fr: true,
            sa: false,
            su: false,
        }
    }
}

impl WorkDays {
    pub fn contains(&self, day: Weekday) -> bool {
        match day {
            Weekday::Mon => self.mo,
            Weekday::Tue => self.tu,
            Weekday::Wed => self.we,
            Weekday::Thu => self.th,
            Weekday::Fri => self.fr,
            Weekday::Sat => self.sa,
            Weekday::Sun => self.su,
        }
    }

    pub fn any(&self) -> bool {
        self.mo || self.tu || self.we || self.th || self.fr || self.sa || self.su
    }
}

impl Settings {
    /// Daily target in seconds.
    pub fn target_seconds(&self) -> u64 {
        let seconds = self.target_hours * 3600.0;
        if seconds.is_finite() && seconds > 0.0 {
            seconds.round() as u64
        } else {
            0
        }
    }

    /// Workday length in whole hours, used for `d` and `w` duration units.
    pub fn workday_hours(&self) -> u64 {
        let rounded = self.target_hours.round();
        if rounded.is_finite() {
            (rounded as i64).clamp(1, 24) as u64
        } else {
            8
        }
    }

    /// Parsed `log_start_time`, if valid.
    pub fn start_time(&self) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(self.log_start_time.trim(), "%H:%M").ok()
    }

    /// Rejects settings the run cannot proceed with.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.jira_host.trim().is_empty() {
            return Err(SettingsError::MissingField("jira_host"));
        }
        if self.jira_user.trim().is_empty() {
            return Err(SettingsError::MissingField("jira_user"));
        }
        if self.jira_pass.trim().is_empty() {
            return Err(SettingsError::MissingField("jira_pass"));
        }
        if self.target_seconds() == 0 {
            return Err(SettingsError::InvalidTarget(self.target_hours));
        }
        if self.start_time().is_none() {
            return Err(SettingsError::InvalidStartTime(self.log_start_time.clone()));
        }
        if !self.work_days.any() {
            return Err(SettingsError::NoWorkDays);
        }
        for task in &self.daily_tasks {
            if task.key.trim().is_empty()
                || duration::parse_seconds(&task.time, self.workday_hours()).is_none()
            {
                return Err(SettingsError::InvalidDailyTask {
                    key: task.key.clone(),
                    time: task.time.clone(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("missing mandatory setting: {0}")]
    MissingField(&'static str),
    #[error("target_hours must be positive, got {0}")]
    InvalidTarget(f64),
    #[error("log_start_time must be HH:MM, got {0:?}")]
    InvalidStartTime(String),
    #[error("work_days enables no weekday")]
    NoWorkDays,
    #[error("daily task {key:?} has an invalid time {time:?}")]
    InvalidDailyTask { key: String, time: String },
    #[error("settings file not found at {0} (run `jira-autolog init` to create one)")]
    NotFound(PathBuf),
    #[error("could not determine the platform config directory")]
    NoConfigDir,
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Loads and saves the settings file at a fixed path.
pub struct SettingsManager {
    path: PathBuf,
}

impl SettingsManager {
    /// Manager bound to the platform-specific config path.
    pub fn from_default_location() -> Result<Self, SettingsError> {
        let dirs = directories::ProjectDirs::from("", "", "jira-autolog")
            .ok_or(SettingsError::NoConfigDir)?;
        Ok(Self {
            path: dirs.config_dir().join("settings.yaml"),
        })
    }

    /// Manager bound to an explicit path.
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Loads settings from disk. Unlike a desktop app with an editor UI,
    /// a missing or malformed file is an error here, not a silent default.
    pub fn load(&self) -> Result<Settings, SettingsError> {
        if !self.path.exists() {
            return Err(SettingsError::NotFound(self.path.clone()));
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Persists settings to disk, creating parent directories when needed.
    pub fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(settings)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}
