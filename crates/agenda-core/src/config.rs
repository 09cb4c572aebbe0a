use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_ADVANCE_MINUTES: u64 = 15;
pub const DEFAULT_TOLERANCE_SECS: u64 = 30;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_COUNTDOWN_SECS: f32 = 30.0;
pub const DEFAULT_ANIMATION_SPEED: f32 = 8.0;
pub const DEFAULT_MAX_ALERTS: usize = 8;
pub const DEFAULT_MESSAGE_CHARS: usize = 75;
pub const DEFAULT_TITLE: &str = "Agenda Reminder";

/// Top-level config (agenda.toml + AGENDA_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgendaConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Poller cadence and the eligibility window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// How long before the scheduled instant an item is surfaced.
    #[serde(default = "default_advance_minutes")]
    pub advance_minutes: u64,
    /// Half-width of the eligibility window around the advance target.
    #[serde(default = "default_tolerance_secs")]
    pub tolerance_secs: u64,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Title used for every alert raised by the poller.
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub sink: SinkKind,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            advance_minutes: DEFAULT_ADVANCE_MINUTES,
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            title: default_title(),
            sink: SinkKind::default(),
        }
    }
}

/// Which OS notification mechanism to use.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SinkKind {
    /// Pick by target OS at startup.
    #[default]
    Auto,
    Osascript,
    NotifySend,
    None,
}

/// How the display surface reacts to alerts added while a session is open.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ResizePolicy {
    /// Size once from the alert count at session start.
    #[default]
    FixedAtOpen,
    /// Resize whenever the alert count changes.
    FollowStack,
}

/// Alert geometry, timing and appearance. Lengths are surface units (pixels).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_countdown_secs")]
    pub countdown_secs: f32,
    #[serde(default = "default_animation_speed")]
    pub animation_speed: f32,
    /// Simultaneous alerts kept on screen; older ones fold into "+K more".
    #[serde(default = "default_max_alerts")]
    pub max_alerts: usize,
    /// Character budget for the message line before it is ellipsized.
    #[serde(default = "default_message_chars")]
    pub message_chars: usize,
    #[serde(default)]
    pub resize: ResizePolicy,
    #[serde(default = "default_width")]
    pub width: f32,
    #[serde(default = "default_alert_height")]
    pub alert_height: f32,
    #[serde(default = "default_spacing")]
    pub spacing: f32,
    /// Gap between the surface and the monitor's top-right corner.
    #[serde(default = "default_margin")]
    pub margin: f32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            countdown_secs: DEFAULT_COUNTDOWN_SECS,
            animation_speed: DEFAULT_ANIMATION_SPEED,
            max_alerts: DEFAULT_MAX_ALERTS,
            message_chars: DEFAULT_MESSAGE_CHARS,
            resize: ResizePolicy::default(),
            width: default_width(),
            alert_height: default_alert_height(),
            spacing: default_spacing(),
            margin: default_margin(),
        }
    }
}

fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.agenda/agenda.db", home)
}
fn default_advance_minutes() -> u64 {
    DEFAULT_ADVANCE_MINUTES
}
fn default_tolerance_secs() -> u64 {
    DEFAULT_TOLERANCE_SECS
}
fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}
fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}
fn default_countdown_secs() -> f32 {
    DEFAULT_COUNTDOWN_SECS
}
fn default_animation_speed() -> f32 {
    DEFAULT_ANIMATION_SPEED
}
fn default_max_alerts() -> usize {
    DEFAULT_MAX_ALERTS
}
fn default_message_chars() -> usize {
    DEFAULT_MESSAGE_CHARS
}
fn default_width() -> f32 {
    420.0
}
fn default_alert_height() -> f32 {
    120.0
}
fn default_spacing() -> f32 {
    10.0
}
fn default_margin() -> f32 {
    20.0
}

impl AgendaConfig {
    /// Load config from a TOML file with AGENDA_* env var overrides.
    ///
    /// Path resolution: explicit argument, else `~/.agenda/agenda.toml`.
    /// A missing file is not an error; every field has a default.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: AgendaConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("AGENDA_").split("__"))
            .extract()
            .map_err(|e| crate::error::CoreError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with; warn about risky ones.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::CoreError::Config;

        if self.notify.poll_interval_secs == 0 {
            return Err(Config("notify.poll_interval_secs must be positive".into()));
        }
        if !(self.display.countdown_secs > 0.0) {
            return Err(Config("display.countdown_secs must be positive".into()));
        }
        if !(self.display.animation_speed > 0.0) {
            return Err(Config("display.animation_speed must be positive".into()));
        }
        if self.display.max_alerts == 0 {
            return Err(Config("display.max_alerts must be at least 1".into()));
        }
        if self.notify.tolerance_secs * 2 < self.notify.poll_interval_secs {
            warn!(
                tolerance_secs = self.notify.tolerance_secs,
                poll_interval_secs = self.notify.poll_interval_secs,
                "eligibility window is narrower than the poll cadence; items can be missed"
            );
        }
        Ok(())
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.agenda/agenda.toml", home)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_constants() {
        let cfg = AgendaConfig::default();
        assert_eq!(cfg.notify.advance_minutes, 15);
        assert_eq!(cfg.notify.tolerance_secs, 30);
        assert_eq!(cfg.notify.poll_interval_secs, 30);
        assert_eq!(cfg.display.countdown_secs, 30.0);
        assert_eq!(cfg.display.resize, ResizePolicy::FixedAtOpen);
        assert_eq!(cfg.notify.sink, SinkKind::Auto);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg: AgendaConfig = Figment::new()
            .merge(Toml::string(
                "[notify]\nadvance_minutes = 5\nsink = \"notify-send\"\n\n[display]\nresize = \"follow-stack\"\n",
            ))
            .extract()
            .unwrap();
        assert_eq!(cfg.notify.advance_minutes, 5);
        assert_eq!(cfg.notify.tolerance_secs, 30);
        assert_eq!(cfg.notify.sink, SinkKind::NotifySend);
        assert_eq!(cfg.display.resize, ResizePolicy::FollowStack);
        assert_eq!(cfg.display.width, 420.0);
    }

    #[test]
    fn zero_countdown_rejected() {
        let mut cfg = AgendaConfig::default();
        cfg.display.countdown_secs = 0.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_poll_interval_rejected() {
        let mut cfg = AgendaConfig::default();
        cfg.notify.poll_interval_secs = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn narrow_window_is_only_a_warning() {
        let mut cfg = AgendaConfig::default();
        cfg.notify.tolerance_secs = 5;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = AgendaConfig::load(Some("/nonexistent/agenda.toml")).unwrap();
        assert_eq!(cfg.display.max_alerts, DEFAULT_MAX_ALERTS);
    }
}
