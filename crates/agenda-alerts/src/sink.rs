//! OS-level notification mechanisms.
//!
//! The poller fires one notification per surfaced item and never retries;
//! a failed notification is logged and otherwise ignored.

use std::sync::Arc;
use std::time::Duration;

use agenda_core::config::SinkKind;
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::SinkError;

/// Maximum time a notifier program may take before it is killed.
const NOTIFIER_TIMEOUT: Duration = Duration::from_secs(5);

/// Fire-and-forget delivery of a title/message pair to the platform.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    async fn notify(&self, title: &str, message: &str) -> Result<(), SinkError>;
}

/// Builds the argument list for a notifier program from title and message.
pub type ArgsBuilder = fn(&str, &str) -> Vec<String>;

/// Runs an external notifier program directly (no shell).
pub struct CommandSink {
    name: &'static str,
    program: String,
    build_args: ArgsBuilder,
}

impl CommandSink {
    pub fn new(name: &'static str, program: impl Into<String>, build_args: ArgsBuilder) -> Self {
        Self {
            name,
            program: program.into(),
            build_args,
        }
    }

    /// macOS Notification Center via `osascript`.
    pub fn osascript() -> Self {
        Self::new("osascript", "osascript", |title, message| {
            vec![
                "-e".to_string(),
                format!(
                    "display notification \"{}\" with title \"{}\" sound name \"default\"",
                    escape_applescript(message),
                    escape_applescript(title)
                ),
            ]
        })
    }

    /// freedesktop notifications via `notify-send`.
    pub fn notify_send() -> Self {
        Self::new("notify-send", "notify-send", |title, message| {
            vec![
                "--app-name=agenda".to_string(),
                title.to_string(),
                message.to_string(),
            ]
        })
    }
}

#[async_trait]
impl NotificationSink for CommandSink {
    fn name(&self) -> &str {
        self.name
    }

    async fn notify(&self, title: &str, message: &str) -> Result<(), SinkError> {
        let mut cmd = Command::new(&self.program);
        cmd.args((self.build_args)(title, message))
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true);

        let status = match tokio::time::timeout(NOTIFIER_TIMEOUT, cmd.status()).await {
            Ok(status) => status?,
            Err(_) => {
                return Err(SinkError::Timeout {
                    ms: NOTIFIER_TIMEOUT.as_millis() as u64,
                })
            }
        };
        if !status.success() {
            return Err(SinkError::Failed {
                status: status.code(),
            });
        }
        debug!(sink = self.name, "os notification delivered");
        Ok(())
    }
}

/// Logs instead of notifying; used where no platform mechanism exists.
#[derive(Debug, Default)]
pub struct NullSink;

#[async_trait]
impl NotificationSink for NullSink {
    fn name(&self) -> &str {
        "none"
    }

    async fn notify(&self, title: &str, message: &str) -> Result<(), SinkError> {
        debug!(%title, %message, "os notification suppressed");
        Ok(())
    }
}

/// Resolve the configured sink, picking by target OS for `auto`.
pub fn sink_from_kind(kind: SinkKind) -> Arc<dyn NotificationSink> {
    let resolved = match kind {
        SinkKind::Auto if cfg!(target_os = "macos") => SinkKind::Osascript,
        SinkKind::Auto if cfg!(all(unix, not(target_os = "macos"))) => SinkKind::NotifySend,
        SinkKind::Auto => SinkKind::None,
        other => other,
    };
    let sink: Arc<dyn NotificationSink> = match resolved {
        SinkKind::Osascript => Arc::new(CommandSink::osascript()),
        SinkKind::NotifySend => Arc::new(CommandSink::notify_send()),
        SinkKind::None | SinkKind::Auto => Arc::new(NullSink),
    };
    info!(sink = sink.name(), "os notification sink selected");
    sink
}

/// Escape text for embedding in an AppleScript string literal.
fn escape_applescript(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
