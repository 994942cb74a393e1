use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

const ENABLED_VAR: &str = "CHAT_STREAM_OBSERVABILITY_ENABLED";
const LEVEL_VAR: &str = "CHAT_STREAM_LOG_LEVEL";
const JSON_PATH_VAR: &str = "CHAT_STREAM_JSON_LOG_PATH";
const DEFAULT_JSON_FILE: &str = "chat-stream.logs.jsonl";

static INSTALLED: OnceCell<()> = OnceCell::new();

/// Where log records go.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogSink {
    /// Compact lines on stderr, so logs never interleave with a reply on stdout.
    Stderr,
    /// One JSON object per line, appended to this file.
    JsonFile(PathBuf),
}

/// Logging settings read from the environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogSettings {
    pub enabled: bool,
    /// Filter directive from `CHAT_STREAM_LOG_LEVEL`. `RUST_LOG` and then the
    /// caller's default level apply when this is unset or invalid.
    pub filter: Option<String>,
    pub sink: LogSink,
}

impl LogSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        // Unrecognized spellings keep logging on.
        let enabled = lookup(ENABLED_VAR)
            .and_then(|raw| parse_switch(&raw))
            .unwrap_or(true);
        let filter = lookup(LEVEL_VAR).filter(|raw| !raw.trim().is_empty());
        let sink = match lookup(JSON_PATH_VAR) {
            Some(path) if !path.trim().is_empty() => LogSink::JsonFile(PathBuf::from(path)),
            _ => LogSink::Stderr,
        };
        Self {
            enabled,
            filter,
            sink,
        }
    }

    fn env_filter(&self, default_level: &str) -> EnvFilter {
        self.filter
            .as_deref()
            .and_then(|directive| EnvFilter::try_new(directive).ok())
            .or_else(|| EnvFilter::try_from_default_env().ok())
            .unwrap_or_else(|| EnvFilter::new(default_level))
    }

    /// Installs a subscriber for these settings. Does nothing when disabled or
    /// when another global subscriber is already set.
    pub fn install(&self, default_level: &str) {
        if !self.enabled {
            return;
        }
        let registry = tracing_subscriber::registry().with(self.env_filter(default_level));
        let _ = match &self.sink {
            LogSink::Stderr => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .compact()
                        .with_target(false)
                        .with_writer(std::io::stderr),
                )
                .try_init(),
            LogSink::JsonFile(path) => {
                let (dir, file) = split_log_path(path);
                let _ = std::fs::create_dir_all(&dir);
                registry
                    .with(
                        tracing_subscriber::fmt::layer()
                            .json()
                            .with_current_span(true)
                            .with_target(false)
                            .with_writer(tracing_appender::rolling::never(dir, file)),
                    )
                    .try_init()
            }
        };
    }
}

fn parse_switch(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn split_log_path(path: &Path) -> (PathBuf, String) {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let file = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(DEFAULT_JSON_FILE)
        .to_string();
    (dir, file)
}

/// Installs the process-wide tracing subscriber from [`LogSettings::from_env`].
/// Only the first call in a process has any effect.
///
/// Environment variables: `CHAT_STREAM_OBSERVABILITY_ENABLED`,
/// `CHAT_STREAM_LOG_LEVEL`, `CHAT_STREAM_JSON_LOG_PATH`, `RUST_LOG`.
pub fn init_observability(default_level: &str) {
    INSTALLED.get_or_init(|| LogSettings::from_env().install(default_level));
}
