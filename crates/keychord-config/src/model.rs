//! Configuration data model

use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub global: GlobalConfig,
    pub bindings: Vec<Binding>,
}

/// Global settings
#[derive(Debug, Clone)]
pub struct GlobalConfig {
    pub log_level: LogLevel,
    /// Milliseconds without a press before held keys are dropped (0 disables)
    pub idle_timeout_ms: u64,
    /// Log every stack transition
    pub debug: bool,
    /// Name of the keyboard to listen on; the first keyboard found when unset
    pub device: Option<String>,
}

impl GlobalConfig {
    pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 750;

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            idle_timeout_ms: Self::DEFAULT_IDLE_TIMEOUT_MS,
            debug: false,
            device: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive usable with `tracing_subscriber::EnvFilter`
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(format!("Unknown log level: {}", s)),
        }
    }
}

/// A chord binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// Key names in press order
    pub keys: Vec<String>,
    /// Clear held keys once the chord has fired
    pub clear_stack: bool,
    /// Shell command to run on a match
    pub command: Option<String>,
    /// Working directory for `command`, with `~` expanded
    pub cwd: Option<PathBuf>,
    /// Label used in logs and JSON output
    pub name: Option<String>,
}

impl Binding {
    /// The binding's name, or its keys joined by spaces
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self.keys.join(" "),
        }
    }
}
