use std::env;

use crate::error::{Error, Result};

pub const DEFAULT_PREFIX: &str = "[Log]";
/// Renders as `YY-MM-DD HH:MM:SS`.
pub const DEFAULT_TIME_FORMAT: &str = "%y-%m-%d %H:%M:%S";
/// Frames between the stack walk and the user call site when going through
/// one of the level wrappers: `emit` (0), the wrapper (1), the caller (2).
pub const DEFAULT_CALLER_DEPTH: usize = 2;

pub const ENV_PREFIX: &str = "CONLOG_PREFIX";
pub const ENV_TIME_FORMAT: &str = "CONLOG_TIME_FORMAT";
pub const ENV_NO_COLOR: &str = "CONLOG_NO_COLOR";
pub const ENV_SHOW_LOCATION: &str = "CONLOG_SHOW_LOCATION";
pub const ENV_CALLER_DEPTH: &str = "CONLOG_CALLER_DEPTH";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub prefix: String,
    /// chrono strftime pattern.
    pub time_format: String,
    pub no_color: bool,
    /// Adds the `[file:line fn()]` segment. Plain function calls capture a
    /// full backtrace per line for this, which is slow; the macros capture
    /// their site at compile time and cost nothing extra.
    pub show_location: bool,
    /// Backtrace frames to skip when resolving the caller of a plain
    /// function call. Ignored by the macros, which capture their site.
    pub caller_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            time_format: DEFAULT_TIME_FORMAT.to_string(),
            // Legacy Windows consoles do not interpret ANSI escapes.
            no_color: cfg!(windows),
            show_location: false,
            caller_depth: DEFAULT_CALLER_DEPTH,
        }
    }
}

impl Config {
    /// Defaults overlaid with the `CONLOG_*` and `NO_COLOR` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        config.apply_lookup(lookup)?;
        Ok(config)
    }

    pub fn apply_lookup<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(prefix) = lookup(ENV_PREFIX) {
            self.prefix = prefix;
        }
        if let Some(format) = lookup(ENV_TIME_FORMAT) {
            self.time_format = format;
        }
        if lookup("NO_COLOR").is_some_and(|v| !v.is_empty()) {
            self.no_color = true;
        }
        if let Some(raw) = lookup(ENV_NO_COLOR) {
            self.no_color = parse_bool(ENV_NO_COLOR, &raw)?;
        }
        if let Some(raw) = lookup(ENV_SHOW_LOCATION) {
            self.show_location = parse_bool(ENV_SHOW_LOCATION, &raw)?;
        }
        if let Some(raw) = lookup(ENV_CALLER_DEPTH) {
            self.caller_depth = raw.trim().parse().map_err(|err| Error::InvalidEnv {
                key: ENV_CALLER_DEPTH,
                value: raw.clone(),
                reason: format!("{}", err),
            })?;
        }
        Ok(())
    }
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(Error::InvalidEnv {
            key,
            value: raw.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}
