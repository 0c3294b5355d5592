use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::printer::{FG_CYAN, FG_GREEN, FG_MAGENTA, FG_RED, FG_YELLOW};

/// Fixed-width display labels, indexed by [`Level::ordinal`].
pub const LABELS: [&str; 5] = ["DEBUG", " INFO", " WARN", "ERROR", "FATAL"];

/// Width every rendered label is padded to.
pub const LABEL_WIDTH: usize = 5;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Level {
    Debug = 0,
    Info,
    Warning,
    Error,
    Fatal,
}

impl Level {
    pub const ALL: [Level; 5] = [
        Level::Debug,
        Level::Info,
        Level::Warning,
        Level::Error,
        Level::Fatal,
    ];

    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn from_ordinal(ordinal: u8) -> Option<Level> {
        Self::ALL.get(usize::from(ordinal)).copied()
    }

    pub fn label(self) -> &'static str {
        LABELS[usize::from(self.ordinal())]
    }

    /// ANSI foreground used for the bracketed label.
    pub fn color(self) -> &'static str {
        match self {
            Level::Debug => FG_CYAN,
            Level::Info => FG_GREEN,
            Level::Warning => FG_YELLOW,
            Level::Error => FG_RED,
            Level::Fatal => FG_MAGENTA,
        }
    }

    pub fn is_fatal(self) -> bool {
        self == Level::Fatal
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label().trim_start())
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warning),
            "error" => Ok(Level::Error),
            "fatal" => Ok(Level::Fatal),
            _ => Err(Error::UnknownLevel(s.to_string())),
        }
    }
}

/// A level as received from a caller, which may carry an ordinal outside
/// the defined range.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Severity {
    Known(Level),
    Unknown(u8),
}

impl Severity {
    pub fn from_ordinal(ordinal: u8) -> Severity {
        match Level::from_ordinal(ordinal) {
            Some(level) => Severity::Known(level),
            None => Severity::Unknown(ordinal),
        }
    }

    pub fn level(self) -> Option<Level> {
        match self {
            Severity::Known(level) => Some(level),
            Severity::Unknown(_) => None,
        }
    }

    /// Label padded to [`LABEL_WIDTH`]; unknown ordinals render as their number.
    pub fn label(self) -> String {
        match self {
            Severity::Known(level) => level.label().to_string(),
            Severity::Unknown(ordinal) => format!("{:>width$}", ordinal, width = LABEL_WIDTH),
        }
    }
}

impl From<Level> for Severity {
    fn from(level: Level) -> Self {
        Severity::Known(level)
    }
}
