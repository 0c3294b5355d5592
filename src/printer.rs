use std::fmt::{self, Write};

use chrono::{DateTime, TimeZone};
use log::warn;

use crate::caller::Caller;
use crate::config::{Config, DEFAULT_TIME_FORMAT};
use crate::level::Severity;

pub const RESET: &str = "\x1b[0m";
pub const FG_RED: &str = "\x1b[31m";
pub const FG_GREEN: &str = "\x1b[32m";
pub const FG_YELLOW: &str = "\x1b[33m";
pub const FG_MAGENTA: &str = "\x1b[35m";
pub const FG_CYAN: &str = "\x1b[36m";

const FG_TIMESTAMP: &str = FG_CYAN;

/// Everything one line is built from.
pub struct Record<'a, Tz: TimeZone> {
    pub severity: Severity,
    pub time: &'a DateTime<Tz>,
    pub caller: Option<&'a Caller>,
    pub args: fmt::Arguments<'a>,
}

/// Assembles `<prefix> <timestamp> [<label>] <location><message>\n`.
pub fn format_line<Tz>(config: &Config, record: &Record<'_, Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let timestamp = format_timestamp(record.time, &config.time_format);
    let label = record.severity.label();

    // Unknown ordinals have no color assigned.
    let color = match record.severity.level() {
        Some(level) if !config.no_color => Some(level.color()),
        _ => None,
    };

    let mut line = String::with_capacity(64);
    line.push_str(&config.prefix);
    line.push(' ');
    match color {
        Some(level_color) => {
            push_painted(&mut line, FG_TIMESTAMP, &timestamp);
            line.push_str(" [");
            push_painted(&mut line, level_color, &label);
        }
        None => {
            line.push_str(&timestamp);
            line.push_str(" [");
            line.push_str(&label);
        }
    }
    line.push_str("] ");
    if let Some(caller) = record.caller {
        let _ = write!(line, "{} ", caller);
    }
    let _ = line.write_fmt(record.args);
    line.push('\n');
    line
}

/// Renders `time` with a strftime pattern, falling back to
/// [`DEFAULT_TIME_FORMAT`] when the pattern is malformed.
pub fn format_timestamp<Tz>(time: &DateTime<Tz>, pattern: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let mut out = String::new();
    if write!(out, "{}", time.format(pattern)).is_ok() {
        return out;
    }
    warn!("invalid time format '{}', using default", pattern);
    out.clear();
    let _ = write!(out, "{}", time.format(DEFAULT_TIME_FORMAT));
    out
}

fn push_painted(line: &mut String, color: &str, text: &str) {
    line.push_str(color);
    line.push_str(text);
    line.push_str(RESET);
}
