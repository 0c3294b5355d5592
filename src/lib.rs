#![doc = include_str!("../README.md")]

pub mod caller;
pub mod cli;
pub mod config;
mod emitter;
pub mod error;
pub mod level;
pub mod logger;
mod macros;
pub mod printer;

use std::fmt;
use std::sync::OnceLock;

pub use caller::Caller;
pub use config::Config;
pub use emitter::{Logger, LoggerBuilder, FATAL_EXIT_CODE};
pub use error::{Error, Result};
pub use level::{Level, Severity};

static DEFAULT_LOGGER: OnceLock<Logger> = OnceLock::new();

/// The process-wide logger behind the free functions and the macros.
/// It writes to stdout with [`Config::default`] until reconfigured.
pub fn logger() -> &'static Logger {
    DEFAULT_LOGGER.get_or_init(Logger::default)
}

/// Adjusts the default logger. Meant for startup, before other threads log.
pub fn configure<F>(f: F)
where
    F: FnOnce(&mut Config),
{
    logger().update(f);
}

/// Overlays the `CONLOG_*` and `NO_COLOR` environment variables onto the
/// default logger's configuration.
pub fn init_from_env() -> Result<()> {
    let mut config = logger().config();
    config.apply_lookup(|key| std::env::var(key).ok())?;
    logger().set_config(config);
    Ok(())
}

pub fn run() -> Result<()> {
    use clap::Parser;
    cli::run_with_cli(cli::Cli::parse())
}

#[track_caller]
#[inline(never)]
pub fn emit(level: Level, args: fmt::Arguments<'_>) {
    logger().emit(level, args);
}

#[track_caller]
#[inline(never)]
pub fn debug(args: fmt::Arguments<'_>) {
    logger().emit(Level::Debug, args);
}

#[track_caller]
#[inline(never)]
pub fn info(args: fmt::Arguments<'_>) {
    logger().emit(Level::Info, args);
}

#[track_caller]
#[inline(never)]
pub fn warn(args: fmt::Arguments<'_>) {
    logger().emit(Level::Warning, args);
}

#[track_caller]
#[inline(never)]
pub fn error(args: fmt::Arguments<'_>) {
    logger().emit(Level::Error, args);
}

/// Writes a fatal line and exits the process with [`FATAL_EXIT_CODE`].
#[track_caller]
#[inline(never)]
pub fn fatal(args: fmt::Arguments<'_>) {
    logger().emit(Level::Fatal, args);
}
