// Backend for conlog's own diagnostics (bad time formats, failed writes,
// stack walks). Installed by the binary only; library users bring their own
// `log` backend.
use env_logger::{Builder, Env, Target};
use log::Level;
use std::io::Write;

/// Filter for the diagnostics, in `RUST_LOG` syntax. Separate from
/// `RUST_LOG` so a parent process's setting does not leak in.
pub const DIAGNOSTICS_ENV: &str = "CONLOG_LOG";
pub const DEFAULT_DIAGNOSTICS_FILTER: &str = "conlog=warn";

pub fn init() {
    let env = Env::new().filter_or(DIAGNOSTICS_ENV, DEFAULT_DIAGNOSTICS_FILTER);
    let mut builder = Builder::from_env(env);

    // Same shape as the binary's error messages: `conlog: warning: ...`.
    builder.target(Target::Stderr).format(|buf, record| {
        writeln!(
            buf,
            "conlog: {}: {}",
            diagnostic_label(record.level()),
            record.args()
        )
    });

    if builder.try_init().is_err() {
        log::debug!("diagnostic logger already initialized");
    }
}

fn diagnostic_label(level: Level) -> &'static str {
    match level {
        Level::Error => "error",
        Level::Warn => "warning",
        Level::Info => "note",
        Level::Debug | Level::Trace => "debug",
    }
}
