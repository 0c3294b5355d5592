use std::fmt;
use std::io::{self, Write};
use std::panic::Location;
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};

use chrono::{DateTime, Local};
use log::warn;

use crate::caller::{self, Caller};
use crate::config::Config;
use crate::level::{Level, Severity};
use crate::printer::{self, Record};

/// Exit status used after a fatal line.
pub const FATAL_EXIT_CODE: i32 = 1;

type Sink = Box<dyn Write + Send>;
type Clock = Box<dyn Fn() -> DateTime<Local> + Send + Sync>;
type Terminator = Box<dyn Fn(i32) + Send + Sync>;

/// A console logger. Every call writes exactly one line; nothing is filtered.
///
/// The sink, clock and terminator default to stdout, [`Local::now`] and
/// [`std::process::exit`]; [`LoggerBuilder`] swaps them out.
pub struct Logger {
    config: RwLock<Config>,
    sink: Mutex<Sink>,
    clock: Clock,
    terminate: Terminator,
}

impl Logger {
    pub fn new(config: Config) -> Self {
        Self::builder().config(config).build()
    }

    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::default()
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> Config {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_config(&self, config: Config) {
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
    }

    /// Applies `f` to a copy of the configuration and stores the result.
    /// No lock is held while `f` runs, so it may log through this logger.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut Config),
    {
        let mut config = self.config();
        f(&mut config);
        self.set_config(config);
    }

    /// Writes one line at `level`. A [`Level::Fatal`] line terminates the
    /// process with [`FATAL_EXIT_CODE`] once written.
    #[track_caller]
    #[inline(never)]
    pub fn emit(&self, level: Level, args: fmt::Arguments<'_>) {
        let site = Location::caller();
        let config = self.config();
        // Resolved here so `emit` is frame 0 of the walk; the entry points
        // are never inlined so the numbering holds in optimized builds.
        let caller = if config.show_location {
            Some(caller::resolve(site, config.caller_depth))
        } else {
            None
        };
        self.dispatch(&config, Severity::Known(level), caller, args);
    }

    /// Like [`Logger::emit`] for a raw ordinal. Ordinals outside the level
    /// table print their number as the label, uncolored, and never terminate.
    #[track_caller]
    #[inline(never)]
    pub fn emit_ordinal(&self, ordinal: u8, args: fmt::Arguments<'_>) {
        let site = Location::caller();
        let config = self.config();
        let caller = if config.show_location {
            Some(caller::resolve(site, config.caller_depth))
        } else {
            None
        };
        self.dispatch(&config, Severity::from_ordinal(ordinal), caller, args);
    }

    /// Used by the macros, which know their call site already.
    pub fn emit_at(&self, level: Level, caller: Caller, args: fmt::Arguments<'_>) {
        let config = self.config();
        let caller = config.show_location.then_some(caller);
        self.dispatch(&config, Severity::Known(level), caller, args);
    }

    #[track_caller]
    #[inline(never)]
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Debug, args);
    }

    #[track_caller]
    #[inline(never)]
    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Info, args);
    }

    #[track_caller]
    #[inline(never)]
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Warning, args);
    }

    #[track_caller]
    #[inline(never)]
    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Error, args);
    }

    #[track_caller]
    #[inline(never)]
    pub fn fatal(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Fatal, args);
    }

    fn dispatch(
        &self,
        config: &Config,
        severity: Severity,
        caller: Option<Caller>,
        args: fmt::Arguments<'_>,
    ) {
        let now = (self.clock)();
        let line = printer::format_line(
            config,
            &Record {
                severity,
                time: &now,
                caller: caller.as_ref(),
                args,
            },
        );
        self.write_line(&line);

        if severity.level().is_some_and(Level::is_fatal) {
            (self.terminate)(FATAL_EXIT_CODE);
        }
    }

    fn write_line(&self, line: &str) {
        let mut sink = self.lock_sink();
        if let Err(err) = sink.write_all(line.as_bytes()).and_then(|()| sink.flush()) {
            warn!("failed to write log line: {}", err);
        }
    }

    fn lock_sink(&self) -> MutexGuard<'_, Sink> {
        self.sink.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("config", &self.config())
            .finish_non_exhaustive()
    }
}

pub struct LoggerBuilder {
    config: Config,
    sink: Option<Sink>,
    clock: Option<Clock>,
    terminate: Option<Terminator>,
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self {
            config: Config::default(),
            sink: None,
            clock: None,
            terminate: None,
        }
    }
}

impl LoggerBuilder {
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Replaces stdout as the destination.
    pub fn writer<W>(mut self, writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        self.sink = Some(Box::new(writer));
        self
    }

    pub fn clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Local> + Send + Sync + 'static,
    {
        self.clock = Some(Box::new(clock));
        self
    }

    /// Replaces [`std::process::exit`] on the fatal path.
    pub fn terminate<F>(mut self, terminate: F) -> Self
    where
        F: Fn(i32) + Send + Sync + 'static,
    {
        self.terminate = Some(Box::new(terminate));
        self
    }

    pub fn build(self) -> Logger {
        Logger {
            config: RwLock::new(self.config),
            sink: Mutex::new(self.sink.unwrap_or_else(|| Box::new(io::stdout()))),
            clock: self.clock.unwrap_or_else(|| Box::new(Local::now)),
            terminate: self.terminate.unwrap_or_else(|| {
                Box::new(|code: i32| {
                    std::process::exit(code);
                })
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Capture {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct Harness {
        logger: Logger,
        out: Capture,
        exit_code: Arc<AtomicI32>,
    }

    fn harness(config: Config) -> Harness {
        let out = Capture::default();
        let exit_code = Arc::new(AtomicI32::new(-1));
        let recorded = exit_code.clone();
        let logger = Logger::builder()
            .config(config)
            .writer(out.clone())
            .clock(|| Local.with_ymd_and_hms(2023, 11, 5, 18, 30, 0).unwrap())
            .terminate(move |code| recorded.store(code, Ordering::SeqCst))
            .build();
        Harness {
            logger,
            out,
            exit_code,
        }
    }

    fn plain() -> Config {
        Config {
            no_color: true,
            ..Config::default()
        }
    }

    #[test]
    fn non_fatal_levels_do_not_terminate() {
        let h = harness(plain());
        h.logger.debug(format_args!("x={}", 42));
        h.logger.info(format_args!("i"));
        h.logger.warn(format_args!("w"));
        h.logger.error(format_args!("e"));

        assert_eq!(h.exit_code.load(Ordering::SeqCst), -1);
        assert_eq!(
            h.out.text(),
            "[Log] 23-11-05 18:30:00 [DEBUG] x=42\n\
             [Log] 23-11-05 18:30:00 [ INFO] i\n\
             [Log] 23-11-05 18:30:00 [ WARN] w\n\
             [Log] 23-11-05 18:30:00 [ERROR] e\n"
        );
    }

    #[test]
    fn fatal_writes_then_terminates_with_one() {
        let h = harness(plain());
        h.logger.fatal(format_args!("unrecoverable: {}", "disk full"));

        assert_eq!(h.exit_code.load(Ordering::SeqCst), FATAL_EXIT_CODE);
        assert_eq!(
            h.out.text(),
            "[Log] 23-11-05 18:30:00 [FATAL] unrecoverable: disk full\n"
        );
    }

    #[test]
    fn unknown_ordinal_degrades_without_terminating() {
        let h = harness(Config {
            no_color: false,
            ..Config::default()
        });
        h.logger.emit_ordinal(12, format_args!("odd"));
        h.logger.emit_ordinal(4, format_args!("known"));

        let text = h.out.text();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("[Log] 23-11-05 18:30:00 [   12] odd"));
        assert!(lines.next().unwrap().contains("FATAL"));
        assert_eq!(h.exit_code.load(Ordering::SeqCst), FATAL_EXIT_CODE);
    }

    #[test]
    fn identical_calls_produce_identical_bytes() {
        let h = harness(Config::default());
        h.logger.warn(format_args!("same {}", 1));
        let first = h.out.text();
        h.logger.warn(format_args!("same {}", 1));
        let both = h.out.text();
        assert_eq!(both, format!("{first}{first}"));
    }

    #[test]
    fn config_changes_apply_to_next_line() {
        let h = harness(plain());
        h.logger.info(format_args!("a"));
        h.logger.update(|cfg| cfg.prefix = "[svc]".to_string());
        h.logger.info(format_args!("b"));

        let text = h.out.text();
        assert!(text.starts_with("[Log] "));
        assert!(text.lines().nth(1).unwrap().starts_with("[svc] "));
        assert_eq!(h.logger.config().prefix, "[svc]");
    }

    #[test]
    fn explicit_caller_is_rendered_verbatim() {
        let h = harness(Config {
            show_location: true,
            ..plain()
        });
        h.logger.emit_at(
            Level::Info,
            Caller::new("/repo/src/api.rs", 17, "repo::api::handle"),
            format_args!("ok"),
        );
        assert_eq!(
            h.out.text(),
            "[Log] 23-11-05 18:30:00 [ INFO] [api.rs:17 handle()] ok\n"
        );
    }

    #[test]
    fn location_is_omitted_by_default() {
        let h = harness(plain());
        h.logger.emit_at(
            Level::Info,
            Caller::new("src/api.rs", 17, "handle"),
            format_args!("ok"),
        );
        assert!(!h.out.text().contains("api.rs"));
    }

    #[test]
    fn update_closure_may_log_through_same_logger() {
        let h = harness(plain());
        h.logger.update(|cfg| {
            h.logger.info(format_args!("reconfiguring"));
            cfg.prefix = "[new]".to_string();
        });
        h.logger.info(format_args!("after"));

        assert_eq!(
            h.out.text(),
            "[Log] 23-11-05 18:30:00 [ INFO] reconfiguring\n\
             [new] 23-11-05 18:30:00 [ INFO] after\n"
        );
    }

    #[test]
    fn walked_location_points_at_this_file() {
        let h = harness(Config {
            show_location: true,
            ..plain()
        });
        h.logger.info(format_args!("walk"));

        let text = h.out.text();
        let start = text.find("] [").unwrap() + 3;
        let segment = &text[start..text.find("()] walk").unwrap()];
        let (file_line, function) = segment.split_once(' ').unwrap();
        let (file, line) = file_line.split_once(':').unwrap();
        assert_eq!(file, "emitter.rs");
        assert!(line.parse::<u32>().unwrap() > 0);
        assert!(!function.is_empty());
    }
}
