//! Caller-location resolution.
//!
//! Two paths feed a [`Caller`]: the logging macros capture `file!()`,
//! `line!()` and the enclosing function at expansion time, while the plain
//! functions walk a captured backtrace. The walk numbers frames starting at
//! the logger entry point that called [`resolve`]:
//!
//! | index | frame                                   |
//! |-------|-----------------------------------------|
//! | 0     | `Logger::emit` / `Logger::emit_ordinal` |
//! | 1     | a level wrapper (`info`, `Logger::warn`, ...) or the caller |
//! | 2     | the caller of a level wrapper           |
//!
//! `Config::caller_depth` picks the index, so it has to match how many
//! wrapper layers sit between user code and `emit`.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt;
use std::panic::Location;

use log::debug;

/// Function name used when the stack walk cannot name the caller.
pub const UNKNOWN_FUNCTION: &str = "?";

const ANCHOR: &str = "caller::resolve";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Caller {
    file: String,
    line: u32,
    function: String,
}

impl Caller {
    /// `function` may be a full path; only its last segment is rendered.
    pub fn new(file: impl Into<String>, line: u32, function: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line,
            function: function.into(),
        }
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn file_name(&self) -> &str {
        base_name(&self.file)
    }

    pub fn short_function(&self) -> &str {
        short_function_name(&self.function)
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}:{} {}()]",
            self.file_name(),
            self.line,
            self.short_function()
        )
    }
}

/// Walks the current stack and returns the frame `depth` levels above the
/// logger entry point. Frames without debug info keep the `site` file and
/// line; an unresolvable stack yields [`UNKNOWN_FUNCTION`].
#[inline(never)]
pub fn resolve(site: &Location<'_>, depth: usize) -> Caller {
    let frame = capture_frames().and_then(|frames| select_frame(frames, ANCHOR, depth));

    match frame {
        Some(Frame {
            symbol,
            location: Some((file, line)),
        }) => Caller::new(file, line, symbol),
        Some(Frame {
            symbol,
            location: None,
        }) => Caller::new(site.file(), site.line(), symbol),
        None => {
            debug!("stack walk found no frame at depth {}", depth);
            Caller::new(site.file(), site.line(), UNKNOWN_FUNCTION)
        }
    }
}

#[inline(never)]
fn capture_frames() -> Option<Vec<Frame>> {
    let backtrace = Backtrace::force_capture();
    if backtrace.status() != BacktraceStatus::Captured {
        debug!("backtrace unavailable: {:?}", backtrace.status());
        return None;
    }
    Some(parse_frames(&backtrace.to_string()))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Frame {
    pub symbol: String,
    pub location: Option<(String, u32)>,
}

/// Parses the `Display` form of [`Backtrace`]:
///
/// ```text
///    0: crate::module::function
///              at ./src/module.rs:10:5
///       crate::module::inlined_function
///              at ./src/module.rs:20:9
/// ```
pub(crate) fn parse_frames(text: &str) -> Vec<Frame> {
    let mut frames: Vec<Frame> = Vec::new();

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(location) = line.strip_prefix("at ") {
            if let Some(frame) = frames.last_mut() {
                if frame.location.is_none() {
                    frame.location = split_location(location);
                }
            }
            continue;
        }

        let symbol = match line.split_once(": ") {
            Some((index, rest)) if !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()) => {
                rest
            }
            _ => line,
        };
        frames.push(Frame {
            symbol: strip_symbol_hash(symbol).to_string(),
            location: None,
        });
    }

    frames
}

pub(crate) fn select_frame(frames: Vec<Frame>, anchor: &str, depth: usize) -> Option<Frame> {
    let position = frames.iter().position(|f| f.symbol.ends_with(anchor))?;
    frames.into_iter().skip(position + 1).nth(depth)
}

/// `path/to/file.rs:LINE:COL` -> (`path/to/file.rs`, LINE)
fn split_location(location: &str) -> Option<(String, u32)> {
    let mut parts = location.rsplitn(3, ':');
    let _column = parts.next()?;
    let line = parts.next()?.parse().ok()?;
    let file = parts.next()?;
    Some((file.to_string(), line))
}

fn strip_symbol_hash(symbol: &str) -> &str {
    match symbol.rsplit_once("::h") {
        Some((head, hash)) if hash.len() == 16 && hash.bytes().all(|b| b.is_ascii_hexdigit()) => {
            head
        }
        _ => symbol,
    }
}

pub fn base_name(file: &str) -> &str {
    file.rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(file)
}

/// Last path segment of a function path, without closure or shim
/// segments and generic arguments:
/// `app::Server<T>::run::<u8>::{closure#0}` -> `run`.
/// Anything that does not reduce to a plain identifier is [`UNKNOWN_FUNCTION`].
pub fn short_function_name(path: &str) -> &str {
    let path = cut_turbofish(path.trim());
    let path = trim_generic_suffix(path);
    let name = path
        .rsplit("::")
        .find(|segment| !segment.starts_with('{'))
        .unwrap_or_default();
    if is_identifier(name) {
        name
    } else {
        UNKNOWN_FUNCTION
    }
}

/// Drops everything from the first top-level `::<`.
fn cut_turbofish(path: &str) -> &str {
    let bytes = path.as_bytes();
    let mut depth = 0usize;
    for (idx, &byte) in bytes.iter().enumerate() {
        match byte {
            b'<' => {
                if depth == 0 && path[..idx].ends_with("::") {
                    return &path[..idx - 2];
                }
                depth += 1;
            }
            // `->` in `fn() -> T`
            b'>' if idx > 0 && bytes[idx - 1] == b'-' => {}
            b'>' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    path
}

fn trim_generic_suffix(path: &str) -> &str {
    if !path.ends_with('>') {
        return path;
    }
    let mut depth = 0usize;
    for (idx, ch) in path.char_indices().rev() {
        match ch {
            '>' if path[..idx].ends_with('-') => {}
            '>' => depth += 1,
            '<' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return &path[..idx];
                }
            }
            _ => {}
        }
    }
    path
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first == '_' || first.is_alphabetic() => {
            chars.all(|c| c == '_' || c.is_alphanumeric())
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
   0: std::backtrace::Backtrace::force_capture
             at /rustc/abc/library/std/src/backtrace.rs:312:9
   1: conlog::caller::capture_frames
             at ./src/caller.rs:95:21
   2: conlog::caller::resolve::h0123456789abcdef
             at ./src/caller.rs:80:17
   3: conlog::emitter::Logger::emit
             at ./src/emitter.rs:120:13
   4: conlog::emitter::Logger::info
             at ./src/emitter.rs:150:9
   5: app::worker::run_job
             at /home/dev/app/src/worker.rs:42:5
      app::main
             at /home/dev/app/src/main.rs:7:5
   6: core::ops::function::FnOnce::call_once
";

    #[test]
    fn parse_frames_reads_symbols_and_locations() {
        let frames = parse_frames(SAMPLE);
        assert_eq!(frames.len(), 8);
        assert_eq!(frames[2].symbol, "conlog::caller::resolve");
        assert_eq!(
            frames[5].location,
            Some(("/home/dev/app/src/worker.rs".to_string(), 42))
        );
        assert_eq!(frames[6].symbol, "app::main");
        assert_eq!(frames[7].location, None);
    }

    #[test]
    fn select_frame_counts_from_anchor() {
        let frames = parse_frames(SAMPLE);
        let emit = select_frame(frames.clone(), ANCHOR, 0).unwrap();
        assert_eq!(emit.symbol, "conlog::emitter::Logger::emit");

        let user = select_frame(frames.clone(), ANCHOR, 2).unwrap();
        assert_eq!(user.symbol, "app::worker::run_job");

        assert!(select_frame(frames, ANCHOR, 40).is_none());
    }

    #[test]
    fn select_frame_without_anchor_fails() {
        let frames = parse_frames("   0: main\n");
        assert!(select_frame(frames, ANCHOR, 0).is_none());
    }

    #[test]
    fn short_names_drop_paths_closures_and_generics() {
        assert_eq!(short_function_name("app::worker::run_job"), "run_job");
        assert_eq!(
            short_function_name("app::Server<T>::start::{{closure}}::{{closure}}"),
            "start"
        );
        assert_eq!(
            short_function_name("<app::Pool as app::Spawn>::spawn<alloc::string::String>"),
            "spawn"
        );
        assert_eq!(short_function_name("main"), "main");
        assert_eq!(short_function_name(""), UNKNOWN_FUNCTION);
    }

    #[test]
    fn short_names_from_optimized_backtraces() {
        assert_eq!(
            short_function_name(
                "test::__rust_begin_short_backtrace::<core::result::Result<(), alloc::string::String>, \
                 fn() -> core::result::Result<(), alloc::string::String>>"
            ),
            "__rust_begin_short_backtrace"
        );
        assert_eq!(short_function_name("app::spawn<fn() -> u8>"), "spawn");
        assert_eq!(short_function_name("app::jobs::run::{closure#0}"), "run");
        assert_eq!(
            short_function_name("<F as core::ops::function::FnOnce<()>>::call_once::{shim:vtable#0}"),
            "call_once"
        );
        assert_eq!(
            short_function_name("app::Server<T>::start::<u8>::{closure#1}"),
            "start"
        );
    }

    #[test]
    fn unreadable_names_degrade_to_placeholder() {
        assert_eq!(short_function_name("app::String>>"), UNKNOWN_FUNCTION);
        assert_eq!(short_function_name("{closure#0}"), UNKNOWN_FUNCTION);
        assert_eq!(short_function_name("app::9lives"), UNKNOWN_FUNCTION);
    }

    #[test]
    fn optimized_frames_without_locations_select_by_depth() {
        let text = "\
   0: conlog::caller::resolve
   1: conlog::emitter::Logger::emit
   2: conlog::emitter::Logger::info
   3: app::handler::<app::Json>::{closure#0}
   4: std::rt::lang_start::<()>::{closure#0}
";
        let frame = select_frame(parse_frames(text), ANCHOR, 2).unwrap();
        assert_eq!(frame.location, None);
        let caller = Caller::new("src/handler.rs", 12, frame.symbol);
        assert_eq!(caller.to_string(), "[handler.rs:12 handler()]");
    }

    #[test]
    fn base_name_strips_both_separators() {
        assert_eq!(base_name("/srv/app/src/main.rs"), "main.rs");
        assert_eq!(base_name(r"C:\work\app\src\lib.rs"), "lib.rs");
        assert_eq!(base_name("lib.rs"), "lib.rs");
    }

    #[test]
    fn caller_renders_bracketed_segment() {
        let caller = Caller::new("/srv/app/src/db.rs", 88, "app::db::connect");
        assert_eq!(caller.to_string(), "[db.rs:88 connect()]");
    }

    #[test]
    fn resolve_never_fails() {
        let site = Location::caller();
        let caller = resolve(site, 500);
        assert_eq!(caller.short_function(), UNKNOWN_FUNCTION);
        assert_eq!(caller.line(), site.line());
        assert_eq!(caller.file_name(), "caller.rs");
    }
}
