//! Formatting macros. Each captures its own call site, so the location
//! segment is exact regardless of `caller_depth`.

#[doc(hidden)]
#[macro_export]
macro_rules! __function_path {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            ::core::any::type_name::<T>()
        }
        let name = type_name_of(f);
        match name.strip_suffix("::f") {
            Some(path) => path,
            None => name,
        }
    }};
}

/// The [`Caller`](crate::Caller) for the current source position.
#[macro_export]
macro_rules! caller {
    () => {
        $crate::Caller::new(file!(), line!(), $crate::__function_path!())
    };
}

/// `emit!(Level::Warning, "disk at {}%", pct)` on the default logger, or
/// `emit!(logger: my_logger, Level::Warning, ...)` on a specific one.
#[macro_export]
macro_rules! emit {
    (logger: $logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.emit_at($level, $crate::caller!(), format_args!($($arg)+))
    };
    ($level:expr, $($arg:tt)+) => {
        $crate::emit!(logger: $crate::logger(), $level, $($arg)+)
    };
}

#[macro_export]
macro_rules! debug {
    (logger: $logger:expr, $($arg:tt)+) => {
        $crate::emit!(logger: $logger, $crate::Level::Debug, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::emit!($crate::Level::Debug, $($arg)+)
    };
}

#[macro_export]
macro_rules! info {
    (logger: $logger:expr, $($arg:tt)+) => {
        $crate::emit!(logger: $logger, $crate::Level::Info, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::emit!($crate::Level::Info, $($arg)+)
    };
}

#[macro_export]
macro_rules! warn {
    (logger: $logger:expr, $($arg:tt)+) => {
        $crate::emit!(logger: $logger, $crate::Level::Warning, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::emit!($crate::Level::Warning, $($arg)+)
    };
}

#[macro_export]
macro_rules! error {
    (logger: $logger:expr, $($arg:tt)+) => {
        $crate::emit!(logger: $logger, $crate::Level::Error, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::emit!($crate::Level::Error, $($arg)+)
    };
}

/// Logs at [`Level::Fatal`](crate::Level::Fatal) and terminates the process
/// with status 1.
#[macro_export]
macro_rules! fatal {
    (logger: $logger:expr, $($arg:tt)+) => {
        $crate::emit!(logger: $logger, $crate::Level::Fatal, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::emit!($crate::Level::Fatal, $($arg)+)
    };
}
