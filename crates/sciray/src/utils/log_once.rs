//! Logging helpers for conditions that may fire once per ray or per record.
//!
//! Each call site logs at most once per process.

#[macro_export]
macro_rules! log_once {
    (target: $target:expr, $lvl:expr, $($arg:tt)+) => {{
        static ONCE: std::sync::Once = std::sync::Once::new();
        ONCE.call_once(|| {
            log::log!(target: $target, $lvl, $($arg)+);
        });
    }};
    ($lvl:expr, $($arg:tt)+) => ($crate::log_once!(target: module_path!(), $lvl, $($arg)+));
}

#[macro_export]
macro_rules! error_once {
    ($($arg:tt)+) => ($crate::log_once!(log::Level::Error, $($arg)+));
}

#[macro_export]
macro_rules! warn_once {
    ($($arg:tt)+) => ($crate::log_once!(log::Level::Warn, $($arg)+));
}

pub use crate::{error_once, log_once, warn_once};
