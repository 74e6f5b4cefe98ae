//! Logging shims.
//!
//! With the `log` feature enabled these forward to the `log` crate's
//! macros of the same name; without it they compile to nothing while still
//! type-checking their format arguments.

#[cfg(feature = "log")]
macro_rules! trace {
    ($($t:tt)*) => {
        log::trace!($($t)*)
    };
}

#[cfg(not(feature = "log"))]
macro_rules! trace {
    ($($t:tt)*) => {{
        let _ = core::format_args!($($t)*);
    }};
}

#[cfg(feature = "log")]
macro_rules! debug {
    ($($t:tt)*) => {
        log::debug!($($t)*)
    };
}

#[cfg(not(feature = "log"))]
macro_rules! debug {
    ($($t:tt)*) => {{
        let _ = core::format_args!($($t)*);
    }};
}
