//! Internal logging helpers for planner events.
//!
//! Planner log lines lead with a stable event name so they can be filtered
//! per event as well as by target.

/// Single logging target for the crate.
pub(crate) const LOG_TARGET: &str = "tessera";

macro_rules! plan_debug {
    ($event:expr, $($arg:tt)+) => {
        log::debug!(
            target: crate::logging::LOG_TARGET,
            "{}: {}",
            $event,
            format_args!($($arg)+),
        )
    };
}

macro_rules! plan_trace {
    ($event:expr, $($arg:tt)+) => {
        log::trace!(
            target: crate::logging::LOG_TARGET,
            "{}: {}",
            $event,
            format_args!($($arg)+),
        )
    };
}

pub(crate) use {plan_debug, plan_trace};
