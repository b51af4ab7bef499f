//! Verbosity-gated stderr logging for the planner.
//!
//! Each line is tagged with its level so interleaved output from placement,
//! drag and rebalance can be told apart. Nothing is formatted when the
//! configured verbosity is below the message level.

/// Verbosity levels carried in `SchedulerConfig::verbosity`.
pub const VERBOSITY_SILENT: u8 = 0;
/// Placements, drag commits, rebalance results.
pub const VERBOSITY_CHANGES: u8 = 1;
/// Probe caps, rejected drag candidates.
pub const VERBOSITY_CHECKS: u8 = 2;
/// Propagation steps and other internals.
pub const VERBOSITY_DEBUG: u8 = 3;

/// Tag printed in front of a message at `level`.
pub fn level_tag(level: u8) -> &'static str {
    match level {
        VERBOSITY_SILENT => "",
        VERBOSITY_CHANGES => "[plan]",
        VERBOSITY_CHECKS => "[plan:check]",
        _ => "[plan:debug]",
    }
}

/// True if a message at `level` should be written under `verbosity`.
#[inline]
pub fn enabled(verbosity: u8, level: u8) -> bool {
    level > VERBOSITY_SILENT && verbosity >= level
}

#[doc(hidden)]
#[macro_export]
macro_rules! __log_at {
    ($level:expr, $verbosity:expr, $($arg:tt)*) => {
        if $crate::logging::enabled($verbosity, $level) {
            eprintln!("{} {}", $crate::logging::level_tag($level), format_args!($($arg)*));
        }
    };
}

/// Log at CHANGES level (verbosity >= 1).
#[macro_export]
macro_rules! log_changes {
    ($verbosity:expr, $($arg:tt)*) => {
        $crate::__log_at!($crate::logging::VERBOSITY_CHANGES, $verbosity, $($arg)*)
    };
}

/// Log at CHECKS level (verbosity >= 2).
#[macro_export]
macro_rules! log_checks {
    ($verbosity:expr, $($arg:tt)*) => {
        $crate::__log_at!($crate::logging::VERBOSITY_CHECKS, $verbosity, $($arg)*)
    };
}

/// Log at DEBUG level (verbosity >= 3).
#[macro_export]
macro_rules! log_debug {
    ($verbosity:expr, $($arg:tt)*) => {
        $crate::__log_at!($crate::logging::VERBOSITY_DEBUG, $verbosity, $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enabled_thresholds() {
        assert!(!enabled(VERBOSITY_SILENT, VERBOSITY_CHANGES));
        assert!(enabled(VERBOSITY_CHANGES, VERBOSITY_CHANGES));
        assert!(!enabled(VERBOSITY_CHANGES, VERBOSITY_CHECKS));
        assert!(enabled(VERBOSITY_DEBUG, VERBOSITY_CHECKS));
        assert!(!enabled(VERBOSITY_DEBUG, VERBOSITY_SILENT));
    }

    #[test]
    fn test_level_tags() {
        assert_eq!(level_tag(VERBOSITY_CHANGES), "[plan]");
        assert_eq!(level_tag(VERBOSITY_DEBUG), "[plan:debug]");
    }

    #[test]
    fn test_log_macros_silent() {
        let verbosity = VERBOSITY_SILENT;
        log_changes!(verbosity, "placed {}", 1);
        log_checks!(verbosity, "probe {}", 2);
        log_debug!(verbosity, "step {}", 3);
    }
}
