// Copyright 2020 Joyent, Inc.

//! Logger construction shared by the binaries and library components.

use std::io;
use std::sync::Mutex;

use slog::{o, Drain, Level, LevelFilter, Logger};

/// Map a `-v` occurrence count to a log level.
pub fn level_from_verbosity(occurrences: u64) -> Level {
    match occurrences {
        0 => Level::Warning,
        1 => Level::Info,
        2 => Level::Debug,
        _ => Level::Trace,
    }
}

/// Root logger for a binary. Writes to stderr so that stdout carries only
/// console output.
pub fn stderr_logger(level: Level, app: &'static str) -> Logger {
    let plain = slog_term::PlainSyncDecorator::new(io::stderr());
    Logger::root(
        Mutex::new(LevelFilter::new(
            slog_term::FullFormat::new(plain).build(),
            level,
        ))
        .fuse(),
        o!("app" => app, "build-id" => env!("CARGO_PKG_VERSION")),
    )
}

/// Use the caller's logger when given one, otherwise hand records to the
/// `log` facade.
pub(crate) fn or_stdlog(log: Option<&Logger>) -> Logger {
    log.cloned()
        .unwrap_or_else(|| Logger::root(slog_stdlog::StdLog.fuse(), o!()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn verbosity_raises_level() {
        assert_eq!(level_from_verbosity(0), Level::Warning);
        assert_eq!(level_from_verbosity(1), Level::Info);
        assert_eq!(level_from_verbosity(2), Level::Debug);
        assert_eq!(level_from_verbosity(7), Level::Trace);
    }
}
