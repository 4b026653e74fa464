//! Logging setup for the upload-sitemap binary.
//!
//! The library only talks to the `log` facade; this module wires up the
//! `env_logger` backend for the CLI. The level comes from, in order:
//!
//! 1. `RUST_LOG`, when set
//! 2. `--quiet` (errors only) or `-v` / `-vv` (debug / trace)
//! 3. info
//!
//! Records always go to stderr so a document written to stdout stays clean.
//!
//! ```rust,no_run
//! use upload_sitemap::logging::init_logging;
//!
//! init_logging(1, false);
//! log::debug!("scanner ready");
//! ```

use std::env;
use std::io::Write;

use env_logger::{Builder, Target};
use log::LevelFilter;

/// Install the global logger.
///
/// Calling it a second time is harmless: the first logger stays active
/// and the failure is ignored.
pub fn init_logging(verbose: u8, quiet: bool) {
    let mut builder = Builder::new();
    builder.target(Target::Stderr);

    let from_env = env::var_os("RUST_LOG").is_some();
    if from_env {
        builder.parse_default_env();
    } else {
        builder.filter_level(level_for(verbose, quiet));
    }

    let with_module = verbose > 0 && cfg!(debug_assertions);
    builder.format(move |buf, record| {
        let style = buf.default_level_style(record.level());
        if with_module {
            writeln!(
                buf,
                "{} {style}{:<5}{style:#} [{}] {}",
                buf.timestamp_seconds(),
                record.level(),
                record.module_path().unwrap_or("?"),
                record.args()
            )
        } else {
            writeln!(buf, "{style}{:<5}{style:#} {}", record.level(), record.args())
        }
    });

    if builder.try_init().is_ok() && !from_env {
        log::debug!("Log level set to {}", level_for(verbose, quiet));
    }
}

/// Map CLI flags to a level. `quiet` wins over any `-v`.
fn level_for(verbose: u8, quiet: bool) -> LevelFilter {
    match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Info,
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    }
}
