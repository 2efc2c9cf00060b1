//! Logging setup using the `log` facade and `env_logger`.
//!
//! The level comes from, in priority order:
//!
//! 1. `RUST_LOG`, when set
//! 2. `--quiet` (errors only) or `-v` / `-vv` (debug / trace)
//! 3. info
//!
//! Non-fatal per-file errors are logged at debug level, so a plain run
//! stays quiet apart from the summary line.
//!
//! ```rust,no_run
//! use linkdupe::logging::init_logging;
//!
//! init_logging(1, false);
//! log::debug!("visible with -v");
//! ```

use std::env;
use std::io::Write;

use env_logger::Builder;
use log::LevelFilter;

/// Initialize the logger. Later calls are ignored.
///
/// * `verbose` - Verbosity count from the CLI (0=info, 1=debug, 2+=trace)
/// * `quiet` - Only show errors (ignored when `RUST_LOG` is set)
pub fn init_logging(verbose: u8, quiet: bool) {
    let from_env = env::var("RUST_LOG").is_ok();

    let mut builder = Builder::new();
    if from_env {
        builder.parse_default_env();
    } else {
        builder.filter_level(determine_level(verbose, quiet));
    }
    configure_format(&mut builder, verbose);

    if builder.try_init().is_err() {
        return;
    }

    if from_env {
        log::debug!("Logging configured from RUST_LOG");
    } else {
        log::debug!(
            "Logging initialized at level: {:?}",
            determine_level(verbose, quiet)
        );
    }
}

fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Debug builds get timestamps and, when verbose, the module path.
/// Release builds print level and message only.
fn configure_format(builder: &mut Builder, verbose: u8) {
    #[cfg(debug_assertions)]
    {
        builder.format(move |buf, record| {
            let level = record.level();
            let style = buf.default_level_style(level);
            let timestamp = buf.timestamp_seconds();
            if verbose >= 1 {
                writeln!(
                    buf,
                    "{timestamp} {style}{level:<5}{style:#} [{}] {}",
                    record.module_path().unwrap_or("unknown"),
                    record.args()
                )
            } else {
                writeln!(buf, "{timestamp} {style}{level:<5}{style:#} {}", record.args())
            }
        });
    }

    #[cfg(not(debug_assertions))]
    {
        let _ = verbose;
        builder.format(|buf, record| {
            let level = record.level();
            let style = buf.default_level_style(level);
            writeln!(buf, "{style}{level:<5}{style:#} {}", record.args())
        });
    }
}
