use log::LevelFilter;
use std::io::Write;

/// Prefix carried by every line forker writes to its error stream.
pub const LOG_PREFIX: &str = "forker: ";

/// Target of the worker start and termination lines. It stays enabled at
/// info whatever `RUST_LOG` says, since those lines carry the worker's status.
pub const LIFECYCLE_TARGET: &str = "forker::lifecycle";

/// Initialize the logger with the specified verbosity level
///
/// # Arguments
/// * `verbose` - Verbosity level (0=info, 1=debug, 2+=trace)
///
/// Records are rendered as `forker: <message>` with no timestamp or level so
/// that the worker lifecycle lines keep a fixed shape. `RUST_LOG` directives
/// are layered over the `-v` level; the lifecycle target is applied last.
pub fn setup_logger(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_module("forker", level)
        .parse_env(env_logger::Env::default())
        .filter_module(LIFECYCLE_TARGET, LevelFilter::Info)
        .format(|buf, record| writeln!(buf, "{LOG_PREFIX}{}", record.args()))
        .init();
}
