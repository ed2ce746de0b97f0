use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// `--quiet` wins over `-v`; `-v` wins over `RUST_LOG`.
pub fn env_filter(quiet: bool, verbose: u8, default_level: &str) -> EnvFilter {
    if quiet {
        return EnvFilter::new("error");
    }

    if verbose > 0 {
        let level = match verbose {
            1 => "debug",
            _ => "trace",
        };
        return EnvFilter::new(level);
    }

    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Install the global subscriber. Logs go to stderr so chart text on stdout stays clean.
pub fn init_logging(quiet: bool, verbose: u8) {
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    // a second init (tests) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(env_filter(quiet, verbose, "warn"))
        .with(layer)
        .try_init();
}
