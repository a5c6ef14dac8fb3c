use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_FILTER: &str = "warn,tally=info";

/// Initialize tracing on stderr so stdout stays machine-readable.
///
/// - Default level: `warn`, `info` for the tally crates
/// - Override via `RUST_LOG`; `--verbose` forces `debug` for the tally crates
pub fn init(verbose: bool) {
    let env_filter = if verbose {
        EnvFilter::new("warn,tally=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .without_time()
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .init();

    tracing::debug!("tracing initialized");
}
