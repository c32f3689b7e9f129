use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log to stderr; `RUST_LOG` overrides the level chosen by `--verbose`.
pub fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "off" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).without_time())
        .with(filter)
        .init();
}
