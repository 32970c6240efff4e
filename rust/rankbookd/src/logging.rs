use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_FILTER: &str = "rankbookd=warn";

/// Installs the stderr subscriber. Stdout carries IPC replies, so nothing
/// may log there.
///
/// Filter precedence: `RUST_LOG`, then `RANKBOOKD_LOG`, then `rankbookd=warn`.
/// `RANKBOOKD_LOG_JSON=1` switches to JSON lines.
pub fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_from_env("RANKBOOKD_LOG"))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let log_json = std::env::var("RANKBOOKD_LOG_JSON")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if log_json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .try_init()?;
    }
    Ok(())
}
