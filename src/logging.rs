use anyhow::{Result, anyhow};
use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;

static LOGGING: OnceCell<()> = OnceCell::new();

fn env_filter(level: Option<&str>) -> Result<EnvFilter> {
    match level.map(str::trim).filter(|l| !l.is_empty()) {
        Some(level) => EnvFilter::try_new(level).map_err(|e| anyhow!("Invalid log filter {level}: {e}")),
        None => Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))),
    }
}

/// Installs the global subscriber. Output goes to stderr since stdout carries
/// the stdio transport.
pub fn init(level: Option<&str>) -> Result<()> {
    let filter = env_filter(level)?;
    LOGGING.get_or_try_init(|| {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_line_number(true)
            .with_ansi(false)
            .try_init()
            .map_err(|e| anyhow!("Failed to install tracing subscriber: {e}"))
    })?;
    Ok(())
}

#[cfg(test)]
#[ctor::ctor]
fn _install_global_tracing() {
    LOGGING.get_or_init(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_test_writer()
            .with_target(true)
            .with_line_number(true)
            .with_ansi(false)
            .init();
    });
}
