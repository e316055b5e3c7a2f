//! Logging bootstrap

use tracing_subscriber::EnvFilter;

use crate::config::LogLevel;

/// Install the global subscriber, returning whether this call installed it.
///
/// `RUST_LOG` wins over the configured level. A second call keeps the
/// subscriber already installed and traces the refusal through it.
pub fn init(level: LogLevel) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_directive()));

    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .try_init()
    {
        tracing::trace!("subscriber already installed: {}", e);
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice() {
        init(LogLevel::Debug);
        assert!(!init(LogLevel::Warn));
        tracing::debug!("logging initialized");
    }
}
