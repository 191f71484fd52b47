//! Tracing setup.
//!
//! Console output with target and level; the filter comes from `RUST_LOG`
//! and falls back to `info`.

use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Directives used when `RUST_LOG` is unset or invalid.
/// The driver crates are noisy at info.
const DEFAULT_DIRECTIVES: &str = "info,serenity=warn,sqlx=warn";

/// Build the filter from an optional `RUST_LOG` value
pub fn build_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|s| !s.trim().is_empty())
        .and_then(|s| EnvFilter::try_new(s).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// Install the global subscriber
pub fn init() {
    let rust_log = std::env::var("RUST_LOG").ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_level(true),
        )
        .with(build_filter(rust_log.as_deref()))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn test_default_filter() {
        assert_eq!(build_filter(None).max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(build_filter(Some("  ")).max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn test_custom_filter() {
        assert_eq!(
            build_filter(Some("peregrine=debug")).max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
    }

    #[test]
    fn test_invalid_filter_falls_back() {
        assert_eq!(
            build_filter(Some("peregrine=loud")).max_level_hint(),
            Some(LevelFilter::INFO)
        );
    }
}
