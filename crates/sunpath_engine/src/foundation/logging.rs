//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system from `RUST_LOG`
pub fn init() {
    env_logger::init();
}

/// Initialize logging with a default level, still overridable through `RUST_LOG`
///
/// Unknown level names fall back to `info`. Calling this twice is harmless:
/// the second initialisation attempt is ignored.
pub fn init_with_level(level: &str) {
    let env_filters = std::env::var(env_logger::DEFAULT_FILTER_ENV).ok();
    let _ = builder(level, env_filters.as_deref()).try_init();
}

/// Logger builder: `level` first, then any `RUST_LOG`-style directives on top
fn builder(level: &str, env_filters: Option<&str>) -> env_logger::Builder {
    let filter = level.parse::<log::LevelFilter>().unwrap_or(log::LevelFilter::Info);

    let mut builder = env_logger::Builder::new();
    builder.filter_level(filter);
    if let Some(filters) = env_filters {
        builder.parse_filters(filters);
    }
    builder
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::LevelFilter;

    #[test]
    fn test_configured_level_applies_without_env() {
        assert_eq!(builder("debug", None).build().filter(), LevelFilter::Debug);
        assert_eq!(builder("chatty", None).build().filter(), LevelFilter::Info);
    }

    #[test]
    fn test_env_directives_override_configured_level() {
        assert_eq!(builder("debug", Some("warn")).build().filter(), LevelFilter::Warn);
        assert_eq!(builder("warn", Some("trace")).build().filter(), LevelFilter::Trace);
    }
}
