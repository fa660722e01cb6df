use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Collector, when configured, has keywords and sane limits
/// - Browser limits are non-zero
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if let Some(collector) = &config.collector {
        if collector.keywords.is_empty() {
            return Err(ConfigError::ValidationError(
                "collector.keywords cannot be empty".to_string(),
            ));
        }
        if collector.github.per_page == 0 {
            return Err(ConfigError::ValidationError(
                "collector.github.per_page cannot be 0".to_string(),
            ));
        }
        if collector.max_pages_per_query == 0 {
            return Err(ConfigError::ValidationError(
                "collector.max_pages_per_query cannot be 0".to_string(),
            ));
        }
        if collector.requests_per_minute == 0 {
            return Err(ConfigError::ValidationError(
                "collector.requests_per_minute cannot be 0".to_string(),
            ));
        }
    }

    if config.browser.max_files == 0 {
        return Err(ConfigError::ValidationError(
            "browser.max_files cannot be 0".to_string(),
        ));
    }
    if config.browser.max_depth == 0 {
        return Err(ConfigError::ValidationError(
            "browser.max_depth cannot be 0".to_string(),
        ));
    }
    if config.browser.extensions.is_empty() {
        return Err(ConfigError::ValidationError(
            "browser.extensions cannot be empty".to_string(),
        ));
    }

    Ok(())
}
