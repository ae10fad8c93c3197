//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{GapConfig, LogOutput, LoggingConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &GapConfig) -> ConfigResult<()> {
    if config.token.trim().is_empty() {
        return Err(ConfigError::missing_field("token"));
    }

    validate_url(&config.api_url)?;

    if config.timeout_ms == Some(0) {
        return Err(ConfigError::validation("Timeout must be greater than 0"));
    }

    if config.server.enabled && config.server.host.is_empty() {
        return Err(ConfigError::missing_field("server.host"));
    }

    validate_logging(&config.logging)
}

fn validate_url(url: &str) -> ConfigResult<()> {
    if url.is_empty() {
        return Err(ConfigError::missing_field("api_url"));
    }

    let valid_schemes = ["http://", "https://"];
    if !valid_schemes.iter().any(|s| url.starts_with(s)) {
        return Err(ConfigError::invalid_url(
            url,
            format!("URL must start with one of: {valid_schemes:?}"),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        assert!(validate_config(&GapConfig::with_token("t")).is_ok());
    }

    #[test]
    fn test_empty_token_is_rejected() {
        let result = validate_config(&GapConfig::default());
        assert!(matches!(result, Err(ConfigError::MissingField { .. })));
    }

    #[test]
    fn test_bad_api_url_is_rejected() {
        let mut config = GapConfig::with_token("t");
        config.api_url = "ftp://api.gap.im/".to_string();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_file_output_needs_path() {
        let mut config = GapConfig::with_token("t");
        config.logging.output = LogOutput::File;
        assert!(validate_config(&config).is_err());

        config.logging.file_path = Some("gap.log".into());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_ephemeral_port_is_allowed() {
        let mut config = GapConfig::with_token("t");
        config.server.port = 0;
        assert!(validate_config(&config).is_ok());
    }
}
