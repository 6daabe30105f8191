//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::MiddlewareConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<MiddlewareConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<MiddlewareConfig, ConfigError> {
    let config: MiddlewareConfig = toml::from_str(content).map_err(ConfigError::Parse)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransportKind;

    #[test]
    fn parses_full_file() {
        let config = parse_config(
            r#"
            [transport]
            kind = "udp"
            bind_address = "127.0.0.1:7000"

            [datagram]
            buffer_size = 1024

            [observability]
            log_level = "debug"
            log_format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.transport.kind, TransportKind::Udp);
        assert_eq!(config.datagram.buffer_size, 1024);
        assert_eq!(config.observability.log_level, "debug");
    }

    #[test]
    fn syntax_errors_are_parse_errors() {
        let err = parse_config("[transport\nkind = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn semantic_errors_are_listed() {
        let err = parse_config("[datagram]\nbuffer_size = 0").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation failed: datagram.buffer_size must be greater than zero"
        );
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
