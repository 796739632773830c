//! Configuration validation.

use url::Url;

use crate::error::ConfigError;
use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// First error as a [`ConfigError`], if any.
    pub fn into_error(self) -> Option<ConfigError> {
        self.errors.into_iter().next().map(|e| ConfigError::InvalidValue {
            field: e.path,
            message: e.message,
        })
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_backend(config, &mut result);
        Self::validate_engine(config, &mut result);
        Self::validate_relay(config, &mut result);

        result
    }

    fn validate_backend(config: &Config, result: &mut ValidationResult) {
        match Url::parse(&config.backend.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(_) => result.add_error(ValidationError::new(
                "backend.base_url",
                "base_url must start with http:// or https://",
            )),
            Err(e) => result.add_error(ValidationError::new(
                "backend.base_url",
                format!("base_url is not a valid URL: {}", e),
            )),
        }

        if config.backend.selection_endpoint.trim().is_empty() {
            result.add_error(ValidationError::new(
                "backend.selection_endpoint",
                "selection_endpoint cannot be empty",
            ));
        }

        if config.backend.timeout_seconds == 0 {
            result.add_error(ValidationError::new(
                "backend.timeout_seconds",
                "timeout_seconds must be greater than 0",
            ));
        }
    }

    fn validate_engine(config: &Config, result: &mut ValidationResult) {
        let directive = &config.engine.ask_user_directive;
        if directive.trim().is_empty() {
            result.add_error(ValidationError::new(
                "engine.ask_user_directive",
                "ask_user_directive cannot be empty",
            ));
        } else if directive.chars().any(char::is_whitespace) {
            result.add_error(ValidationError::new(
                "engine.ask_user_directive",
                "ask_user_directive must be a single word",
            ));
        }

        if config.engine.step_delay_ms > 60_000 {
            result.add_warning(ValidationWarning::new(
                "engine.step_delay_ms",
                "step_delay_ms is over a minute, runs will be very slow",
            ));
        }
    }

    fn validate_relay(config: &Config, result: &mut ValidationResult) {
        if config.relay.highlight_ms == 0 {
            result.add_warning(ValidationWarning::new(
                "relay.highlight_ms",
                "highlight_ms is 0, highlighted elements will not be visible",
            ));
        }

        if config.relay.request_timeout_ms == Some(0) {
            result.add_error(ValidationError::new(
                "relay.request_timeout_ms",
                "request_timeout_ms must be greater than 0 when set",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
