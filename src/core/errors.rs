//! Error types for the dupdetect library.
//!
//! Every fallible operation in the detection pipeline returns [`Result`], so
//! precondition violations (bad band splits, composite moduli, undefined
//! metrics) surface to the caller with enough structure to act on them.

use std::io;

use thiserror::Error;

/// Main result type for dupdetect operations.
pub type Result<T> = std::result::Result<T, DupdetectError>;

/// Error type for all dupdetect operations.
#[derive(Error, Debug)]
pub enum DupdetectError {
    /// I/O related errors (dataset and config files)
    #[error("I/O error: {message}")]
    Io {
        /// Human-readable error message
        message: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error description
        message: String,
        /// Configuration field that caused the error
        field: Option<String>,
    },

    /// Numerical errors, including metrics that are undefined for the input
    #[error("Mathematical error: {message}")]
    Math {
        /// Error description
        message: String,
        /// Context of the mathematical operation
        context: Option<String>,
    },

    /// MinHash and LSH precondition violations
    #[error("LSH error: {message}")]
    Lsh {
        /// Error description
        message: String,
        /// LSH parameters that caused the issue
        parameters: Option<String>,
    },

    /// Detection pipeline errors
    #[error("Pipeline error at stage '{stage}': {message}")]
    Pipeline {
        /// Pipeline stage where error occurred
        stage: String,
        /// Error description
        message: String,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error description
        message: String,
        /// Data format being handled
        data_type: Option<String>,
        /// Underlying serialization error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Validation errors for input data
    #[error("Validation error: {message}")]
    Validation {
        /// Error description
        message: String,
        /// Field or input that failed validation
        field: Option<String>,
        /// Expected value or format
        expected: Option<String>,
        /// Actual value received
        actual: Option<String>,
    },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal {
        /// Error description
        message: String,
        /// Additional context
        context: Option<String>,
    },
}

impl DupdetectError {
    /// Create a new I/O error with context
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: None,
        }
    }

    /// Create a new configuration error with field context
    pub fn config_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new mathematical error
    pub fn math(message: impl Into<String>) -> Self {
        Self::Math {
            message: message.into(),
            context: None,
        }
    }

    /// Create a new mathematical error with context
    pub fn math_with_context(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Math {
            message: message.into(),
            context: Some(context.into()),
        }
    }

    /// Create a new LSH error
    pub fn lsh(message: impl Into<String>) -> Self {
        Self::Lsh {
            message: message.into(),
            parameters: None,
        }
    }

    /// Create a new LSH error recording the offending parameters
    pub fn lsh_with_parameters(message: impl Into<String>, parameters: impl Into<String>) -> Self {
        Self::Lsh {
            message: message.into(),
            parameters: Some(parameters.into()),
        }
    }

    /// Create a new pipeline error
    pub fn pipeline(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Pipeline {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: None,
            expected: None,
            actual: None,
        }
    }

    /// Create a validation error naming the field plus expected and actual values
    pub fn validation_mismatch(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        let field = field.into();
        let expected = expected.into();
        let actual = actual.into();
        Self::Validation {
            message: format!("{field} must be {expected}, got {actual}"),
            field: Some(field),
            expected: Some(expected),
            actual: Some(actual),
        }
    }

    /// Create a new internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            context: None,
        }
    }

    /// Add context to an existing error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        match &mut self {
            Self::Math { context: ctx, .. } | Self::Internal { context: ctx, .. } => {
                *ctx = Some(context.into());
            }
            Self::Io { message, .. } => {
                *message = format!("{}: {message}", context.into());
            }
            _ => {}
        }
        self
    }
}

impl From<io::Error> for DupdetectError {
    fn from(err: io::Error) -> Self {
        Self::io("I/O operation failed", err)
    }
}

impl From<serde_json::Error> for DupdetectError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: format!("JSON serialization failed: {err}"),
            data_type: Some("JSON".to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_yaml::Error> for DupdetectError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization {
            message: format!("YAML serialization failed: {err}"),
            data_type: Some("YAML".to_string()),
            source: Some(Box::new(err)),
        }
    }
}

/// Result extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    /// Add static context to an error result
    fn context(self, msg: &'static str) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<DupdetectError>,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_context(f()))
    }

    fn context(self, msg: &'static str) -> Result<T> {
        self.map_err(|e| e.into().with_context(msg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = DupdetectError::config("Invalid configuration");
        assert!(matches!(err, DupdetectError::Config { .. }));

        let err = DupdetectError::lsh("r * b must equal n");
        assert!(matches!(err, DupdetectError::Lsh { .. }));
    }

    #[test]
    fn test_math_with_context() {
        let err = DupdetectError::math_with_context("recall is undefined", "evaluate");

        if let DupdetectError::Math { message, context } = err {
            assert_eq!(message, "recall is undefined");
            assert_eq!(context, Some("evaluate".to_string()));
        } else {
            panic!("Expected Math error");
        }
    }

    #[test]
    fn test_lsh_with_parameters() {
        let err = DupdetectError::lsh_with_parameters("band split mismatch", "r=7, b=3, n=1155");

        if let DupdetectError::Lsh {
            message,
            parameters,
        } = err
        {
            assert_eq!(message, "band split mismatch");
            assert_eq!(parameters, Some("r=7, b=3, n=1155".to_string()));
        } else {
            panic!("Expected Lsh error");
        }
    }

    #[test]
    fn test_validation_mismatch() {
        let err = DupdetectError::validation_mismatch("modulus", "prime", "510510");
        let display = err.to_string();
        assert!(display.contains("modulus must be prime, got 510510"));

        if let DupdetectError::Validation {
            field,
            expected,
            actual,
            ..
        } = err
        {
            assert_eq!(field.as_deref(), Some("modulus"));
            assert_eq!(expected.as_deref(), Some("prime"));
            assert_eq!(actual.as_deref(), Some("510510"));
        } else {
            panic!("Expected Validation error");
        }
    }

    #[test]
    fn test_io_context_is_prefixed() {
        let result: std::result::Result<(), io::Error> =
            Err(io::Error::new(io::ErrorKind::NotFound, "missing"));

        let err = result.context("Failed to read dataset").unwrap_err();
        if let DupdetectError::Io { message, source } = err {
            assert!(message.starts_with("Failed to read dataset"));
            assert_eq!(source.kind(), io::ErrorKind::NotFound);
        } else {
            panic!("Expected Io error");
        }
    }

    #[test]
    fn test_with_context_non_contextual_error() {
        let err = DupdetectError::config("Bad config").with_context("Should not change");

        if let DupdetectError::Config { message, .. } = err {
            assert_eq!(message, "Bad config");
        } else {
            panic!("Expected Config error");
        }
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<i32>("invalid json").unwrap_err();
        let err: DupdetectError = json_err.into();

        if let DupdetectError::Serialization { data_type, .. } = err {
            assert_eq!(data_type, Some("JSON".to_string()));
        } else {
            panic!("Expected Serialization error");
        }
    }

    #[test]
    fn test_from_yaml_error() {
        let yaml_err = serde_yaml::from_str::<i32>("invalid: yaml: content").unwrap_err();
        let err: DupdetectError = yaml_err.into();

        if let DupdetectError::Serialization { data_type, .. } = err {
            assert_eq!(data_type, Some("YAML".to_string()));
        } else {
            panic!("Expected Serialization error");
        }
    }

    #[test]
    fn test_pipeline_error_display() {
        let err = DupdetectError::pipeline("bucketing", "signature matrix is empty");
        assert_eq!(
            err.to_string(),
            "Pipeline error at stage 'bucketing': signature matrix is empty"
        );
    }
}
