use thiserror::Error;

/// The main error type for the idle monitor.
///
/// Only [`MonitorError::Config`] is meant to end the process. API and
/// notification failures are contained by the monitor loop and surface
/// here only for one-shot callers such as the CLI `status` command.
#[derive(Error, Debug)]
pub enum MonitorError {
    /// Missing or invalid configuration, fatal at startup
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A hypervisor API call failed
    #[error("Hypervisor API error: {0}")]
    Api(#[from] ApiError),

    /// The shutdown webhook call failed
    #[error("Shutdown webhook error: {0}")]
    Notify(#[from] NotifyError),
}

/// Specialized error type for configuration failures.
///
/// This enum provides detailed context about why a configuration value
/// was rejected, including field-specific errors and format violations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Represents a validation failure for a specific field
    ///
    /// # Fields
    /// * `field` - The name of the field that failed validation
    /// * `message` - A detailed message about why validation failed
    #[error("Field '{field}' validation failed: {message}")]
    Field { field: String, message: String },

    /// Represents format/syntax validation failures
    #[error("Format error: {0}")]
    Format(String),

    /// Represents violations of cross-field constraints
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// The configuration file could not be read
    #[error("Failed to read config file '{path}': {source}")]
    Load {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML for the expected layout
    #[error("Failed to parse config file '{path}': {message}")]
    Parse { path: String, message: String },
}

impl ConfigError {
    pub(crate) fn field(field: &str, message: impl Into<String>) -> Self {
        ConfigError::Field {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Failure of a single hypervisor API call.
///
/// The monitor loop treats every variant as a skipped sample.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    /// Connection refused, DNS failure, TLS error and similar
    #[error("HTTP request failed: {0}")]
    Transport(String),

    /// The connect or read timeout elapsed
    #[error("HTTP request timed out: {0}")]
    Timeout(String),

    /// The hypervisor answered with a non-success status
    #[error("API error ({status}): {body}")]
    Status { status: u16, body: String },

    /// The response body was not the expected JSON document
    #[error("Failed to parse response: {0}")]
    Payload(String),
}

/// Failure of the shutdown webhook call.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("Webhook request failed: {0}")]
    Transport(String),

    #[error("Webhook request timed out: {0}")]
    Timeout(String),

    #[error("Webhook returned status {status}: {body}")]
    Status { status: u16, body: String },
}

/// Type alias for Results that may fail with a MonitorError
pub type MonitorResult<T> = Result<T, MonitorError>;
