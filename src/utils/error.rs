use thiserror::Error;

#[derive(Error, Debug)]
pub enum PosError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Backend returned {status}: {body}")]
    BackendError { status: u16, body: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid configuration for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Insufficient payment: total {total}, tendered {tendered}")]
    InsufficientPayment { total: String, tendered: String },

    #[error("Role '{role}' cannot access {page}")]
    AccessDenied { role: String, page: String },

    #[error("Order {id} cannot move from {from} to {to}")]
    InvalidTransition { id: String, from: String, to: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Storage,
    Configuration,
    Business,
    Authorization,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl PosError {
    pub fn validation(message: impl Into<String>) -> Self {
        PosError::ValidationError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            PosError::ApiError(_) | PosError::BackendError { .. } => ErrorCategory::Network,
            PosError::CsvError(_) | PosError::IoError(_) | PosError::SerializationError(_) => {
                ErrorCategory::Storage
            }
            PosError::ConfigError { .. }
            | PosError::ConfigValidationError { .. }
            | PosError::InvalidConfigValueError { .. }
            | PosError::MissingConfigError { .. } => ErrorCategory::Configuration,
            PosError::AccessDenied { .. } => ErrorCategory::Authorization,
            PosError::ValidationError { .. }
            | PosError::NotFound { .. }
            | PosError::EmptyCart
            | PosError::InsufficientPayment { .. }
            | PosError::InvalidTransition { .. } => ErrorCategory::Business,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Business => ErrorSeverity::Low,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Authorization | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            PosError::ApiError(_) => "Check network connectivity and the backend URL",
            PosError::BackendError { status, .. } if *status == 401 || *status == 403 => {
                "Check the backend anon key and row-level security policies"
            }
            PosError::BackendError { .. } => "Check that the backend tables exist and retry",
            PosError::CsvError(_) | PosError::IoError(_) => {
                "Check that the data directory exists and is writable"
            }
            PosError::SerializationError(_) => {
                "A stored record is malformed; inspect or restore the data file"
            }
            PosError::ConfigError { .. }
            | PosError::ConfigValidationError { .. }
            | PosError::InvalidConfigValueError { .. } => "Fix the configuration file and rerun",
            PosError::MissingConfigError { .. } => "Add the missing key to the configuration file",
            PosError::ValidationError { .. } => "Correct the input and try again",
            PosError::NotFound { .. } => "List the available records and use an existing id",
            PosError::EmptyCart => "Add items before checking out",
            PosError::InsufficientPayment { .. } => "Collect at least the order total",
            PosError::AccessDenied { .. } => "Ask an administrator to grant the page to your role",
            PosError::InvalidTransition { .. } => "Check the order's current status",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            PosError::ApiError(_) | PosError::BackendError { .. } => {
                format!("Could not reach the store backend: {}", self)
            }
            PosError::EmptyCart => "Please add items before checking out!".to_string(),
            PosError::InsufficientPayment { .. } => {
                "Amount tendered is less than the total amount.".to_string()
            }
            _ => self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PosError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_errors_are_low_severity() {
        assert_eq!(PosError::EmptyCart.severity(), ErrorSeverity::Low);
        assert_eq!(
            PosError::validation("bad").category(),
            ErrorCategory::Business
        );
    }

    #[test]
    fn test_backend_auth_suggestion() {
        let err = PosError::BackendError {
            status: 401,
            body: "{}".to_string(),
        };
        assert!(err.recovery_suggestion().contains("anon key"));
        assert_eq!(err.severity(), ErrorSeverity::Medium);
    }
}
