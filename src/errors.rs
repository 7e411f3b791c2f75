use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unknown action: {0}")]
    UnknownTool(String),
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },
    #[error("Confirmation required to {operation} {resource} {target}. Re-send with confirmation=\"{sentinel}\" to proceed")]
    ConfirmationRequired {
        operation: &'static str,
        resource: &'static str,
        target: String,
        sentinel: &'static str,
    },
    #[error("AWS profile not found: {0}")]
    ProfileNotFound(String),
    #[error("{operation} failed: {message}")]
    Downstream {
        operation: String,
        code: Option<String>,
        message: String,
    },
    #[error("{0} timed out")]
    Timeout(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::UnknownTool(_) => "UnknownTool",
            AppError::MissingParameter(_) => "MissingParameter",
            AppError::InvalidParameter { .. } => "InvalidParameter",
            AppError::ConfirmationRequired { .. } => "ConfirmationRequired",
            AppError::ProfileNotFound(_) => "ProfileNotFound",
            AppError::Downstream { .. } => "Downstream",
            AppError::Timeout(_) => "Timeout",
            AppError::Internal(_) => "Internal",
        }
    }

    pub fn invalid(name: &str, reason: impl Into<String>) -> Self {
        AppError::InvalidParameter { name: name.to_string(), reason: reason.into() }
    }

    /// Provider error code (e.g. `NoSuchBucketPolicy`), when the provider reported one.
    pub fn downstream_code(&self) -> Option<&str> {
        match self {
            AppError::Downstream { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
