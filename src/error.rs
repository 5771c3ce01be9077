//! Error Types
//!
//! One error enum per external boundary, each paired with a result alias.

use thiserror::Error;

/// Identity provider failures (the only errors shown to the user)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("An account with this email already exists")]
    AccountExists,
    #[error("Password is too weak: {0}")]
    WeakPassword(String),
    #[error("Sign-in was cancelled")]
    Cancelled,
    #[error("Network error: {0}")]
    Network(String),
    #[error("Identity provider error: {0}")]
    Provider(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Remote document store failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Internal store error: {0}")]
    Internal(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Local notification scheduler failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    #[error("Notification permission denied")]
    PermissionDenied,
    #[error("Invalid fire time: {0}")]
    InvalidTimestamp(String),
    #[error("Notification platform error: {0}")]
    Platform(String),
}

pub type NotifyResult<T> = Result<T, NotifyError>;

/// Configuration loading and validation failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Application startup failures
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Logger setup failed: {0}")]
    Logger(#[from] rolling_logger::LoggerError),
}
