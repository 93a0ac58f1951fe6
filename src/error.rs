//! Global error handling for promptree
//!
//! This module provides a centralized error type that can represent errors
//! from all modules in the project.

use std::io;
use thiserror::Error;

use crate::clipboard::ClipboardError;

/// Global error type for promptree operations
#[derive(Error, Debug)]
pub enum PromptreeError {
    /// File system errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON processing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Ignore file parsing errors
    #[error("Ignore error: {0}")]
    Ignore(#[from] ignore::Error),

    /// Clipboard errors
    #[error("Clipboard error: {0}")]
    Clipboard(#[from] ClipboardError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A path that does not resolve to the expected kind of entry inside the root
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// A bounded operation ran past its deadline
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Unexpected error
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Specialized Result type for promptree operations
pub type Result<T> = std::result::Result<T, PromptreeError>;

/// Creates a PromptreeError with a formatted message
#[macro_export]
macro_rules! error {
    ($error_type:ident, $($arg:tt)*) => {
        $crate::error::PromptreeError::$error_type(format!($($arg)*))
    };
}

/// Returns an error result with a formatted message
#[macro_export]
macro_rules! bail {
    ($error_type:ident, $($arg:tt)*) => {
        return Err($crate::error!($error_type, $($arg)*))
    };
}

/// Ensures a condition is true, otherwise returns an error
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $error_type:ident, $($arg:tt)*) => {
        if !($cond) {
            $crate::bail!($error_type, $($arg)*)
        }
    };
}

/// Extension trait for adding context to errors
pub trait ResultExt<T, E> {
    /// Add additional context to an error
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display;
}

impl<T, E: std::error::Error + 'static> ResultExt<T, E> for std::result::Result<T, E> {
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display,
    {
        self.map_err(|e| {
            let context = f();
            PromptreeError::Unexpected(format!("{}: {}", context, e))
        })
    }
}

impl PromptreeError {
    /// Whether this error means the caller asked for something outside the root
    /// or of the wrong kind, as opposed to an environmental failure
    pub fn is_path_violation(&self) -> bool {
        matches!(self, Self::InvalidPath(_))
    }
}

// Allow converting PromptreeError to io::Error for the binary's main signature
impl From<PromptreeError> for io::Error {
    fn from(err: PromptreeError) -> Self {
        match err {
            PromptreeError::Io(e) => e,
            other => io::Error::new(io::ErrorKind::Other, other.to_string()),
        }
    }
}
