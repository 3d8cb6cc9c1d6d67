//! Error handling for plugin-deps
//!
//! The error system follows two rules:
//! 1. **Strongly-typed errors** ([`PluginDepsError`]) for the failures the library reports
//! 2. **User-friendly messages** ([`ErrorContext`]) with actionable suggestions for CLI users
//!
//! Most of the resolution path never fails: malformed requirement tokens fall back
//! to opaque identifiers and failed fetches fall back to synthesized metadata. The
//! errors here cover the edges around it: reading unit manifests, configuration
//! files and the persisted metadata cache.
//!
//! # Examples
//!
//! ```rust,no_run
//! use plugin_deps::core::{PluginDepsError, user_friendly_error};
//!
//! let error = PluginDepsError::UnitsFileNotFound {
//!     path: "units.toml".to_string(),
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display(); // Shows colored error with suggestions
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for plugin-deps operations
///
/// # Error Categories
///
/// ## Host input
/// - [`UnitsFileNotFound`] - The units manifest does not exist
/// - [`UnitsParseError`] - The units manifest could not be decoded
/// - [`InvalidUnit`] - A unit entry is structurally unusable
///
/// ## Configuration and cache
/// - [`ConfigError`] - Configuration file issues
/// - [`CacheError`] - Persisted metadata cache could not be read or written
///
/// ## Generic
/// - [`IoError`] - Standard I/O errors from [`std::io::Error`]
/// - [`Other`] - Anything else, carrying the full error chain
///
/// [`UnitsFileNotFound`]: PluginDepsError::UnitsFileNotFound
/// [`UnitsParseError`]: PluginDepsError::UnitsParseError
/// [`InvalidUnit`]: PluginDepsError::InvalidUnit
/// [`ConfigError`]: PluginDepsError::ConfigError
/// [`CacheError`]: PluginDepsError::CacheError
/// [`IoError`]: PluginDepsError::IoError
/// [`Other`]: PluginDepsError::Other
#[derive(Error, Debug)]
pub enum PluginDepsError {
    /// The units manifest passed by the host was not found
    #[error("Units manifest not found: {path}")]
    UnitsFileNotFound {
        /// Path that was looked up
        path: String,
    },

    /// The units manifest exists but could not be decoded
    #[error("Failed to parse units manifest {file}: {reason}")]
    UnitsParseError {
        /// File that failed to parse
        file: String,
        /// Decoder message
        reason: String,
    },

    /// A unit entry is missing data the graph cannot do without
    #[error("Invalid unit '{id}': {reason}")]
    InvalidUnit {
        /// Unit id as written (may be empty)
        id: String,
        /// What is wrong with it
        reason: String,
    },

    /// Configuration file issues
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the problem
        message: String,
    },

    /// Persisted metadata cache could not be read or written
    #[error("Metadata cache {operation} failed for {path}: {reason}")]
    CacheError {
        /// "read" or "write"
        operation: String,
        /// Cache file path
        path: String,
        /// Underlying failure
        reason: String,
    },

    /// Standard I/O errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Catch-all error with the rendered error chain
    #[error("{message}")]
    Other {
        /// Full message
        message: String,
    },
}

impl Clone for PluginDepsError {
    fn clone(&self) -> Self {
        match self {
            Self::UnitsFileNotFound {
                path,
            } => Self::UnitsFileNotFound {
                path: path.clone(),
            },
            Self::UnitsParseError {
                file,
                reason,
            } => Self::UnitsParseError {
                file: file.clone(),
                reason: reason.clone(),
            },
            Self::InvalidUnit {
                id,
                reason,
            } => Self::InvalidUnit {
                id: id.clone(),
                reason: reason.clone(),
            },
            Self::ConfigError {
                message,
            } => Self::ConfigError {
                message: message.clone(),
            },
            Self::CacheError {
                operation,
                path,
                reason,
            } => Self::CacheError {
                operation: operation.clone(),
                path: path.clone(),
                reason: reason.clone(),
            },
            // io::Error is not Clone; keep kind and message
            Self::IoError(e) => Self::IoError(std::io::Error::new(e.kind(), e.to_string())),
            Self::Other {
                message,
            } => Self::Other {
                message: message.clone(),
            },
        }
    }
}

/// Error wrapper carrying a suggestion and details for CLI display
///
/// Build one with [`ErrorContext::new`] and the `with_*` builder methods, or let
/// [`user_friendly_error`] pick the suggestion for a known error.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: PluginDepsError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context without suggestion or details.
    #[must_use]
    pub const fn new(error: PluginDepsError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error context to stderr with terminal colors.
    ///
    /// - Error message: Red and bold
    /// - Details: Yellow
    /// - Suggestion: Green
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] suitable for CLI display.
///
/// Known [`PluginDepsError`] variants get a tailored suggestion. Everything else is wrapped in [`PluginDepsError::Other`] with the full
/// `Caused by:` chain.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(known) = error.downcast_ref::<PluginDepsError>() {
        return create_error_context(known.clone());
    }

    let mut message = error.to_string();
    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(PluginDepsError::Other {
        message,
    })
}

fn create_error_context(error: PluginDepsError) -> ErrorContext {
    match &error {
        PluginDepsError::UnitsFileNotFound {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Pass the path of a units manifest with --units")
            .with_details("A units manifest lists installed plugins as [[units]] entries"),
        PluginDepsError::UnitsParseError {
            ..
        } => ErrorContext::new(error).with_suggestion(
            "Each unit needs an `id`; `requires_plugins` is a comma-separated string",
        ),
        PluginDepsError::InvalidUnit {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Give every unit a non-empty id such as \"my-plugin/my-plugin.php\""),
        PluginDepsError::ConfigError {
            ..
        } => ErrorContext::new(error).with_suggestion(format!(
            "Check ~/{}/config.toml or the file passed with --config",
            crate::constants::APP_DIR_NAME
        )),
        PluginDepsError::CacheError {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Run `plugin-deps cache clear` to discard the persisted cache")
            .with_details("The cache only holds fetched metadata and is safe to delete"),
        PluginDepsError::IoError(_) => ErrorContext::new(error)
            .with_suggestion("Check that the file exists and that you have permission to read it"),
        PluginDepsError::Other {
            ..
        } => ErrorContext::new(error),
    }
}
