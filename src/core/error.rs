//! Error handling for compose-graph.
//!
//! Two layers, following the same split as the rest of the crate:
//! - [`ComposeGraphError`] — strongly-typed errors for every failure mode in
//!   the resolution pipeline
//! - [`ErrorContext`] — wrapper that adds user-friendly messages and
//!   actionable suggestions for CLI display
//!
//! The loader errors ([`ComposeGraphError::FileNotFound`],
//! [`ComposeGraphError::ParseError`], [`ComposeGraphError::CyclicInclude`])
//! are fatal for the whole resolution: later normalization assumes a
//! complete, consistent set of documents, so no partial document list is
//! ever returned. [`ComposeGraphError::SchemaInconsistency`] is scoped to a
//! single service and names the service and field so the remaining services
//! can still be normalized individually.

use colored::Colorize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for compose-graph operations.
#[derive(Error, Debug)]
pub enum ComposeGraphError {
    /// A compose file (top-level or included) does not resolve to a readable
    /// file.
    #[error("compose file not found: {path}", path = .path.display())]
    FileNotFound {
        /// Path as requested, before resolution failed.
        path: PathBuf,
    },

    /// A compose file could not be parsed into a root mapping.
    #[error("failed to parse compose file '{path}': {reason}", path = .path.display())]
    ParseError {
        /// Resolved path of the offending file.
        path: PathBuf,
        /// Parser diagnostic.
        reason: String,
    },

    /// An `include` chain revisits a file that is still being resolved.
    #[error("cyclic include detected: '{path}' is already being resolved", path = .path.display())]
    CyclicInclude {
        /// Resolved path that closed the cycle.
        path: PathBuf,
    },

    /// A service field is in neither of its two recognized shapes.
    ///
    /// Scoped to one service; other services remain normalizable.
    #[error("service '{service}' has an invalid '{field}' value: {reason}")]
    SchemaInconsistency {
        /// Name of the service that failed normalization.
        service: String,
        /// Field that had the unrecognized shape (`depends_on`, `environment`).
        field: String,
        /// What was found instead.
        reason: String,
    },

    /// Underlying I/O failure other than a missing file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A compose-graph result.
pub type Result<T> = std::result::Result<T, ComposeGraphError>;

/// Error wrapper that pairs an error with user-facing guidance.
///
/// Used by the CLI to display errors with suggestions instead of bare
/// `Debug` output.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error.
    pub error: anyhow::Error,
    /// Actionable suggestion for resolving the error.
    pub suggestion: Option<String>,
    /// Additional technical detail.
    pub details: Option<String>,
}

impl ErrorContext {
    /// Wrap an error without any extra guidance.
    pub fn new(error: impl Into<anyhow::Error>) -> Self {
        Self {
            error: error.into(),
            suggestion: None,
            details: None,
        }
    }

    /// Attach an actionable suggestion.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Attach additional detail.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with colors.
    pub fn display(&self) {
        eprintln!("{} {:#}", "Error:".red().bold(), self.error);
        if let Some(details) = &self.details {
            eprintln!("  {} {}", "Details:".yellow(), details);
        }
        if let Some(suggestion) = &self.suggestion {
            eprintln!("  {} {}", "Suggestion:".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#}", self.error)?;
        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }
        Ok(())
    }
}

/// Convert any error into an [`ErrorContext`] with a contextual suggestion.
///
/// Known [`ComposeGraphError`] variants get targeted guidance; everything
/// else passes through unchanged.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let suggestion = match error.downcast_ref::<ComposeGraphError>() {
        Some(ComposeGraphError::FileNotFound { .. }) => Some(
            "Check the compose file path and the paths listed under 'include'. \
             Relative include paths resolve against the including file's directory."
                .to_string(),
        ),
        Some(ComposeGraphError::ParseError { .. }) => {
            Some("Verify the file is valid YAML with a mapping at the root.".to_string())
        }
        Some(ComposeGraphError::CyclicInclude { .. }) => Some(
            "Remove the circular reference from the 'include' chain; a file must not \
             include itself, directly or transitively."
                .to_string(),
        ),
        Some(ComposeGraphError::SchemaInconsistency { field, .. }) => Some(format!(
            "'{field}' must be either a list or a mapping; fix the service definition \
             and re-run."
        )),
        _ => None,
    };

    let mut ctx = ErrorContext::new(error);
    if let Some(suggestion) = suggestion {
        ctx = ctx.with_suggestion(suggestion);
    }
    ctx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = ComposeGraphError::FileNotFound {
            path: PathBuf::from("missing.yaml"),
        };
        assert_eq!(err.to_string(), "compose file not found: missing.yaml");

        let err = ComposeGraphError::SchemaInconsistency {
            service: "web".to_string(),
            field: "depends_on".to_string(),
            reason: "found a scalar".to_string(),
        };
        assert!(err.to_string().contains("web"));
        assert!(err.to_string().contains("depends_on"));
    }

    #[test]
    fn test_user_friendly_error_attaches_suggestion() {
        let err = ComposeGraphError::CyclicInclude {
            path: PathBuf::from("/tmp/a.yaml"),
        };
        let ctx = user_friendly_error(anyhow::Error::from(err));
        assert!(ctx.suggestion.is_some());
        assert!(ctx.suggestion.unwrap().contains("circular"));
    }

    #[test]
    fn test_error_context_format() {
        let ctx = ErrorContext::new(ComposeGraphError::FileNotFound {
            path: PathBuf::from("x.yaml"),
        })
        .with_suggestion("check the path")
        .with_details("requested by a.yaml");

        let rendered = format!("{ctx}");
        assert!(rendered.contains("x.yaml"));
        assert!(rendered.contains("Suggestion: check the path"));
        assert!(rendered.contains("Details: requested by a.yaml"));
    }
}
