//! Core types and error handling.
//!
//! Everything in the resolution pipeline reports failures through
//! [`ComposeGraphError`]; the CLI converts them for display with
//! [`user_friendly_error`].

pub mod error;

pub use error::{ComposeGraphError, ErrorContext, Result, user_friendly_error};
