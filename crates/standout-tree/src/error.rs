//! Error types.
//!
//! Everything fallible in this crate returns [`TreeError`]. User callbacks
//! (executors, redirect modifiers, suggestion providers) return it too, so a
//! failure raised inside an original callback reaches the caller of the
//! remapped callback unchanged.

use std::fmt;
use thiserror::Error;

/// Number of input characters shown before the cursor in error messages.
const CONTEXT_AMOUNT: usize = 10;

/// Errors produced by the command tree and the source mapper.
#[derive(Debug, Clone, Error)]
pub enum TreeError {
    /// A caller passed a value the tree cannot accept (adding a root as a
    /// child, forwarding a node with children, asking for a missing argument).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A reverse lookup was made for an instance this mapper never produced.
    #[error("no original {kind} found for {remapped}")]
    UnknownRemap {
        /// What was looked up, e.g. `"argument command node"`.
        kind: &'static str,
        /// Debug rendering of the foreign instance.
        remapped: String,
    },

    /// A remapped callback ran after every handle to its mapper was dropped.
    #[error("the source mapper behind this remapped {kind} was dropped")]
    MapperDropped {
        /// What ran, e.g. `"command"`.
        kind: &'static str,
    },

    /// A command failed to parse or execute.
    #[error(transparent)]
    CommandSyntax(#[from] CommandSyntaxError),
}

impl TreeError {
    /// Creates an [`TreeError::InvalidArgument`] error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Returns the lookup kind if this is an [`TreeError::UnknownRemap`] error.
    pub fn unknown_remap_kind(&self) -> Option<&'static str> {
        match self {
            TreeError::UnknownRemap { kind, .. } => Some(kind),
            _ => None,
        }
    }

    /// Returns the syntax error if this is a [`TreeError::CommandSyntax`] error.
    pub fn as_syntax(&self) -> Option<&CommandSyntaxError> {
        match self {
            TreeError::CommandSyntax(e) => Some(e),
            _ => None,
        }
    }
}

/// Failure raised while parsing or running a command.
///
/// Carries the offending input and cursor position when known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSyntaxError {
    message: String,
    input: Option<String>,
    cursor: Option<usize>,
}

impl CommandSyntaxError {
    /// Creates an error without input context.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            input: None,
            cursor: None,
        }
    }

    /// Attaches the input and cursor where the error occurred.
    pub fn with_context(mut self, input: impl Into<String>, cursor: usize) -> Self {
        self.input = Some(input.into());
        self.cursor = Some(cursor);
        self
    }

    /// The raw message, without position context.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn input(&self) -> Option<&str> {
        self.input.as_deref()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// The input leading up to the cursor, marked with `<--[HERE]`.
    pub fn context(&self) -> Option<String> {
        let (input, cursor) = (self.input.as_deref()?, self.cursor?);
        let cursor = cursor.min(input.len());
        let mut start = cursor.saturating_sub(CONTEXT_AMOUNT);
        while !input.is_char_boundary(start) {
            start -= 1;
        }
        let before = input.get(start..cursor).unwrap_or("");
        let ellipsis = if start > 0 { "..." } else { "" };
        Some(format!("{ellipsis}{before}<--[HERE]"))
    }
}

impl fmt::Display for CommandSyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if let (Some(context), Some(cursor)) = (self.context(), self.cursor) {
            write!(f, " at position {}: {}", cursor, context)?;
        }
        Ok(())
    }
}

impl std::error::Error for CommandSyntaxError {}
