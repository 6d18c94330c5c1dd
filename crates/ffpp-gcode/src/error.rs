//! Error types for G-code post-processing.

use thiserror::Error;

/// Fatal errors that abort a post-processing run.
///
/// The pipeline stops at the first one and no output is produced.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PostProcessError {
    /// A recognized command has a parameter shape this tool cannot rewrite.
    #[error("malformed command at line {line}: {message} (`{text}`)")]
    MalformedCommand {
        /// Line number (1-indexed).
        line: usize,
        /// Source text of the line.
        text: String,
        /// What was wrong with it.
        message: String,
    },

    /// A plain macro was collected more than once with different values.
    #[error("macro `{name}` has conflicting values `{first}` and `{conflicting}`")]
    MacroConsistency {
        /// Macro name.
        name: String,
        /// First collected value.
        first: String,
        /// First value that differs from it.
        conflicting: String,
    },

    /// A placeholder names a macro that was never collected.
    #[error("unknown macro `{name}` referenced at line {line}")]
    UnknownMacro {
        /// Line number (1-indexed).
        line: usize,
        /// Macro name.
        name: String,
    },

    /// A `calculated-` placeholder has no known computation.
    #[error("calculated macro `{name}` at line {line} is not implemented")]
    UnimplementedCalculation {
        /// Line number (1-indexed).
        line: usize,
        /// Calculated macro name (without the `calculated-` prefix).
        name: String,
    },

    /// A cursor-driven calculated macro ran out of collected values.
    #[error(
        "calculated macro `{name}` at line {line} needs value #{} but only {available} were collected",
        cursor + 1
    )]
    CursorOutOfRange {
        /// Line number (1-indexed).
        line: usize,
        /// Calculated macro name.
        name: String,
        /// Zero-based cursor position that was requested.
        cursor: usize,
        /// Number of collected values.
        available: usize,
    },

    /// A collected value could not be used in a calculation.
    #[error("macro `{name}` value `{value}` is not a number")]
    InvalidMacroValue {
        /// Macro name.
        name: String,
        /// Offending raw value.
        value: String,
    },

    /// The grammar matched but an expected part was missing.
    #[error("internal invariant violated at line {line}: {message}")]
    InternalInvariant {
        /// Line number (1-indexed).
        line: usize,
        /// Description of the violated invariant.
        message: String,
    },

    /// Output file name cannot be shortened to the firmware limit.
    #[error("file name `{name}` cannot be shortened to {limit} characters")]
    FileNameTooLong {
        /// The name that was too long.
        name: String,
        /// Maximum length in characters.
        limit: usize,
    },

    /// Settings are out of range or could not be parsed.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}

impl PostProcessError {
    /// Create a malformed command error.
    pub fn malformed(line: usize, text: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedCommand {
            line,
            text: text.into(),
            message: message.into(),
        }
    }

    /// Create an internal invariant error.
    pub fn invariant(line: usize, message: impl Into<String>) -> Self {
        Self::InternalInvariant {
            line,
            message: message.into(),
        }
    }
}

/// Result type for post-processing operations.
pub type Result<T> = std::result::Result<T, PostProcessError>;
