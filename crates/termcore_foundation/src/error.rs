//! Error types for termcore.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.

use std::fmt;

use thiserror::Error;

use crate::location::Layout;
use crate::types::Type;

/// The main error type for termcore operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Pushes a frame onto this error's context, creating the context if needed.
    #[must_use]
    pub fn in_frame(mut self, frame: impl Into<String>) -> Self {
        let context = self.context.take().unwrap_or_default();
        self.context = Some(context.with_frame(frame));
        self
    }

    /// Creates a type mismatch error.
    #[must_use]
    pub fn type_mismatch(expected: Type, actual: Type) -> Self {
        Self::new(ErrorKind::TypeMismatch { expected, actual })
    }

    /// Creates an error for mutation of a finalized builder.
    #[must_use]
    pub fn finalized() -> Self {
        Self::new(ErrorKind::FinalizedMutation)
    }

    /// Creates an unsupported operation error.
    #[must_use]
    pub fn unsupported(operation: &'static str, layout: Layout) -> Self {
        Self::new(ErrorKind::UnsupportedOperation { operation, layout })
    }

    /// Creates an invalid argument error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument(message.into()))
    }

    /// Creates a missing keyword parameter error.
    #[must_use]
    pub fn missing_parameter(label: impl Into<String>) -> Self {
        Self::new(ErrorKind::MissingParameter(label.into()))
    }

    /// Creates an arity mismatch error.
    #[must_use]
    pub fn arity_mismatch(expected: usize, actual: usize) -> Self {
        Self::new(ErrorKind::ArityMismatch { expected, actual })
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// A value's runtime type is not a subtype of the required type.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// The expected type.
        expected: Type,
        /// The actual type encountered.
        actual: Type,
    },

    /// Mutation attempted on a builder that was already finalized.
    #[error("builder already finalized")]
    FinalizedMutation,

    /// Operation not supported by the selected representation.
    #[error("unsupported operation: {operation} on {layout:?} layout")]
    UnsupportedOperation {
        /// The accessor or mutator that was invoked.
        operation: &'static str,
        /// The layout that lacks support for it.
        layout: Layout,
    },

    /// Argument out of range or inconsistent with other arguments.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Keyword parameter with neither a stored value nor a declared default.
    #[error("missing keyword parameter: {0}")]
    MissingParameter(String),

    /// Wrong number of children for a constructor.
    #[error("arity mismatch: expected {expected}, got {actual}")]
    ArityMismatch {
        /// Declared arity.
        expected: usize,
        /// Actual number of children.
        actual: usize,
    },
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Name of the operation that failed.
    pub operation: Option<String>,
    /// Position of the offending element in a batch.
    pub index: Option<usize>,
    /// Stack of enclosing operations, innermost first.
    pub stack: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the operation name.
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Sets the batch index.
    #[must_use]
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Adds a stack frame.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.stack.push(frame.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(operation) = &self.operation {
            write!(f, "in {operation}")?;
            if let Some(index) = self.index {
                write!(f, " at element {index}")?;
            }
        }
        if !self.stack.is_empty() {
            writeln!(f)?;
            for frame in &self.stack {
                writeln!(f, "  in {frame}")?;
            }
        }
        Ok(())
    }
}
