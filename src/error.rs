//! Error types for scope resolution, argument binding and invocation

use thiserror::Error;

use crate::model::CoercionError;

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors raised by the execution core
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// A required argument received no value and declares no default
    #[error("Required argument [{argument}] is missing for function [{function}]")]
    MissingArgument {
        /// Function name
        function: String,
        /// Argument name
        argument: String,
    },

    /// A bound argument value does not coerce to the declared type
    #[error(
        "In function [{function}], argument [{argument}] with a type of [{actual}] does not match the declared type of [{expected}]"
    )]
    InvalidArgumentType {
        /// Function name
        function: String,
        /// Argument name
        argument: String,
        /// Declared type
        expected: String,
        /// Actual type of the offending value
        actual: String,
    },

    /// A function result does not coerce to the declared return type
    #[error(
        "The return value of the function [{function}] is of type [{actual}] does not match the declared type of [{expected}]"
    )]
    InvalidReturnType {
        /// Function name
        function: String,
        /// Declared return type
        expected: String,
        /// Actual type of the result
        actual: String,
    },

    /// A declaration lists the same argument name twice
    #[error("Function [{function}] declares argument [{argument}] more than once")]
    DuplicateArgument {
        /// Function name
        function: String,
        /// Argument name
        argument: String,
    },

    /// An explicit lookup for a scope that no context in the chain owns
    #[error("The requested scope name [{name}] was not located in any context")]
    UnknownScope {
        /// Scope name
        name: String,
    },

    /// A strict variable lookup that found nothing
    #[error("The requested key [{key}] was not located in any scope or it's undefined")]
    KeyNotFound {
        /// Variable name
        key: String,
    },

    /// Raw casting failure
    #[error("Coercion error: {0}")]
    Coercion(#[from] CoercionError),

    /// The context tree was asked to do something its shape does not allow
    #[error("Invalid context: {message}")]
    InvalidContext {
        /// Error message
        message: String,
    },

    /// A function body failed
    #[error("Function [{function}] failed: {message}")]
    Execution {
        /// Function name
        function: String,
        /// Error message
        message: String,
    },

    /// Configuration could not be loaded
    #[error("Invalid configuration: {message}")]
    Config {
        /// Error message
        message: String,
    },
}

impl RuntimeError {
    /// Create an error for a failing function body
    pub fn execution(function: impl Into<String>, message: impl Into<String>) -> Self {
        RuntimeError::Execution {
            function: function.into(),
            message: message.into(),
        }
    }

    /// Whether this error was raised while binding arguments
    pub fn is_binding_error(&self) -> bool {
        matches!(
            self,
            RuntimeError::MissingArgument { .. } | RuntimeError::InvalidArgumentType { .. }
        )
    }
}
