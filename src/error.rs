//! Error types for store, dispatch and binding operations.

use thiserror::Error;

/// Errors raised by stores, the dispatcher and their callbacks.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A diff passed to `set` or `merge` was not a JSON object.
    #[error("cannot merge a {found} into store state, expected an object")]
    InvalidDiff { found: &'static str },

    /// `Store::call` named a method the definition did not declare.
    #[error("unknown store method: {0}")]
    UnknownMethod(String),

    /// A handler asked for a positional argument that was not supplied.
    #[error("missing argument at position {index}")]
    MissingArgument { index: usize },

    /// A positional argument had the wrong JSON type.
    #[error("argument at position {index} is not {expected}")]
    InvalidArgument { index: usize, expected: &'static str },

    /// Error raised by user code: an action handler, listener, method or init hook.
    #[error(transparent)]
    Callback(Box<dyn std::error::Error + Send + Sync>),

    /// Serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    /// Wrap an arbitrary error raised inside a callback.
    pub fn callback<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StoreError::Callback(Box::new(err))
    }

    /// Build a callback error from a plain message.
    pub fn msg(message: impl Into<String>) -> Self {
        let message: String = message.into();
        StoreError::Callback(message.into())
    }

    /// Returns true if the error came from user code rather than the store itself.
    pub fn is_callback(&self) -> bool {
        matches!(self, StoreError::Callback(_))
    }
}

/// Name of a JSON value's type, as used in error messages.
pub(crate) fn json_type(value: &serde_json::Value) -> &'static str {
    use serde_json::Value;
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
