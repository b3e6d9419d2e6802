use crate::error::{Result, StoreError};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Positional arguments of an action or method call.
#[derive(Debug, Clone, Copy)]
pub struct Args<'a> {
    values: &'a [Value],
}

impl<'a> Args<'a> {
    /// Wrap a slice of positional values.
    pub fn new(values: &'a [Value]) -> Self {
        Self { values }
    }

    /// Number of arguments supplied.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no arguments were supplied.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The raw argument slice.
    pub fn as_slice(&self) -> &'a [Value] {
        self.values
    }

    /// Argument at `index`, if supplied.
    pub fn get(&self, index: usize) -> Option<&'a Value> {
        self.values.get(index)
    }

    /// Argument at `index`, or [`StoreError::MissingArgument`].
    pub fn value(&self, index: usize) -> Result<&'a Value> {
        self.values
            .get(index)
            .ok_or(StoreError::MissingArgument { index })
    }

    /// Argument at `index` as an integer.
    pub fn i64(&self, index: usize) -> Result<i64> {
        self.value(index)?
            .as_i64()
            .ok_or(StoreError::InvalidArgument {
                index,
                expected: "an integer",
            })
    }

    /// Argument at `index` as a float. Integers are widened.
    pub fn f64(&self, index: usize) -> Result<f64> {
        self.value(index)?
            .as_f64()
            .ok_or(StoreError::InvalidArgument {
                index,
                expected: "a number",
            })
    }

    /// Argument at `index` as a string slice.
    pub fn str(&self, index: usize) -> Result<&'a str> {
        self.value(index)?
            .as_str()
            .ok_or(StoreError::InvalidArgument {
                index,
                expected: "a string",
            })
    }

    /// Argument at `index` as a boolean.
    pub fn bool(&self, index: usize) -> Result<bool> {
        self.value(index)?
            .as_bool()
            .ok_or(StoreError::InvalidArgument {
                index,
                expected: "a boolean",
            })
    }

    /// Deserialize the argument at `index` into `T`.
    pub fn parse<T: DeserializeOwned>(&self, index: usize) -> Result<T> {
        let value = self.value(index)?;
        Ok(T::deserialize(value)?)
    }
}
