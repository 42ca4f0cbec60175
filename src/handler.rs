//! Type-erased wrapper around an exposed function

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::DecodeMode;

type ErasedFn = dyn Fn(Value) -> Result<Value> + Send + Sync;

/// An exposed function taking and returning JSON values.
///
/// Cloning is cheap; all clones share the same function.
#[derive(Clone)]
pub struct Handler {
    func: Arc<ErasedFn>,
}

impl Handler {
    /// Wrap an infallible function. The argument is deserialized from the
    /// payload and the return value serialized back to JSON.
    pub fn new<F, T, R>(func: F) -> Self
    where
        F: Fn(T) -> R + Send + Sync + 'static,
        T: DeserializeOwned,
        R: Serialize,
    {
        Self::fallible(move |arg: T| Ok::<R, std::convert::Infallible>(func(arg)))
    }

    /// Wrap a function that can fail. Its error message becomes the
    /// `Error::Handler` text.
    pub fn fallible<F, T, R, E>(func: F) -> Self
    where
        F: Fn(T) -> std::result::Result<R, E> + Send + Sync + 'static,
        T: DeserializeOwned,
        R: Serialize,
        E: fmt::Display,
    {
        let erased = move |payload: Value| -> Result<Value> {
            let arg: T =
                serde_json::from_value(payload).map_err(|e| Error::Payload(e.to_string()))?;
            let ret = func(arg).map_err(|e| Error::handler(e.to_string()))?;
            Ok(serde_json::to_value(ret)?)
        };

        Self {
            func: Arc::new(erased),
        }
    }

    /// Call the function in-process with an already decoded payload
    pub fn invoke(&self, payload: Value) -> Result<Value> {
        (self.func)(payload)
    }

    /// Apply `mode` to a request body the JSON extractor already parsed, then
    /// invoke the function
    pub fn respond(&self, body: Value, mode: DecodeMode) -> Result<Value> {
        let payload = decode_payload(body, mode)?;
        self.invoke(payload)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler").finish_non_exhaustive()
    }
}

/// Turn a parsed request body into the function argument.
///
/// In `Literal` mode the body must be a JSON string holding JSON text; that
/// text is parsed again. Any other body shape is a decode error.
pub fn decode_payload(body: Value, mode: DecodeMode) -> Result<Value> {
    match mode {
        DecodeMode::Single => Ok(body),
        DecodeMode::Literal => match body {
            Value::String(text) => serde_json::from_str(&text)
                .map_err(|e| Error::decode(format!("body string is not valid JSON: {}", e))),
            other => Err(Error::decode(format!(
                "expected a JSON-encoded string body, got {}",
                kind_of(&other)
            ))),
        },
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
