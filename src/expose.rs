//! Turning functions into HTTP endpoints

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::{Binding, ExposeOptions};
use crate::error::Result;
use crate::handler::Handler;
use crate::listener::{Endpoint, ListenerHandle};
use crate::types::MethodSet;

/// A function being served over HTTP.
///
/// The function stays callable in-process through [`call`](Self::call).
#[derive(Debug)]
pub struct Exposed {
    handler: Handler,
    listener: ListenerHandle,
}

impl Exposed {
    /// Invoke the function directly with a decoded payload, bypassing HTTP
    pub fn call(&self, payload: Value) -> Result<Value> {
        self.handler.invoke(payload)
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    pub fn listener(&self) -> &ListenerHandle {
        &self.listener
    }

    pub fn into_parts(self) -> (Handler, ListenerHandle) {
        (self.handler, self.listener)
    }
}

/// Serve `func` on `options.route` for `methods` and return without waiting
/// for the socket.
///
/// Only an invalid route or a failure to spawn the listener thread is
/// returned as an error. Everything that happens later is reported through
/// the listener's state.
pub fn expose<F, T, R>(func: F, methods: MethodSet, options: ExposeOptions) -> Result<Exposed>
where
    F: Fn(T) -> R + Send + Sync + 'static,
    T: DeserializeOwned,
    R: Serialize,
{
    expose_handler(Handler::new(func), methods, options)
}

/// Like [`expose`], for a prebuilt handler such as [`Handler::fallible`]
pub fn expose_handler(
    handler: Handler,
    methods: MethodSet,
    options: ExposeOptions,
) -> Result<Exposed> {
    let binding = Binding::new(methods, options)?;
    let listener = Endpoint::new(handler.clone(), binding).start()?;

    Ok(Exposed { handler, listener })
}

/// [`expose`] on GET, POST, PUT and DELETE
pub fn expose_all<F, T, R>(func: F, options: ExposeOptions) -> Result<Exposed>
where
    F: Fn(T) -> R + Send + Sync + 'static,
    T: DeserializeOwned,
    R: Serialize,
{
    expose(func, MethodSet::ALL, options)
}

/// [`expose`] on GET
pub fn expose_get<F, T, R>(func: F, options: ExposeOptions) -> Result<Exposed>
where
    F: Fn(T) -> R + Send + Sync + 'static,
    T: DeserializeOwned,
    R: Serialize,
{
    expose(func, MethodSet::GET, options)
}

/// [`expose`] on POST
pub fn expose_post<F, T, R>(func: F, options: ExposeOptions) -> Result<Exposed>
where
    F: Fn(T) -> R + Send + Sync + 'static,
    T: DeserializeOwned,
    R: Serialize,
{
    expose(func, MethodSet::POST, options)
}

/// [`expose`] on PUT
pub fn expose_put<F, T, R>(func: F, options: ExposeOptions) -> Result<Exposed>
where
    F: Fn(T) -> R + Send + Sync + 'static,
    T: DeserializeOwned,
    R: Serialize,
{
    expose(func, MethodSet::PUT, options)
}

/// [`expose`] on DELETE
pub fn expose_delete<F, T, R>(func: F, options: ExposeOptions) -> Result<Exposed>
where
    F: Fn(T) -> R + Send + Sync + 'static,
    T: DeserializeOwned,
    R: Serialize,
{
    expose(func, MethodSet::DELETE, options)
}
