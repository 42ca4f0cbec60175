//! exposer - serve a plain function as a JSON-over-HTTP endpoint

pub mod config;
pub mod error;
pub mod types;

pub mod api;
pub mod expose;
pub mod handler;
pub mod listener;

pub use config::{Binding, Config, ExposeOptions};
pub use error::{Error, Result};
pub use expose::{
    expose, expose_all, expose_delete, expose_get, expose_handler, expose_post, expose_put,
    Exposed,
};
pub use handler::Handler;
pub use listener::{Endpoint, ListenerHandle};
pub use types::*;
