//! HTTP layer for a single exposed function

mod handlers;
mod routes;

pub use handlers::ErrorResponse;
pub use routes::{create_router, EndpointState};
