//! Route definition for an exposed function

use axum::{
    body::Body,
    http::Request,
    routing::{on, MethodFilter, MethodRouter},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers;
use crate::config::Binding;
use crate::handler::Handler;
use crate::types::{DecodeMode, Method, MethodSet};

/// Shared state of one endpoint
#[derive(Clone)]
pub struct EndpointState {
    pub handler: Handler,
    pub decode: DecodeMode,
}

fn method_filter(method: Method) -> MethodFilter {
    match method {
        Method::Get => MethodFilter::GET,
        Method::Post => MethodFilter::POST,
        Method::Put => MethodFilter::PUT,
        Method::Delete => MethodFilter::DELETE,
    }
}

/// `None` for an empty set
fn combined_filter(methods: MethodSet) -> Option<MethodFilter> {
    methods.iter().map(method_filter).reduce(MethodFilter::or)
}

/// Create the router serving `handler` on the binding's route and methods.
///
/// Other paths answer 404, other methods 405. Request spans are children of
/// `parent`; `Span::none()` makes them roots.
pub fn create_router(handler: Handler, binding: &Binding, parent: Span) -> Router {
    let state = EndpointState {
        handler,
        decode: binding.decode(),
    };

    let method_router: MethodRouter<EndpointState> = match combined_filter(binding.methods()) {
        Some(filter) => on(filter, handlers::invoke),
        None => MethodRouter::new(),
    };

    Router::new()
        .route(binding.route(), method_router)
        .layer(
            TraceLayer::new_for_http().make_span_with(move |request: &Request<Body>| {
                tracing::debug_span!(
                    parent: &parent,
                    "request",
                    method = %request.method(),
                    uri = %request.uri()
                )
            }),
        )
        .with_state(state)
}
