//! Request handler wrapping the exposed function

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use serde_json::Value;

use super::routes::EndpointState;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

fn internal_error(message: String) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse { error: message }),
    )
}

/// Decode the body, run the function on the blocking pool, encode its result
pub async fn invoke(
    State(state): State<EndpointState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, (StatusCode, Json<ErrorResponse>)> {
    let handler = state.handler.clone();
    let decode = state.decode;

    match tokio::task::spawn_blocking(move || handler.respond(body, decode)).await {
        Ok(Ok(value)) => {
            tracing::debug!("Exposed function returned");
            Ok(Json(value))
        }
        Ok(Err(e)) => {
            tracing::warn!("Exposed function failed: {}", e);
            Err(internal_error(e.to_string()))
        }
        Err(e) => {
            tracing::error!("Exposed function panicked: {}", e);
            Err(internal_error("exposed function panicked".into()))
        }
    }
}
