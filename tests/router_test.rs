//! Router-level tests: routing, method binding and decode conventions,
//! driven through `tower::ServiceExt::oneshot` without opening sockets

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use exposer::{Binding, DecodeMode, Endpoint, ExposeOptions, Handler, Method, MethodSet};

/// Echo endpoint that counts how often the function ran
fn counting_router(methods: MethodSet, options: ExposeOptions) -> (Router, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let handler = Handler::new(move |payload: Value| {
        counter.fetch_add(1, Ordering::SeqCst);
        payload
    });

    let binding = Binding::new(methods, options).expect("valid binding");
    (Endpoint::new(handler, binding).router(), calls)
}

fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

#[tokio::test]
async fn test_matching_method_and_route_reach_function() {
    let (app, calls) = counting_router(MethodSet::POST, ExposeOptions::default().route("/echo"));

    let (status, body) = send(&app, json_request("POST", "/echo", &json!("42"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), json!(42));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_method_outside_set_is_rejected() {
    let (app, calls) = counting_router(MethodSet::POST, ExposeOptions::default());

    for method in ["GET", "PUT", "DELETE"] {
        let (status, _) = send(&app, json_request(method, "/", &json!("1"))).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "method {}", method);
    }

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_other_path_is_not_found() {
    let (app, calls) = counting_router(MethodSet::ALL, ExposeOptions::default().route("/orders"));

    let (status, _) = send(&app, json_request("POST", "/customers", &json!("1"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, json_request("POST", "/", &json!("1"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_every_method_in_set_is_served() {
    let methods: MethodSet = [Method::Get, Method::Put, Method::Delete].into_iter().collect();
    let (app, calls) = counting_router(methods, ExposeOptions::default());

    for method in ["GET", "PUT", "DELETE"] {
        let (status, body) = send(&app, json_request(method, "/", &json!("[1, 2]"))).await;
        assert_eq!(status, StatusCode::OK, "method {}", method);
        assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), json!([1, 2]));
    }

    let (status, _) = send(&app, json_request("POST", "/", &json!("1"))).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_empty_method_set_never_invokes_function() {
    let (app, calls) = counting_router(MethodSet::EMPTY, ExposeOptions::default());

    for method in ["GET", "POST", "PUT", "DELETE"] {
        let (status, _) = send(&app, json_request(method, "/", &json!("1"))).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "method {}", method);
    }

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_literal_decode_rejects_plain_object() {
    let (app, calls) = counting_router(MethodSet::POST, ExposeOptions::default());

    let order = json!({"Id": 78912, "Customer": "Jason Sweet", "Quantity": 1, "Price": 18.0});
    let (status, body) = send(&app, json_request("POST", "/", &order)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let error: Value = serde_json::from_slice(&body).unwrap();
    assert!(error["error"].as_str().unwrap().contains("JSON-encoded string"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_literal_decode_round_trips_encoded_object() {
    let (app, _) = counting_router(MethodSet::POST, ExposeOptions::default());

    let order = json!({"Id": 78912, "Customer": "Jason Sweet", "Quantity": 1, "Price": 18.0});
    let encoded = Value::String(order.to_string());
    let (status, body) = send(&app, json_request("POST", "/", &encoded)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), order);
}

#[tokio::test]
async fn test_single_decode_round_trips_any_value() {
    let (app, _) = counting_router(
        MethodSet::POST,
        ExposeOptions::default().decode(DecodeMode::Single),
    );

    let values = [
        json!(null),
        json!(true),
        json!(3.5),
        json!("42"),
        json!([1, "two", {"three": 3}]),
        json!({"nested": {"list": [1, 2, 3]}}),
    ];

    for value in values {
        let (status, body) = send(&app, json_request("POST", "/", &value)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), value);
    }
}

#[tokio::test]
async fn test_missing_content_type_is_rejected_by_extractor() {
    let (app, calls) = counting_router(MethodSet::POST, ExposeOptions::default());

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .body(Body::from("\"42\""))
        .unwrap();
    let (status, _) = send(&app, request).await;

    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_function_panic_yields_server_error() {
    let handler = Handler::new(|n: i64| -> i64 {
        if n == 0 {
            panic!("division by zero");
        }
        100 / n
    });
    let binding = Binding::new(MethodSet::POST, ExposeOptions::default()).unwrap();
    let app = Endpoint::new(handler, binding).router();

    let (status, body) = send(&app, json_request("POST", "/", &json!("4"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), json!(25));

    let (status, body) = send(&app, json_request("POST", "/", &json!("0"))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let error: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["error"], json!("exposed function panicked"));
}

#[tokio::test]
async fn test_fallible_function_error_message() {
    let handler = Handler::fallible(|name: String| {
        if name.is_empty() {
            Err("name must not be empty")
        } else {
            Ok(format!("hello, {}", name))
        }
    });
    let binding = Binding::new(
        MethodSet::POST,
        ExposeOptions::default().decode(DecodeMode::Single),
    )
    .unwrap();
    let app = Endpoint::new(handler, binding).router();

    let (status, body) = send(&app, json_request("POST", "/", &json!("ada"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), json!("hello, ada"));

    let (status, body) = send(&app, json_request("POST", "/", &json!(""))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let error: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["error"], json!("Handler error: name must not be empty"));
}
