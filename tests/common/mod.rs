#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, Bytes},
    http::{HeaderMap, Request, StatusCode},
};
use employee_api::{
    application::employee_service::EmployeeService, build_router, state::AppState,
    storage::EmployeeStore,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

pub fn app_with(store: Arc<dyn EmployeeStore>) -> Router {
    let service = Arc::new(EmployeeService::new(store));
    build_router(AppState::new(service))
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body is JSON")
    }

    pub fn content_type(&self) -> &str {
        self.headers
            .get("content-type")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
    }
}

pub async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> TestResponse {
    send_raw(app, method, uri, body.map(|body| body.to_string())).await
}

/// Sends `body` verbatim as `application/json`, well-formed or not.
pub async fn send_raw(app: Router, method: &str, uri: &str, body: Option<String>) -> TestResponse {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body)),
        None => builder.body(Body::empty()),
    }
    .expect("valid request");

    let response = app.oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let headers = response.headers().clone();
    let body = response
        .into_body()
        .collect()
        .await
        .expect("readable body")
        .to_bytes();

    TestResponse {
        status,
        headers,
        body,
    }
}
