use std::time::Instant;

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::application::error::ErrorReport;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Correlates a request with its log lines. Echoed back as `x-request-id`.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
}

/// Reuse a caller-provided `x-request-id` when it is printable, otherwise mint one.
pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty() && value.len() <= 128)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().simple().to_string());

    let ctx = RequestContext { request_id };
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&ctx.request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response.extensions_mut().insert(ctx);
    response
}

/// One access line per request; failures carry the attached `ErrorReport`.
pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.clone())
        .unwrap_or_default();
    let started_at = Instant::now();

    let mut response = next.run(request).await;
    let line = AccessLine {
        method,
        path,
        request_id,
        status: response.status(),
        elapsed_ms: started_at.elapsed().as_millis() as u64,
    };

    match response.extensions_mut().remove::<ErrorReport>() {
        Some(report) => line.failed(&report),
        None if line.status.is_client_error() || line.status.is_server_error() => {
            line.failed(&ErrorReport::from_message(
                "infra::http",
                line.status,
                "no diagnostic available",
            ))
        }
        None => line.succeeded(),
    }

    response
}

struct AccessLine {
    method: Method,
    path: String,
    request_id: String,
    status: StatusCode,
    elapsed_ms: u64,
}

impl AccessLine {
    fn succeeded(&self) {
        info!(
            target = "texforge::http::response",
            status = self.status.as_u16(),
            method = %self.method,
            path = %self.path,
            elapsed_ms = self.elapsed_ms,
            request_id = %self.request_id,
            "request completed",
        );
    }

    fn failed(&self, report: &ErrorReport) {
        let detail = report
            .messages
            .first()
            .map(String::as_str)
            .unwrap_or("no diagnostic available");
        if self.status.is_server_error() {
            error!(
                target = "texforge::http::response",
                status = self.status.as_u16(),
                method = %self.method,
                path = %self.path,
                elapsed_ms = self.elapsed_ms,
                source = report.source,
                detail = %detail,
                chain = ?report.messages,
                request_id = %self.request_id,
                "request failed",
            );
        } else {
            warn!(
                target = "texforge::http::response",
                status = self.status.as_u16(),
                method = %self.method,
                path = %self.path,
                elapsed_ms = self.elapsed_ms,
                source = report.source,
                detail = %detail,
                chain = ?report.messages,
                request_id = %self.request_id,
                "client request error",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, middleware as axum_middleware, routing::get};
    use tower::ServiceExt;

    fn router() -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(axum_middleware::from_fn(log_responses))
            .layer(axum_middleware::from_fn(set_request_context))
    }

    #[tokio::test]
    async fn mints_request_id_when_absent() {
        let response = router()
            .oneshot(Request::builder().uri("/").body(Body::empty()).expect("request"))
            .await
            .expect("response");

        let id = response.headers()[&REQUEST_ID_HEADER].to_str().expect("ascii");
        assert_eq!(id.len(), 32);
        assert!(response.extensions().get::<RequestContext>().is_some());
    }

    #[tokio::test]
    async fn echoes_caller_request_id() {
        let request = Request::builder()
            .uri("/")
            .header(&REQUEST_ID_HEADER, "trace-123")
            .body(Body::empty())
            .expect("request");
        let response = router().oneshot(request).await.expect("response");

        assert_eq!(response.headers()[&REQUEST_ID_HEADER], "trace-123");
    }
}
