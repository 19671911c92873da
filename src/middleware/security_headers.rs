//! Response headers for the JSON API

use axum::{extract::Request, middleware::Next, response::Response};
use http::{header, HeaderValue};

/// Adds `nosniff`, frame denial and a strict referrer policy to every response.
/// Session-bearing paths also get `Cache-Control: no-store`.
pub async fn security_headers(req: Request, next: Next) -> Response {
    let private = is_private_path(req.uri().path());
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(header::REFERRER_POLICY, HeaderValue::from_static("no-referrer"));
    if private {
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    }

    response
}

fn is_private_path(path: &str) -> bool {
    path.starts_with("/auth") || path.starts_with("/api/admin") || path.starts_with("/api/users")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, middleware, routing::get, Router};
    use http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_app() -> Router {
        Router::new()
            .route("/api/health", get(|| async { "ok" }))
            .route("/api/admin/logs", get(|| async { "[]" }))
            .layer(middleware::from_fn(security_headers))
    }

    async fn get_path(path: &str) -> Response {
        test_app()
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_public_response_headers() {
        let response = get_path("/api/health").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("x-content-type-options").unwrap(), "nosniff");
        assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
        assert!(response.headers().get("cache-control").is_none());
    }

    #[tokio::test]
    async fn test_admin_responses_are_not_cached() {
        let response = get_path("/api/admin/logs").await;
        assert_eq!(response.headers().get("cache-control").unwrap(), "no-store");
    }
}
