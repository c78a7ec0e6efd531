// Copyright 2025 RustFS Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use axum::{
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::warn;

use crate::auth::origin::{Decision, OriginGuard};

/// Single-origin CORS
///
/// Answers preflight requests from the allowed origin directly and adds CORS
/// headers to its other requests. Requests from any other origin go through
/// untouched, so the browser refuses to expose the response.
pub async fn cors_middleware(
    State(guard): State<Arc<OriginGuard>>,
    request: Request,
    next: Next,
) -> Response {
    let origin = request.headers().get(header::ORIGIN);

    match guard.decide(request.method(), origin) {
        Decision::NoOrigin => next.run(request).await,
        Decision::Reject => {
            warn!(
                "cross-origin request from {:?} to {} {} not allowed",
                origin,
                request.method(),
                request.uri().path()
            );
            next.run(request).await
        }
        Decision::Preflight => {
            let mut response = StatusCode::OK.into_response();
            guard.apply_preflight_headers(response.headers_mut());
            response
        }
        Decision::Allow => {
            let mut response = next.run(request).await;
            guard.apply_allow_headers(response.headers_mut());
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::Method, middleware, routing::get};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    const APP: &str = "https://app.example.com";

    /// Router whose single route counts how often it was dispatched to.
    fn app(hits: Arc<AtomicUsize>) -> Router {
        Router::new()
            .route(
                "/entries",
                get(move || {
                    let hits = hits.clone();
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        "entries"
                    }
                }),
            )
            .layer(middleware::from_fn_with_state(
                Arc::new(OriginGuard::new(APP).unwrap()),
                cors_middleware,
            ))
    }

    async fn send(method: Method, origin: Option<&str>) -> (Response, usize) {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut builder = Request::builder().method(method).uri("/entries");
        if let Some(origin) = origin {
            builder = builder.header(header::ORIGIN, origin);
        }
        let response = app(hits.clone())
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        (response, hits.load(Ordering::SeqCst))
    }

    #[tokio::test]
    async fn test_preflight_from_allowed_origin_short_circuits() {
        let (response, hits) = send(Method::OPTIONS, Some(APP)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(hits, 0);
        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], APP);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert!(headers.contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));
        assert!(headers.contains_key(header::ACCESS_CONTROL_ALLOW_HEADERS));
        assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "3600");
    }

    #[tokio::test]
    async fn test_request_from_allowed_origin_gets_headers() {
        let (response, hits) = send(Method::GET, Some(APP)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(hits, 1);
        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], APP);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert!(!headers.contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));
    }

    #[tokio::test]
    async fn test_foreign_origin_continues_without_headers() {
        let (response, hits) = send(Method::GET, Some("https://evil.com")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(hits, 1);
        assert!(!response.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
        assert!(!response.headers().contains_key(header::ACCESS_CONTROL_ALLOW_CREDENTIALS));
    }

    #[tokio::test]
    async fn test_foreign_preflight_is_not_answered() {
        let (response, hits) = send(Method::OPTIONS, Some("https://evil.com")).await;

        assert_ne!(response.status(), StatusCode::OK);
        assert_eq!(hits, 0);
        assert!(!response.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }

    #[tokio::test]
    async fn test_no_origin_continues_without_headers() {
        let (response, hits) = send(Method::GET, None).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(hits, 1);
        assert!(!response.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }
}
