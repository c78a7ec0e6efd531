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
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::auth::AuthenticatedIdentity;
use crate::auth::codec::TokenCodec;

pub const BEARER_PREFIX: &str = "Bearer ";

/// Bearer token authentication
///
/// Verifies the bearer token, if any, and puts the resulting
/// [`AuthenticatedIdentity`] into the request extensions. Never rejects a
/// request: a missing or bad token just leaves it unauthenticated, and the
/// authorization layer decides what that means for the route.
pub async fn auth_middleware(
    State(codec): State<Arc<TokenCodec>>,
    mut request: Request,
    next: Next,
) -> Response {
    let identity = identify(&codec, request.headers(), request.uri().path(), Utc::now());
    if let Some(identity) = identity {
        request.extensions_mut().insert(identity);
    }

    next.run(request).await
}

fn identify(
    codec: &TokenCodec,
    headers: &HeaderMap,
    path: &str,
    now: DateTime<Utc>,
) -> Option<AuthenticatedIdentity> {
    let token = bearer_token(headers)?;

    match codec.verify(token, now) {
        Ok(claims) => {
            debug!("token authentication successful for user '{}'", claims.sub);
            Some(AuthenticatedIdentity::from(claims))
        }
        Err(e) if e.reason().is_internal() => {
            error!("unexpected error during token verification for {}: {}", path, e.reason());
            None
        }
        Err(e) => {
            warn!("token verification failed for {}: {}", path, e.reason());
            None
        }
    }
}

/// Token part of an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix(BEARER_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{test_claims, test_codec};
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{HeaderValue, StatusCode},
        middleware,
        routing::get,
    };
    use tower::ServiceExt;

    async fn whoami(request: Request) -> String {
        match request.extensions().get::<AuthenticatedIdentity>() {
            Some(identity) => identity.username.clone(),
            None => "anonymous".to_string(),
        }
    }

    fn app() -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .layer(middleware::from_fn_with_state(
                Arc::new(test_codec()),
                auth_middleware,
            ))
    }

    async fn call(authorization: Option<&str>) -> (StatusCode, String) {
        let mut builder = Request::builder().uri("/whoami");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let response = app()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_missing_header_passes_through_unauthenticated() {
        assert_eq!(call(None).await, (StatusCode::OK, "anonymous".to_string()));
    }

    #[tokio::test]
    async fn test_valid_token_attaches_identity() {
        let mut claims = test_claims("bob", &["ROLE_READ"]);
        claims.exp = Utc::now().timestamp() + 600;
        let token = test_codec().sign(&claims).unwrap();

        let (status, body) = call(Some(&format!("Bearer {}", token.as_str()))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "bob");
    }

    #[tokio::test]
    async fn test_invalid_token_passes_through_unauthenticated() {
        let (status, body) = call(Some("Bearer not.a.token")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "anonymous");
    }

    #[tokio::test]
    async fn test_expired_token_passes_through_unauthenticated() {
        let mut claims = test_claims("bob", &[]);
        claims.iat = Utc::now().timestamp() - 120;
        claims.exp = claims.iat + 60;
        let token = test_codec().sign(&claims).unwrap();

        let (_, body) = call(Some(&format!("Bearer {}", token.as_str()))).await;
        assert_eq!(body, "anonymous");
    }

    #[tokio::test]
    async fn test_other_schemes_are_ignored() {
        let (_, body) = call(Some("Basic Ym9iOnB3")).await;
        assert_eq!(body, "anonymous");
    }

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers), Some("abc"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("bearer abc"));
        assert_eq!(bearer_token(&headers), None);
    }
}
