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
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::debug;

use crate::api::error::Error;
use crate::auth::AuthenticatedIdentity;

/// Which routes may be called without a token. Everything else requires an
/// authenticated identity.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    public_paths: Vec<String>,
    public_prefixes: Vec<String>,
}

impl AccessPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn permit(mut self, path: impl Into<String>) -> Self {
        self.public_paths.push(path.into());
        self
    }

    pub fn permit_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.public_prefixes.push(prefix.into());
        self
    }

    /// Prefixes match whole path segments: `/docs` covers `/docs` and
    /// `/docs/index.html` but not `/docsX`.
    pub fn is_public(&self, path: &str) -> bool {
        self.public_paths.iter().any(|p| p == path)
            || self.public_prefixes.iter().any(|p| {
                path.strip_prefix(p.as_str())
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
            })
    }
}

/// Rejects unauthenticated calls to protected routes with 401.
pub async fn require_authenticated(
    State(policy): State<Arc<AccessPolicy>>,
    request: Request,
    next: Next,
) -> Response {
    let authenticated = request.extensions().get::<AuthenticatedIdentity>().is_some();
    let path = request.uri().path();

    if authenticated || policy.is_public(path) {
        return next.run(request).await;
    }

    debug!("rejecting unauthenticated request to {}", path);
    Error::Unauthorized.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        http::{StatusCode, header},
        middleware,
        routing::get,
    };
    use std::collections::BTreeSet;
    use tower::ServiceExt;

    fn policy() -> AccessPolicy {
        AccessPolicy::new()
            .permit("/oauth/token")
            .permit("/healthz")
            .permit_prefix("/swagger-ui")
    }

    #[test]
    fn test_is_public() {
        let policy = policy();
        assert!(policy.is_public("/oauth/token"));
        assert!(policy.is_public("/swagger-ui/index.html"));
        assert!(policy.is_public("/swagger-ui"));
        assert!(!policy.is_public("/swagger-uiX"));
        assert!(!policy.is_public("/swagger-ui-admin/index.html"));
        assert!(!policy.is_public("/oauth/token/extra"));
        assert!(!policy.is_public("/api/v1/session"));
    }

    async fn status_of(path: &str, identity: Option<AuthenticatedIdentity>) -> Response {
        let app = Router::new()
            .route("/healthz", get(|| async { "ok" }))
            .route("/private", get(|| async { "secret" }))
            .layer(middleware::from_fn_with_state(
                Arc::new(policy()),
                require_authenticated,
            ));

        let mut request = Request::builder().uri(path).body(Body::empty()).unwrap();
        if let Some(identity) = identity {
            request.extensions_mut().insert(identity);
        }
        app.oneshot(request).await.unwrap()
    }

    #[tokio::test]
    async fn test_protected_route_requires_identity() {
        let response = status_of("/private", None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");

        let identity = AuthenticatedIdentity {
            username: "bob".to_string(),
            authorities: BTreeSet::new(),
        };
        let response = status_of("/private", Some(identity)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_public_route_is_open() {
        let response = status_of("/healthz", None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
