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
    Router,
    http::{HeaderValue, StatusCode, header},
    middleware,
    response::IntoResponse,
    routing::get,
};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{
    middleware::{
        auth::auth_middleware,
        authorization::{AccessPolicy, require_authenticated},
        cors::cors_middleware,
    },
    openapi::ApiDoc,
    routes,
    state::AppState,
};
use crate::auth::{
    codec::TokenCodec, issuer::TokenIssuer, origin::OriginGuard, policy, user_store::StaticUserStore,
};
use crate::config::ServerConfig;

const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; script-src 'self'; style-src 'self' 'unsafe-inline'; img-src 'self' data:; font-src 'self'; connect-src 'self'; frame-ancestors 'none'";
const STRICT_TRANSPORT_SECURITY: &str = "max-age=31536000; includeSubDomains";

/// The long-lived pieces of the request pipeline.
#[derive(Clone)]
pub struct Pipeline {
    pub codec: Arc<TokenCodec>,
    pub issuer: Arc<TokenIssuer>,
    pub origin_guard: Arc<OriginGuard>,
    pub swagger_ui: bool,
}

impl Pipeline {
    fn access_policy(&self) -> AccessPolicy {
        let policy = AccessPolicy::new()
            .permit("/oauth/token")
            .permit("/healthz")
            .permit("/readyz");

        if self.swagger_ui {
            policy.permit_prefix("/swagger-ui").permit("/api-docs/openapi.json")
        } else {
            policy
        }
    }

    /// Builds the router. Requests pass the origin guard, then token
    /// authentication, then route authorization, then the handler.
    pub fn router(&self) -> Router {
        let mut router = Router::new()
            // public probes
            .route("/healthz", get(health_check))
            .route("/readyz", get(ready_check))
            .merge(routes::token_routes())
            .nest("/api/v1", routes::api_routes());

        if self.swagger_ui {
            router = router
                .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));
        }

        // layers run outermost first, i.e. bottom to top
        router
            .with_state(AppState::new(self.issuer.clone()))
            .layer(middleware::from_fn_with_state(
                Arc::new(self.access_policy()),
                require_authenticated,
            ))
            .layer(middleware::from_fn_with_state(self.codec.clone(), auth_middleware))
            .layer(middleware::from_fn_with_state(
                self.origin_guard.clone(),
                cors_middleware,
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::CONTENT_SECURITY_POLICY,
                HeaderValue::from_static(CONTENT_SECURITY_POLICY),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::STRICT_TRANSPORT_SECURITY,
                HeaderValue::from_static(STRICT_TRANSPORT_SECURITY),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::X_FRAME_OPTIONS,
                HeaderValue::from_static("DENY"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ))
            .layer(CompressionLayer::new())
            .layer(TraceLayer::new_for_http())
    }
}

/// Starts the HTTP server.
///
/// Validates the token configuration before anything else; a fatal finding
/// aborts startup without binding the listener.
pub async fn run(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting tokengate on {}", config.listen_addr());

    policy::enforce(&config.jwt, &config.profile)?;

    let codec = Arc::new(
        TokenCodec::new(&config.jwt.secret, &config.jwt.issuer, &config.jwt.audience)
            .with_leeway(config.jwt.clock_skew_secs),
    );

    let store = StaticUserStore::load(&config.users_file).await?;
    if store.is_empty() {
        warn!("users file defines no users, every token request will be rejected");
    }

    let issuer = Arc::new(TokenIssuer::new(
        codec.clone(),
        Arc::new(store),
        config.jwt.expiration(),
        config.jwt.scope.clone(),
    ));
    let origin_guard = Arc::new(OriginGuard::new(&config.allowed_origin)?);

    let app = Pipeline {
        codec,
        issuer,
        origin_guard,
        swagger_ui: config.swagger_ui,
    }
    .router();

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!("API endpoints:");
    info!("  - POST /oauth/token");
    info!("  - GET  /api/v1/session");
    info!("  - GET  /healthz");
    if config.swagger_ui {
        info!("  - GET  /swagger-ui");
    }
    info!("CORS allowed origin: {}", config.allowed_origin);
    info!("Security: JWT authentication is active and validated");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Liveness probe
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Readiness probe
async fn ready_check() -> impl IntoResponse {
    (StatusCode::OK, "Ready")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
