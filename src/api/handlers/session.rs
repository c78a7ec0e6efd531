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

use axum::{Extension, Json};

use crate::api::models::session::SessionResponse;
use crate::auth::AuthenticatedIdentity;

/// Echoes the authenticated identity.
#[utoipa::path(
    get,
    path = "/api/v1/session",
    tag = "session",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Identity of the caller", body = SessionResponse),
        (status = 401, description = "No valid bearer token"),
    )
)]
pub async fn session(Extension(identity): Extension<AuthenticatedIdentity>) -> Json<SessionResponse> {
    Json(SessionResponse {
        username: identity.username,
        authorities: identity.authorities.into_iter().collect(),
    })
}
