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
    Form, Json,
    extract::{State, rejection::FormRejection},
};
use tracing::debug;

use crate::api::{
    error::{Error, Result},
    models::token::{OAuthErrorBody, TokenRequest, TokenResponse},
    state::AppState,
};

const TOKEN_TYPE: &str = "bearer";

/// Password grant token endpoint
///
/// Exchanges a username and password for a signed access token.
#[utoipa::path(
    post,
    path = "/oauth/token",
    tag = "token",
    request_body(content = TokenRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Invalid request, grant type or credentials", body = OAuthErrorBody),
        (status = 500, description = "Unexpected failure", body = OAuthErrorBody),
    )
)]
pub async fn issue_token(
    State(state): State<AppState>,
    form: std::result::Result<Form<TokenRequest>, FormRejection>,
) -> Result<Json<TokenResponse>> {
    let Form(req) = form.map_err(|rejection| {
        debug!("unreadable token request: {}", rejection.body_text());
        Error::BadRequest {
            message: "request body must be a form with username, password and grant_type"
                .to_string(),
        }
    })?;

    let username = required(req.username, "username")?;
    let password = required(req.password, "password")?;
    let grant_type = required(req.grant_type, "grant_type")?;

    let issued = state
        .issuer
        .issue_token(&username, &password, &grant_type)
        .await?;

    Ok(Json(TokenResponse {
        access_token: issued.token.into_inner(),
        token_type: TOKEN_TYPE.to_string(),
        expires_in: issued.expires_in,
        scope: issued.scope,
    }))
}

fn required(value: Option<String>, name: &str) -> Result<String> {
    value.ok_or_else(|| Error::BadRequest {
        message: format!("missing required parameter '{name}'"),
    })
}
