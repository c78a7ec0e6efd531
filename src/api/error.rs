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
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use snafu::Snafu;

use crate::api::models::token::OAuthErrorBody;
use crate::auth::issuer;

/// Fixed wire message for rejected credentials.
pub const INVALID_CREDENTIALS_DESCRIPTION: &str = "Bad credentials";
const SERVER_ERROR_DESCRIPTION: &str = "An internal error occurred while processing the request";
const UNAUTHORIZED_DESCRIPTION: &str = "Full authentication is required to access this resource";

/// Errors rendered to HTTP callers.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("Unauthorized"))]
    Unauthorized,

    #[snafu(display("Bad request: {}", message))]
    BadRequest { message: String },

    #[snafu(transparent)]
    Issue { source: issuer::Error },
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error, description) = match self {
            Error::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                UNAUTHORIZED_DESCRIPTION.to_string(),
            ),
            Error::BadRequest { message } => {
                (StatusCode::BAD_REQUEST, "invalid_request", message)
            }
            Error::Issue { source } => match source {
                issuer::Error::InvalidRequest { message } => {
                    (StatusCode::BAD_REQUEST, "invalid_request", message)
                }
                issuer::Error::UnsupportedGrantType { grant_type } => (
                    StatusCode::BAD_REQUEST,
                    "unsupported_grant_type",
                    format!("Grant type not supported: {grant_type}"),
                ),
                issuer::Error::InvalidCredentials => (
                    StatusCode::BAD_REQUEST,
                    "invalid_grant",
                    INVALID_CREDENTIALS_DESCRIPTION.to_string(),
                ),
                // detail was logged where it happened
                issuer::Error::Internal { .. } => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "server_error",
                    SERVER_ERROR_DESCRIPTION.to_string(),
                ),
            },
        };

        let body = Json(OAuthErrorBody {
            error: error.to_string(),
            error_description: description,
        });

        let mut response = (status, body).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

/// Result type for API handlers
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(response: Response) -> OAuthErrorBody {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_internal_error_detail_is_hidden() {
        let err = Error::from(issuer::Error::Internal {
            message: "connection refused by 10.0.0.3".to_string(),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_of(response).await;
        assert_eq!(body.error, "server_error");
        assert!(!body.error_description.contains("10.0.0.3"));
    }

    #[tokio::test]
    async fn test_invalid_credentials_maps_to_invalid_grant() {
        let response = Error::from(issuer::Error::InvalidCredentials).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_of(response).await;
        assert_eq!(body.error, "invalid_grant");
        assert_eq!(body.error_description, INVALID_CREDENTIALS_DESCRIPTION);
    }

    #[tokio::test]
    async fn test_unauthorized_has_challenge() {
        let response = Error::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
    }
}
