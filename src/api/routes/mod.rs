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
    routing::{get, post},
};

use crate::api::{handlers, state::AppState};

/// Token issuance route
pub fn token_routes() -> Router<AppState> {
    Router::new().route("/oauth/token", post(handlers::token::issue_token))
}

/// Routes nested under `/api/v1`
pub fn api_routes() -> Router<AppState> {
    Router::new().route("/session", get(handlers::session::session))
}
