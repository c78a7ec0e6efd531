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

pub mod codec;
pub mod credentials;
pub mod issuer;
pub mod origin;
pub mod policy;
pub mod user_store;

use std::collections::BTreeSet;

use crate::auth::codec::TokenClaims;

/// The caller behind a verified bearer token. Lives in the request
/// extensions for the duration of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedIdentity {
    pub username: String,
    pub authorities: BTreeSet<String>,
}

impl From<TokenClaims> for AuthenticatedIdentity {
    fn from(claims: TokenClaims) -> Self {
        Self {
            username: claims.sub,
            authorities: claims.authorities.into_iter().collect(),
        }
    }
}
