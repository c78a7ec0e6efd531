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

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use snafu::Snafu;

/// A user whose credentials have been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
    pub display_name: Option<String>,
    /// Roles and permissions, in store order.
    pub authorities: Vec<String>,
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CredentialError {
    /// Unknown user or wrong password; the two are never told apart.
    #[snafu(display("bad credentials"))]
    BadCredentials,

    #[snafu(display("credential store unavailable: {message}"))]
    Unavailable { message: String },
}

/// Checks a username/password pair against a credential store.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AuthenticationProvider: Send + Sync {
    async fn authenticate(&self, username: &str, password: &str)
    -> Result<Principal, CredentialError>;
}
