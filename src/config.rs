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

use clap::Args;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Token signing secret.
///
/// The value never shows up in `Debug` output, so the config struct can be
/// logged as a whole.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Length in characters, which is what the secret policy measures.
    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Token signing and lifetime settings.
#[derive(Debug, Clone, Args)]
pub struct JwtConfig {
    /// HMAC-SHA256 signing secret, at least 32 characters
    #[arg(long = "jwt-secret", env = "JWT_SECRET", hide_env_values = true)]
    pub secret: Secret,

    /// Access token lifetime in milliseconds, in whole seconds
    #[arg(
        long = "jwt-expiration-ms",
        env = "JWT_EXPIRATION_MS",
        default_value_t = 1_800_000,
        value_parser = clap::value_parser!(u64).range(1000..)
    )]
    pub expiration_ms: u64,

    /// Value of the `iss` claim, checked on every request
    #[arg(long = "jwt-issuer", env = "JWT_ISSUER", default_value = "tokengate")]
    pub issuer: String,

    /// Value of the `aud` claim, checked on every request
    #[arg(long = "jwt-audience", env = "JWT_AUDIENCE", default_value = "tokengate-api")]
    pub audience: String,

    /// Tolerated clock skew when checking token expiry, in seconds
    #[arg(long = "jwt-clock-skew-secs", env = "JWT_CLOCK_SKEW_SECS", default_value_t = 0)]
    pub clock_skew_secs: u64,

    /// Scope reported in token responses
    #[arg(long = "token-scope", env = "TOKEN_SCOPE", default_value = "read write")]
    pub scope: String,
}

impl JwtConfig {
    pub fn expiration(&self) -> Duration {
        Duration::from_millis(self.expiration_ms)
    }
}

/// Everything the `server` command needs, read once at startup.
#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to
    #[arg(long = "bind", env = "BIND_ADDRESS", default_value = "0.0.0.0")]
    pub bind: IpAddr,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Active environment label, e.g. `dev`, `staging` or `prod`
    #[arg(long = "profile", env = "APP_PROFILE", default_value = "default")]
    pub profile: String,

    /// The single origin allowed to make cross-origin requests
    #[arg(
        long = "allowed-origin",
        env = "CORS_ALLOWED_ORIGIN",
        default_value = "http://localhost:8000"
    )]
    pub allowed_origin: String,

    /// YAML file holding the users that may request tokens
    #[arg(long = "users-file", env = "USERS_FILE")]
    pub users_file: PathBuf,

    /// Serve Swagger UI and the OpenAPI document
    #[arg(long = "swagger-ui", env = "SWAGGER_UI")]
    pub swagger_ui: bool,

    #[command(flatten)]
    pub jwt: JwtConfig,
}

impl ServerConfig {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

/// Subset of the configuration checked by `check-config`.
#[derive(Debug, Clone, Args)]
pub struct PolicyConfig {
    #[arg(long = "profile", env = "APP_PROFILE", default_value = "default")]
    pub profile: String,

    #[command(flatten)]
    pub jwt: JwtConfig,
}
