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

use chrono::{DateTime, Utc};
use snafu::Snafu;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use strum::{Display, EnumString};
use tracing::{error, info};

use crate::auth::codec::{SignedToken, TokenClaims, TokenCodec};
use crate::auth::credentials::{AuthenticationProvider, CredentialError};

pub const MAX_USERNAME_LENGTH: usize = 255;
pub const MAX_PASSWORD_LENGTH: usize = 100;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("invalid request: {message}"))]
    InvalidRequest { message: String },

    #[snafu(display("grant type not supported: {grant_type}"))]
    UnsupportedGrantType { grant_type: String },

    #[snafu(display("invalid username or password"))]
    InvalidCredentials,

    #[snafu(display("token issuance failed: {message}"))]
    Internal { message: String },
}

/// Credential exchange modes understood by the token endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum GrantType {
    #[strum(serialize = "password")]
    Password,
}

/// A freshly minted access token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: SignedToken,
    pub claims: TokenClaims,
    /// Lifetime in seconds.
    pub expires_in: u64,
    pub scope: String,
}

/// Exchanges a username and password for a signed access token.
pub struct TokenIssuer {
    codec: Arc<TokenCodec>,
    provider: Arc<dyn AuthenticationProvider>,
    expiration: Duration,
    scope: String,
}

impl TokenIssuer {
    pub fn new(
        codec: Arc<TokenCodec>,
        provider: Arc<dyn AuthenticationProvider>,
        expiration: Duration,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            codec,
            provider,
            expiration,
            scope: scope.into(),
        }
    }

    pub async fn issue_token(
        &self,
        username: &str,
        password: &str,
        grant_type: &str,
    ) -> Result<IssuedToken, Error> {
        self.issue_token_at(username, password, grant_type, Utc::now())
            .await
    }

    /// Same as [`TokenIssuer::issue_token`] with an explicit issue time.
    pub async fn issue_token_at(
        &self,
        username: &str,
        password: &str,
        grant_type: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, Error> {
        check_bounds(username, password)?;

        let GrantType::Password = GrantType::from_str(grant_type).map_err(|_| {
            Error::UnsupportedGrantType {
                grant_type: grant_type.to_string(),
            }
        })?;

        let principal = match self.provider.authenticate(username, password).await {
            Ok(principal) => principal,
            Err(CredentialError::BadCredentials) => {
                info!("authentication failed for a token request");
                return InvalidCredentialsSnafu.fail();
            }
            Err(e) => {
                error!("credential check failed for user '{}': {}", username, e);
                return InternalSnafu {
                    message: e.to_string(),
                }
                .fail();
            }
        };

        let expires_in = self.expiration.as_secs();
        let issued_at = now.timestamp();
        let claims = TokenClaims {
            sub: username.to_string(),
            user_name: username.to_string(),
            authorities: principal.authorities,
            name: Some(principal.display_name.unwrap_or_else(|| username.to_string())),
            iss: self.codec.issuer().to_string(),
            aud: self.codec.audience().to_string(),
            iat: issued_at,
            exp: issued_at.saturating_add(i64::try_from(expires_in).unwrap_or(i64::MAX)),
        };

        let token = self.codec.sign(&claims).map_err(|e| {
            error!("failed to sign token for user '{}': {}", username, e);
            Error::Internal {
                message: e.to_string(),
            }
        })?;

        info!("issued access token for user '{}'", username);

        Ok(IssuedToken {
            token,
            claims,
            expires_in,
            scope: self.scope.clone(),
        })
    }
}

fn check_bounds(username: &str, password: &str) -> Result<(), Error> {
    if username.is_empty() {
        return InvalidRequestSnafu {
            message: "username must not be empty",
        }
        .fail();
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return InvalidRequestSnafu {
            message: format!("username exceeds {MAX_USERNAME_LENGTH} characters"),
        }
        .fail();
    }
    if password.chars().count() > MAX_PASSWORD_LENGTH {
        return InvalidRequestSnafu {
            message: format!("password exceeds {MAX_PASSWORD_LENGTH} characters"),
        }
        .fail();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::credentials::{MockAuthenticationProvider, Principal};
    use crate::tests::test_codec;
    use chrono::TimeZone;
    use mockall::predicate::eq;

    const HALF_HOUR: Duration = Duration::from_secs(1800);

    fn issuer_with(provider: MockAuthenticationProvider) -> TokenIssuer {
        TokenIssuer::new(
            Arc::new(test_codec()),
            Arc::new(provider),
            HALF_HOUR,
            "read write",
        )
    }

    /// Knows only bob/pw.
    fn bob_only() -> MockAuthenticationProvider {
        let mut provider = MockAuthenticationProvider::new();
        provider.expect_authenticate().returning(|username, password| {
            if username == "bob" && password == "pw" {
                Ok(Principal {
                    username: "bob".to_string(),
                    display_name: Some("Bob Builder".to_string()),
                    authorities: vec!["ROLE_WRITE".to_string(), "ROLE_READ".to_string()],
                })
            } else {
                Err(CredentialError::BadCredentials)
            }
        });
        provider
    }

    #[tokio::test]
    async fn test_issue_token_builds_claims() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let issuer = issuer_with(bob_only());

        let issued = issuer
            .issue_token_at("bob", "pw", "password", now)
            .await
            .unwrap();

        assert_eq!(issued.expires_in, 1800);
        assert_eq!(issued.scope, "read write");
        assert_eq!(issued.claims.sub, "bob");
        assert_eq!(issued.claims.user_name, "bob");
        assert_eq!(issued.claims.authorities, vec!["ROLE_WRITE", "ROLE_READ"]);
        assert_eq!(issued.claims.display_name(), "Bob Builder");
        assert_eq!(issued.claims.iat, 1_700_000_000);
        assert_eq!(issued.claims.exp - issued.claims.iat, 1800);

        let verified = test_codec().verify(issued.token.as_str(), now).unwrap();
        assert_eq!(verified, issued.claims);
    }

    #[tokio::test]
    async fn test_invalid_credentials_are_indistinguishable() {
        let issuer = issuer_with(bob_only());

        let wrong_password = issuer
            .issue_token("bob", "wrongpass", "password")
            .await
            .unwrap_err();
        let unknown_user = issuer
            .issue_token("nonexistent", "x", "password")
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, Error::InvalidCredentials));
        assert!(matches!(unknown_user, Error::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    #[tokio::test]
    async fn test_unsupported_grant_type_skips_credential_check() {
        let mut provider = MockAuthenticationProvider::new();
        provider.expect_authenticate().never();
        let issuer = issuer_with(provider);

        let err = issuer
            .issue_token("bob", "pw", "refresh_token")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::UnsupportedGrantType { ref grant_type } if grant_type == "refresh_token"
        ));
    }

    #[tokio::test]
    async fn test_display_name_falls_back_to_username() {
        let mut provider = MockAuthenticationProvider::new();
        provider
            .expect_authenticate()
            .with(eq("alice"), eq("secret"))
            .times(1)
            .returning(|_, _| {
                Ok(Principal {
                    username: "alice".to_string(),
                    display_name: None,
                    authorities: Vec::new(),
                })
            });
        let issuer = issuer_with(provider);

        let issued = issuer
            .issue_token("alice", "secret", "password")
            .await
            .unwrap();

        assert_eq!(issued.claims.name.as_deref(), Some("alice"));
        assert!(issued.claims.authorities.is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_is_internal() {
        let mut provider = MockAuthenticationProvider::new();
        provider.expect_authenticate().returning(|_, _| {
            Err(CredentialError::Unavailable {
                message: "connection refused".to_string(),
            })
        });
        let issuer = issuer_with(provider);

        let err = issuer.issue_token("bob", "pw", "password").await.unwrap_err();
        assert!(matches!(err, Error::Internal { .. }));
    }

    #[tokio::test]
    async fn test_oversized_input_is_a_client_error() {
        let mut provider = MockAuthenticationProvider::new();
        provider.expect_authenticate().never();
        let issuer = issuer_with(provider);

        let long_username = "u".repeat(MAX_USERNAME_LENGTH + 1);
        let err = issuer
            .issue_token(&long_username, "pw", "password")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRequest { .. }));

        let long_password = "p".repeat(MAX_PASSWORD_LENGTH + 1);
        let err = issuer
            .issue_token("bob", &long_password, "password")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRequest { .. }));

        let err = issuer.issue_token("", "pw", "password").await.unwrap_err();
        assert!(matches!(err, Error::InvalidRequest { .. }));
    }

    #[test]
    fn test_grant_type_parsing_is_exact() {
        assert_eq!(GrantType::from_str("password").unwrap(), GrantType::Password);
        assert!(GrantType::from_str("Password").is_err());
        assert!(GrantType::from_str("client_credentials").is_err());
    }
}
