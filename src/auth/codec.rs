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
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use snafu::Snafu;
use std::fmt;

use crate::config::Secret;

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Payload of an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Username of the token owner.
    pub sub: String,
    /// Same as `sub`; kept for clients that read the password-grant payload shape.
    #[serde(default)]
    pub user_name: String,
    /// Granted roles and permissions, in the order the credential store returned them.
    #[serde(default)]
    pub authorities: Vec<String>,
    /// Human readable name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub iss: String,
    pub aud: String,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Expires at (unix seconds).
    pub exp: i64,
}

impl TokenClaims {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.sub)
    }
}

/// A signed compact token, handed out as-is to clients.
#[derive(Clone, PartialEq, Eq)]
pub struct SignedToken(String);

impl SignedToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for SignedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SignedToken(***)")
    }
}

#[derive(Debug, Snafu)]
#[snafu(display("failed to sign token: {source}"))]
pub struct SigningError {
    source: jsonwebtoken::errors::Error,
}

/// Why a token was rejected. Only meant for logs.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum Rejection {
    #[snafu(display("malformed token: {message}"))]
    Malformed { message: String },

    #[snafu(display("signature mismatch"))]
    BadSignature,

    #[snafu(display("issuer mismatch"))]
    IssuerMismatch,

    #[snafu(display("audience mismatch"))]
    AudienceMismatch,

    #[snafu(display("missing required claim '{claim}'"))]
    MissingClaim { claim: String },

    #[snafu(display("token expired at {expired_at}"))]
    Expired { expired_at: i64 },

    #[snafu(display("unexpected verification failure: {message}"))]
    Internal { message: String },
}

impl Rejection {
    /// True when the failure is not the token's fault.
    pub fn is_internal(&self) -> bool {
        matches!(self, Rejection::Internal { .. })
    }
}

impl From<jsonwebtoken::errors::Error> for Rejection {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => Rejection::BadSignature,
            ErrorKind::InvalidIssuer => Rejection::IssuerMismatch,
            ErrorKind::InvalidAudience => Rejection::AudienceMismatch,
            ErrorKind::MissingRequiredClaim(claim) => Rejection::MissingClaim {
                claim: claim.clone(),
            },
            ErrorKind::InvalidToken
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => Rejection::Malformed {
                message: err.to_string(),
            },
            _ => Rejection::Internal {
                message: err.to_string(),
            },
        }
    }
}

/// Returned for every rejected token. Its message is the same whatever the
/// cause; the cause itself is available through [`VerificationError::reason`].
#[derive(Debug, Snafu)]
#[snafu(display("invalid or expired token"))]
pub struct VerificationError {
    reason: Rejection,
}

impl VerificationError {
    pub fn reason(&self) -> &Rejection {
        &self.reason
    }
}

impl From<Rejection> for VerificationError {
    fn from(reason: Rejection) -> Self {
        Self { reason }
    }
}

/// Signs and verifies HS256 access tokens.
///
/// Keys and validation rules are built once in [`TokenCodec::new`] and shared
/// read-only by all requests.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
    leeway_secs: i64,
}

impl TokenCodec {
    pub fn new(secret: &Secret, issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        let issuer = issuer.into();
        let audience = audience.into();

        let mut validation = Validation::new(ALGORITHM);
        validation.set_issuer(&[issuer.as_str()]);
        validation.set_audience(&[audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        // expiry is compared against the caller supplied clock in `verify`
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            issuer,
            audience,
            leeway_secs: 0,
        }
    }

    /// Accept tokens up to `secs` seconds past their expiry.
    pub fn with_leeway(mut self, secs: u64) -> Self {
        self.leeway_secs = i64::try_from(secs).unwrap_or(i64::MAX);
        self
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn sign(&self, claims: &TokenClaims) -> Result<SignedToken, SigningError> {
        encode(&Header::new(ALGORITHM), claims, &self.encoding_key)
            .map(SignedToken)
            .map_err(|source| SigningError { source })
    }

    /// Verifies signature, issuer, audience and expiry against `now`.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, VerificationError> {
        let claims = decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(Rejection::from)?
            .claims;

        if claims.sub.is_empty() {
            return Err(Rejection::MissingClaim {
                claim: "sub".to_string(),
            }
            .into());
        }

        if now.timestamp() > claims.exp.saturating_add(self.leeway_secs) {
            return Err(Rejection::Expired {
                expired_at: claims.exp,
            }
            .into());
        }

        Ok(claims)
    }
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("leeway_secs", &self.leeway_secs)
            .finish_non_exhaustive()
    }
}
