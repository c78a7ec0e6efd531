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

//! Startup checks for the token signing configuration.

use snafu::Snafu;
use std::fmt;
use strum::Display;
use tracing::{error, info, warn};

use crate::config::{JwtConfig, Secret};

/// 256 bits.
pub const MIN_SECRET_LENGTH: usize = 32;
/// 5 minutes.
pub const MIN_EXPIRATION_MS: u64 = 300_000;
/// 24 hours.
pub const MAX_EXPIRATION_MS: u64 = 86_400_000;

const MS_PER_SECOND: u64 = 1_000;
const MS_PER_MINUTE: u64 = 60_000;
const MS_PER_HOUR: u64 = 3_600_000;

/// Secret shipped in the development profile. It is version-controlled and
/// therefore public, so it may only ever sign tokens in development.
pub const DEVELOPMENT_PLACEHOLDER_SECRET: &str =
    "YMkBXW7Iicvdg/VIVqcUc7ifNntf1mpl0V0FGUDOlEJ4SVLGPo6fpQ2w9YwjirwleoB/6CbNlgUwvDTgkwPMHw==";

const DEVELOPMENT_KEYWORDS: [&str; 4] = ["dev", "development", "local", "test"];

const GENERATE_HINT: &str = "generate one with: openssl rand -base64 64";

#[derive(Debug, Snafu, PartialEq, Eq)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("JWT secret is not configured; set JWT_SECRET ({GENERATE_HINT})"))]
    EmptySecret,

    #[snafu(display(
        "JWT secret is too short: {length} characters, minimum is {minimum} ({GENERATE_HINT})"
    ))]
    SecretTooShort { length: usize, minimum: usize },

    #[snafu(display(
        "the version-controlled development JWT secret is in use under profile '{profile}'; \
         set JWT_SECRET to a unique secret ({GENERATE_HINT})"
    ))]
    PlaceholderSecretInNonDev { profile: String },

    #[snafu(display(
        "JWT expiration of {expiration_ms} ms is not a whole number of seconds; \
         tokens carry second precision"
    ))]
    FractionalSecondExpiration { expiration_ms: u64 },
}

/// How an environment label is treated by the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum EnvironmentKind {
    #[strum(to_string = "development")]
    Development,
    #[strum(to_string = "production")]
    Production,
    #[strum(to_string = "other")]
    Other,
}

impl EnvironmentKind {
    /// Classifies a profile label by substring, ignoring case. Production
    /// wins over development when a label mentions both.
    pub fn classify(label: &str) -> Self {
        let label = label.to_ascii_lowercase();
        if label.contains("prod") {
            Self::Production
        } else if label.contains("dev") {
            Self::Development
        } else {
            Self::Other
        }
    }
}

/// Non-fatal findings, logged at warn level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    DevelopmentProfileActive,
    SecretLooksLikeDevelopmentValue,
    ExpirationTooShort { expiration_ms: u64 },
    ExpirationTooLong { expiration_ms: u64 },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::DevelopmentProfileActive => {
                write!(f, "development profile is active, do not use it in production")
            }
            Warning::SecretLooksLikeDevelopmentValue => write!(
                f,
                "JWT secret contains development keywords, make sure it is not a development secret"
            ),
            Warning::ExpirationTooShort { expiration_ms } => write!(
                f,
                "JWT expiration time is very short: {} ms ({} minutes)",
                expiration_ms,
                expiration_ms / MS_PER_MINUTE
            ),
            Warning::ExpirationTooLong { expiration_ms } => write!(
                f,
                "JWT expiration time is very long: {} ms ({} hours), consider shorter tokens",
                expiration_ms,
                expiration_ms / MS_PER_HOUR
            ),
        }
    }
}

/// Outcome of a successful validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub environment: EnvironmentKind,
    pub warnings: Vec<Warning>,
}

/// Checks the signing secret and token lifetime.
///
/// Fatal rules are evaluated in order and the first violation is returned.
/// Warnings are collected into the report; logging them is left to the caller.
pub fn validate(secret: &Secret, expiration_ms: u64, profile: &str) -> Result<Report, Error> {
    if secret.is_empty() {
        return EmptySecretSnafu.fail();
    }

    let length = secret.len();
    if length < MIN_SECRET_LENGTH {
        return SecretTooShortSnafu {
            length,
            minimum: MIN_SECRET_LENGTH,
        }
        .fail();
    }

    let environment = EnvironmentKind::classify(profile);
    if secret.expose() == DEVELOPMENT_PLACEHOLDER_SECRET
        && environment != EnvironmentKind::Development
    {
        return PlaceholderSecretInNonDevSnafu { profile }.fail();
    }

    if expiration_ms % MS_PER_SECOND != 0 {
        return FractionalSecondExpirationSnafu { expiration_ms }.fail();
    }

    let mut warnings = Vec::new();
    if environment == EnvironmentKind::Development {
        warnings.push(Warning::DevelopmentProfileActive);
    } else {
        let lowered = secret.expose().to_ascii_lowercase();
        if DEVELOPMENT_KEYWORDS.iter().any(|k| lowered.contains(k)) {
            warnings.push(Warning::SecretLooksLikeDevelopmentValue);
        }
    }

    if expiration_ms < MIN_EXPIRATION_MS {
        warnings.push(Warning::ExpirationTooShort { expiration_ms });
    }
    if expiration_ms > MAX_EXPIRATION_MS {
        warnings.push(Warning::ExpirationTooLong { expiration_ms });
    }

    Ok(Report {
        environment,
        warnings,
    })
}

/// Startup entry point: validates the token configuration and logs the
/// outcome. A returned error must abort startup.
pub fn enforce(jwt: &JwtConfig, profile: &str) -> Result<Report, Error> {
    info!("Validating JWT configuration for profile: {}", profile);

    let report = validate(&jwt.secret, jwt.expiration_ms, profile).inspect_err(|e| {
        error!("CRITICAL SECURITY ERROR: {}", e);
    })?;

    for warning in &report.warnings {
        warn!("{}", warning);
    }

    info!(
        "JWT configuration validated: secret length {} characters, expiration {} ms ({} minutes), issuer '{}', audience '{}', environment {}",
        jwt.secret.len(),
        jwt.expiration_ms,
        jwt.expiration_ms / MS_PER_MINUTE,
        jwt.issuer,
        jwt.audience,
        report.environment
    );

    Ok(report)
}
