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

//! File backed credential store.
//!
//! ```yaml
//! users:
//!   - username: admin@example.com
//!     name: Administrator
//!     password_hash: "$argon2id$v=19$m=19456,t=2,p=1$..."
//!     authorities: [ROLE_SEARCH_ENTRY, ROLE_CREATE_ENTRY]
//! ```

use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use async_trait::async_trait;
use password_hash::{PasswordHash, SaltString};
use serde::Deserialize;
use snafu::{ResultExt, Snafu};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::auth::credentials::{AuthenticationProvider, CredentialError, Principal};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("failed to read users file '{}': {}", path.display(), source))]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("failed to parse users file: {}", source))]
    Parse { source: serde_yaml_ng::Error },

    #[snafu(display("user '{}' is defined more than once", username))]
    DuplicateUser { username: String },

    #[snafu(display("user '{}' has an invalid password hash: {}", username, message))]
    InvalidHash { username: String, message: String },

    #[snafu(display("failed to hash password: {}", message))]
    Hash { message: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Argon2 PHC string.
    pub password_hash: String,
    #[serde(default)]
    pub authorities: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct UsersFile {
    #[serde(default)]
    users: Vec<UserRecord>,
}

/// Hashes a password into an Argon2 PHC string with a random salt.
pub fn hash_password(password: &str) -> Result<String, Error> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| Error::Hash {
        message: e.to_string(),
    })?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| Error::Hash {
        message: e.to_string(),
    })?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|phc| phc.to_string())
        .map_err(|e| Error::Hash {
            message: e.to_string(),
        })
}

fn verify_password(phc: &str, password: &str) -> Result<bool, password_hash::Error> {
    let parsed = PasswordHash::new(phc)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Users loaded once at startup, keyed by username.
#[derive(Debug, Clone)]
pub struct StaticUserStore {
    users: Arc<HashMap<String, UserRecord>>,
    /// Checked for unknown usernames so they cost as much as a wrong password.
    decoy_hash: Arc<str>,
}

impl StaticUserStore {
    pub fn from_records(records: Vec<UserRecord>) -> Result<Self, Error> {
        let mut users = HashMap::with_capacity(records.len());
        for record in records {
            PasswordHash::new(&record.password_hash).map_err(|e| Error::InvalidHash {
                username: record.username.clone(),
                message: e.to_string(),
            })?;

            if users.contains_key(&record.username) {
                return DuplicateUserSnafu {
                    username: record.username,
                }
                .fail();
            }
            users.insert(record.username.clone(), record);
        }

        let mut decoy = [0u8; 16];
        getrandom::getrandom(&mut decoy).map_err(|e| Error::Hash {
            message: e.to_string(),
        })?;
        let decoy_hash = hash_password(&String::from_utf8_lossy(&decoy))?;

        Ok(Self {
            users: Arc::new(users),
            decoy_hash: decoy_hash.into(),
        })
    }

    pub fn from_yaml(contents: &str) -> Result<Self, Error> {
        let file: UsersFile = serde_yaml_ng::from_str(contents).context(ParseSnafu)?;
        Self::from_records(file.users)
    }

    pub async fn load(path: &Path) -> Result<Self, Error> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .context(ReadFileSnafu { path })?;
        let store = Self::from_yaml(&contents)?;
        info!("loaded {} users from {}", store.len(), path.display());
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl AuthenticationProvider for StaticUserStore {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Principal, CredentialError> {
        let record = self.users.get(username).cloned();
        let phc = match &record {
            Some(record) => record.password_hash.clone(),
            None => self.decoy_hash.to_string(),
        };
        let password = password.to_string();

        // keep argon2 off the async workers
        let verified = tokio::task::spawn_blocking(move || verify_password(&phc, &password))
            .await
            .map_err(|e| CredentialError::Unavailable {
                message: format!("password verification task failed: {e}"),
            })?
            .map_err(|e| CredentialError::Unavailable {
                message: format!("password hash could not be checked: {e}"),
            })?;

        match record {
            Some(record) if verified => Ok(Principal {
                username: record.username,
                display_name: record.name,
                authorities: record.authorities,
            }),
            _ => Err(CredentialError::BadCredentials),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn record(username: &str, password: &str, authorities: &[&str]) -> UserRecord {
        UserRecord {
            username: username.to_string(),
            name: Some(format!("{username} example")),
            password_hash: hash_password(password).unwrap(),
            authorities: authorities.iter().map(|a| a.to_string()).collect(),
        }
    }

    #[test]
    fn test_hash_password_produces_verifiable_phc() {
        let phc = hash_password("s3cret").unwrap();
        assert!(phc.starts_with("$argon2"));
        assert!(verify_password(&phc, "s3cret").unwrap());
        assert!(!verify_password(&phc, "other").unwrap());
    }

    #[tokio::test]
    async fn test_authenticate_returns_principal() {
        let store =
            StaticUserStore::from_records(vec![record("bob", "pw", &["ROLE_B", "ROLE_A"])])
                .unwrap();

        let principal = store.authenticate("bob", "pw").await.unwrap();
        assert_eq!(principal.username, "bob");
        assert_eq!(principal.display_name.as_deref(), Some("bob example"));
        assert_eq!(principal.authorities, vec!["ROLE_B", "ROLE_A"]);
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user_look_the_same() {
        let store = StaticUserStore::from_records(vec![record("bob", "pw", &[])]).unwrap();

        let wrong = store.authenticate("bob", "wrongpass").await.unwrap_err();
        let unknown = store.authenticate("nonexistent", "x").await.unwrap_err();

        assert!(matches!(wrong, CredentialError::BadCredentials));
        assert!(matches!(unknown, CredentialError::BadCredentials));
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[test]
    fn test_duplicate_users_are_rejected() {
        let err = StaticUserStore::from_records(vec![record("bob", "a", &[]), record("bob", "b", &[])])
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateUser { ref username } if username == "bob"));
    }

    #[test]
    fn test_invalid_hash_is_rejected() {
        let err = StaticUserStore::from_records(vec![UserRecord {
            username: "bob".to_string(),
            name: None,
            password_hash: "plaintext".to_string(),
            authorities: Vec::new(),
        }])
        .unwrap_err();
        assert!(matches!(err, Error::InvalidHash { .. }));
    }

    #[tokio::test]
    async fn test_load_from_yaml_file() {
        let phc = hash_password("pw").unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "users:\n  - username: maria\n    password_hash: \"{phc}\"\n    authorities: [ROLE_SEARCH]\n"
        )
        .unwrap();

        let store = StaticUserStore::load(file.path()).await.unwrap();
        assert_eq!(store.len(), 1);

        let principal = store.authenticate("maria", "pw").await.unwrap();
        assert_eq!(principal.display_name, None);
        assert_eq!(principal.authorities, vec!["ROLE_SEARCH"]);
    }

    #[tokio::test]
    async fn test_load_missing_file_fails() {
        let err = StaticUserStore::load(Path::new("/nonexistent/users.yaml"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ReadFile { .. }));
    }
}
