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

use std::pin::Pin;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;

use crate::api::openapi::ApiDoc;
use crate::auth::{policy, user_store};
use crate::config::PolicyConfig;

pub mod api;
pub mod auth;
pub mod config;


pub use crate::api::server::run;

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_level(true)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Writes the OpenAPI document as YAML to `file`, or stdout when unset.
pub async fn openapi(file: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let mut writer: Pin<Box<dyn AsyncWrite + Send>> = if let Some(file) = file {
        Box::pin(
            tokio::fs::OpenOptions::new()
                .create(true)
                .truncate(true)
                .write(true)
                .open(file)
                .await?,
        )
    } else {
        Box::pin(tokio::io::stdout())
    };

    writer
        .write_all(serde_yaml_ng::to_string(&ApiDoc::openapi())?.as_bytes())
        .await?;
    writer.flush().await?;

    Ok(())
}

/// Runs the secret policy without starting the server.
pub fn check_config(config: &PolicyConfig) -> Result<(), Box<dyn std::error::Error>> {
    let report = policy::enforce(&config.jwt, &config.profile)?;
    info!(
        "configuration accepted for {} environment with {} warning(s)",
        report.environment,
        report.warnings.len()
    );
    Ok(())
}

/// Reads one password line from stdin and prints its Argon2 hash, ready to
/// paste into the users file.
pub async fn hash_password() -> Result<(), Box<dyn std::error::Error>> {
    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err("no password given on stdin".into());
    }

    let phc = user_store::hash_password(password)?;

    let mut stdout = tokio::io::stdout();
    stdout.write_all(phc.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await?;

    Ok(())
}
