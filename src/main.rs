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

use clap::{Parser, Subcommand};
use shadow_rs::shadow;
use tokengate::config::{PolicyConfig, ServerConfig};

shadow!(build);

#[derive(Parser)]
#[command(name = "tokengate")]
#[command(version = build::PKG_VERSION)]
#[command(about = "Password-grant token issuer with bearer authentication", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Output the OpenAPI document in YAML
    Openapi {
        /// Optional output path. If not set, the output will be written to stdout.
        #[arg(short, long)]
        file: Option<String>,
    },

    /// Validate the token configuration and exit
    CheckConfig(PolicyConfig),

    /// Hash a password read from stdin for the users file
    HashPassword,

    /// Run the HTTP server
    Server(ServerConfig),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Openapi { file } => tokengate::openapi(file).await?,
        Commands::CheckConfig(config) => {
            tokengate::init_tracing();
            tokengate::check_config(&config)?;
        }
        Commands::HashPassword => tokengate::hash_password().await?,
        Commands::Server(config) => {
            tokengate::init_tracing();
            tokengate::run(config).await?;
        }
    }

    Ok(())
}
