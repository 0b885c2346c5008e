// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of pmedit and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! pmedit CLI entrypoint.
//!
//! `pmedit serve` runs the collaboration server at `ws://<bind>/ws`; `new`, `list` and `schema`
//! are offline helpers around the model folder and the wire protocol.

use std::error::Error;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use pmedit::config::{ServerConfig, DEFAULT_MODELS_DIR};
use pmedit::model::{ModelId, ModelType};
use pmedit::session::{Request, SessionRegistry};
use pmedit::store::{ModelFolder, ModelStore};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "pmedit", version, about = "Collaborative process model editor server")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve collaborative sessions over WebSockets.
    Serve(ServeArgs),
    /// Create an empty model in the model folder.
    New {
        id: ModelId,
        #[arg(long = "type", default_value = "petri_net")]
        model_type: ModelType,
        #[arg(long, env = "PMEDIT_MODELS_DIR", default_value = DEFAULT_MODELS_DIR)]
        models_dir: PathBuf,
    },
    /// List stored models.
    List {
        #[arg(long, env = "PMEDIT_MODELS_DIR", default_value = DEFAULT_MODELS_DIR)]
        models_dir: PathBuf,
    },
    /// Print the JSON Schema of inbound protocol requests.
    Schema,
}

#[derive(Debug, Args)]
struct ServeArgs {
    #[arg(long, env = "PMEDIT_BIND", default_value = "127.0.0.1:8001")]
    bind: SocketAddr,
    #[arg(long, env = "PMEDIT_MODELS_DIR", default_value = DEFAULT_MODELS_DIR)]
    models_dir: PathBuf,
    /// Opt into slower, best-effort durable persistence (fsync where supported).
    #[arg(long, env = "PMEDIT_DURABLE_WRITES")]
    durable_writes: bool,
    #[arg(long, env = "PMEDIT_COLLABORATOR_GRACE_MS", default_value_t = 2_000)]
    collaborator_grace_ms: u64,
    #[arg(long, env = "PMEDIT_SPECTATOR_GRACE_MS", default_value_t = 60_000)]
    spectator_grace_ms: u64,
    #[arg(long, env = "PMEDIT_MAX_MESSAGE_BYTES", default_value_t = 1024 * 1024)]
    max_message_bytes: usize,
}

impl ServeArgs {
    fn into_config(self) -> ServerConfig {
        ServerConfig::default()
            .bind(self.bind)
            .models_dir(self.models_dir)
            .durable_writes(self.durable_writes)
            .collaborator_grace(Duration::from_millis(self.collaborator_grace_ms))
            .spectator_grace(Duration::from_millis(self.spectator_grace_ms))
            .max_message_bytes(self.max_message_bytes)
    }
}

fn serve(config: ServerConfig) -> Result<(), Box<dyn Error>> {
    config.validate()?;
    let store: Arc<dyn ModelStore> = Arc::new(config.model_folder());
    let registry = SessionRegistry::new(store, config.session_settings());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(config.bind).await?;
        info!(models_dir = ?config.models_dir, durable = config.durable_writes, "serving models");
        pmedit::server::serve(listener, registry, async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;
        Ok::<(), Box<dyn Error>>(())
    })
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    match cli.command {
        Command::Serve(args) => serve(args.into_config()),
        Command::New {
            id,
            model_type,
            models_dir,
        } => {
            let folder = ModelFolder::new(models_dir);
            let model = folder.create(id, model_type)?;
            println!("{}", folder.model_path(model.id()).display());
            Ok(())
        }
        Command::List { models_dir } => {
            for stored in ModelFolder::new(models_dir).list()? {
                println!("{}\t{}", stored.id, stored.model_type);
            }
            Ok(())
        }
        Command::Schema => {
            let schema = schemars::schema_for!(Request);
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(())
        }
    }
}

fn main() {
    pmedit::telemetry::init();
    if let Err(err) = run(Cli::parse()) {
        eprintln!("pmedit: {err}");
        std::process::exit(1);
    }
}
