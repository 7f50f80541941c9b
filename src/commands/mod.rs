//! CLI command implementations.
//!
//! Read commands (`list`, `matrix`, `summary`, `stats`, `export`) run one
//! refresh of a [`RiskPipeline`](crate::reconcile::RiskPipeline) over the JSON
//! file store and render the derived view. Mutating commands (`add`,
//! `update`, `delete`) go through the store so payloads are normalized and
//! validated exactly as they would be for any other client.

pub mod init;
pub mod mutate;
pub mod view;

use crate::cli::{Cli, Commands};
use crate::config::{load_config, load_config_from, RiskmapConfig};
use crate::store::JsonFileStore;
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

/// Resolved configuration plus the store every command works against.
pub struct CommandContext {
    pub config: RiskmapConfig,
    pub organization_id: String,
    pub store: Arc<JsonFileStore>,
}

impl CommandContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let config = match &cli.config {
            Some(path) => load_config_from(path)?,
            None => load_config(),
        };
        let store_path: PathBuf = cli
            .store
            .clone()
            .unwrap_or_else(|| config.store.path.clone());
        let organization_id = cli
            .organization
            .clone()
            .unwrap_or_else(|| config.store.organization_id.clone());
        log::debug!(
            "Using store {} for organization '{}'",
            store_path.display(),
            organization_id
        );
        Ok(Self {
            store: Arc::new(JsonFileStore::new(store_path)),
            organization_id,
            config,
        })
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    if let Commands::Init { force } = &cli.command {
        return init::init_config(&std::env::current_dir()?, *force);
    }

    let context = CommandContext::from_cli(&cli)?;
    match cli.command {
        Commands::List {
            filter,
            order,
            format,
        } => view::list(&context, &filter, &order, format.into()).await,
        Commands::Matrix { filter, format } => {
            view::matrix(&context, &filter, format.into()).await
        }
        Commands::Summary {
            filter,
            top,
            format,
        } => view::summary(&context, &filter, top, format.into()).await,
        Commands::Stats { filter, format } => view::stats(&context, &filter, format.into()).await,
        Commands::Export {
            filter,
            order,
            output,
        } => view::export(&context, &filter, &order, output.as_deref()).await,
        Commands::Add { title, id, fields } => {
            mutate::add(&context, fields.into_raw(id, Some(title))).await
        }
        Commands::Update { id, title, fields } => {
            mutate::update(&context, &id, fields.into_raw(None, title)).await
        }
        Commands::Delete { id } => mutate::delete(&context, &id).await,
        Commands::Init { .. } => Ok(()),
    }
}
