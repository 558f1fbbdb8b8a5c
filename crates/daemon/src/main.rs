//! Notebook interpreter server - Main Entry Point

mod bootstrap;
mod settings;

use anyhow::{anyhow, Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use notebook_api_rpc::RpcServer;
use notebook_core::application::{HandlerRegistry, InterpreterService, RequestClassifier};
use notebook_core::port::context_repository::memory::InMemoryStore;
use notebook_core::port::{ConfigSource, ContextRepository, SessionRepository};
use notebook_infra_sqlite::{create_pool, run_migrations, SqliteStore};
use notebook_infra_system::SubprocessRunner;
use settings::{ServerConfig, Storage};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const LOG_FORMAT_ENV: &str = "NOTEBOOK_LOG_FORMAT";
const DEFAULT_LOG_FILTER: &str = "notebook=info";

type Stores = (Arc<dyn ContextRepository>, Arc<dyn SessionRepository>);

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize logging
    init_tracing()?;
    info!("Notebook interpreter server v{} starting...", VERSION);

    // 2. Load configuration
    let config = ServerConfig::load()?;

    // 3. Open storage
    let (contexts, sessions) = open_storage(&config.storage).await?;

    // 4. Seed interpreter contexts
    let created = bootstrap::seed_contexts(contexts.as_ref(), &config.contexts())
        .await
        .context("Context bootstrap failed")?;
    info!(created, "Interpreter contexts ready");
    if let Some(id) = config.default_session {
        bootstrap::seed_session(sessions.as_ref(), &config.default_context.name, id)
            .await
            .context("Session bootstrap failed")?;
    }

    // 5. Setup dependencies (DI wiring)
    let properties: Arc<dyn ConfigSource> = Arc::new(config.properties.clone());
    let classifier = RequestClassifier::from_config(properties.as_ref());
    let registry = Arc::new(HandlerRegistry::with_builtin_handlers(
        Arc::new(SubprocessRunner::default()),
        properties,
    ));
    let service = Arc::new(InterpreterService::new(
        contexts, sessions, registry, classifier,
    ));

    // 6. Start JSON-RPC server
    let (addr, rpc_handle) = RpcServer::new(config.rpc.clone(), service)
        .start()
        .await
        .map_err(|e| anyhow!("RPC server start failed: {}", e))?;

    info!(addr = %addr, "System ready. Press Ctrl+C to shutdown");

    // 7. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Exiting gracefully...");

    rpc_handle
        .stop()
        .map_err(|e| anyhow!("RPC server stop failed: {}", e))?;
    rpc_handle.stopped().await;

    info!("Shutdown complete.");
    Ok(())
}

/// Pretty output for development, JSON with `NOTEBOOK_LOG_FORMAT=json`
fn init_tracing() -> Result<()> {
    let log_format = std::env::var(LOG_FORMAT_ENV).unwrap_or_else(|_| "pretty".to_string());
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))
        .context("Failed to create env filter")?;

    match log_format.as_str() {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json())
            .init(),
        _ => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty())
            .init(),
    }
    Ok(())
}

async fn open_storage(storage: &Storage) -> Result<Stores> {
    match storage {
        Storage::Memory => {
            info!("Using in-memory storage, sessions are lost on shutdown");
            let store = Arc::new(InMemoryStore::new());
            Ok((store.clone(), store))
        }
        Storage::Sqlite { url, path } => {
            if let Some(parent) = path.as_ref().and_then(|p| p.parent()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            info!(url = %url, "Initializing database...");
            let pool = create_pool(url).await.context("DB pool creation failed")?;
            run_migrations(&pool).await.context("Migration failed")?;
            let store = Arc::new(SqliteStore::new(pool));
            Ok((store.clone(), store))
        }
    }
}
