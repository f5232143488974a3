use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use pdash_api::{
    auth::sweeper::spawn_session_sweeper,
    config::{LogFormat, PdashApiConfig},
    context::ApiContext,
    launcher::LocalPhoenixd,
    server,
};
use pdash_db::storage::{Storage, memory::MemoryStorage, mongodb::MongoDBStorage};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or("pdash_api=info,pdash_common=info,pdash_db=info".into());
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn open_storage(config: &PdashApiConfig) -> anyhow::Result<Arc<dyn Storage>> {
    match config.database_uri {
        Some(ref uri) => {
            let storage = MongoDBStorage::new(uri)
                .await
                .context("Failed to connect to MongoDB")?;
            storage.ping().await.context("MongoDB is not answering")?;
            info!("Using MongoDB storage");
            Ok(Arc::new(storage))
        }
        None => {
            warn!("No database configured; sessions and settings are kept in memory");
            Ok(Arc::new(MemoryStorage::new()))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = PdashApiConfig::parse();

    if !config.dump_openapi {
        init_tracing(config.log_format);
    }

    let launcher = match (&config.phoenixd_binary, &config.phoenixd_data_dir) {
        (Some(binary), Some(data_dir)) if !config.dump_openapi => {
            Some(Arc::new(LocalPhoenixd::spawn(binary, data_dir)?))
        }
        _ => None,
    };

    let db: Arc<dyn Storage> = if config.dump_openapi {
        Arc::new(MemoryStorage::new())
    } else {
        open_storage(&config).await?
    };

    let ctx = ApiContext::new(config.clone(), Arc::clone(&db), launcher.clone()).await?;
    let (router, api) = server::make(ctx.clone())?;

    if config.dump_openapi {
        print!("{}", api.to_pretty_json()?);
        return Ok(());
    }

    ctx.phoenixd.start().await;

    let cancel = CancellationToken::new();
    let sweeper = spawn_session_sweeper(db, config.session_sweep_interval(), cancel.clone());

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    info!("Listening on http://{}", config.bind_addr);

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutting down");
        })
        .await;

    cancel.cancel();
    let _ = sweeper.await;
    ctx.phoenixd.stop().await;
    if let Some(launcher) = launcher {
        launcher.stop().await;
    }

    served.context("Server error")
}
