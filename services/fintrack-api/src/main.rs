//! FinTrack API
//!
//! Registration, login and token rotation over sealed request envelopes.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use fintrack_api::{router, AppState, Config, Storage};
use fintrack_auth_core::{PrivateKey, SystemClock};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting FinTrack API");

    let config = Config::from_env()?;

    let key = PrivateKey::from_pem_file(&config.private_key_path).with_context(|| {
        format!(
            "loading envelope private key from {}",
            config.private_key_path.display()
        )
    })?;

    let clock = Arc::new(SystemClock);
    let http_port = config.http_port;

    let state = match (config.storage, config.database_url.clone()) {
        (Storage::Postgres, Some(url)) => {
            let pool = fintrack_db::create_pool(&url)
                .await
                .context("connecting to database")?;
            fintrack_db::run_migrations(&pool)
                .await
                .context("applying database schema")?;
            tracing::info!("Using PostgreSQL storage");
            AppState::postgres(config, key, pool, clock)?
        }
        (Storage::Postgres, None) => anyhow::bail!("DATABASE_URL is required for postgres storage"),
        (Storage::Memory, _) => {
            tracing::warn!("Using in-memory storage; sessions are lost on restart");
            AppState::in_memory(config, key, clock)?
        }
    };

    let app = router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], http_port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
