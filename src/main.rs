use anyhow::{Context, Result};
use axum::Router;
use std::{io::ErrorKind, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod config;
mod errors;
mod handlers;
mod models;
mod routes;
mod services;

use services::{
    gateway_service::GatewayService, s3_store::S3ObjectStore, staging::StagingArea,
};

#[tokio::main]
async fn main() -> Result<()> {
    // --- .env (optional) ---
    let dotenv = dotenvy::dotenv();

    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Ok(path) = dotenv {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    // --- Parse config ---
    let cfg = config::AppConfig::from_env_and_args()?;

    tracing::info!("Starting bucket-gateway with config: {:?}", cfg);

    // --- Ensure staging directory exists ---
    let staging = StagingArea::new(&cfg.staging_dir);
    staging.ensure_exists().await.with_context(|| {
        format!(
            "creating staging directory {}",
            cfg.staging_dir.display()
        )
    })?;
    tracing::info!("Staging uploads in {}", cfg.staging_dir.display());

    // --- Initialize core service ---
    let store = S3ObjectStore::connect(&cfg).await;
    let service = GatewayService::new(Arc::new(store), staging);

    // --- Build router ---
    let app: Router = routes::routes::routes(&cfg.public_dir).with_state(service);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server running on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
