use std::{env, net::SocketAddr, sync::Arc};

use axum::Router;
use common::utils::logging::init_logging_default;
use dotenvy::dotenv;
use tower_http::cors::CorsLayer;
use tracing::info;

use service::{file::user_directory::UserStore, runtime};

use crate::routes;

/// Initialize logging via shared common utils
fn init_logging() {
    init_logging_default();
}

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Load bind address and store path from configs or env vars, with sensible
/// fallbacks
fn load_settings() -> anyhow::Result<(SocketAddr, String)> {
    let (host, port, store_path) = match configs::load_default() {
        Ok(cfg) => (cfg.server.host, cfg.server.port, cfg.store.path),
        Err(_) => {
            let host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
            let port = env::var("SERVER_PORT")
                .ok()
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(8080);
            let store_path =
                env::var("STORE_PATH").unwrap_or_else(|_| "data/users.json".to_string());
            (host, port, store_path)
        }
    };
    Ok((format!("{}:{}", host, port).parse()?, store_path))
}

/// Public entry: build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging();

    let (addr, store_path) = load_settings()?;
    runtime::ensure_store_dir(&store_path).await?;

    // User directory state, persisted at the configured path
    let store = UserStore::new(store_path.as_str()).await?;

    let cors = build_cors();
    let app: Router = routes::build_router(Arc::clone(&store), cors);

    info!(%addr, store = %store_path, "starting user directory server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
