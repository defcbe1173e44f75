use axum::http::{header, Method};
use backend::api::{routes, AppState};
use backend::shared::cache::QueryCache;
use backend::shared::config::{self, SourceConfig};
use backend::shared::data::access::DataAccess;
use backend::shared::data::db;
use backend::shared::data::postgrest_store::PostgrestStore;
use backend::shared::data::sqlite_store::SqliteStore;
use backend::shared::data::store::KpiStore;
use backend::system;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

async fn open_store(source: &SourceConfig) -> anyhow::Result<Arc<dyn KpiStore>> {
    match source {
        SourceConfig::Sqlite { path } => {
            let db_path = config::resolve_database_path(path);
            let conn = db::connect_sqlite(&db_path).await?;
            db::ensure_schema(&conn).await?;
            Ok(Arc::new(SqliteStore::new(conn)))
        }
        SourceConfig::Postgrest { url, api_key } => {
            let api_key = api_key.as_deref().ok_or_else(|| {
                anyhow::anyhow!(
                    "source.api_key is not set (config.toml or {})",
                    config::API_KEY_ENV
                )
            })?;
            tracing::info!("Reading KPI tables from {}", url);
            Ok(Arc::new(PostgrestStore::new(url, api_key)?))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    system::tracing::initialize()?;

    let config = config::load_config()?;
    let store = open_store(&config.source).await?;

    let state = AppState::new(
        DataAccess::with_tracing(store),
        QueryCache::new(config.cache.ttl(), config.cache.retries),
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    let app = routes::configure_routes(state).layer(cors);

    let port = config.server.port;
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();

    tracing::info!("Attempting to bind server to http://{}", addr);
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => {
            tracing::info!("Server successfully bound to {}", addr);
            listener
        }
        Err(e) => {
            if e.kind() == std::io::ErrorKind::AddrInUse {
                tracing::error!(
                    "Error: Port {} is already in use. Please ensure no other process is using this port.",
                    port
                );
            } else {
                tracing::error!("Failed to bind to port {}. Error: {}", port, e);
            }
            return Err(e.into());
        }
    };

    axum::serve(listener, app).await?;

    Ok(())
}
