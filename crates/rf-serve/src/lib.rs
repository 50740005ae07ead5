pub mod middleware;
pub mod openapi;
pub mod routes;

use axum::Router;
use rf_core::error::StoreError;
use rf_db::schema;
use rf_db::store::DbStore;
use tokio::net::TcpListener;

#[derive(Clone)]
pub struct AppState {
    pub db_path: String,
}

impl AppState {
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }
}

/// Each request opens its own connection; SQLite serializes writers.
pub fn open_store(state: &AppState) -> Result<DbStore, StoreError> {
    let conn = schema::open_and_migrate(&state.db_path).map_err(|err| StoreError::Storage {
        message: err.to_string(),
    })?;
    Ok(DbStore::new(conn))
}

pub fn app(state: AppState) -> Router {
    routes::router(state)
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, db_path = %state.db_path, "serving reviews");
    axum::serve(listener, app(state)).await
}
