//! REST API over the interview store.
//!
//! | Route | Auth |
//! |---|---|
//! | `POST/DELETE /users` | Basic credentials of a database role |
//! | `PUT /users` | API user |
//! | `GET /interviews/{selector}[/{field}]` | API user |
//! | `GET /health` | none |

pub mod auth;
pub mod error;
pub mod handlers;

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Router,
    routing::{get, post},
};
use sqlx::PgPool;

use crate::{config::DatabaseConfig, error::Result};

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    /// Used to open per-request connections under another role.
    pub database: Arc<DatabaseConfig>,
    pub pbkdf2_rounds: u32,
}

impl AppState {
    pub fn new(
        pool: PgPool,
        database: DatabaseConfig,
        pbkdf2_rounds: u32,
    ) -> Self {
        Self {
            pool,
            database: Arc::new(database),
            pbkdf2_rounds,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/users",
            post(handlers::create_user)
                .put(handlers::update_password)
                .delete(handlers::delete_user),
        )
        .route("/interviews/{selector}", get(handlers::interviews))
        .route(
            "/interviews/{selector}/{field}",
            get(handlers::interview_field),
        )
        .route("/health", get(handlers::health))
        .with_state(state)
}

/// Serve the API until Ctrl-C.
pub async fn serve(state: AppState, bind: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
