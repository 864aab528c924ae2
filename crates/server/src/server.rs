use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get},
};
use sea_orm::DatabaseConnection;

use std::sync::Arc;

use crate::{attachments, categories, expenses, statistics, user};
use engine::{Engine, LocalBlobStore, MAX_UPLOAD_BYTES};

/// Largest request body accepted: a base64 encoded receipt of
/// [`MAX_UPLOAD_BYTES`] plus room for the rest of the expense form.
pub const MAX_BODY_BYTES: usize = MAX_UPLOAD_BYTES.div_ceil(3) * 4 + 64 * 1024;

/// Display defaults used when a request does not say otherwise.
#[derive(Clone, Copy, Debug)]
pub struct ServerOptions {
    /// Expenses per page of `GET /expenses`.
    pub page_size: usize,
    /// Pages shown on each side of the current one in the page links.
    pub page_siblings: usize,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            page_size: 10,
            page_siblings: 1,
        }
    }
}

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
    pub blobs: Arc<LocalBlobStore>,
    pub options: ServerOptions,
}

impl ServerState {
    pub fn new(
        engine: Engine,
        db: DatabaseConnection,
        blobs: LocalBlobStore,
        options: ServerOptions,
    ) -> Self {
        Self {
            engine: Arc::new(engine),
            db,
            blobs: Arc::new(blobs),
            options,
        }
    }
}

/// Builds the HTTP API.
///
/// Every route but the attachment download requires Basic auth. Bodies are
/// capped at [`MAX_BODY_BYTES`] so receipts up to the upload limit reach
/// validation.
pub fn router(state: ServerState) -> Router {
    let authenticated = Router::new()
        .route("/expenses", get(expenses::list).post(expenses::create))
        .route(
            "/expenses/{id}",
            get(expenses::get)
                .patch(expenses::update)
                .delete(expenses::remove),
        )
        .route("/stats", get(statistics::get_stats))
        .route(
            "/categories",
            get(categories::list).post(categories::create),
        )
        .route("/categories/{id}", delete(categories::remove))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            user::authenticate,
        ));

    Router::new()
        .merge(authenticated)
        .route("/attachments/{*key}", get(attachments::download))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

pub async fn run_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(state, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
