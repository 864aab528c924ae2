//! Receipt download.
//!
//! Stored receipts are served at the public URL handed out on upload. Keys
//! contain a random component, so the route is not behind auth.

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
};

use crate::{ServerError, extract::PathParam, server::ServerState};

pub async fn download(
    State(state): State<ServerState>,
    PathParam(key): PathParam<String>,
) -> Result<impl IntoResponse, ServerError> {
    let (bytes, content_type) = state.blobs.open(&key).await?;
    Ok(([(header::CONTENT_TYPE, content_type)], bytes))
}
