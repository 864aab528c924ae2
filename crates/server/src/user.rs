//! Request authentication.
//!
//! Requests carry the user in a Basic `Authorization` header; the username
//! is the user id every engine call is scoped to.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};
use engine::{EngineError, users};
use sea_orm::EntityTrait;

use crate::{ServerError, server::ServerState};

/// The authenticated user, inserted as a request extension.
pub type User = users::Model;

pub async fn authenticate(
    auth_header: Option<TypedHeader<Authorization<Basic>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let Some(TypedHeader(credentials)) = auth_header else {
        return Err(EngineError::NotAuthenticated.into());
    };
    if credentials.username().is_empty() || credentials.password().is_empty() {
        return Err(EngineError::NotAuthenticated.into());
    }

    let user = users::Entity::find_by_id(credentials.username().to_string())
        .one(&state.db)
        .await
        .map_err(EngineError::from)?
        .filter(|user| user.password == credentials.password())
        .ok_or(EngineError::NotAuthenticated)?;

    request.extensions_mut().insert::<User>(user);
    Ok(next.run(request).await)
}
