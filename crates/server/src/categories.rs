//! Categories API endpoints

use api_types::category::{CategoryListResponse, CategoryNew, CategoryView};
use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    ServerError,
    extract::{JsonBody, PathParam},
    server::ServerState,
    user::User,
};

fn category_view(category: engine::Category) -> CategoryView {
    CategoryView {
        id: category.id,
        name: category.name,
        icon: category.icon,
        color: category.color,
    }
}

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<CategoryListResponse>, ServerError> {
    let categories = state.engine.list_categories(&user.username).await?;
    Ok(Json(CategoryListResponse {
        categories: categories.into_iter().map(category_view).collect(),
    }))
}

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    JsonBody(payload): JsonBody<CategoryNew>,
) -> Result<(StatusCode, Json<CategoryView>), ServerError> {
    let category = state
        .engine
        .create_category(
            &user.username,
            &payload.name,
            payload.icon.as_deref(),
            payload.color.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(category_view(category))))
}

pub async fn remove(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    PathParam(id): PathParam<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_category(&user.username, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
