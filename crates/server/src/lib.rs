use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::IntoResponse,
};
use engine::EngineError;

use serde::Serialize;
pub use server::{
    MAX_BODY_BYTES, ServerOptions, ServerState, router, run_with_listener, spawn_with_listener,
};

mod attachments;
mod categories;
mod expenses;
mod extract;
mod server;
mod statistics;
mod user;

pub mod types {
    pub mod attachment {
        pub use api_types::attachment::{AttachmentUpload, AttachmentView};
    }

    pub mod category {
        pub use api_types::category::{CategoryListResponse, CategoryNew, CategoryView};
    }

    pub mod expense {
        pub use api_types::expense::{
            ExpenseNew, ExpensePage, ExpenseQuery, ExpenseUpdate, ExpenseView,
            PageLink, SortField, SortOrder,
        };
    }

    pub mod stats {
        pub use api_types::stats::{CurrencyTotalsView, ExpenseStatsView, TopCategoryView};
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
    /// A request axum could not extract (bad path, query or body).
    Rejection(StatusCode, String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::NotAuthenticated => StatusCode::UNAUTHORIZED,
        EngineError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) => StatusCode::CONFLICT,
        EngineError::Storage(_) => StatusCode::BAD_GATEWAY,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::Storage(reason) => {
            tracing::error!("storage error: {reason}");
            EngineError::Storage(reason).to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), message_for_engine_error(err)),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
            ServerError::Rejection(status, err) => (status, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<JsonRejection> for ServerError {
    fn from(value: JsonRejection) -> Self {
        Self::Rejection(value.status(), value.body_text())
    }
}

impl From<QueryRejection> for ServerError {
    fn from(value: QueryRejection) -> Self {
        Self::Rejection(value.status(), value.body_text())
    }
}

impl From<PathRejection> for ServerError {
    fn from(value: PathRejection) -> Self {
        Self::Rejection(value.status(), value.body_text())
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::DbErr;

    use super::*;

    #[test]
    fn engine_not_authenticated_maps_to_401() {
        let res = ServerError::from(EngineError::NotAuthenticated).into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::KeyNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_conflict_maps_to_409() {
        let res = ServerError::from(EngineError::ExistingKey("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn engine_validation_maps_to_422() {
        let res = ServerError::from(EngineError::Validation("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn engine_storage_maps_to_502() {
        let res = ServerError::from(EngineError::Storage("down".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn engine_database_maps_to_500() {
        let err = EngineError::Database(DbErr::Custom("disk full".to_string()));
        let res = ServerError::from(err).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn rejection_keeps_its_status() {
        let res = ServerError::Rejection(StatusCode::PAYLOAD_TOO_LARGE, "too big".to_string())
            .into_response();
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
