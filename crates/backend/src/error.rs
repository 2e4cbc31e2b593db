use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use contracts::domain::common::ValidationError;
use sea_orm::DbErr;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Failure taxonomy of the catalog.
///
/// Validation failures carry the offending field, not-found carries the id,
/// and everything the storage backend reports lands in `Storage`.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("listing {0} not found")]
    NotFound(Uuid),

    #[error("storage error: {0}")]
    Storage(#[from] DbErr),
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let (status, kind, message, field) = match &self {
            CatalogError::Validation(e) => {
                tracing::warn!("Validation error: {}", e);
                (
                    StatusCode::BAD_REQUEST,
                    "validation_error",
                    e.message.clone(),
                    Some(e.field),
                )
            }
            CatalogError::NotFound(id) => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("listing {} not found", id),
                None,
            ),
            CatalogError::Storage(e) => {
                tracing::error!("Storage error: {}", e);
                // The body stays generic; driver messages can contain file paths.
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "storage_error",
                    "internal storage failure".to_string(),
                    None,
                )
            }
        };

        let mut body = json!({
            "error": kind,
            "message": message,
        });
        if let Some(field) = field {
            body["field"] = json!(field);
        }

        (status, Json(body)).into_response()
    }
}
