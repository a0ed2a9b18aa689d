//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del sistema
//! y su conversión a respuestas HTTP apropiadas.

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {message}")]
    Conflict {
        message: String,
        conflicts: BTreeMap<String, String>,
    },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Queue error: {0}")]
    Queue(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    conflicts: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Queue(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = match self {
            AppError::Database(e) => {
                error!("❌ Database error: {}", e);
                ErrorResponse {
                    error: "Database Error".to_string(),
                    message: "An error occurred while accessing the database".to_string(),
                    details: None,
                    conflicts: None,
                    code: Some("DB_ERROR".to_string()),
                }
            }

            AppError::Validation(e) => {
                warn!("⚠️ Validation error: {}", e);
                ErrorResponse {
                    error: "Validation Error".to_string(),
                    message: "The provided data is invalid".to_string(),
                    details: Some(json!(e)),
                    conflicts: None,
                    code: Some("VALIDATION_ERROR".to_string()),
                }
            }

            AppError::NotFound(msg) => {
                warn!("🔍 Resource not found: {}", msg);
                ErrorResponse {
                    error: "Not Found".to_string(),
                    message: msg,
                    details: None,
                    conflicts: None,
                    code: Some("NOT_FOUND".to_string()),
                }
            }

            AppError::Conflict { message, conflicts } => {
                warn!("⚠️ Conflict: {} {:?}", message, conflicts);
                ErrorResponse {
                    error: "Conflict".to_string(),
                    message,
                    details: None,
                    conflicts: Some(conflicts),
                    code: Some("CONFLICT".to_string()),
                }
            }

            AppError::BadRequest(msg) => {
                warn!("⚠️ Bad request: {}", msg);
                ErrorResponse {
                    error: "Bad Request".to_string(),
                    message: msg,
                    details: None,
                    conflicts: None,
                    code: Some("BAD_REQUEST".to_string()),
                }
            }

            AppError::Queue(msg) => {
                error!("❌ Queue error: {}", msg);
                ErrorResponse {
                    error: "Queue Error".to_string(),
                    message: "An error occurred while communicating with the message queue".to_string(),
                    details: None,
                    conflicts: None,
                    code: Some("QUEUE_ERROR".to_string()),
                }
            }

            AppError::Internal(msg) => {
                error!("❌ Internal error: {}", msg);
                ErrorResponse {
                    error: "Internal Server Error".to_string(),
                    message: "An unexpected error occurred".to_string(),
                    details: None,
                    conflicts: None,
                    code: Some("INTERNAL_ERROR".to_string()),
                }
            }
        };

        (status, Json(error_response)).into_response()
    }
}

impl From<redis::RedisError> for AppError {
    fn from(e: redis::RedisError) -> Self {
        AppError::Queue(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Internal(format!("JSON error: {}", e))
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de vehículo no encontrado
pub fn not_found_error(id: impl std::fmt::Display) -> AppError {
    AppError::NotFound(format!("Vehículo con id '{}' no encontrado", id))
}

/// Función helper para crear errores de conflicto con el mapa completo de campos
pub fn conflict_error(conflicts: BTreeMap<String, String>) -> AppError {
    let fields: Vec<&str> = conflicts.keys().map(String::as_str).collect();
    AppError::Conflict {
        message: format!("Conflicto en los campos: {}", fields.join(", ")),
        conflicts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_conflict_response_carries_every_field() {
        let mut conflicts = BTreeMap::new();
        conflicts.insert("plate".to_string(), "ABC1D23".to_string());
        conflicts.insert("chassis".to_string(), "9BWZZZ377VT004251".to_string());

        let response = conflict_error(conflicts).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["conflicts"]["plate"], "ABC1D23");
        assert_eq!(body["conflicts"]["chassis"], "9BWZZZ377VT004251");
        assert_eq!(body["message"], "Conflicto en los campos: chassis, plate");
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let response = AppError::Internal("pool exhausted at 10.0.0.3".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(!text.contains("10.0.0.3"));
        assert!(text.contains("An unexpected error occurred"));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::BadRequest("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(not_found_error(1).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Queue("down".into()).status_code(), StatusCode::BAD_GATEWAY);
    }
}
