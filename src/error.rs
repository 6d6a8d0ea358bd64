use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use sea_orm::{DbErr, SqlErr};
use serde_json::json;
use thiserror::Error;

use crate::models::CheckoutError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Checkout rejected: {0}")]
    Checkout(#[from] CheckoutError),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AppError {
    /// Maps a unique-constraint violation to a 400 with `message`; other
    /// database errors pass through.
    pub fn unique_violation_or(err: DbErr, message: &str) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::ValidationError(message.to_string())
            }
            _ => AppError::DatabaseError(err),
        }
    }

    /// Maps a foreign-key violation to a 400 with `message`; other database
    /// errors pass through.
    pub fn foreign_key_violation_or(err: DbErr, message: &str) -> Self {
        let violation = err.sql_err();
        Self::referenced_row_or(violation, err, message)
    }

    fn referenced_row_or(violation: Option<SqlErr>, err: DbErr, message: &str) -> Self {
        match violation {
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                AppError::ValidationError(message.to_string())
            }
            _ => AppError::DatabaseError(err),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::Checkout(e) if e.is_conflict() => StatusCode::CONFLICT,
            AppError::Checkout(_) => StatusCode::BAD_REQUEST,
            AppError::AuthError(_) | AppError::JwtError(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) | AppError::PermissionDenied => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (error_code, message) = match self {
            AppError::ValidationError(msg) => {
                log::warn!("Validation error: {msg}");
                ("VALIDATION_ERROR", msg.clone())
            }
            AppError::Checkout(err) => {
                log::warn!("Checkout rejected: {err}");
                return HttpResponse::build(self.status_code()).json(json!({
                    "success": false,
                    "error": {
                        "code": "CHECKOUT_ERROR",
                        "reason": err.reason(),
                        "message": err.to_string()
                    }
                }));
            }
            AppError::AuthError(msg) => {
                log::warn!("Authentication error: {msg}");
                ("AUTH_ERROR", msg.clone())
            }
            AppError::JwtError(err) => {
                log::warn!("Token rejected: {err}");
                ("AUTH_ERROR", "Invalid or expired token".to_string())
            }
            AppError::NotFound(msg) => ("NOT_FOUND", msg.clone()),
            AppError::Forbidden(msg) => {
                log::warn!("Forbidden access: {msg}");
                ("FORBIDDEN", msg.clone())
            }
            AppError::PermissionDenied => {
                log::warn!("Permission denied");
                ("FORBIDDEN", "Access denied: role not allowed".to_string())
            }
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
                ("DATABASE_ERROR", "Database error".to_string())
            }
            _ => {
                log::error!("Internal error: {self}");
                ("INTERNAL_ERROR", "Internal server error".to_string())
            }
        };

        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "error": {
                "code": error_code,
                "message": message
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::ValidationError("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::AuthError("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::PermissionDenied.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Checkout(CheckoutError::EmptyItems).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Checkout(CheckoutError::CodeExhausted).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::DatabaseError(DbErr::Custom("boom".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_non_unique_db_error_passes_through() {
        let err = AppError::unique_violation_or(DbErr::Custom("boom".into()), "dup");
        assert!(matches!(err, AppError::DatabaseError(_)));
    }

    #[test]
    fn test_foreign_key_violation_becomes_validation_error() {
        let err = AppError::referenced_row_or(
            Some(SqlErr::ForeignKeyConstraintViolation("products_kategori_id_fkey".into())),
            DbErr::Custom("fk".into()),
            "still referenced",
        );
        assert!(matches!(err, AppError::ValidationError(ref m) if m == "still referenced"));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = AppError::foreign_key_violation_or(DbErr::Custom("boom".into()), "x");
        assert!(matches!(err, AppError::DatabaseError(_)));
    }

    #[actix_web::test]
    async fn test_internal_errors_do_not_leak_details() {
        let resp = AppError::DatabaseError(DbErr::Custom("relation users is gone".into()))
            .error_response();
        let body = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("DATABASE_ERROR"));
        assert!(!text.contains("relation users"));
    }
}
