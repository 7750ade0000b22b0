use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    DataIntegrity(String),
    BadRequest(String),
    Validation(Vec<FieldMessage>),
    Unauthorized(String),
    Forbidden(String),
    RateLimited(String),
    Internal(String),
    Database(sqlx::Error),
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldMessage {
    pub field_name: String,
    pub message: String,
}

/// Uniform error body. `path` is filled in by `middleware::error_envelope`,
/// which has access to the request URI.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorBody {
    pub timestamp: DateTime<Utc>,
    pub status: u16,
    pub message: String,
    pub path: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldMessage>,
}

impl ErrorBody {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            status: status.as_u16(),
            message: message.into(),
            path: String::new(),
            errors: Vec::new(),
        }
    }

    pub fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, axum::Json(&self)).into_response();
        response.extensions_mut().insert(self);
        response
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not Found: {msg}"),
            AppError::DataIntegrity(msg) => write!(f, "Data Integrity: {msg}"),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {msg}"),
            AppError::Validation(errors) => {
                write!(f, "Validation failed on {} field(s)", errors.len())
            }
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {msg}"),
            AppError::RateLimited(msg) => write!(f, "Rate Limited: {msg}"),
            AppError::Internal(msg) => write!(f, "Internal Error: {msg}"),
            AppError::Database(err) => write!(f, "Database Error: {err}"),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = match self {
            AppError::NotFound(msg) => ErrorBody::new(StatusCode::NOT_FOUND, msg),
            AppError::DataIntegrity(msg) => ErrorBody::new(StatusCode::BAD_REQUEST, msg),
            AppError::BadRequest(msg) => ErrorBody::new(StatusCode::BAD_REQUEST, msg),
            AppError::Validation(errors) => ErrorBody {
                errors,
                ..ErrorBody::new(StatusCode::UNPROCESSABLE_ENTITY, "Validation failed")
            },
            AppError::Unauthorized(msg) => {
                let mut response = ErrorBody::new(StatusCode::UNAUTHORIZED, msg).into_response();
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
                return response;
            }
            AppError::Forbidden(msg) => ErrorBody::new(StatusCode::FORBIDDEN, msg),
            AppError::RateLimited(msg) => ErrorBody::new(StatusCode::TOO_MANY_REQUESTS, msg),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                ErrorBody::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            AppError::Database(err) => {
                tracing::error!("Database error: {err}");
                ErrorBody::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        body.into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut errors: Vec<FieldMessage> = err
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| FieldMessage {
                    field_name: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string()),
                })
            })
            .collect();
        errors.sort_by(|a, b| a.field_name.cmp(&b.field_name));
        AppError::Validation(errors)
    }
}

/// Map a failed DELETE: rows still referenced elsewhere become `DataIntegrity`.
pub fn integrity_violation(err: sqlx::Error) -> AppError {
    match err {
        sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
            AppError::DataIntegrity("Integrity violation".to_string())
        }
        _ => AppError::Database(err),
    }
}

/// Map a failed UPDATE ... RETURNING: no row means the id does not exist.
pub fn not_found_on_missing_row(err: sqlx::Error, what: &str) -> AppError {
    match err {
        sqlx::Error::RowNotFound => AppError::NotFound(format!("{what} not found")),
        _ => AppError::Database(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 8, message = "Must have at least 8 characters"))]
        password: String,
        #[validate(email)]
        email: String,
    }

    #[test]
    fn validation_errors_become_sorted_field_messages() {
        let sample = Sample {
            password: "short".to_string(),
            email: "nope".to_string(),
        };
        let AppError::Validation(errors) = AppError::from(sample.validate().unwrap_err()) else {
            panic!("expected validation error");
        };
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field_name, "email");
        assert_eq!(errors[0].message, "email");
        assert_eq!(errors[1].field_name, "password");
        assert_eq!(errors[1].message, "Must have at least 8 characters");
    }

    #[test]
    fn status_codes_follow_taxonomy() {
        let cases = [
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::DataIntegrity("x".into()), StatusCode::BAD_REQUEST),
            (AppError::Validation(vec![]), StatusCode::UNPROCESSABLE_ENTITY),
            (AppError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (AppError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (AppError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err = not_found_on_missing_row(sqlx::Error::RowNotFound, "Product");
        assert!(matches!(err, AppError::NotFound(msg) if msg == "Product not found"));
    }
}
