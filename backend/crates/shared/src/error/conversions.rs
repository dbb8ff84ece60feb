//! Conversions between [`AppError`] and the outside world.

#[cfg(feature = "axum")]
use super::app_error::AppError;

/// Whether `err` is a PostgreSQL unique constraint violation (`23505`).
///
/// Stores use this to turn a lost check-then-insert race into a typed
/// conflict instead of a generic database failure.
#[cfg(feature = "sqlx")]
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

/// RFC 7807 problem document.
#[cfg(feature = "axum")]
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;
        use axum::http::StatusCode;

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = serde_json::json!({
            "type": format!("https://httpstatuses.io/{}", self.status_code()),
            "title": self.kind().as_str(),
            "status": self.status_code(),
            "detail": self.message(),
            "action": self.action(),
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    #[cfg(feature = "sqlx")]
    #[test]
    fn test_row_not_found_is_not_a_unique_violation() {
        assert!(!super::is_unique_violation(&sqlx::Error::RowNotFound));
    }

    #[cfg(feature = "axum")]
    #[test]
    fn test_problem_document_status() {
        use super::AppError;
        use crate::error::kind::ErrorKind;
        use axum::response::IntoResponse;

        let response = AppError::new(ErrorKind::Gone, "Link expired").into_response();
        assert_eq!(response.status(), axum::http::StatusCode::GONE);
    }
}
