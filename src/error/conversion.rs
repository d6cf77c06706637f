use axum::{
    body::Body,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::error::types::AppError;

impl IntoResponse for AppError {
    /// Convert an application error into a JSON HTTP response.
    ///
    /// The body carries the message and status so clients do not have to
    /// parse reason phrases:
    ///
    /// ```json
    /// { "error": "No available copies to borrow.", "status": 400 }
    /// ```
    ///
    /// Infrastructure errors are logged with their cause chain and surface
    /// only a generic message.
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(
                error.cause_chain = ?self,
                error.message = %self,
                "Unexpected error while handling request"
            );
        }

        let message = match &self {
            AppError::Database(_) | AppError::Bcrypt(_) | AppError::Token(_) => {
                "Internal server error.".to_string()
            }
            other => other.to_string(),
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        Response::builder()
            .status(status)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap_or_else(|_| status.into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_error_body_is_generic() {
        let err = AppError::Database(sqlx::Error::RowNotFound);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_policy_error_keeps_its_message() {
        let response = AppError::NoAvailableCopies.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
