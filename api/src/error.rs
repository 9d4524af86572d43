//! HTTP error mapping

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use streetsavvy_promotions::PromoError;
use thiserror::Error;
use tracing::error;

use crate::models::ApiResponse;

/// Error returned by every handler
#[derive(Error, Debug)]
#[error(transparent)]
pub struct ApiError(#[from] PromoError);

impl ApiError {
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self(PromoError::InvalidParameter(message.into()))
    }

    pub fn status(&self) -> StatusCode {
        match &self.0 {
            PromoError::InvalidParameter(_) | PromoError::InvalidAction(_) => StatusCode::BAD_REQUEST,
            PromoError::LocationUnavailable(_) | PromoError::UserNotFound(_) => StatusCode::NOT_FOUND,
            PromoError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::invalid_parameter(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::invalid_parameter(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self.0 {
            PromoError::Store(e) => {
                error!(error = %e, "request failed on store error");
                "internal error".to_string()
            }
            other => other.to_string(),
        };
        let body = ApiResponse::<()>::error(self.0.code(), &message);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streetsavvy_promotions::{EntityId, StoreError};

    #[test]
    fn test_status_mapping() {
        let cases = [
            (PromoError::InvalidParameter("lat".into()), StatusCode::BAD_REQUEST),
            (PromoError::InvalidAction("viewed".into()), StatusCode::BAD_REQUEST),
            (PromoError::LocationUnavailable(EntityId::from("u1")), StatusCode::NOT_FOUND),
            (PromoError::UserNotFound(EntityId::from("u1")), StatusCode::NOT_FOUND),
            (
                PromoError::Store(StoreError::Query("relation missing".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[tokio::test]
    async fn test_store_error_text_not_exposed() {
        let err = ApiError::from(PromoError::Store(StoreError::Connection("password=hunter2".into())));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "store_error");
        assert_eq!(body["error"]["message"], "internal error");
        assert!(!String::from_utf8_lossy(&bytes).contains("hunter2"));
    }
}
