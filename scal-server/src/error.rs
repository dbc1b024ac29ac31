use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, warn};

use scal_core::ScalError;
use scal_core::error::NO_WIFI_MSG;

/// Convert errors to plain-text HTTP responses. Calendar apps show the body
/// as-is, so keep it short.
#[derive(Debug)]
pub struct AppError(anyhow::Error);

impl AppError {
    fn status(&self) -> StatusCode {
        match self.0.downcast_ref::<ScalError>() {
            Some(ScalError::Offline(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Some(ScalError::Upstream { .. }) | Some(ScalError::FeedUnavailable(_)) => {
                StatusCode::BAD_GATEWAY
            }
            Some(ScalError::NotFound(_)) => StatusCode::NOT_FOUND,
            Some(ScalError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self.0.downcast_ref::<ScalError>() {
            Some(ScalError::Offline(cause)) => {
                warn!(%cause, "Schoology unreachable");
                NO_WIFI_MSG.to_string()
            }
            Some(ScalError::FeedUnavailable(cause)) => {
                warn!(%cause, "ICS fetch failed");
                "Failed to fetch ICS".to_string()
            }
            _ => {
                if status.is_server_error() {
                    error!(error = %self.0, "Request failed");
                }
                self.0.to_string()
            }
        };

        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
