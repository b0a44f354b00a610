use axum::body::Body;
use axum::http::StatusCode;
use axum::response::Response;
use serde_json::json;

#[derive(Debug)]
pub enum Error {
    InvalidInput(String),
    SessionNotFound,
    Configuration(String),
}

impl From<shared::shared_settlement::SettlementError> for Error {
    fn from(err: shared::shared_settlement::SettlementError) -> Self {
        Error::InvalidInput(err.to_string())
    }
}

impl From<shared::shared_tavern_game::WheelConfigError> for Error {
    fn from(err: shared::shared_tavern_game::WheelConfigError) -> Self {
        Error::Configuration(err.to_string())
    }
}

impl axum::response::IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Error::InvalidInput(message) => (StatusCode::BAD_REQUEST, message),
            Error::SessionNotFound =>
                (StatusCode::NOT_FOUND, "Unknown or expired tavern session".to_string()),
            Error::Configuration(message) => {
                tracing::error!("Wheel configuration error: {}", message);
                (StatusCode::INTERNAL_SERVER_ERROR, "Wheel configuration error".to_string())
            }
        };

        Response::builder()
            .status(status)
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_string(&json!({
                "error": message
            })).unwrap()))
            .unwrap()
    }
}
