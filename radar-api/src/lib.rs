pub mod handlers;
pub mod server;
pub mod state;
pub mod websocket;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use radar_analytics::{Alert, TimelineEvent};
use radar_core::RadarError;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct AnomaliesResponse {
    pub alerts: Vec<Alert>,
    pub timestamp: DateTime<Utc>,
}

impl AnomaliesResponse {
    pub fn new(alerts: Vec<Alert>) -> Self {
        Self {
            alerts,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TimelineResponse {
    pub events: Vec<TimelineEvent>,
    pub timestamp: DateTime<Utc>,
}

impl TimelineResponse {
    pub fn new(events: Vec<TimelineEvent>) -> Self {
        Self {
            events,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let body = Json(serde_json::json!({ "detail": self.message }));
        (self.status, body).into_response()
    }
}

impl From<RadarError> for ApiError {
    fn from(err: RadarError) -> Self {
        let status = match &err {
            RadarError::InsufficientHistory { .. } => StatusCode::BAD_REQUEST,
            RadarError::SourceUnavailable { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

pub type ApiResult<T> = std::result::Result<Json<T>, ApiError>;
