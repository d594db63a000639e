//! API Types
//!
//! Request/response DTOs for the HTTP surface and the WebSocket push
//! channel.

use crate::error::Error;
use crate::types::MarketRecord;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

/// WebSocket push messages (server -> client)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum WsMessage {
    /// Full market snapshot: sent on connect and on each broadcast tick
    #[serde(rename = "MARKET_DATA")]
    MarketData(Vec<MarketRecord>),
}

/// Body of POST /api/simulations
#[derive(Debug, Clone, Deserialize)]
pub struct RunSimulationRequest {
    pub user_id: i64,
    pub asset: String,
}

/// Query of GET /api/simulations
#[derive(Debug, Deserialize)]
pub struct SimulationsQuery {
    pub user_id: Option<i64>,
}

/// Query of GET /api/market-data
#[derive(Debug, Deserialize)]
pub struct MarketDataQuery {
    pub asset: Option<String>,
}

/// Body of PATCH /api/market-data/{asset}; absent fields stay untouched
#[derive(Debug, Clone, Deserialize)]
pub struct MarketUpdateRequest {
    pub price: Option<f64>,
    pub change_24h: Option<f64>,
    pub volume_24h: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            error_kind: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
            error_kind: None,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::InsufficientData { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Error::AssetNotFound(_) | Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::SimulationFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(self.to_string()),
            error_kind: Some(self.kind().to_string()),
        };

        (status, Json(body)).into_response()
    }
}
