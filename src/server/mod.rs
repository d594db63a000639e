//! HTTP/WebSocket API
//!
//! REST endpoints for simulations and market data, plus the `/ws` push
//! channel that streams market snapshots to every subscriber.

pub mod broadcast;
pub mod types;

pub use broadcast::BroadcastGate;
pub use types::*;

use crate::error::Error;
use crate::simulation::SimulationEngine;
use crate::storage::MemoryStore;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use std::sync::Arc;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MemoryStore>,
    pub engine: Arc<SimulationEngine>,
    pub gate: BroadcastGate,
}

/// Create the API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Simulations
        .route(
            "/api/simulations",
            post(run_simulation).get(list_simulations),
        )
        .route("/api/simulations/:id", axum::routing::delete(delete_simulation))
        // Market data
        .route("/api/market-data", get(get_market_data))
        .route("/api/market-data/:asset", patch(update_market_data))
        // WebSocket
        .route("/ws", get(websocket_handler))
        // State
        .with_state(state)
        // CORS for frontend
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

// ─────────────────────────────────────────────────────────────────
// API Handlers
// ─────────────────────────────────────────────────────────────────

/// POST /api/simulations - run a simulation and persist the result
async fn run_simulation(
    State(state): State<AppState>,
    Json(request): Json<RunSimulationRequest>,
) -> Result<impl IntoResponse, Error> {
    let record = state.engine.run(request.user_id, &request.asset).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(record))))
}

/// GET /api/simulations?user_id=N - stored simulations for one user
async fn list_simulations(
    State(state): State<AppState>,
    Query(query): Query<SimulationsQuery>,
) -> Result<impl IntoResponse, Error> {
    let user_id = query
        .user_id
        .ok_or_else(|| Error::InvalidInput("user_id query parameter is required".to_string()))?;
    let records = state.engine.list(user_id).await;
    Ok(Json(ApiResponse::success(records)))
}

/// DELETE /api/simulations/{id} - remove a stored simulation
async fn delete_simulation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, Error> {
    state.engine.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/market-data[?asset=Name] - one record or the full snapshot
async fn get_market_data(
    State(state): State<AppState>,
    Query(query): Query<MarketDataQuery>,
) -> Result<Response, Error> {
    if let Some(asset) = query.asset {
        let record = state
            .store
            .market_data_for(&asset)
            .await
            .ok_or(Error::AssetNotFound(asset))?;
        return Ok(Json(ApiResponse::success(record)).into_response());
    }

    let records = state.store.all_market_data().await;
    Ok(Json(ApiResponse::success(records)).into_response())
}

/// PATCH /api/market-data/{asset} - partial update, then signal broadcast
async fn update_market_data(
    State(state): State<AppState>,
    Path(asset): Path<String>,
    Json(update): Json<MarketUpdateRequest>,
) -> Result<impl IntoResponse, Error> {
    if let Some(price) = update.price {
        if price <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "price must be positive, got {price}"
            )));
        }
    }

    let record = state
        .store
        .update_market(&asset, |record| {
            if let Some(price) = update.price {
                record.price = price;
            }
            if let Some(change) = update.change_24h {
                record.change_24h = change;
            }
            if let Some(volume) = update.volume_24h {
                record.volume_24h = Some(volume);
            }
        })
        .await
        .ok_or(Error::AssetNotFound(asset))?;

    let snapshot = state.store.all_market_data().await;
    state.gate.maybe_broadcast(&snapshot);

    Ok(Json(ApiResponse::success(record)))
}

// ─────────────────────────────────────────────────────────────────
// WebSocket Handler
// ─────────────────────────────────────────────────────────────────

/// WebSocket upgrade handler
async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

/// Drive one subscriber connection: immediate snapshot on connect, then
/// broadcast frames until the client goes away. A failed send tears down
/// only this connection.
async fn handle_websocket(socket: WebSocket, state: AppState) {
    use futures_util::{SinkExt, StreamExt};

    let conn_id = Uuid::new_v4();
    tracing::info!(%conn_id, "market data subscriber connected");

    let (mut sender, mut receiver) = socket.split();

    // Connect-time snapshot, independent of the broadcast throttle.
    let snapshot = state.store.all_market_data().await;
    match state.gate.snapshot_message(&snapshot) {
        Ok(json) => {
            if sender.send(Message::Text(json)).await.is_err() {
                tracing::info!(%conn_id, "subscriber dropped before initial snapshot");
                return;
            }
        }
        Err(e) => {
            tracing::warn!(%conn_id, error = %e, "failed to serialize initial snapshot");
            return;
        }
    }

    let mut rx = state.gate.subscribe();

    loop {
        tokio::select! {
            broadcast_msg = rx.recv() => {
                match broadcast_msg {
                    Ok(json) => {
                        if sender.send(Message::Text(json)).await.is_err() {
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!(%conn_id, skipped, "subscriber lagging, frames dropped");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!(%conn_id, %text, "ignoring client message");
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
        }
    }

    tracing::info!(%conn_id, subscribers = state.gate.subscriber_count().saturating_sub(1),
        "market data subscriber disconnected");
}

/// Start the API server; resolves once the shutdown flag flips
pub async fn start(
    state: AppState,
    port: u16,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let app = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!("API server starting on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.changed().await;
        })
        .await?;

    Ok(())
}
