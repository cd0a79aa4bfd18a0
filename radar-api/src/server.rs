use crate::{handlers, state::AppState, websocket};
use axum::routing::get;
use axum::Router;
use radar_core::config::ServerConfig;
use radar_core::{RadarError, Result};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

pub struct ApiServer {
    app: Router,
    addr: SocketAddr,
}

impl ApiServer {
    pub fn new(config: &ServerConfig, state: AppState) -> Result<Self> {
        let app = Router::new()
            .route("/health", get(handlers::health))
            // Radar analytics
            .route("/api/v1/radar/:symbol/snapshot", get(handlers::snapshot))
            .route("/api/v1/radar/:symbol/anomalies", get(handlers::anomalies))
            .route("/api/v1/radar/:symbol/tempo", get(handlers::tempo))
            .route("/api/v1/radar/:symbol/timeline", get(handlers::timeline))
            // Real-time radar push
            .route("/api/v1/radar/ws/:symbol", get(websocket::radar_ws))
            // Market data
            .route("/api/v1/market/history/:symbol", get(handlers::history))
            .route("/api/v1/market/:symbol", get(handlers::market))
            .route("/api/v1/market/:symbol/indicators", get(handlers::indicators))
            .route("/api/v1/market/:symbol/orderbook", get(handlers::orderbook))
            .with_state(state)
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );

        let addr: SocketAddr = format!("{}:{}", config.host, config.port)
            .parse()
            .map_err(|e| RadarError::Configuration(format!("listen address: {}", e)))?;

        Ok(Self { app, addr })
    }

    pub async fn run(self) -> Result<()> {
        info!("API server listening on {}", self.addr);

        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| RadarError::Other(e.to_string()))?;

        axum::serve(listener, self.app)
            .await
            .map_err(|e| RadarError::Other(e.to_string()))?;

        Ok(())
    }
}
