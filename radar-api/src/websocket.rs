use crate::state::AppState;
use crate::{AnomaliesResponse, TimelineResponse};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use chrono::{DateTime, Utc};
use futures::stream::SplitStream;
use futures::{SinkExt, StreamExt};
use radar_analytics::{Alert, ChangeSnapshot, TempoReport, TimelineEvent};
use radar_core::Result as RadarResult;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Combined radar message pushed to a connected client on every cycle. Each
/// analytic fills either its data slot or its error slot, never both, so a
/// single failing analytic degrades its own section without losing the rest.
#[derive(Debug, Serialize)]
pub struct RadarUpdate {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub data: RadarData,
    pub errors: RadarErrors,
}

#[derive(Debug, Serialize)]
pub struct RadarData {
    pub snapshot: Option<ChangeSnapshot>,
    pub anomalies: Option<AnomaliesResponse>,
    pub tempo: Option<TempoReport>,
    pub timeline: Option<TimelineResponse>,
}

#[derive(Debug, Serialize)]
pub struct RadarErrors {
    pub snapshot: Option<String>,
    pub anomalies: Option<String>,
    pub tempo: Option<String>,
    pub timeline: Option<String>,
}

impl RadarUpdate {
    pub fn assemble(
        symbol: &str,
        snapshot: RadarResult<ChangeSnapshot>,
        anomalies: RadarResult<Vec<Alert>>,
        tempo: RadarResult<TempoReport>,
        timeline: RadarResult<Vec<TimelineEvent>>,
    ) -> Self {
        let (snapshot, snapshot_err) = split(snapshot);
        let (anomalies, anomalies_err) = split(anomalies.map(AnomaliesResponse::new));
        let (tempo, tempo_err) = split(tempo);
        let (timeline, timeline_err) = split(timeline.map(TimelineResponse::new));

        Self {
            kind: "market_radar_update",
            symbol: symbol.to_uppercase(),
            timestamp: Utc::now(),
            data: RadarData {
                snapshot,
                anomalies,
                tempo,
                timeline,
            },
            errors: RadarErrors {
                snapshot: snapshot_err,
                anomalies: anomalies_err,
                tempo: tempo_err,
                timeline: timeline_err,
            },
        }
    }
}

fn split<T>(result: RadarResult<T>) -> (Option<T>, Option<String>) {
    match result {
        Ok(value) => (Some(value), None),
        Err(e) => (None, Some(e.to_string())),
    }
}

pub async fn radar_ws(
    ws: WebSocketUpgrade,
    Path(symbol): Path<String>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| run_radar_loop(socket, state, symbol))
}

/// Push a combined update every broadcast interval until the client goes
/// away. The four analytics run concurrently and are joined by name, so a
/// slow or failing one never blocks the others out of the message.
async fn run_radar_loop(socket: WebSocket, state: AppState, symbol: String) {
    let client_id = Uuid::new_v4();
    info!("radar client {} connected for {}", client_id, symbol);

    let (mut sender, mut receiver) = socket.split();

    loop {
        let (snapshot, anomalies, tempo, timeline) = tokio::join!(
            state.engine.snapshot(&symbol),
            state.engine.anomalies(&symbol),
            state.engine.tempo(&symbol),
            state.engine.timeline(&symbol),
        );

        let update = RadarUpdate::assemble(&symbol, snapshot, anomalies, tempo, timeline);
        let payload = match serde_json::to_string(&update) {
            Ok(payload) => payload,
            Err(e) => {
                error!("could not serialize radar update for {}: {}", symbol, e);
                break;
            }
        };

        if sender.send(Message::Text(payload)).await.is_err() {
            break;
        }
        debug!("radar update sent to client {}", client_id);

        if !sleep_or_disconnect(&mut receiver, state.broadcast_interval).await {
            break;
        }
    }

    info!("radar client {} disconnected for {}", client_id, symbol);
}

/// Wait out the broadcast interval while watching the client side. Returns
/// false when the client closed or errored, true when the next cycle is due.
async fn sleep_or_disconnect(receiver: &mut SplitStream<WebSocket>, interval: Duration) -> bool {
    let sleep = tokio::time::sleep(interval);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            _ = &mut sleep => return true,
            message = receiver.next() => match message {
                None | Some(Ok(Message::Close(_))) | Some(Err(_)) => return false,
                Some(Ok(_)) => {}
            },
        }
    }
}
