use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};

use spicesniff_sdk::{SpiceSniff, TelemetrySample};

/// Event name for pushed sensor readings.
pub const SENSOR_READING: &str = "sensorReading";

#[derive(Debug, Serialize)]
struct Frame<'a> {
    event: &'static str,
    data: &'a TelemetrySample,
}

/// Encode a sample as a `{"event":"sensorReading","data":...}` text frame.
pub fn encode_frame(sample: &TelemetrySample) -> serde_json::Result<String> {
    serde_json::to_string(&Frame {
        event: SENSOR_READING,
        data: sample,
    })
}

/// `GET /ws`: live sensor feed.
pub async fn websocket_handler(ws: WebSocketUpgrade, State(sdk): State<SpiceSniff>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, sdk))
}

async fn handle_socket(socket: WebSocket, sdk: SpiceSniff) {
    let (mut sender, mut receiver) = socket.split();
    let mut subscription = sdk.subscribe();
    info!(observers = sdk.feed().observer_count(), "dashboard connected");

    // Forward the latest sample, then every new one.
    let mut send_task = tokio::spawn(async move {
        while let Some(sample) = subscription.next().await {
            let frame = match encode_frame(&sample) {
                Ok(frame) => frame,
                Err(e) => {
                    warn!(error = %e, "failed to encode sensor frame");
                    continue;
                }
            };
            if sender.send(Message::Text(frame)).await.is_err() {
                break;
            }
        }
    });

    // Inbound messages are ignored; the loop only watches for disconnect.
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Close(_) => break,
                other => debug!(?other, "ignoring client message"),
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    };
    info!("dashboard disconnected");
}
