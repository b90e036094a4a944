//! Live sensor endpoints: ingestion, latest/history reads, and promotion.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use spicesniff_sdk::{BatchId, SpiceSniff, TelemetrySample};

use crate::error::{ServerError, ServerResult};
use crate::view::CommitView;

const DEVICE_REQUIRED: &str = "deviceId required";

/// `POST /api/ingest`: accept one reading from a field device.
pub async fn ingest_handler(
    State(sdk): State<SpiceSniff>,
    body: Result<Json<Value>, JsonRejection>,
) -> ServerResult<StatusCode> {
    let Json(payload) = body.map_err(|_| ServerError::BadInput(DEVICE_REQUIRED.into()))?;
    let has_device = payload
        .get("deviceId")
        .and_then(Value::as_str)
        .is_some_and(|d| !d.trim().is_empty());
    if !has_device {
        return Err(ServerError::BadInput(DEVICE_REQUIRED.into()));
    }

    let sample: TelemetrySample =
        serde_json::from_value(payload).map_err(|e| ServerError::BadInput(e.to_string()))?;
    sdk.ingest(sample)?;
    Ok(StatusCode::OK)
}

/// `GET /api/ingest`: endpoint description for people poking at it in a browser.
pub async fn ingest_info_handler(State(sdk): State<SpiceSniff>) -> Json<Value> {
    Json(json!({
        "message": "Sensor data ingestion endpoint",
        "method": "This endpoint accepts POST requests",
        "latestData": sdk.latest(),
        "totalReadings": sdk.feed().history_len(),
        "status": "Server is running",
    }))
}

pub async fn latest_handler(State(sdk): State<SpiceSniff>) -> ServerResult<Json<TelemetrySample>> {
    sdk.latest().map(Json).ok_or(ServerError::NoSensorData)
}

pub async fn history_handler(State(sdk): State<SpiceSniff>) -> Json<Vec<TelemetrySample>> {
    Json(sdk.history())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRequest {
    pub batch_id: String,
    pub spice: String,
}

/// `POST /api/sensor/commit`: promote the latest reading into an anchored batch.
pub async fn commit_handler(
    State(sdk): State<SpiceSniff>,
    body: Result<Json<CommitRequest>, JsonRejection>,
) -> ServerResult<Json<CommitView>> {
    let Json(request) = body.map_err(|_| ServerError::BadInput("batchId and spice are required".into()))?;
    let batch_id = BatchId::from_input(&request.batch_id).map_err(|e| ServerError::BadInput(e.to_string()))?;
    let receipt = sdk.commit_latest(&batch_id, request.spice.trim()).await?;
    Ok(Json(receipt.into()))
}
