use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Json, Response};
use serde_json::{json, Value};
use tracing::info;

use spicesniff_sdk::{BatchId, SpiceSniff};

use crate::error::{ServerError, ServerResult};
use crate::view::{BatchView, HydratedBatchView, SubmitView};

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Liveness plus content-store reachability.
pub async fn health_handler(State(sdk): State<SpiceSniff>) -> Json<Value> {
    Json(json!({
        "ok": true,
        "time": now_rfc3339(),
        "ipfs": sdk.store_available().await,
    }))
}

pub async fn status_handler(State(sdk): State<SpiceSniff>) -> Json<Value> {
    let status = sdk.status().await;
    Json(json!({
        "status": "ok",
        "timestamp": now_rfc3339(),
        "services": {
            "ipfs": status.store,
            "blockchain": status.ledger,
            "server": true,
        },
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// `POST /sensor`: store the whole body as the batch document and anchor it.
pub async fn submit_handler(
    State(sdk): State<SpiceSniff>,
    body: Result<Json<Value>, JsonRejection>,
) -> ServerResult<Json<SubmitView>> {
    let Json(document) = body.map_err(|e| ServerError::BadInput(e.body_text()))?;

    let field = |name: &str| {
        document
            .get(name)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    let (Some(batch_id), Some(spice)) = (field("batch_id"), field("spice")) else {
        return Err(ServerError::BadInput("batch_id and spice are required".into()));
    };
    let batch_id = BatchId::from_input(&batch_id).map_err(|e| ServerError::BadInput(e.to_string()))?;

    info!(batch_id = %batch_id, "receiving batch");
    let receipt = sdk.submit_batch(&batch_id, &spice, &document).await?;
    Ok(Json(receipt.into()))
}

/// `GET /batch/:id`: on-chain metadata hydrated with the stored document.
pub async fn batch_handler(
    State(sdk): State<SpiceSniff>,
    Path(id): Path<String>,
) -> ServerResult<Json<HydratedBatchView>> {
    let batch_id = BatchId::new(id).map_err(|e| ServerError::BadInput(e.to_string()))?;
    let fetched = sdk.fetch_batch(&batch_id).await?;
    Ok(Json(fetched.into()))
}

pub async fn batches_handler(State(sdk): State<SpiceSniff>) -> ServerResult<Json<Vec<BatchView>>> {
    let records = sdk.list_batches().await?;
    Ok(Json(records.iter().map(BatchView::from).collect()))
}

pub async fn not_found_handler(uri: Uri) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Endpoint not found",
            "code": "NOT_FOUND",
            "path": uri.path(),
            "timestamp": now_rfc3339(),
        })),
    )
        .into_response()
}
