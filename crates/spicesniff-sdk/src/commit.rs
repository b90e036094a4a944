use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use spicesniff_types::{BatchId, TelemetrySample};

use crate::batch::SubmitReceipt;

/// Result of promoting the latest live sample into an anchored batch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommitReceipt {
    #[serde(flatten)]
    pub submit: SubmitReceipt,
    pub purity: Option<f64>,
    pub grade: Option<String>,
}

/// Build the batch document for a promoted sample.
///
/// Shape: `{batch_id, spice, sensor_data: {deviceId, timestamp, measurements, purity, grade}}`.
pub fn promotion_document(batch_id: &BatchId, spice_kind: &str, sample: &TelemetrySample) -> Value {
    json!({
        "batch_id": batch_id.as_str(),
        "spice": spice_kind,
        "sensor_data": {
            "deviceId": sample.device_id,
            "timestamp": sample.server_ts,
            "measurements": sample.measurements,
            "purity": sample.purity,
            "grade": sample.grade,
        }
    })
}
