use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A live sensor reading pushed by a field device.
///
/// Samples are ephemeral: they are held in memory as the latest reading and
/// in a bounded history, and are only persisted when explicitly promoted
/// into a batch record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    #[serde(rename = "deviceId")]
    pub device_id: String,
    /// Whether the device considers its sensors warmed up and the reading valid.
    #[serde(default, alias = "availability")]
    pub available: bool,
    /// Derived purity score reported by the device.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    /// Server receive time in milliseconds since the Unix epoch.
    #[serde(rename = "_serverTs", default, skip_serializing_if = "Option::is_none")]
    pub server_ts: Option<u64>,
    /// All remaining device fields (temperature, humidity, gas resistances, ...).
    #[serde(flatten)]
    pub measurements: Map<String, Value>,
}

impl TelemetrySample {
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            available: false,
            purity: None,
            grade: None,
            server_ts: None,
            measurements: Map::new(),
        }
    }

    pub fn with_purity(mut self, purity: f64, grade: impl Into<String>) -> Self {
        self.available = true;
        self.purity = Some(purity);
        self.grade = Some(grade.into());
        self
    }

    pub fn with_measurement(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.measurements.insert(key.into(), value.into());
        self
    }

    /// Record the server receive time.
    pub fn stamp(&mut self, now_ms: u64) {
        self.server_ts = Some(now_ms);
    }

    /// A sample can be promoted only once the device reports it available
    /// with a positive purity score.
    pub fn is_ready(&self) -> bool {
        self.available && self.purity.is_some_and(|p| p > 0.0)
    }
}
