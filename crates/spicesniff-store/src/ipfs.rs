use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use spicesniff_types::ContentId;

use crate::canonical::canonical_bytes;
use crate::config::IpfsConfig;
use crate::error::{StoreError, StoreResult};
use crate::traits::ContentStore;

/// Kubo-compatible daemon client with public-gateway read fallback.
///
/// Writes go only to the daemon. Reads try the daemon first, then each
/// configured gateway in order; every gateway attempt carries its own
/// timeout so one hung gateway cannot starve the rest of the chain.
pub struct IpfsContentStore {
    client: reqwest::Client,
    config: IpfsConfig,
}

#[derive(Deserialize)]
struct AddResponse {
    #[serde(rename = "Hash")]
    hash: String,
}

#[derive(Deserialize)]
struct VersionResponse {
    #[serde(rename = "Version")]
    version: String,
}

impl IpfsContentStore {
    pub fn new(config: IpfsConfig) -> StoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.api_timeout())
            .build()
            .map_err(|e| StoreError::Config(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &IpfsConfig {
        &self.config
    }

    fn api(&self, path: &str) -> String {
        format!("{}/api/v0/{path}", self.config.api_url.trim_end_matches('/'))
    }

    /// Daemon version string, or `None` if the daemon is unreachable.
    pub async fn version(&self) -> Option<String> {
        let response = self.client.post(self.api("version")).send().await.ok()?;
        let body: VersionResponse = response.error_for_status().ok()?.json().await.ok()?;
        Some(body.version)
    }

    async fn add(&self, bytes: Vec<u8>) -> Result<ContentId, String> {
        let part = Part::bytes(bytes)
            .file_name("batch.json")
            .mime_str("application/json")
            .map_err(|e| e.to_string())?;
        let response = self
            .client
            .post(self.api("add"))
            .multipart(Form::new().part("file", part))
            .send()
            .await
            .map_err(|e| e.to_string())?
            .error_for_status()
            .map_err(|e| e.to_string())?;
        let body: AddResponse = response.json().await.map_err(|e| e.to_string())?;
        ContentId::new(body.hash).map_err(|e| e.to_string())
    }

    async fn pin(&self, id: &ContentId) -> Result<(), String> {
        self.client
            .post(self.api("pin/add"))
            .query(&[("arg", id.as_str())])
            .send()
            .await
            .map_err(|e| e.to_string())?
            .error_for_status()
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    async fn cat(&self, id: &ContentId) -> Result<Value, String> {
        let response = self
            .client
            .post(self.api("cat"))
            .query(&[("arg", id.as_str())])
            .send()
            .await
            .map_err(|e| e.to_string())?
            .error_for_status()
            .map_err(|e| e.to_string())?;
        let bytes = response.bytes().await.map_err(|e| e.to_string())?;
        serde_json::from_slice(&bytes).map_err(|e| e.to_string())
    }

    async fn fetch_gateway(&self, gateway: &str, id: &ContentId) -> Result<Value, String> {
        let url = format!("{}/ipfs/{}", gateway.trim_end_matches('/'), id);
        let attempt = async {
            let response = self
                .client
                .get(&url)
                .timeout(self.config.gateway_timeout())
                .send()
                .await
                .map_err(|e| e.to_string())?
                .error_for_status()
                .map_err(|e| e.to_string())?;
            response.json::<Value>().await.map_err(|e| e.to_string())
        };
        match tokio::time::timeout(self.config.gateway_timeout(), attempt).await {
            Ok(result) => result,
            Err(_) => Err(format!("timed out after {}ms", self.config.gateway_timeout_ms)),
        }
    }
}

#[async_trait]
impl ContentStore for IpfsContentStore {
    async fn store(&self, document: &Value) -> StoreResult<ContentId> {
        let bytes = canonical_bytes(document)?;
        let size = bytes.len();
        let id = self.add(bytes).await.map_err(StoreError::Upload)?;

        match self.pin(&id).await {
            Ok(()) => debug!(cid = %id, "pinned content"),
            Err(e) => warn!(cid = %id, error = %e, "could not pin content; it may be garbage-collected"),
        }

        info!(cid = %id, size, "uploaded document");
        Ok(id)
    }

    async fn retrieve(&self, id: &ContentId) -> StoreResult<Value> {
        match self.cat(id).await {
            Ok(document) => return Ok(document),
            Err(e) => warn!(cid = %id, error = %e, "daemon fetch failed, trying public gateways"),
        }

        for gateway in &self.config.gateways {
            debug!(cid = %id, gateway = %gateway, "trying gateway");
            match self.fetch_gateway(gateway, id).await {
                Ok(document) => {
                    info!(cid = %id, gateway = %gateway, "fetched from gateway");
                    return Ok(document);
                }
                Err(e) => warn!(cid = %id, gateway = %gateway, error = %e, "gateway failed"),
            }
        }

        Err(StoreError::Retrieval {
            content_id: id.clone(),
            attempts: 1 + self.config.gateways.len(),
        })
    }

    async fn is_available(&self) -> bool {
        match self.version().await {
            Some(version) => {
                debug!(version = %version, "ipfs daemon reachable");
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for IpfsContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IpfsContentStore")
            .field("api_url", &self.config.api_url)
            .field("gateways", &self.config.gateways.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use axum::extract::Path;
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;
    use tokio::net::TcpListener;

    async fn spawn(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn failing_daemon() -> Router {
        Router::new()
            .route("/api/v0/cat", post(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
            .route("/api/v0/version", post(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
    }

    fn slow_gateway() -> Router {
        Router::new().route(
            "/ipfs/:cid",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({"from": "slow"}))
            }),
        )
    }

    fn good_gateway() -> Router {
        Router::new().route(
            "/ipfs/:cid",
            get(|Path(cid): Path<String>| async move { Json(json!({"purity": 92, "cid": cid})) }),
        )
    }

    fn store_with(api_url: String, gateways: Vec<String>) -> IpfsContentStore {
        IpfsContentStore::new(IpfsConfig {
            api_url,
            gateways,
            gateway_timeout_ms: 200,
            api_timeout_ms: 2_000,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn falls_back_past_timed_out_gateway() {
        let daemon = spawn(failing_daemon()).await;
        let slow = spawn(slow_gateway()).await;
        let good = spawn(good_gateway()).await;
        let store = store_with(daemon, vec![slow, good]);

        let id = ContentId::new("QmTest").unwrap();
        let started = std::time::Instant::now();
        let doc = store.retrieve(&id).await.unwrap();
        assert_eq!(doc, json!({"purity": 92, "cid": "QmTest"}));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn retrieval_error_when_all_tiers_fail() {
        let daemon = spawn(failing_daemon()).await;
        let slow = spawn(slow_gateway()).await;
        let store = store_with(daemon, vec![slow]);

        let err = store.retrieve(&ContentId::new("QmGone").unwrap()).await.unwrap_err();
        match err {
            StoreError::Retrieval { content_id, attempts } => {
                assert_eq!(content_id.as_str(), "QmGone");
                assert_eq!(attempts, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn unparseable_gateway_body_is_skipped() {
        let daemon = spawn(failing_daemon()).await;
        let garbage = spawn(Router::new().route("/ipfs/:cid", get(|| async { "not json" }))).await;
        let good = spawn(good_gateway()).await;
        let store = store_with(daemon, vec![garbage, good]);

        let doc = store.retrieve(&ContentId::new("QmX").unwrap()).await.unwrap();
        assert_eq!(doc["purity"], json!(92));
    }

    #[tokio::test]
    async fn daemon_serves_before_gateways() {
        let gateway_hits = Arc::new(AtomicUsize::new(0));
        let hits = gateway_hits.clone();
        let daemon = spawn(Router::new().route(
            "/api/v0/cat",
            post(|| async { r#"{"purity":88}"# }),
        ))
        .await;
        let gateway = spawn(Router::new().route(
            "/ipfs/:cid",
            get(move || {
                hits.fetch_add(1, Ordering::SeqCst);
                async { Json(json!({})) }
            }),
        ))
        .await;
        let store = store_with(daemon, vec![gateway]);

        let doc = store.retrieve(&ContentId::new("QmLocal").unwrap()).await.unwrap();
        assert_eq!(doc, json!({"purity": 88}));
        assert_eq!(gateway_hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn store_survives_pin_failure() {
        let daemon = spawn(
            Router::new()
                .route("/api/v0/add", post(|| async { Json(json!({"Hash": "QmAdded", "Size": "12"})) }))
                .route("/api/v0/pin/add", post(|| async { StatusCode::INTERNAL_SERVER_ERROR })),
        )
        .await;
        let store = store_with(daemon, vec![]);

        let id = store.store(&json!({"purity": 92})).await.unwrap();
        assert_eq!(id.as_str(), "QmAdded");
    }

    #[tokio::test]
    async fn upload_failure_is_store_error() {
        let daemon = spawn(
            Router::new().route("/api/v0/add", post(|| async { StatusCode::SERVICE_UNAVAILABLE })),
        )
        .await;
        let store = store_with(daemon, vec![]);

        let err = store.store(&json!({"purity": 92})).await.unwrap_err();
        assert!(matches!(err, StoreError::Upload(_)));
    }

    #[tokio::test]
    async fn availability_reflects_api_reachability() {
        let up = spawn(Router::new().route(
            "/api/v0/version",
            post(|| async { Json(json!({"Version": "0.29.0"})) }),
        ))
        .await;
        let store = store_with(up, vec![]);
        assert!(store.is_available().await);
        assert_eq!(store.version().await.as_deref(), Some("0.29.0"));

        let down = spawn(failing_daemon()).await;
        assert!(!store_with(down, vec![]).is_available().await);
    }
}
