// SPDX-License-Identifier: MIT

//! Actinia REST client

use super::{Engine, ProcessChain, RunHandle, RunReport, RunStatus};
use crate::config::Config;
use crate::error::{DriverError, Result};
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// HTTP implementation of [`Engine`] for an actinia server
#[derive(Clone)]
pub struct ActiniaEngine {
    client: Client,
    host: Url,
    version: String,
    user: String,
    password: String,
    timeout: Duration,
}

impl ActiniaEngine {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;

        log::info!(
            "Actinia client: base_url={}, user={}, timeout={:?}",
            config.api_base(),
            config.user,
            config.timeout
        );

        Ok(Self {
            client,
            host: config.host.clone(),
            version: config.version.clone(),
            user: config.user.clone(),
            password: config.password.clone(),
            timeout: config.timeout,
        })
    }

    /// Send one request, bounded by the configured timeout
    async fn request(
        &self,
        operation: &str,
        method: Method,
        segments: &[&str],
        body: Option<Value>,
    ) -> Result<Value> {
        let url = self.endpoint(segments)?;
        log::debug!("{} {} ({})", method, url, operation);

        let mut req = self
            .client
            .request(method, url)
            .basic_auth(&self.user, Some(&self.password))
            .header("Accept", "application/json");

        if let Some(b) = body {
            req = req.json(&b);
        }

        let call = async {
            let resp = req.send().await?;
            let status = resp.status();
            let text = resp.text().await?;

            if !status.is_success() {
                return Err(DriverError::engine(status.as_u16(), error_detail(&text)));
            }
            if text.trim().is_empty() {
                return Ok(Value::Null);
            }
            Ok::<Value, DriverError>(serde_json::from_str(&text)?)
        };

        match tokio::time::timeout(self.timeout, call).await {
            Ok(Err(DriverError::Transport(e))) if e.is_timeout() => {
                Err(DriverError::timeout(operation, self.timeout))
            }
            Ok(result) => result,
            Err(_) => Err(DriverError::timeout(operation, self.timeout)),
        }
    }

    async fn list_layers(&self, location: &str, mapset: &str, kind: &str) -> Result<Vec<String>> {
        let operation = format!("list_{}", kind);
        let json = self
            .request(
                &operation,
                Method::GET,
                &["locations", location, "mapsets", mapset, kind],
                None,
            )
            .await?;
        string_list(&json, "process_results")
    }

    /// `<host>/api/<version>/<segments>`, each segment percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.host.clone();
        url.path_segments_mut()
            .map_err(|_| {
                DriverError::config(format!("ACTINIA_HOST '{}' cannot be a base", self.host))
            })?
            .pop_if_empty()
            .push("api")
            .push(&self.version)
            .extend(segments);
        Ok(url)
    }
}

/// Prefer the `message` field of an actinia error body over the raw text
fn error_detail(text: &str) -> String {
    serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| text.to_string())
}

fn string_list(json: &Value, key: &str) -> Result<Vec<String>> {
    let items = json
        .get(key)
        .and_then(|v| v.as_array())
        .ok_or_else(|| DriverError::engine(200, format!("Missing '{}' in response", key)))?;

    Ok(items
        .iter()
        .filter_map(|item| item.as_str().map(str::to_string))
        .collect())
}

fn run_report(json: &Value, fallback: Option<&RunHandle>) -> Result<RunReport> {
    let handle = match json.get("resource_id").and_then(|v| v.as_str()) {
        Some(id) => RunHandle {
            resource_id: id.to_string(),
        },
        None => fallback
            .cloned()
            .ok_or_else(|| DriverError::engine(200, "Missing 'resource_id' in response"))?,
    };

    let status = json
        .get("status")
        .and_then(|v| v.as_str())
        .map(RunStatus::parse)
        .unwrap_or(RunStatus::Accepted);

    let results = json
        .get("urls")
        .and_then(|u| u.get("resources"))
        .and_then(|r| r.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|r| r.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    let message = json
        .get("message")
        .and_then(|m| m.as_str())
        .map(str::to_string);

    Ok(RunReport {
        handle,
        status,
        results,
        message,
    })
}

#[async_trait]
impl Engine for ActiniaEngine {
    async fn list_mapsets(&self, location: &str) -> Result<Vec<String>> {
        let json = self
            .request(
                "list_mapsets",
                Method::GET,
                &["locations", location, "mapsets"],
                None,
            )
            .await?;
        string_list(&json, "process_results")
    }

    async fn list_raster(&self, location: &str, mapset: &str) -> Result<Vec<String>> {
        self.list_layers(location, mapset, "raster_layers").await
    }

    async fn list_vector(&self, location: &str, mapset: &str) -> Result<Vec<String>> {
        self.list_layers(location, mapset, "vector_layers").await
    }

    async fn list_strds(&self, location: &str, mapset: &str) -> Result<Vec<String>> {
        self.list_layers(location, mapset, "strds").await
    }

    async fn list_modules(&self) -> Result<Vec<Value>> {
        let json = self
            .request("list_modules", Method::GET, &["modules"], None)
            .await?;
        json.get("processes")
            .and_then(|p| p.as_array())
            .cloned()
            .ok_or_else(|| DriverError::engine(200, "Missing 'processes' in response"))
    }

    async fn submit(&self, location: &str, chain: &ProcessChain) -> Result<RunReport> {
        let body = serde_json::to_value(chain)?;
        let json = self
            .request(
                "submit",
                Method::POST,
                &["locations", location, "processing_async_export"],
                Some(body),
            )
            .await?;
        run_report(&json, None)
    }

    async fn status(&self, handle: &RunHandle) -> Result<RunReport> {
        let json = self
            .request(
                "status",
                Method::GET,
                &["resources", &self.user, &handle.resource_id],
                None,
            )
            .await?;
        run_report(&json, Some(handle))
    }

    async fn cancel(&self, handle: &RunHandle) -> Result<()> {
        self.request(
            "cancel",
            Method::DELETE,
            &["resources", &self.user, &handle.resource_id],
            None,
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actinia::Instruction;
    use axum::{
        extract::Path,
        http::{StatusCode, Uri},
        routing::{get, post},
        Json, Router,
    };
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    async fn spawn_stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn engine_for(host: &str) -> ActiniaEngine {
        let config = Config::from_lookup(|key| match key {
            "ACTINIA_HOST" => Some(host.to_string()),
            "ACTINIA_USER" => Some("tester".to_string()),
            "ACTINIA_TIMEOUT_SECS" => Some("1".to_string()),
            _ => None,
        })
        .unwrap();
        ActiniaEngine::new(&config).unwrap()
    }

    fn stub_router() -> Router {
        Router::new()
            .route(
                "/api/v3/locations/{location}/mapsets",
                get(|Path(location): Path<String>| async move {
                    Json(json!({"process_results": ["PERMANENT", location]}))
                }),
            )
            .route(
                "/api/v3/locations/{location}/mapsets/{mapset}/strds",
                get(|| async { Json(json!({"process_results": ["lsat5_1987_10"]})) }),
            )
            .route(
                "/api/v3/locations/{location}/mapsets/{mapset}/raster_layers",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(3)).await;
                    Json(json!({"process_results": []}))
                }),
            )
            .route(
                "/api/v3/modules",
                get(|| async {
                    (
                        StatusCode::UNAUTHORIZED,
                        Json(json!({"message": "Wrong credentials"})),
                    )
                }),
            )
            .route(
                "/api/v3/locations/{location}/processing_async_export",
                post(|Json(body): Json<Value>| async move {
                    let n = body["list"].as_array().map(|l| l.len()).unwrap_or(0);
                    Json(json!({
                        "resource_id": format!("resource_id-{}", n),
                        "status": "accepted"
                    }))
                }),
            )
            .route(
                "/api/v3/resources/{user}/{id}",
                get(|Path((user, id)): Path<(String, String)>| async move {
                    Json(json!({
                        "status": "finished",
                        "message": format!("{} {}", user, id),
                        "urls": {"resources": ["https://example.com/out.tif"]}
                    }))
                })
                .delete(|| async { Json(json!({"status": "terminated"})) }),
            )
    }

    #[tokio::test]
    async fn test_list_mapsets_and_strds() {
        let host = spawn_stub(stub_router()).await;
        let engine = engine_for(&host);

        let mapsets = engine.list_mapsets("nc_spm_08").await.unwrap();
        assert_eq!(mapsets, vec!["PERMANENT", "nc_spm_08"]);

        let strds = engine.list_strds("nc_spm_08", "landsat").await.unwrap();
        assert_eq!(strds, vec!["lsat5_1987_10"]);
    }

    #[tokio::test]
    async fn test_non_success_code_is_engine_error() {
        let host = spawn_stub(stub_router()).await;
        let engine = engine_for(&host);

        match engine.list_modules().await {
            Err(DriverError::Engine { code, detail }) => {
                assert_eq!(code, 401);
                assert_eq!(detail, "Wrong credentials");
            }
            other => panic!("expected engine error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_slow_engine_times_out() {
        let host = spawn_stub(stub_router()).await;
        let engine = engine_for(&host);

        let err = engine.list_raster("nc_spm_08", "PERMANENT").await.unwrap_err();
        assert_eq!(err.kind(), "TransportTimeout");
    }

    #[tokio::test]
    async fn test_submit_status_cancel() {
        let host = spawn_stub(stub_router()).await;
        let engine = engine_for(&host);

        let chain = ProcessChain::new(vec![
            Instruction::new("t.rast.extract"),
            Instruction::new("t.rast.hants"),
        ]);
        let report = engine.submit("nc_spm_08", &chain).await.unwrap();
        assert_eq!(report.handle.resource_id, "resource_id-2");
        assert_eq!(report.status, RunStatus::Accepted);

        let status = engine.status(&report.handle).await.unwrap();
        assert_eq!(status.status, RunStatus::Finished);
        assert_eq!(status.handle, report.handle);
        assert_eq!(status.results, vec!["https://example.com/out.tif"]);
        assert_eq!(status.message.as_deref(), Some("tester resource_id-2"));

        engine.cancel(&report.handle).await.unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_engine_is_transport_error() {
        // Nothing listens on the discard port
        let engine = engine_for("http://127.0.0.1:9");
        let err = engine.list_mapsets("nc_spm_08").await.unwrap_err();
        assert!(matches!(
            err,
            DriverError::Transport(_) | DriverError::TransportTimeout { .. }
        ));
    }

    #[tokio::test]
    async fn test_location_stays_one_path_segment() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let router = Router::new()
            .route(
                "/api/v3/locations/{location}/processing_async_export",
                post(|Path(location): Path<String>| async move {
                    Json(json!({"resource_id": location, "status": "accepted"}))
                }),
            )
            .fallback({
                let seen = seen.clone();
                move |uri: Uri| async move {
                    seen.lock().unwrap().push(uri.path().to_string());
                    StatusCode::NOT_FOUND
                }
            });
        let host = spawn_stub(router).await;
        let engine = engine_for(&host);

        let location = "nc_spm_08/mapsets/PERMANENT/raster_layers#";
        let report = engine
            .submit(location, &ProcessChain::new(vec![]))
            .await
            .unwrap();
        assert_eq!(report.handle.resource_id, location);
        assert!(seen.lock().unwrap().is_empty());

        let url = engine.endpoint(&["locations", "a?b", "mapsets"]).unwrap();
        assert_eq!(url.path(), "/api/v3/locations/a%3Fb/mapsets");
        assert!(url.query().is_none());
    }

    #[test]
    fn test_endpoint_keeps_host_path_prefix() {
        let engine = engine_for("http://localhost:8088/actinia/");
        let url = engine.endpoint(&["resources", "tester", "id-1"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8088/actinia/api/v3/resources/tester/id-1"
        );
    }

    #[test]
    fn test_error_detail_falls_back_to_text() {
        assert_eq!(error_detail("plain failure"), "plain failure");
        assert_eq!(error_detail(r#"{"message": "nope"}"#), "nope");
    }
}
