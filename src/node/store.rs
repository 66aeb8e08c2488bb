/// Config store client
///
/// The orchestrator keeps each node's settings; the node reads and writes them
/// through `/api/admin/external/config/{id}`, forwarding the caller's token.

use super::NodeConfig;
use reqwest::{Client, StatusCode, Url};
use std::time::Duration;
use thiserror::Error;

const CONFIG_PATH: [&str; 4] = ["api", "admin", "external", "config"];
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("config store request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("config store answered {0}")]
    Status(StatusCode),
    #[error("invalid config store url '{0}'")]
    Url(String),
    #[error("stored config is not valid: {0}")]
    Decode(#[from] serde_json::Error),
}

/// HTTP client for the orchestrator's per-node config API
#[derive(Debug, Clone)]
pub struct ConfigStore {
    client: Client,
    base_url: Url,
}

impl ConfigStore {
    pub fn new(proxeus_url: &str) -> Result<Self, StoreError> {
        let base_url = Url::parse(proxeus_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| StoreError::Url(proxeus_url.to_string()))?;
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, base_url })
    }

    /// `{base}/api/admin/external/config/{node_id}` with the id as one encoded segment
    fn config_url(&self, node_id: &str) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Url(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(CONFIG_PATH)
            .push(node_id);
        Ok(url)
    }

    /// Fetch the stored settings of a node
    pub async fn get(&self, node_id: &str, token: &str) -> Result<NodeConfig, StoreError> {
        let response = self
            .client
            .get(self.config_url(node_id)?)
            .query(&[("auth", token)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status(status));
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Persist the settings of a node
    pub async fn set(
        &self,
        node_id: &str,
        token: &str,
        config: &NodeConfig,
    ) -> Result<(), StoreError> {
        let response = self
            .client
            .post(self.config_url(node_id)?)
            .query(&[("auth", token)])
            .json(config)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status(status));
        }
        Ok(())
    }

    /// Stored settings, or the built-in defaults when the store cannot provide them
    pub async fn load_or_default(&self, node_id: &str, token: &str) -> NodeConfig {
        match self.get(node_id, token).await {
            Ok(config) => {
                tracing::debug!("📥 Loaded stored config for node {}", node_id);
                config
            }
            Err(e) => {
                tracing::warn!("⚠️ Using default config for node {}: {}", node_id, e);
                NodeConfig::defaults()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn stored() -> serde_json::Value {
        json!({
            "EmailFrom": "flows@example.com",
            "EmailTo": "ops@example.com",
            "EmailSubject": "Rates",
            "EmailBody": "Rate: %s",
            "Replacement": "rate"
        })
    }

    #[tokio::test]
    async fn get_decodes_stored_config() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/admin/external/config/node-1"))
            .and(query_param("auth", "tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(stored()))
            .expect(1)
            .mount(&server)
            .await;

        let store = ConfigStore::new(&server.uri()).unwrap();
        let config = store.get("node-1", "tok").await.unwrap();

        assert_eq!(config.email_from, "flows@example.com");
        assert_eq!(config.replacement, "rate");
    }

    #[tokio::test]
    async fn null_fields_keep_the_rest_of_the_stored_config() {
        let server = MockServer::start().await;
        let mut config = stored();
        config["Replacement"] = serde_json::Value::Null;
        Mock::given(method("GET"))
            .and(path("/api/admin/external/config/node-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(config))
            .mount(&server)
            .await;

        let store = ConfigStore::new(&server.uri()).unwrap();
        let config = store.load_or_default("node-1", "tok").await;

        assert_eq!(config.email_from, "flows@example.com");
        assert_eq!(config.email_to, "ops@example.com");
        assert_eq!(config.email_body, "Rate: %s");
        assert_eq!(config.replacement, "");
    }

    #[tokio::test]
    async fn node_id_is_sent_as_a_single_path_segment() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/admin/external/config/a%2Fb%3Fc%23d"))
            .and(query_param("auth", "tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(stored()))
            .expect(1)
            .mount(&server)
            .await;

        let store = ConfigStore::new(&server.uri()).unwrap();
        let config = store.get("a/b?c#d", "tok").await.unwrap();
        assert_eq!(config.replacement, "rate");
    }

    #[test]
    fn unusable_base_url_is_rejected() {
        assert!(matches!(ConfigStore::new("not a url"), Err(StoreError::Url(_))));
        assert!(matches!(ConfigStore::new("mailto:x@example.com"), Err(StoreError::Url(_))));
    }

    #[tokio::test]
    async fn set_posts_pascal_case_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/admin/external/config/node-1"))
            .and(query_param("auth", "tok"))
            .and(body_json(stored()))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let config: NodeConfig = serde_json::from_value(stored()).unwrap();
        let store = ConfigStore::new(&format!("{}/", server.uri())).unwrap();
        store.set("node-1", "tok", &config).await.unwrap();
    }

    #[tokio::test]
    async fn set_reports_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let store = ConfigStore::new(&server.uri()).unwrap();
        let err = store
            .set("node-1", "tok", &NodeConfig::defaults())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Status(status) if status.as_u16() == 403));
    }

    #[tokio::test]
    async fn missing_config_falls_back_to_defaults() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let store = ConfigStore::new(&server.uri()).unwrap();
        assert_eq!(store.load_or_default("node-1", "tok").await, NodeConfig::defaults());
    }

    #[tokio::test]
    async fn garbage_config_falls_back_to_defaults() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let store = ConfigStore::new(&server.uri()).unwrap();
        assert!(matches!(
            store.get("node-1", "tok").await,
            Err(StoreError::Decode(_))
        ));
        assert_eq!(store.load_or_default("node-1", "tok").await, NodeConfig::defaults());
    }
}
