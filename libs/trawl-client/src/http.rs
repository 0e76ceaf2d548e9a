//! Reqwest-backed [`SearchEngine`] implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use trawl_core::{Error, Result, SearchEngine, SearchReply};

const DEFAULT_BASE_URL: &str = "http://localhost:9200";

fn default_timeout_secs() -> u64 {
    30
}

/// Connection settings for one cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpEngineConfig {
    /// Cluster root, such as `http://localhost:9200`.
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Basic-auth credentials, for clusters behind a security layer.
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl Default for HttpEngineConfig {
    fn default() -> Self {
        HttpEngineConfig {
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout_secs: default_timeout_secs(),
            username: None,
            password: None,
        }
    }
}

/// Engine handle speaking the Elasticsearch/OpenSearch REST API.
pub struct HttpEngine {
    client: Client,
    config: HttpEngineConfig,
}

impl HttpEngine {
    pub fn new(config: HttpEngineConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| {
                Error::Misconfigured(format!("failed to build the http client: {err}"))
            })?;
        Ok(HttpEngine { client, config })
    }

    /// Connect to a cluster root with default settings.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        Self::new(HttpEngineConfig {
            base_url: base_url.into(),
            ..HttpEngineConfig::default()
        })
    }

    fn base(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn search_url(&self, index: &str) -> String {
        format!("{}/{}/_search", self.base(), index)
    }

    fn document_url(&self, index: &str, mapping: Option<&str>, id: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.base(),
            index,
            mapping.unwrap_or("_doc"),
            urlencoding::encode(id)
        )
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.username {
            Some(username) => request.basic_auth(username, self.config.password.as_deref()),
            None => request,
        }
    }
}

#[async_trait]
impl SearchEngine for HttpEngine {
    async fn search(&self, index: &str, body: &Value) -> Result<SearchReply> {
        let url = self.search_url(index);
        tracing::debug!(%url, "dispatching search request");
        let response = self
            .authorized(self.client.post(&url).json(body))
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::EngineFailure {
                status: Some(status.as_u16()),
                message: format!("search against `{index}` failed: {message}"),
            });
        }
        let reply: Value = response.json().await.map_err(transport)?;
        Ok(SearchReply::from_value(&reply))
    }

    async fn get_document(
        &self,
        index: &str,
        mapping: Option<&str>,
        id: &str,
        ignore: &[u16],
    ) -> Result<Option<Value>> {
        let url = self.document_url(index, mapping, id);
        tracing::debug!(%url, "fetching document");
        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            if ignore.contains(&status.as_u16()) {
                tracing::debug!(status = status.as_u16(), "ignoring engine status");
                return Ok(None);
            }
            let message = response.text().await.unwrap_or_default();
            return Err(Error::EngineFailure {
                status: Some(status.as_u16()),
                message: format!("get `{id}` from `{index}` failed: {message}"),
            });
        }
        let document: Value = response.json().await.map_err(transport)?;
        Ok(Some(document))
    }
}

fn transport(err: reqwest::Error) -> Error {
    Error::EngineFailure {
        status: err.status().map(|status| status.as_u16()),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(base_url: &str) -> HttpEngine {
        HttpEngine::with_base_url(base_url).unwrap()
    }

    #[test]
    fn search_url_joins_base_and_index() {
        let engine = engine("http://localhost:9200/");
        assert_eq!(
            engine.search_url("books"),
            "http://localhost:9200/books/_search"
        );
    }

    #[test]
    fn document_url_defaults_to_the_doc_segment() {
        let engine = engine("http://localhost:9200");
        assert_eq!(
            engine.document_url("books", None, "54"),
            "http://localhost:9200/books/_doc/54"
        );
        assert_eq!(
            engine.document_url("books", Some("book_document"), "54"),
            "http://localhost:9200/books/book_document/54"
        );
    }

    #[test]
    fn document_ids_are_percent_encoded() {
        let engine = engine("http://localhost:9200");
        assert_eq!(
            engine.document_url("books", None, "isbn/978 0"),
            "http://localhost:9200/books/_doc/isbn%2F978%200"
        );
    }

    #[test]
    fn config_parses_with_defaults() {
        let config: HttpEngineConfig =
            serde_json::from_str(r#"{"base_url": "http://search:9200"}"#).unwrap();
        assert_eq!(config.base_url, "http://search:9200");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.username, None);
    }

    #[tokio::test]
    async fn unreachable_clusters_surface_as_engine_failures() {
        let engine = engine("http://127.0.0.1:1");
        let result = engine
            .search("books", &serde_json::json!({"query": {"match_all": {}}}))
            .await;
        match result {
            Err(Error::EngineFailure { status, .. }) => assert_eq!(status, None),
            other => panic!("expected an engine failure, got {other:?}"),
        }
    }
}
