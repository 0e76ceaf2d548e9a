//! The engine seam.
//!
//! Views talk to Elasticsearch or OpenSearch through [`SearchEngine`],
//! so the compilation pipeline and the response envelopes can be tested
//! against a fake, and the HTTP transport lives in its own crate.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// One search cluster, reachable by index name.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Execute a `_search` body and return the parsed reply.
    async fn search(&self, index: &str, body: &Value) -> Result<SearchReply>;

    /// Fetch one document by id.
    ///
    /// `mapping` is the pre-7 document type segment; engines at version 7
    /// and above receive `_doc`. A reply whose HTTP status appears in
    /// `ignore` resolves to `None` instead of an error.
    async fn get_document(
        &self,
        index: &str,
        mapping: Option<&str>,
        id: &str,
        ignore: &[u16],
    ) -> Result<Option<Value>>;
}

/// Parsed `_search` reply.
///
/// Both total shapes are accepted: the pre-7 bare number and the 7.x
/// `{"value": .., "relation": ..}` object. Everything else is carried
/// verbatim for the envelopes.
#[derive(Debug, Clone, Default)]
pub struct SearchReply {
    /// Total hit count across the whole result set.
    pub total: u64,
    /// Count relation reported by the engine, usually `eq` or `gte`.
    pub total_relation: Option<String>,
    /// Hit objects, `_source` and metadata included.
    pub hits: Vec<Value>,
    pub aggregations: Option<Value>,
    pub suggest: Option<Value>,
    pub shards: Option<Value>,
}

impl SearchReply {
    pub fn from_value(reply: &Value) -> SearchReply {
        let hits_section = reply.get("hits");
        let (total, total_relation) = match hits_section.and_then(|hits| hits.get("total")) {
            Some(Value::Number(total)) => (total.as_u64().unwrap_or(0), None),
            Some(Value::Object(total)) => (
                total.get("value").and_then(Value::as_u64).unwrap_or(0),
                total
                    .get("relation")
                    .and_then(Value::as_str)
                    .map(str::to_owned),
            ),
            _ => (0, None),
        };
        let hits = hits_section
            .and_then(|hits| hits.get("hits"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        SearchReply {
            total,
            total_relation,
            hits,
            aggregations: reply.get("aggregations").cloned(),
            suggest: reply.get("suggest").cloned(),
            shards: reply.get("_shards").cloned(),
        }
    }
}
