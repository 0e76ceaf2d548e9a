//! Document views.
//!
//! A [`DocumentView`] binds one [`ViewConfig`] to one engine connection
//! and answers the five read actions: list, detail, suggest, functional
//! suggest and more-like-this. Each action compiles the query-string
//! parameters through the backend pipeline, makes at most one engine
//! call and shapes the reply into its envelope.

use std::sync::Arc;

use serde_json::{json, Map, Value};
use tracing::debug;

use crate::backends::functional_suggest::{self, FunctionalSuggestion};
use crate::backends::{compile, Action, CompileContext};
use crate::config::{MoreLikeThisConfig, ViewConfig};
use crate::engine::{SearchEngine, SearchReply};
use crate::error::{Error, Result};
use crate::pagination::{paginate, ResolvedWindow};
use crate::params::RequestParams;
use crate::request::{BoolArm, SearchRequest};

pub struct DocumentView {
    config: ViewConfig,
    engine: Arc<dyn SearchEngine>,
}

impl DocumentView {
    /// Build a view, validating its configuration up front.
    pub fn new(config: ViewConfig, engine: Arc<dyn SearchEngine>) -> Result<DocumentView> {
        config.validate()?;
        Ok(DocumentView { config, engine })
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// Answer a list request with the `{count, next, previous, facets?,
    /// results}` envelope.
    ///
    /// `pairs` are the raw query parameters in request order; `base_url`
    /// is prepended to the paging links when given.
    pub async fn list(&self, pairs: &[(String, String)], base_url: Option<&str>) -> Result<Value> {
        let params = self.params(pairs);
        let mut acc = compile(&params, &self.config, Action::List)?;
        let window = self.config.pagination.resolve(&params)?;
        self.check_window(&window)?;
        acc.from = Some(window.from());
        acc.size = Some(window.fetch_size());
        let reply = self.dispatch(&acc.to_body()).await?;
        self.envelope(&window, reply, pairs, base_url)
    }

    /// Answer a detail request with the projected document.
    ///
    /// An `id` field resolves through the engine's direct document GET;
    /// any other id field goes through a uniqueness-checked term filter.
    /// A status suppressed by `detail_ignore_statuses` answers with a
    /// null body instead of an error.
    pub async fn retrieve(&self, id: &str) -> Result<Value> {
        let descriptor = &self.config.document;
        if descriptor.id_field == "id" {
            let reply = self
                .engine
                .get_document(
                    &descriptor.index,
                    self.mapping_segment(),
                    id,
                    &self.config.detail_ignore_statuses,
                )
                .await?;
            let Some(document) = reply else {
                return Ok(Value::Null);
            };
            return Ok(document.get("_source").cloned().unwrap_or(Value::Null));
        }

        let field = descriptor.id_field.as_str();
        let mut acc = SearchRequest::new();
        acc.query.push(BoolArm::Filter, json!({"term": {field: id}}));
        // Two hits are enough to tell unique from ambiguous.
        acc.size = Some(2);
        let reply = self.dispatch(&acc.to_body()).await?;
        if reply.total > 1 {
            return Err(Error::NotFound(
                "multiple results match the given query".to_owned(),
            ));
        }
        let Some(hit) = reply.hits.first() else {
            return Err(Error::NotFound("no result matches the given query".to_owned()));
        };
        Ok(hit.get("_source").cloned().unwrap_or(Value::Null))
    }

    /// Answer a suggest request with the engine's `suggest` subdocument,
    /// keyed by raw parameter name. No parameter matching a configured
    /// suggester means an empty map, without an engine call.
    pub async fn suggest(&self, pairs: &[(String, String)]) -> Result<Value> {
        let params = self.params(pairs);
        let acc = compile(&params, &self.config, Action::Suggest)?;
        if acc.suggest.is_empty() {
            return Ok(json!({}));
        }
        let reply = self.dispatch(&acc.to_body()).await?;
        Ok(reply.suggest.unwrap_or_else(|| json!({})))
    }

    /// Answer a functional-suggest request.
    ///
    /// The reply mimics the native suggest shape, synthesized from plain
    /// hits: each hit becomes an option with a `text` read from its
    /// source.
    pub async fn functional_suggest(&self, pairs: &[(String, String)]) -> Result<Value> {
        let params = self.params(pairs);
        let acc = compile(&params, &self.config, Action::FunctionalSuggest)?;
        let ctx = CompileContext {
            params: &params,
            config: &self.config,
            action: Action::FunctionalSuggest,
        };
        let suggestion = functional_suggest::picked(&ctx)?;
        let reply = self.dispatch(&acc.to_body()).await?;
        Ok(functional_envelope(&suggestion, reply))
    }

    /// Answer a more-like-this request for the given document, shaped
    /// like a list.
    pub async fn more_like_this(
        &self,
        id: &str,
        pairs: &[(String, String)],
        base_url: Option<&str>,
    ) -> Result<Value> {
        let Some(mlt) = &self.config.more_like_this else {
            return Err(Error::Misconfigured(
                "more-like-this is not configured for this view".to_owned(),
            ));
        };
        let params = self.params(pairs);
        let mut acc = compile(&params, &self.config, Action::MoreLikeThis)?;
        // Similarity results are relevance-ordered.
        acc.sort.clear();
        acc.query
            .push(BoolArm::Must, self.more_like_this_clause(mlt, id));
        let window = self.config.pagination.resolve(&params)?;
        self.check_window(&window)?;
        acc.from = Some(window.from());
        acc.size = Some(window.fetch_size());
        let reply = self.dispatch(&acc.to_body()).await?;
        self.envelope(&window, reply, pairs, base_url)
    }

    fn params(&self, pairs: &[(String, String)]) -> RequestParams {
        RequestParams::from_pairs(pairs, &self.config.separators)
    }

    async fn dispatch(&self, body: &Value) -> Result<SearchReply> {
        debug!(index = %self.config.document.index, "dispatching search");
        self.engine.search(&self.config.document.index, body).await
    }

    /// Pre-7 engines address documents through their mapping type.
    fn mapping_segment(&self) -> Option<&str> {
        if self.config.engine_version < 7 {
            self.config.document.mapping.as_deref()
        } else {
            None
        }
    }

    /// The engine rejects windows reaching past `index.max_result_window`,
    /// so such requests are answered locally.
    fn check_window(&self, window: &ResolvedWindow) -> Result<()> {
        let end = window.from() + window.fetch_size();
        if end > self.config.max_result_window {
            return Err(Error::MalformedParameter(format!(
                "requested window ends at {end}, past the result window of {}",
                self.config.max_result_window
            )));
        }
        Ok(())
    }

    fn more_like_this_clause(&self, mlt: &MoreLikeThisConfig, id: &str) -> Value {
        let descriptor = &self.config.document;
        let mut like = Map::new();
        like.insert("_index".to_owned(), json!(descriptor.index));
        like.insert("_id".to_owned(), json!(id));
        if self.config.engine_version < 7 {
            if let Some(mapping) = &descriptor.mapping {
                like.insert("_type".to_owned(), json!(mapping));
            }
        }
        let mut body = Map::new();
        if !mlt.fields.is_empty() {
            body.insert("fields".to_owned(), json!(mlt.fields));
        }
        body.insert("like".to_owned(), json!([like]));
        body.extend(mlt.options.clone());
        json!({"more_like_this": body})
    }

    fn envelope(
        &self,
        window: &ResolvedWindow,
        reply: SearchReply,
        pairs: &[(String, String)],
        base_url: Option<&str>,
    ) -> Result<Value> {
        let facets = reply.aggregations;
        let page = paginate(
            window,
            reply.hits,
            reply.total as usize,
            reply.total_relation,
            pairs,
            base_url,
        )?;
        let results: Vec<Value> = page.results.iter().map(project).collect();
        let mut envelope = Map::new();
        envelope.insert("count".to_owned(), json!(page.count));
        if let Some(relation) = page.count_relation {
            envelope.insert("count_relation".to_owned(), json!(relation));
        }
        envelope.insert("next".to_owned(), page.next.map_or(Value::Null, Value::String));
        envelope.insert(
            "previous".to_owned(),
            page.previous.map_or(Value::Null, Value::String),
        );
        if let Some(facets) = facets {
            envelope.insert("facets".to_owned(), facets);
        }
        envelope.insert("results".to_owned(), Value::Array(results));
        Ok(Value::Object(envelope))
    }
}

/// One result entry: the document source with any highlight attached.
fn project(hit: &Value) -> Value {
    let mut doc = hit.get("_source").cloned().unwrap_or_else(|| json!({}));
    if let Some(highlight) = hit.get("highlight") {
        if let Some(object) = doc.as_object_mut() {
            object.insert("highlight".to_owned(), highlight.clone());
        }
    }
    doc
}

fn functional_envelope(suggestion: &FunctionalSuggestion, reply: SearchReply) -> Value {
    let options: Vec<Value> = reply
        .hits
        .into_iter()
        .map(|mut hit| {
            let text = hit
                .get("_source")
                .and_then(|source| source.get(&suggestion.serializer_field))
                .cloned()
                .unwrap_or(Value::Null);
            if let Some(object) = hit.as_object_mut() {
                object.insert("text".to_owned(), text);
            }
            hit
        })
        .collect();
    let mut entry = Map::new();
    entry.insert("text".to_owned(), json!(suggestion.text));
    entry.insert("options".to_owned(), Value::Array(options));
    entry.insert("length".to_owned(), json!(suggestion.text.chars().count()));
    entry.insert("offset".to_owned(), json!(0));
    let mut envelope = Map::new();
    envelope.insert(suggestion.param.clone(), json!([entry]));
    envelope.insert(
        "_shards".to_owned(),
        reply.shards.unwrap_or_else(|| json!({})),
    );
    Value::Object(envelope)
}
