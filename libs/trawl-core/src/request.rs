//! The search-request accumulator.
//!
//! Backends never touch engine JSON mid-flight. They push clauses into
//! the typed slots below, and [`SearchRequest::to_body`] renders the
//! final body exactly once. Rendering is deterministic: slot order is
//! fixed and the JSON maps preserve insertion order.

use serde_json::{json, Map, Value};

/// The arm of a `bool` compound a clause lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolArm {
    Must,
    Should,
    Filter,
    MustNot,
}

/// A `bool` compound under construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoolQuery {
    pub must: Vec<Value>,
    pub should: Vec<Value>,
    pub filter: Vec<Value>,
    pub must_not: Vec<Value>,
}

impl BoolQuery {
    pub fn is_empty(&self) -> bool {
        self.must.is_empty()
            && self.should.is_empty()
            && self.filter.is_empty()
            && self.must_not.is_empty()
    }

    pub fn push(&mut self, arm: BoolArm, clause: Value) {
        match arm {
            BoolArm::Must => self.must.push(clause),
            BoolArm::Should => self.should.push(clause),
            BoolArm::Filter => self.filter.push(clause),
            BoolArm::MustNot => self.must_not.push(clause),
        }
    }

    /// Render as `{"bool": {...}}` with empty arms omitted. `None` when
    /// no arm holds a clause.
    pub fn to_value(&self) -> Option<Value> {
        if self.is_empty() {
            return None;
        }
        let mut arms = Map::new();
        if !self.must.is_empty() {
            arms.insert("must".to_owned(), Value::Array(self.must.clone()));
        }
        if !self.should.is_empty() {
            arms.insert("should".to_owned(), Value::Array(self.should.clone()));
        }
        if !self.filter.is_empty() {
            arms.insert("filter".to_owned(), Value::Array(self.filter.clone()));
        }
        if !self.must_not.is_empty() {
            arms.insert("must_not".to_owned(), Value::Array(self.must_not.clone()));
        }
        Some(json!({ "bool": arms }))
    }
}

/// Where a clause-producing backend writes its clauses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClauseSink {
    /// The main query compound.
    Query,
    /// The post-filter compound, applied after aggregations.
    PostFilter,
    /// The main query compound, with each clause wrapped in
    /// `{"nested": {"path": .., "query": ..}}` first.
    Nested { path: String },
}

/// Accumulating representation of one search request.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub query: BoolQuery,
    pub post_filter: BoolQuery,
    /// Aggregations, keyed by aggregation name.
    pub aggs: Map<String, Value>,
    /// Sort clauses in priority order.
    pub sort: Vec<Value>,
    /// Highlighted fields and their per-field options.
    pub highlight: Map<String, Value>,
    /// Native suggesters, keyed by suggester name.
    pub suggest: Map<String, Value>,
    /// `_source` projection, rendered verbatim.
    pub source: Option<Value>,
    pub from: Option<usize>,
    pub size: Option<usize>,
}

impl SearchRequest {
    pub fn new() -> Self {
        SearchRequest::default()
    }

    /// Push a clause through a sink into the chosen arm.
    pub fn push_clause(&mut self, sink: &ClauseSink, arm: BoolArm, clause: Value) {
        match sink {
            ClauseSink::Query => self.query.push(arm, clause),
            ClauseSink::PostFilter => self.post_filter.push(arm, clause),
            ClauseSink::Nested { path } => {
                let wrapped = json!({
                    "nested": {
                        "path": path,
                        "query": clause,
                    }
                });
                self.query.push(arm, wrapped);
            }
        }
    }

    /// Render the engine JSON body.
    ///
    /// An empty query compound renders as `{"match_all": {}}`; every
    /// other slot is omitted when empty.
    pub fn to_body(&self) -> Value {
        let mut body = Map::new();
        body.insert(
            "query".to_owned(),
            self.query.to_value().unwrap_or_else(|| json!({"match_all": {}})),
        );
        if let Some(post_filter) = self.post_filter.to_value() {
            body.insert("post_filter".to_owned(), post_filter);
        }
        if !self.aggs.is_empty() {
            body.insert("aggs".to_owned(), Value::Object(self.aggs.clone()));
        }
        if !self.sort.is_empty() {
            body.insert("sort".to_owned(), Value::Array(self.sort.clone()));
        }
        if !self.highlight.is_empty() {
            body.insert(
                "highlight".to_owned(),
                json!({"fields": self.highlight.clone()}),
            );
        }
        if !self.suggest.is_empty() {
            body.insert("suggest".to_owned(), Value::Object(self.suggest.clone()));
        }
        if let Some(source) = &self.source {
            body.insert("_source".to_owned(), source.clone());
        }
        if let Some(from) = self.from {
            body.insert("from".to_owned(), json!(from));
        }
        if let Some(size) = self.size {
            body.insert("size".to_owned(), json!(size));
        }
        Value::Object(body)
    }
}
