//! Free-text search backends.
//!
//! The compound backend reads the `search` parameter and runs the
//! view's configured sub-queries per value: match-family clauses over
//! `search_fields` and nested clauses over `search_nested_fields`. The
//! multi-match and simple-query-string backends each read their own
//! parameter and emit a single fielded clause.
//!
//! A value of the form `field:term` restricts a match clause to that
//! one field; `f1,f2:term` restricts a fielded clause to that subset.
//! Restriction never escapes the whitelist: unknown names are dropped
//! from the subset, and a match clause with an unknown prefix is
//! dropped entirely.

use serde_json::{json, Map, Value};

use crate::config::{MatchMode, SearchFieldOptions, SearchFields, SearchQueryKind};
use crate::error::Result;
use crate::request::{BoolArm, SearchRequest};

use super::{CompileContext, FilterBackend};

const SEARCH_PARAM: &str = "search";
const MULTI_MATCH_PARAM: &str = "search_multi_match";
const SIMPLE_QUERY_STRING_PARAM: &str = "search_simple_query_string";

pub struct CompoundSearchBackend;

impl FilterBackend for CompoundSearchBackend {
    fn apply(&self, ctx: &CompileContext<'_>, acc: &mut SearchRequest) -> Result<()> {
        let mut clauses = Vec::new();
        for kind in &ctx.config.search_query_kinds {
            match kind {
                SearchQueryKind::Match => match_clauses(ctx, "match", &mut clauses),
                SearchQueryKind::MatchPhrase => match_clauses(ctx, "match_phrase", &mut clauses),
                SearchQueryKind::MatchPhrasePrefix => {
                    match_clauses(ctx, "match_phrase_prefix", &mut clauses)
                }
                SearchQueryKind::Nested => nested_clauses(ctx, &mut clauses),
            }
        }
        if let Some(clause) = combined(clauses, ctx.config.search_matching) {
            acc.query.push(BoolArm::Must, clause);
        }
        Ok(())
    }
}

pub struct MultiMatchSearchBackend;

impl FilterBackend for MultiMatchSearchBackend {
    fn apply(&self, ctx: &CompileContext<'_>, acc: &mut SearchRequest) -> Result<()> {
        // Repeated occurrences are not additive here; the first wins.
        if let Some(value) = ctx.params.first_value(MULTI_MATCH_PARAM) {
            acc.query.push(
                BoolArm::Must,
                fielded_clause(
                    ctx,
                    "multi_match",
                    value,
                    ctx.config.multi_match_fields(),
                    &ctx.config.multi_match_options,
                ),
            );
        }
        Ok(())
    }
}

pub struct SimpleQueryStringSearchBackend;

impl FilterBackend for SimpleQueryStringSearchBackend {
    fn apply(&self, ctx: &CompileContext<'_>, acc: &mut SearchRequest) -> Result<()> {
        if let Some(value) = ctx.params.first_value(SIMPLE_QUERY_STRING_PARAM) {
            acc.query.push(
                BoolArm::Must,
                fielded_clause(
                    ctx,
                    "simple_query_string",
                    value,
                    ctx.config.simple_query_string_fields(),
                    &ctx.config.simple_query_string_options,
                ),
            );
        }
        Ok(())
    }
}

/// Zero clauses emit nothing, one is emitted bare, more are wrapped in
/// a `bool` under the given matching arm.
fn combined(clauses: Vec<Value>, matching: MatchMode) -> Option<Value> {
    match clauses.len() {
        0 => None,
        1 => clauses.into_iter().next(),
        _ => {
            let mut arms = Map::new();
            arms.insert(matching.as_str().to_owned(), Value::Array(clauses));
            Some(json!({"bool": arms}))
        }
    }
}

fn match_clauses(ctx: &CompileContext<'_>, operator: &str, out: &mut Vec<Value>) {
    let table = &ctx.config.search_fields;
    for value in ctx.params.values_for(SEARCH_PARAM) {
        match ctx.config.separators.split_named(value) {
            Some((field, term)) => {
                if table.contains(field) {
                    out.push(match_clause(operator, field, table.options_for(field), term));
                }
            }
            None => {
                for (field, options) in table.entries() {
                    out.push(match_clause(operator, field, options, value));
                }
            }
        }
    }
}

fn match_clause(
    operator: &str,
    field: &str,
    options: Option<&SearchFieldOptions>,
    term: &str,
) -> Value {
    let field_name = options.and_then(|o| o.field.as_deref()).unwrap_or(field);
    let mut body = Map::new();
    body.insert("query".to_owned(), json!(term));
    if let Some(boost) = options.and_then(|o| o.boost.clone()) {
        body.insert("boost".to_owned(), Value::Number(boost));
    }
    json!({ operator: { field_name: body } })
}

fn nested_clauses(ctx: &CompileContext<'_>, out: &mut Vec<Value>) {
    for value in ctx.params.values_for(SEARCH_PARAM) {
        for spec in ctx.config.search_nested_fields.values() {
            let matches = spec
                .fields
                .iter()
                .map(|field| {
                    let scoped = format!("{}.{}", spec.path, field);
                    json!({"match": {scoped: value}})
                })
                .collect();
            // Sub-field matches combine disjunctively inside the scope.
            let Some(query) = combined(matches, MatchMode::Should) else {
                continue;
            };
            out.push(json!({"nested": {"path": spec.path, "query": query}}));
        }
    }
}

fn fielded_clause(
    ctx: &CompileContext<'_>,
    query_type: &str,
    value: &str,
    table: &SearchFields,
    options: &Map<String, Value>,
) -> Value {
    let seps = &ctx.config.separators;
    let (term, fields) = match seps.split_named(value) {
        Some((names, term)) => (
            term,
            seps.split_parts(names)
                .into_iter()
                .filter(|name| table.contains(name))
                .map(|name| encode_field(name, table.options_for(name)))
                .collect::<Vec<String>>(),
        ),
        None => (
            value,
            table
                .entries()
                .into_iter()
                .map(|(name, options)| encode_field(name, options))
                .collect(),
        ),
    };
    let mut body = Map::new();
    body.insert("query".to_owned(), json!(term));
    body.insert("fields".to_owned(), json!(fields));
    body.extend(options.clone());
    json!({ query_type: body })
}

/// `name^boost` when a boost is configured, the bare name otherwise.
fn encode_field(name: &str, options: Option<&SearchFieldOptions>) -> String {
    let field = options.and_then(|o| o.field.as_deref()).unwrap_or(name);
    match options.and_then(|o| o.boost.as_ref()) {
        Some(boost) => format!("{field}^{boost}"),
        None => field.to_owned(),
    }
}
