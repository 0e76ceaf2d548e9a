//! Native suggester backend.
//!
//! Active only under the suggest action. Each whitelisted parameter
//! becomes one entry in the request's `suggest` section, keyed by the
//! raw parameter name, so `?name_suggest__completion=Ad` answers under
//! `name_suggest__completion`.
//!
//! Completion suggesters may carry context filters. The configured
//! category filters map extra URL parameters onto engine context names
//! with the value grammar `value[__boost][__prefix]`; geo filters use
//! `lat__lon[__precision[__boost]]`.

use serde_json::{json, Map, Value};

use crate::config::SuggesterField;
use crate::error::Result;
use crate::lookup::Suggester;
use crate::request::SearchRequest;

use super::{Action, CompileContext, FilterBackend};

pub struct SuggestBackend;

impl FilterBackend for SuggestBackend {
    fn apply(&self, ctx: &CompileContext<'_>, acc: &mut SearchRequest) -> Result<()> {
        if ctx.action != Action::Suggest {
            return Ok(());
        }
        for group in ctx.params.grouped() {
            let Some(spec) = ctx.config.suggester_fields.get(group.base) else {
                continue;
            };
            let Some(operator) = resolve_suggester(group.lookup, spec) else {
                continue;
            };
            // Repeated occurrences are not additive; the last wins.
            let Some(value) = group.values.last() else {
                continue;
            };
            let body = match operator {
                Suggester::Term | Suggester::Phrase => {
                    json!({"field": spec.resolved_field(group.base)})
                }
                Suggester::Completion => completion_body(ctx, group.base, spec),
            };
            let mut entry = Map::new();
            entry.insert("text".to_owned(), json!(value));
            entry.insert(operator.as_str().to_owned(), body);
            acc.suggest
                .insert(group.raw_name.to_owned(), Value::Object(entry));
        }
        Ok(())
    }
}

/// Explicit suffix first, then the configured default, then the first
/// explicitly listed suggester. A suffix outside the allowed set drops
/// the parameter.
fn resolve_suggester(suffix: Option<&str>, spec: &SuggesterField) -> Option<Suggester> {
    match suffix {
        Some(suffix) => Suggester::from_suffix(suffix).filter(|s| spec.allows(*s)),
        None => spec
            .default_suggester
            .or_else(|| spec.suggesters.first().copied()),
    }
}

fn completion_body(ctx: &CompileContext<'_>, url_name: &str, spec: &SuggesterField) -> Value {
    let mut body = Map::new();
    body.insert("field".to_owned(), json!(spec.resolved_field(url_name)));
    if let Some(size) = spec.options.get("size") {
        body.insert("size".to_owned(), size.clone());
    }
    if !spec.completion_options.is_empty() {
        body.insert("contexts".to_owned(), Value::Object(contexts(ctx, spec)));
    }
    if let Some(skip) = spec.options.get("skip_duplicates") {
        body.insert("skip_duplicates".to_owned(), skip.clone());
    }
    Value::Object(body)
}

fn contexts(ctx: &CompileContext<'_>, spec: &SuggesterField) -> Map<String, Value> {
    let lookup = ctx.config.separators.lookup.as_str();
    let mut contexts = Map::new();
    for (param, context) in &spec.completion_options.category_filters {
        let mut entries = Vec::new();
        for value in ctx.params.values_for(param) {
            let parts: Vec<&str> = value.splitn(3, lookup).collect();
            let entry = match parts.as_slice() {
                [value, boost, _] => json!({"context": value, "boost": boost, "prefix": true}),
                [value, "prefix"] => json!({"context": value, "prefix": true}),
                [value, boost] => json!({"context": value, "boost": boost}),
                [value] => json!({"context": value}),
                _ => continue,
            };
            entries.push(entry);
        }
        if !entries.is_empty() {
            contexts.insert(context.clone(), Value::Array(entries));
        }
    }
    for (param, context) in &spec.completion_options.geo_filters {
        let mut entries = Vec::new();
        for value in ctx.params.values_for(param) {
            let parts: Vec<&str> = value.splitn(4, lookup).collect();
            let entry = match parts.as_slice() {
                [lat, lon, precision, boost] => json!({
                    "context": {"lat": lat, "lon": lon},
                    "precision": precision,
                    "boost": boost,
                }),
                [lat, lon, precision] => json!({
                    "context": {"lat": lat, "lon": lon},
                    "precision": precision,
                }),
                [lat, lon] => json!({"context": {"lat": lat, "lon": lon}}),
                _ => continue,
            };
            entries.push(entry);
        }
        if !entries.is_empty() {
            contexts.insert(context.clone(), Value::Array(entries));
        }
    }
    contexts
}
