//! Plain and default ordering.
//!
//! The ordering backend reads the shared `ordering` parameter, splits
//! each occurrence on `,` and translates whitelisted tokens into sort
//! entries. The default ordering backend runs last and appends the
//! view's configured defaults when no earlier backend produced a sort;
//! it is the only stage that inspects the accumulator built by its
//! predecessors.

use serde_json::{json, Value};

use crate::error::Result;
use crate::request::SearchRequest;

use super::{CompileContext, FilterBackend};

const ORDERING_PARAM: &str = "ordering";

pub struct OrderingBackend;

impl FilterBackend for OrderingBackend {
    fn apply(&self, ctx: &CompileContext<'_>, acc: &mut SearchRequest) -> Result<()> {
        for value in ctx.params.values_for(ORDERING_PARAM) {
            for token in value.split(',') {
                let token = token.trim();
                if token.is_empty() {
                    continue;
                }
                let (direction, key) = split_direction(token);
                let Some(spec) = ctx.config.ordering_fields.get(key) else {
                    continue;
                };
                acc.sort
                    .push(sort_entry(spec.resolved_field(key), direction, spec.path.as_deref()));
            }
        }
        Ok(())
    }
}

pub struct DefaultOrderingBackend;

impl FilterBackend for DefaultOrderingBackend {
    fn apply(&self, ctx: &CompileContext<'_>, acc: &mut SearchRequest) -> Result<()> {
        if !acc.sort.is_empty() {
            return Ok(());
        }
        for token in &ctx.config.ordering_defaults {
            let (direction, key) = split_direction(token);
            // Defaults are view configuration, not client input: tokens
            // that miss the whitelist sort on the raw name.
            let entry = match ctx.config.ordering_fields.get(key) {
                Some(spec) => sort_entry(spec.resolved_field(key), direction, spec.path.as_deref()),
                None => sort_entry(key, direction, None),
            };
            acc.sort.push(entry);
        }
        Ok(())
    }
}

fn split_direction(token: &str) -> (&'static str, &str) {
    match token.strip_prefix('-') {
        Some(rest) => ("desc", rest),
        None => ("asc", token),
    }
}

fn sort_entry(field: &str, direction: &str, path: Option<&str>) -> Value {
    let body = match path {
        Some(path) => json!({"order": direction, "nested": {"path": path}}),
        None => json!({"order": direction}),
    };
    json!({ field: body })
}
