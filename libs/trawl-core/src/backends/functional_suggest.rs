//! Functional suggester backend.
//!
//! Active only under the functional-suggest action. Unlike native
//! suggesters these answer from ordinary queries: each whitelisted
//! parameter contributes a `prefix` or `match` clause, and the view
//! reshapes the plain hits into a suggest-style envelope afterwards.
//!
//! The backend also resets aggregation, highlight, and sort output from
//! earlier stages; functional suggestions are always relevance-ordered.

use serde_json::{json, Value};

use crate::config::FunctionalSuggesterField;
use crate::error::{Error, Result};
use crate::lookup::FunctionalSuggester;
use crate::request::{BoolArm, SearchRequest};

use super::{Action, CompileContext, FilterBackend};

pub struct FunctionalSuggestBackend;

impl FilterBackend for FunctionalSuggestBackend {
    fn apply(&self, ctx: &CompileContext<'_>, acc: &mut SearchRequest) -> Result<()> {
        if ctx.action != Action::FunctionalSuggest {
            return Ok(());
        }
        let applied = applications(ctx);
        if applied.is_empty() {
            return Err(Error::NoSuggestion(
                "no parameter matched a functional suggester".to_owned(),
            ));
        }
        acc.aggs.clear();
        acc.highlight.clear();
        acc.sort.clear();
        for application in applied {
            acc.query.push(BoolArm::Must, application.clause);
            if let Some((from, size)) = application.window {
                acc.from = Some(from);
                acc.size = Some(size);
            }
        }
        Ok(())
    }
}

/// What the response envelope needs to know about an applied parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionalSuggestion {
    /// Raw parameter name, suffix included.
    pub param: String,
    /// The suggestion text the client sent.
    pub text: String,
    /// Source field the per-hit suggestion text is read from.
    pub serializer_field: String,
}

/// The parameter whose value names the suggestion in the response.
/// When several parameters apply, the last one wins.
pub fn picked(ctx: &CompileContext<'_>) -> Result<FunctionalSuggestion> {
    applications(ctx)
        .pop()
        .map(|application| application.suggestion)
        .ok_or_else(|| {
            Error::NoSuggestion("no parameter matched a functional suggester".to_owned())
        })
}

struct Application {
    clause: Value,
    window: Option<(usize, usize)>,
    suggestion: FunctionalSuggestion,
}

fn applications(ctx: &CompileContext<'_>) -> Vec<Application> {
    let mut applied = Vec::new();
    for group in ctx.params.grouped() {
        let Some(spec) = ctx.config.functional_suggester_fields.get(group.base) else {
            continue;
        };
        let Some(operator) = resolve_suggester(group.lookup, spec) else {
            continue;
        };
        let field = spec.resolved_field(group.base);
        for value in &group.values {
            let clause = match operator {
                FunctionalSuggester::CompletionPrefix => json!({"prefix": {field: value}}),
                FunctionalSuggester::CompletionMatch => json!({"match": {field: value}}),
                // The match-family operators decode but have no query form.
                FunctionalSuggester::TermMatch | FunctionalSuggester::PhraseMatch => continue,
            };
            applied.push(Application {
                clause,
                window: window(spec),
                suggestion: FunctionalSuggestion {
                    param: group.raw_name.to_owned(),
                    text: (*value).to_owned(),
                    serializer_field: serializer_field(group.base, spec),
                },
            });
        }
    }
    applied
}

/// Explicit suffix first, otherwise the configured default. A suffix
/// outside the allowed set drops the parameter.
fn resolve_suggester(
    suffix: Option<&str>,
    spec: &FunctionalSuggesterField,
) -> Option<FunctionalSuggester> {
    match suffix {
        Some(suffix) => FunctionalSuggester::from_suffix(suffix).filter(|s| spec.allows(*s)),
        None => spec.default_suggester,
    }
}

/// `from` and `size` for the synthesized query, read from the field
/// options when a size is configured.
fn window(spec: &FunctionalSuggesterField) -> Option<(usize, usize)> {
    let size = spec.options.get("size").and_then(Value::as_u64)?;
    let from = spec
        .options
        .get("from")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    Some((from as usize, size as usize))
}

fn serializer_field(url_name: &str, spec: &FunctionalSuggesterField) -> String {
    if let Some(field) = &spec.serializer_field {
        return field.clone();
    }
    let resolved = spec.resolved_field(url_name);
    resolved.split('.').next().unwrap_or(resolved).to_owned()
}
