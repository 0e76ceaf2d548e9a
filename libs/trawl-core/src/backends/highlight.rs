//! Highlight backend.
//!
//! Declared highlight fields are attached to the request when marked
//! `enabled` or when the URL carries `highlight={field}`. Hits come
//! back with a `highlight` subdocument the response shaper copies onto
//! the serialized result.

use serde_json::Value;

use crate::error::Result;
use crate::request::SearchRequest;

use super::{CompileContext, FilterBackend};

const HIGHLIGHT_PARAM: &str = "highlight";

pub struct HighlightBackend;

impl FilterBackend for HighlightBackend {
    fn apply(&self, ctx: &CompileContext<'_>, acc: &mut SearchRequest) -> Result<()> {
        let requested = ctx.params.values_for(HIGHLIGHT_PARAM);
        for (name, spec) in &ctx.config.highlight_fields {
            if spec.enabled || requested.iter().any(|value| value == name) {
                acc.highlight
                    .insert(name.clone(), Value::Object(spec.options.clone()));
            }
        }
        Ok(())
    }
}
