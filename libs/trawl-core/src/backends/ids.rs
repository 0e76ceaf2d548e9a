//! Filtering by document id.
//!
//! `?ids=68|64` or `?ids=68&ids=64` (or any mix) collect into a single
//! `ids` clause in the `filter` arm. Engines below version 7 still carry
//! the mapping type in the clause.

use serde_json::{json, Value};

use crate::error::Result;
use crate::request::{BoolArm, SearchRequest};

use super::{CompileContext, FilterBackend};

const IDS_PARAM: &str = "ids";

pub struct IdsBackend;

impl FilterBackend for IdsBackend {
    fn apply(&self, ctx: &CompileContext<'_>, acc: &mut SearchRequest) -> Result<()> {
        let seps = &ctx.config.separators;
        let ids: Vec<&str> = ctx
            .params
            .values_for(IDS_PARAM)
            .into_iter()
            .flat_map(|value| seps.split_value(value))
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .collect();
        if ids.is_empty() {
            return Ok(());
        }
        let clause: Value = match &ctx.config.document.mapping {
            Some(mapping) if ctx.config.engine_version < 7 => {
                json!({"ids": {"type": mapping, "values": ids}})
            }
            _ => json!({"ids": {"values": ids}}),
        };
        acc.query.push(BoolArm::Filter, clause);
        Ok(())
    }
}
