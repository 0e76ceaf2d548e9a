//! Faceted-search backend.
//!
//! Declared facets become aggregations when they are marked `enabled`
//! or when the request opts in with `facet={url_name}`. Every
//! aggregation is wrapped in a filter bucket keyed `_filter_{url_name}`
//! so bucket counts stay stable while a post-filter narrows the result
//! list. Facets marked `global` aggregate over the whole index instead.

use serde_json::{json, Map};

use crate::error::Result;
use crate::request::SearchRequest;

use super::{CompileContext, FilterBackend};

const FACET_PARAM: &str = "facet";

pub struct FacetedSearchBackend;

impl FilterBackend for FacetedSearchBackend {
    fn apply(&self, ctx: &CompileContext<'_>, acc: &mut SearchRequest) -> Result<()> {
        let requested = ctx.params.values_for(FACET_PARAM);
        for (name, spec) in &ctx.config.faceted_search_fields {
            if !spec.enabled && !requested.iter().any(|value| value == name) {
                continue;
            }
            let mut inner = Map::new();
            inner.insert("field".to_owned(), json!(spec.resolved_field(name)));
            inner.extend(spec.options.clone());
            let aggregation = json!({ (spec.facet.as_str()): inner });

            let wrapper = if spec.global {
                json!({"global": {}, "aggs": {name: aggregation}})
            } else {
                json!({"filter": {"match_all": {}}, "aggs": {name: aggregation}})
            };
            acc.aggs.insert(format!("_filter_{name}"), wrapper);
        }
        Ok(())
    }
}
