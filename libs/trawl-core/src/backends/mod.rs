//! The compilation pipeline.
//!
//! Each backend reads the parsed parameters plus its whitelist table and
//! pushes clauses into the accumulator. Backends run in the order the
//! view lists them; the fold is pure, so the same parameters always
//! compile to the same body.

pub mod faceted;
pub mod filtering;
pub mod functional_suggest;
pub mod geo;
pub mod highlight;
pub mod ids;
pub mod nested;
pub mod ordering;
pub mod post_filter;
pub mod search;
pub mod source;
pub mod suggest;

use crate::config::{BackendKind, ViewConfig};
use crate::error::Result;
use crate::params::RequestParams;
use crate::request::SearchRequest;

/// The terminal action a request is compiled for.
///
/// Suggest backends only contribute under their own actions; everything
/// else contributes everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    #[default]
    List,
    Detail,
    Suggest,
    FunctionalSuggest,
    MoreLikeThis,
}

/// Everything a backend may read while contributing clauses.
pub struct CompileContext<'a> {
    pub params: &'a RequestParams,
    pub config: &'a ViewConfig,
    pub action: Action,
}

/// One stage of the compilation pipeline.
pub trait FilterBackend {
    fn apply(&self, ctx: &CompileContext<'_>, acc: &mut SearchRequest) -> Result<()>;
}

fn backend(kind: BackendKind) -> &'static dyn FilterBackend {
    match kind {
        BackendKind::Filtering => &filtering::FilteringBackend,
        BackendKind::NestedFiltering => &nested::NestedFilteringBackend,
        BackendKind::PostFilter => &post_filter::PostFilterBackend,
        BackendKind::Ids => &ids::IdsBackend,
        BackendKind::GeoSpatialFiltering => &geo::GeoSpatialFilteringBackend,
        BackendKind::GeoSpatialOrdering => &geo::GeoSpatialOrderingBackend,
        BackendKind::Ordering => &ordering::OrderingBackend,
        BackendKind::DefaultOrdering => &ordering::DefaultOrderingBackend,
        BackendKind::CompoundSearch => &search::CompoundSearchBackend,
        BackendKind::MultiMatchSearch => &search::MultiMatchSearchBackend,
        BackendKind::SimpleQueryStringSearch => &search::SimpleQueryStringSearchBackend,
        BackendKind::FacetedSearch => &faceted::FacetedSearchBackend,
        BackendKind::Highlight => &highlight::HighlightBackend,
        BackendKind::Suggest => &suggest::SuggestBackend,
        BackendKind::FunctionalSuggest => &functional_suggest::FunctionalSuggestBackend,
        BackendKind::Source => &source::SourceBackend,
    }
}

/// Fold an empty accumulator through the view's backend list.
pub fn compile(
    params: &RequestParams,
    config: &ViewConfig,
    action: Action,
) -> Result<SearchRequest> {
    let ctx = CompileContext {
        params,
        config,
        action,
    };
    let mut acc = SearchRequest::new();
    for kind in &config.backends {
        backend(*kind).apply(&ctx, &mut acc)?;
    }
    Ok(acc)
}
