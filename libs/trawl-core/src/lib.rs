//! Query-string to search-DSL compiler for Elasticsearch and OpenSearch.
//!
//! Views declare whitelist tables for filtering, ordering, search,
//! facets, highlights and suggesters; requests compile deterministically
//! into one engine body, and replies come back in DRF-style envelopes.

pub mod backends;
pub mod config;
pub mod constants;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod lookup;
pub mod pagination;
pub mod params;
pub mod request;
pub mod views;

pub use backends::{compile, Action, CompileContext, FilterBackend};
pub use config::{
    BackendKind, CompletionContexts, FacetKind, FacetedField, FilterField,
    FunctionalSuggesterField, HighlightField, MatchMode, MoreLikeThisConfig, NestedSearchField,
    OrderingField, SearchFieldOptions, SearchFields, SearchQueryKind, SourceProjection,
    SuggesterField, ViewConfig,
};
pub use descriptor::{DocumentDescriptor, FieldKind};
pub use engine::{SearchEngine, SearchReply};
pub use error::{Error, Result};
pub use lookup::{FunctionalSuggester, Lookup, Suggester};
pub use pagination::{paginate, Paginated, PaginationConfig, ResolvedWindow};
pub use params::{parse_bool, RequestParams, Separators};
pub use request::{BoolArm, BoolQuery, ClauseSink, SearchRequest};
pub use views::DocumentView;
