//! View configuration.
//!
//! A [`ViewConfig`] is the declarative face of one search view: the
//! document descriptor, the ordered backend pipeline and the whitelist
//! tables the backends consult. Configurations are plain serde data so
//! they can be embedded in code or loaded from JSON files verbatim.
//!
//! All whitelist tables are keyed by the URL-facing parameter name. The
//! engine-side field defaults to that name and is overridden per entry
//! with `field`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::descriptor::DocumentDescriptor;
use crate::error::{Error, Result};
use crate::lookup::{FunctionalSuggester, Lookup, Suggester};
use crate::pagination::PaginationConfig;
use crate::params::Separators;

/// The pipeline stages a view can enable, applied in list order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Filtering,
    NestedFiltering,
    PostFilter,
    Ids,
    GeoSpatialFiltering,
    GeoSpatialOrdering,
    Ordering,
    DefaultOrdering,
    CompoundSearch,
    MultiMatchSearch,
    SimpleQueryStringSearch,
    FacetedSearch,
    Highlight,
    Suggest,
    FunctionalSuggest,
    Source,
}

/// How multiple search clauses combine inside the emitted `bool`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    Must,
    #[default]
    Should,
}

impl MatchMode {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchMode::Must => "must",
            MatchMode::Should => "should",
        }
    }
}

/// Whitelist entry for one filterable URL parameter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterField {
    /// Engine-side field path. Defaults to the URL name.
    #[serde(default)]
    pub field: Option<String>,
    /// Allowed lookups. Empty means every non-geo lookup is allowed.
    #[serde(default)]
    pub lookups: Vec<Lookup>,
    /// Lookup assumed when the parameter carries no suffix.
    #[serde(default)]
    pub default_lookup: Option<Lookup>,
    /// Nested path the clauses are wrapped in. Only consulted by the
    /// nested filtering backend, where it is mandatory.
    #[serde(default)]
    pub path: Option<String>,
}

impl FilterField {
    pub fn resolved_field<'a>(&'a self, url_name: &'a str) -> &'a str {
        self.field.as_deref().unwrap_or(url_name)
    }

    pub fn allows(&self, lookup: Lookup) -> bool {
        self.lookups.is_empty() || self.lookups.contains(&lookup)
    }
}

/// Per-field options for the match family of search backends.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFieldOptions {
    /// Engine-side field path. Defaults to the configured name.
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub boost: Option<Number>,
}

/// Searchable fields, either a bare list or a map with per-field options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchFields {
    Simple(Vec<String>),
    Detailed(BTreeMap<String, Option<SearchFieldOptions>>),
}

impl Default for SearchFields {
    fn default() -> Self {
        SearchFields::Simple(Vec::new())
    }
}

impl SearchFields {
    pub fn is_empty(&self) -> bool {
        match self {
            SearchFields::Simple(fields) => fields.is_empty(),
            SearchFields::Detailed(fields) => fields.is_empty(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        match self {
            SearchFields::Simple(fields) => fields.iter().any(|f| f == name),
            SearchFields::Detailed(fields) => fields.contains_key(name),
        }
    }

    /// Configured names with their options, in deterministic order.
    pub fn entries(&self) -> Vec<(&str, Option<&SearchFieldOptions>)> {
        match self {
            SearchFields::Simple(fields) => {
                fields.iter().map(|f| (f.as_str(), None)).collect()
            }
            SearchFields::Detailed(fields) => fields
                .iter()
                .map(|(name, options)| (name.as_str(), options.as_ref()))
                .collect(),
        }
    }

    pub fn options_for(&self, name: &str) -> Option<&SearchFieldOptions> {
        match self {
            SearchFields::Simple(_) => None,
            SearchFields::Detailed(fields) => fields.get(name).and_then(|o| o.as_ref()),
        }
    }
}

/// One nested search scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NestedSearchField {
    /// Nested path the clauses are wrapped in.
    pub path: String,
    /// Field names under the path, without the path prefix.
    pub fields: Vec<String>,
}

/// Clause generators the compound search backend runs, in list order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchQueryKind {
    Match,
    MatchPhrase,
    MatchPhrasePrefix,
    Nested,
}

/// Aggregation kinds views can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacetKind {
    #[default]
    Terms,
    DateHistogram,
    Histogram,
    Range,
    Nested,
}

impl FacetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FacetKind::Terms => "terms",
            FacetKind::DateHistogram => "date_histogram",
            FacetKind::Histogram => "histogram",
            FacetKind::Range => "range",
            FacetKind::Nested => "nested",
        }
    }
}

/// One declared facet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FacetedField {
    /// Engine-side field path. Defaults to the URL name.
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub facet: FacetKind,
    /// Extra aggregation body entries, merged after `field`.
    #[serde(default)]
    pub options: Map<String, Value>,
    /// Computed on every request instead of only when asked for.
    #[serde(default)]
    pub enabled: bool,
    /// Computed over the whole index, ignoring the request's own query.
    #[serde(default)]
    pub global: bool,
}

impl FacetedField {
    pub fn resolved_field<'a>(&'a self, url_name: &'a str) -> &'a str {
        self.field.as_deref().unwrap_or(url_name)
    }
}

/// One highlightable field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HighlightField {
    /// Highlighted on every request instead of only when asked for.
    #[serde(default)]
    pub enabled: bool,
    /// Per-field highlight options, emitted verbatim.
    #[serde(default)]
    pub options: Map<String, Value>,
}

/// One sortable URL name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderingField {
    /// Engine-side field path. Defaults to the URL name.
    #[serde(default)]
    pub field: Option<String>,
    /// Nested path for sorting on fields inside nested objects.
    #[serde(default)]
    pub path: Option<String>,
}

impl OrderingField {
    pub fn resolved_field<'a>(&'a self, url_name: &'a str) -> &'a str {
        self.field.as_deref().unwrap_or(url_name)
    }
}

/// Context filters for completion suggesters: URL parameter name to
/// engine context name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionContexts {
    #[serde(default)]
    pub category_filters: BTreeMap<String, String>,
    #[serde(default)]
    pub geo_filters: BTreeMap<String, String>,
}

impl CompletionContexts {
    pub fn is_empty(&self) -> bool {
        self.category_filters.is_empty() && self.geo_filters.is_empty()
    }
}

/// One native suggester parameter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuggesterField {
    /// Engine-side field path. Defaults to the URL name.
    #[serde(default)]
    pub field: Option<String>,
    /// Allowed suggester operators. Empty means all three.
    #[serde(default)]
    pub suggesters: Vec<Suggester>,
    /// Operator assumed when the parameter carries no suffix.
    #[serde(default)]
    pub default_suggester: Option<Suggester>,
    /// `size` and `skip_duplicates`, forwarded for completion suggesters.
    #[serde(default)]
    pub options: Map<String, Value>,
    #[serde(default)]
    pub completion_options: CompletionContexts,
}

impl SuggesterField {
    pub fn resolved_field<'a>(&'a self, url_name: &'a str) -> &'a str {
        self.field.as_deref().unwrap_or(url_name)
    }

    pub fn allows(&self, suggester: Suggester) -> bool {
        self.suggesters.is_empty() || self.suggesters.contains(&suggester)
    }
}

/// One functional suggester parameter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionalSuggesterField {
    /// Engine-side field path. Defaults to the URL name.
    #[serde(default)]
    pub field: Option<String>,
    /// Allowed operators. Empty means all four.
    #[serde(default)]
    pub suggesters: Vec<FunctionalSuggester>,
    /// Operator assumed when the parameter carries no suffix.
    #[serde(default)]
    pub default_suggester: Option<FunctionalSuggester>,
    /// Source field the suggestion text is read from. Defaults to the
    /// first dotted segment of the engine field path.
    #[serde(default)]
    pub serializer_field: Option<String>,
    /// Optional `from` and `size` window for the synthesized query.
    #[serde(default)]
    pub options: Map<String, Value>,
}

impl FunctionalSuggesterField {
    pub fn resolved_field<'a>(&'a self, url_name: &'a str) -> &'a str {
        self.field.as_deref().unwrap_or(url_name)
    }

    pub fn allows(&self, suggester: FunctionalSuggester) -> bool {
        self.suggesters.is_empty() || self.suggesters.contains(&suggester)
    }
}

/// Options for the more-like-this action.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MoreLikeThisConfig {
    /// Fields the similarity is computed over. Empty lets the engine
    /// fall back to all text fields.
    #[serde(default)]
    pub fields: Vec<String>,
    /// Extra `more_like_this` body entries, emitted verbatim.
    #[serde(default)]
    pub options: Map<String, Value>,
}

/// `_source` projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceProjection {
    /// Plain include list.
    Fields(Vec<String>),
    /// Include and exclude patterns.
    Scoped {
        #[serde(default)]
        includes: Vec<String>,
        #[serde(default)]
        excludes: Vec<String>,
    },
}

/// Declarative configuration of one search view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    pub document: DocumentDescriptor,
    /// Pipeline stages, applied in order.
    pub backends: Vec<BackendKind>,
    #[serde(default)]
    pub separators: Separators,

    #[serde(default)]
    pub filter_fields: BTreeMap<String, FilterField>,
    #[serde(default)]
    pub nested_filter_fields: BTreeMap<String, FilterField>,
    #[serde(default)]
    pub post_filter_fields: BTreeMap<String, FilterField>,
    #[serde(default)]
    pub geo_spatial_filter_fields: BTreeMap<String, FilterField>,

    #[serde(default)]
    pub ordering_fields: BTreeMap<String, OrderingField>,
    /// Sort tokens applied when the request carries no valid ordering,
    /// in `ordering` parameter syntax (`-` prefix for descending).
    #[serde(default)]
    pub ordering_defaults: Vec<String>,
    #[serde(default)]
    pub geo_spatial_ordering_fields: BTreeMap<String, OrderingField>,

    #[serde(default)]
    pub search_fields: SearchFields,
    #[serde(default)]
    pub search_nested_fields: BTreeMap<String, NestedSearchField>,
    /// How compound-search clauses combine. Multi-match and simple query
    /// string always combine with `must`.
    #[serde(default)]
    pub search_matching: MatchMode,
    /// Sub-queries the compound search backend builds per search value.
    #[serde(default = "default_search_query_kinds")]
    pub search_query_kinds: Vec<SearchQueryKind>,
    /// Field table for the multi-match backend. Falls back to
    /// `search_fields`.
    #[serde(default)]
    pub multi_match_search_fields: Option<SearchFields>,
    /// Extra `multi_match` body entries, such as `type` or `operator`.
    #[serde(default)]
    pub multi_match_options: Map<String, Value>,
    /// Field table for the simple-query-string backend. Falls back to
    /// `search_fields`.
    #[serde(default)]
    pub simple_query_string_search_fields: Option<SearchFields>,
    /// Extra `simple_query_string` body entries.
    #[serde(default)]
    pub simple_query_string_options: Map<String, Value>,

    #[serde(default)]
    pub faceted_search_fields: BTreeMap<String, FacetedField>,
    #[serde(default)]
    pub highlight_fields: BTreeMap<String, HighlightField>,
    #[serde(default)]
    pub suggester_fields: BTreeMap<String, SuggesterField>,
    #[serde(default)]
    pub functional_suggester_fields: BTreeMap<String, FunctionalSuggesterField>,

    #[serde(default)]
    pub more_like_this: Option<MoreLikeThisConfig>,
    #[serde(default)]
    pub source: Option<SourceProjection>,

    #[serde(default)]
    pub pagination: PaginationConfig,
    /// Major engine version, gating mapping-type emission.
    #[serde(default = "default_engine_version")]
    pub engine_version: u32,
    /// Engine HTTP statuses the detail action treats as an absent
    /// document instead of an error.
    #[serde(default)]
    pub detail_ignore_statuses: Vec<u16>,
    /// Ceiling on `from + size`, mirroring `index.max_result_window`.
    #[serde(default = "default_max_result_window")]
    pub max_result_window: usize,
}

fn default_engine_version() -> u32 {
    7
}

fn default_search_query_kinds() -> Vec<SearchQueryKind> {
    vec![SearchQueryKind::Match, SearchQueryKind::Nested]
}

fn default_max_result_window() -> usize {
    crate::constants::DEFAULT_MAX_RESULT_WINDOW
}

impl ViewConfig {
    /// Minimal configuration: one index, the given pipeline, defaults
    /// everywhere else.
    pub fn new(document: DocumentDescriptor, backends: Vec<BackendKind>) -> Self {
        ViewConfig {
            document,
            backends,
            separators: Separators::default(),
            filter_fields: BTreeMap::new(),
            nested_filter_fields: BTreeMap::new(),
            post_filter_fields: BTreeMap::new(),
            geo_spatial_filter_fields: BTreeMap::new(),
            ordering_fields: BTreeMap::new(),
            ordering_defaults: Vec::new(),
            geo_spatial_ordering_fields: BTreeMap::new(),
            search_fields: SearchFields::default(),
            search_nested_fields: BTreeMap::new(),
            search_matching: MatchMode::default(),
            search_query_kinds: default_search_query_kinds(),
            multi_match_search_fields: None,
            multi_match_options: Map::new(),
            simple_query_string_search_fields: None,
            simple_query_string_options: Map::new(),
            faceted_search_fields: BTreeMap::new(),
            highlight_fields: BTreeMap::new(),
            suggester_fields: BTreeMap::new(),
            functional_suggester_fields: BTreeMap::new(),
            more_like_this: None,
            source: None,
            pagination: PaginationConfig::default(),
            engine_version: default_engine_version(),
            detail_ignore_statuses: Vec::new(),
            max_result_window: default_max_result_window(),
        }
    }

    /// Check the configuration for contradictions.
    ///
    /// Called once when a view is built so that per-request code never
    /// sees a misconfigured table.
    pub fn validate(&self) -> Result<()> {
        if self.backends.is_empty() {
            return Err(Error::Misconfigured("backend list is empty".to_owned()));
        }
        if self.document.index.is_empty() {
            return Err(Error::Misconfigured("document index is empty".to_owned()));
        }
        if self.engine_version == 0 {
            return Err(Error::Misconfigured("engine version 0".to_owned()));
        }
        if self.max_result_window == 0 {
            return Err(Error::Misconfigured("max result window is 0".to_owned()));
        }
        self.pagination.validate()?;

        for (name, spec) in &self.filter_fields {
            check_default_lookup(name, spec)?;
        }
        for (name, spec) in &self.post_filter_fields {
            check_default_lookup(name, spec)?;
        }
        for (name, spec) in &self.nested_filter_fields {
            check_default_lookup(name, spec)?;
            let Some(path) = spec.path.as_deref() else {
                return Err(Error::Misconfigured(format!(
                    "nested filter field `{name}` has no path"
                )));
            };
            let field = spec.resolved_field(name);
            if !field.starts_with(&format!("{path}.")) {
                return Err(Error::Misconfigured(format!(
                    "nested filter field `{name}`: path `{path}` is not a prefix of `{field}`"
                )));
            }
        }
        for (name, spec) in &self.geo_spatial_filter_fields {
            check_default_lookup(name, spec)?;
            if let Some(bad) = spec.lookups.iter().find(|l| !l.is_geo()) {
                return Err(Error::Misconfigured(format!(
                    "geo filter field `{name}` allows non-geo lookup `{}`",
                    bad.as_str()
                )));
            }
        }
        for (name, spec) in &self.suggester_fields {
            if let Some(default) = spec.default_suggester {
                if !spec.allows(default) {
                    return Err(Error::Misconfigured(format!(
                        "suggester field `{name}`: default `{}` is not among its suggesters",
                        default.as_str()
                    )));
                }
            }
        }
        for (name, spec) in &self.functional_suggester_fields {
            if let Some(default) = spec.default_suggester {
                if !spec.allows(default) {
                    return Err(Error::Misconfigured(format!(
                        "functional suggester field `{name}`: default `{}` is not among its suggesters",
                        default.as_str()
                    )));
                }
            }
        }
        for (name, spec) in &self.search_nested_fields {
            if spec.path.is_empty() {
                return Err(Error::Misconfigured(format!(
                    "nested search field `{name}` has an empty path"
                )));
            }
            if spec.fields.is_empty() {
                return Err(Error::Misconfigured(format!(
                    "nested search field `{name}` has no fields"
                )));
            }
        }
        if self.backends.contains(&BackendKind::CompoundSearch)
            && self.search_query_kinds.is_empty()
        {
            return Err(Error::Misconfigured(
                "compound search has no query kinds".to_owned(),
            ));
        }
        Ok(())
    }

    /// Field table the multi-match backend searches.
    pub fn multi_match_fields(&self) -> &SearchFields {
        self.multi_match_search_fields
            .as_ref()
            .unwrap_or(&self.search_fields)
    }

    /// Field table the simple-query-string backend searches.
    pub fn simple_query_string_fields(&self) -> &SearchFields {
        self.simple_query_string_search_fields
            .as_ref()
            .unwrap_or(&self.search_fields)
    }
}

fn check_default_lookup(name: &str, spec: &FilterField) -> Result<()> {
    if let Some(default) = spec.default_lookup {
        if !spec.allows(default) {
            return Err(Error::Misconfigured(format!(
                "filter field `{name}`: default lookup `{}` is not among its lookups",
                default.as_str()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal() -> ViewConfig {
        ViewConfig::new(
            DocumentDescriptor::new("articles"),
            vec![BackendKind::Filtering],
        )
    }

    #[test]
    fn minimal_config_validates() {
        assert!(minimal().validate().is_ok());
    }

    #[test]
    fn empty_backend_list_is_rejected() {
        let config = ViewConfig::new(DocumentDescriptor::new("articles"), vec![]);
        assert!(matches!(
            config.validate(),
            Err(Error::Misconfigured(_))
        ));
    }

    #[test]
    fn nested_filter_path_must_prefix_the_field() {
        let mut config = minimal();
        config.nested_filter_fields.insert(
            "country".to_owned(),
            FilterField {
                field: Some("continent.country.name".to_owned()),
                path: Some("continent.country".to_owned()),
                ..FilterField::default()
            },
        );
        assert!(config.validate().is_ok());

        config
            .nested_filter_fields
            .get_mut("country")
            .unwrap()
            .path = Some("city".to_owned());
        assert!(matches!(
            config.validate(),
            Err(Error::Misconfigured(_))
        ));
    }

    #[test]
    fn nested_filter_without_path_is_rejected() {
        let mut config = minimal();
        config
            .nested_filter_fields
            .insert("country".to_owned(), FilterField::default());
        assert!(matches!(
            config.validate(),
            Err(Error::Misconfigured(_))
        ));
    }

    #[test]
    fn default_lookup_outside_whitelist_is_rejected() {
        let mut config = minimal();
        config.filter_fields.insert(
            "state".to_owned(),
            FilterField {
                lookups: vec![Lookup::Term, Lookup::Terms],
                default_lookup: Some(Lookup::Range),
                ..FilterField::default()
            },
        );
        assert!(matches!(
            config.validate(),
            Err(Error::Misconfigured(_))
        ));
    }

    #[test]
    fn geo_table_rejects_plain_lookups() {
        let mut config = minimal();
        config.geo_spatial_filter_fields.insert(
            "location".to_owned(),
            FilterField {
                lookups: vec![Lookup::GeoDistance, Lookup::Term],
                ..FilterField::default()
            },
        );
        assert!(matches!(
            config.validate(),
            Err(Error::Misconfigured(_))
        ));
    }

    #[test]
    fn search_fields_accept_list_and_map_forms() {
        let simple: SearchFields = serde_json::from_value(json!(["title", "summary"])).unwrap();
        assert!(simple.contains("title"));
        assert_eq!(simple.options_for("title"), None);

        let detailed: SearchFields = serde_json::from_value(json!({
            "title": {"boost": 4},
            "summary": null
        }))
        .unwrap();
        assert!(detailed.contains("summary"));
        let boost = detailed.options_for("title").unwrap().boost.clone().unwrap();
        assert_eq!(boost.as_u64(), Some(4));
    }

    #[test]
    fn full_config_parses_from_json() {
        let config: ViewConfig = serde_json::from_value(json!({
            "document": {"index": "books"},
            "backends": [
                "filtering", "post_filter", "ordering", "default_ordering",
                "compound_search", "faceted_search", "highlight"
            ],
            "filter_fields": {
                "state": {"field": "state.raw", "lookups": ["term", "terms"]},
                "price": {}
            },
            "ordering_fields": {"title": {"field": "title.raw"}},
            "ordering_defaults": ["-price"],
            "search_fields": {"title": {"boost": 4}, "summary": null},
            "faceted_search_fields": {
                "state": {"field": "state.raw"}
            },
            "highlight_fields": {
                "title": {"enabled": true, "options": {"number_of_fragments": 0}}
            },
            "pagination": {"policy": "page_number", "page_size": 20}
        }))
        .unwrap();
        config.validate().unwrap();
        assert_eq!(config.document.index, "books");
        assert_eq!(config.backends.len(), 7);
        assert_eq!(config.engine_version, 7);
        assert!(config.filter_fields["state"].allows(Lookup::Term));
        assert!(!config.filter_fields["state"].allows(Lookup::Range));
        assert!(config.filter_fields["price"].allows(Lookup::Range));
    }
}
