//! Lookup and suggester operators, keyed by their URL suffixes.

use phf::phf_map;
use serde::{Deserialize, Serialize};

/// Filter lookup operators.
///
/// Most map one-to-one onto engine term-level queries. `Contains`,
/// `Startswith`, `Endswith`, `In`, `Isnull` and `Exclude` are synthesized
/// from wildcard, prefix, exists and bool compounds. The geo variants are
/// only honored by the geo-spatial backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lookup {
    Term,
    Terms,
    Range,
    Exists,
    Prefix,
    Wildcard,
    Regexp,
    Contains,
    In,
    Gt,
    Gte,
    Lt,
    Lte,
    Startswith,
    Endswith,
    Isnull,
    Exclude,
    GeoDistance,
    GeoPolygon,
    GeoBoundingBox,
    GeoShape,
}

static LOOKUP_SUFFIXES: phf::Map<&'static str, Lookup> = phf_map! {
    "term" => Lookup::Term,
    "terms" => Lookup::Terms,
    "range" => Lookup::Range,
    "exists" => Lookup::Exists,
    "prefix" => Lookup::Prefix,
    "wildcard" => Lookup::Wildcard,
    "regexp" => Lookup::Regexp,
    "contains" => Lookup::Contains,
    "in" => Lookup::In,
    "gt" => Lookup::Gt,
    "gte" => Lookup::Gte,
    "lt" => Lookup::Lt,
    "lte" => Lookup::Lte,
    "startswith" => Lookup::Startswith,
    "endswith" => Lookup::Endswith,
    "isnull" => Lookup::Isnull,
    "exclude" => Lookup::Exclude,
    "geo_distance" => Lookup::GeoDistance,
    "geo_polygon" => Lookup::GeoPolygon,
    "geo_bounding_box" => Lookup::GeoBoundingBox,
    "geo_shape" => Lookup::GeoShape,
};

impl Lookup {
    /// Decode a URL lookup suffix.
    pub fn from_suffix(suffix: &str) -> Option<Lookup> {
        LOOKUP_SUFFIXES.get(suffix).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Lookup::Term => "term",
            Lookup::Terms => "terms",
            Lookup::Range => "range",
            Lookup::Exists => "exists",
            Lookup::Prefix => "prefix",
            Lookup::Wildcard => "wildcard",
            Lookup::Regexp => "regexp",
            Lookup::Contains => "contains",
            Lookup::In => "in",
            Lookup::Gt => "gt",
            Lookup::Gte => "gte",
            Lookup::Lt => "lt",
            Lookup::Lte => "lte",
            Lookup::Startswith => "startswith",
            Lookup::Endswith => "endswith",
            Lookup::Isnull => "isnull",
            Lookup::Exclude => "exclude",
            Lookup::GeoDistance => "geo_distance",
            Lookup::GeoPolygon => "geo_polygon",
            Lookup::GeoBoundingBox => "geo_bounding_box",
            Lookup::GeoShape => "geo_shape",
        }
    }

    /// True for the lookups handled by the geo-spatial filtering backend.
    pub fn is_geo(self) -> bool {
        matches!(
            self,
            Lookup::GeoDistance | Lookup::GeoPolygon | Lookup::GeoBoundingBox | Lookup::GeoShape
        )
    }
}

/// Native suggester operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Suggester {
    Term,
    Phrase,
    Completion,
}

static SUGGESTER_SUFFIXES: phf::Map<&'static str, Suggester> = phf_map! {
    "term" => Suggester::Term,
    "phrase" => Suggester::Phrase,
    "completion" => Suggester::Completion,
};

impl Suggester {
    pub fn from_suffix(suffix: &str) -> Option<Suggester> {
        SUGGESTER_SUFFIXES.get(suffix).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Suggester::Term => "term",
            Suggester::Phrase => "phrase",
            Suggester::Completion => "completion",
        }
    }
}

/// Functional suggester operators, answered from regular queries instead
/// of the engine's suggest machinery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionalSuggester {
    TermMatch,
    PhraseMatch,
    CompletionMatch,
    CompletionPrefix,
}

static FUNCTIONAL_SUFFIXES: phf::Map<&'static str, FunctionalSuggester> = phf_map! {
    "term_match" => FunctionalSuggester::TermMatch,
    "phrase_match" => FunctionalSuggester::PhraseMatch,
    "completion_match" => FunctionalSuggester::CompletionMatch,
    "completion_prefix" => FunctionalSuggester::CompletionPrefix,
};

impl FunctionalSuggester {
    pub fn from_suffix(suffix: &str) -> Option<FunctionalSuggester> {
        FUNCTIONAL_SUFFIXES.get(suffix).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FunctionalSuggester::TermMatch => "term_match",
            FunctionalSuggester::PhraseMatch => "phrase_match",
            FunctionalSuggester::CompletionMatch => "completion_match",
            FunctionalSuggester::CompletionPrefix => "completion_prefix",
        }
    }
}
