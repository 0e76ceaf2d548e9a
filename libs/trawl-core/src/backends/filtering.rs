//! Common filtering.
//!
//! Matches whitelisted parameters against their lookup suffixes and
//! pushes term-level clauses. Positive clauses land in the `filter` arm
//! (they never contribute to scoring), negated ones in `must_not`.
//! Unknown parameters and unknown or disallowed suffixes are ignored so
//! that filtering composes with pagination, search and tracking
//! parameters sharing the same query string.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use crate::config::FilterField;
use crate::error::Result;
use crate::lookup::Lookup;
use crate::params::{parse_bool, Separators};
use crate::request::{BoolArm, ClauseSink, SearchRequest};

use super::{CompileContext, FilterBackend};

pub struct FilteringBackend;

impl FilterBackend for FilteringBackend {
    fn apply(&self, ctx: &CompileContext<'_>, acc: &mut SearchRequest) -> Result<()> {
        apply_filter_table(&ctx.config.filter_fields, ctx, acc, |_, _| {
            Ok(ClauseSink::Query)
        })
    }
}

/// Walk one whitelist table and push the clauses of every matching
/// parameter through the sink chosen per field. Shared by the common,
/// nested and post-filter backends.
pub(crate) fn apply_filter_table<F>(
    fields: &BTreeMap<String, FilterField>,
    ctx: &CompileContext<'_>,
    acc: &mut SearchRequest,
    sink_for: F,
) -> Result<()>
where
    F: Fn(&str, &FilterField) -> Result<ClauseSink>,
{
    let seps = &ctx.config.separators;
    for group in ctx.params.grouped() {
        let Some(spec) = fields.get(group.base) else {
            continue;
        };
        let lookup = match group.lookup {
            Some(suffix) => match Lookup::from_suffix(suffix) {
                Some(lookup) if spec.allows(lookup) => Some(lookup),
                _ => {
                    tracing::warn!(
                        param = group.raw_name,
                        suffix,
                        "ignoring unknown or disallowed lookup suffix"
                    );
                    continue;
                }
            },
            None => spec.default_lookup,
        };
        let field = spec.resolved_field(group.base);
        let sink = sink_for(group.base, spec)?;
        match lookup {
            None => {
                // No suffix and no default: a single value filters as
                // `term`, repeated occurrences as one `terms` clause.
                let clause = if group.values.len() > 1 {
                    json!({"terms": {field: group.values}})
                } else {
                    json!({"term": {field: group.values[0]}})
                };
                acc.push_clause(&sink, BoolArm::Filter, clause);
            }
            Some(lookup) if lookup.is_geo() => {
                tracing::warn!(
                    param = group.raw_name,
                    "geo lookups are handled by the geo-spatial backend"
                );
            }
            Some(lookup) => {
                for value in &group.values {
                    for (arm, clause) in clauses_for_lookup(lookup, field, value, seps) {
                        acc.push_clause(&sink, arm, clause);
                    }
                }
            }
        }
    }
    Ok(())
}

/// Clauses one `(lookup, value)` pair produces, with the arm each one
/// belongs in. Pseudo-boolean values outside the recognized literals
/// produce nothing.
fn clauses_for_lookup(
    lookup: Lookup,
    field: &str,
    value: &str,
    seps: &Separators,
) -> Vec<(BoolArm, Value)> {
    match lookup {
        Lookup::Term => vec![(BoolArm::Filter, json!({"term": {field: value}}))],
        Lookup::Terms => vec![(
            BoolArm::Filter,
            json!({"terms": {field: seps.split_value(value)}}),
        )],
        Lookup::Range => vec![(
            BoolArm::Filter,
            json!({"range": {field: range_body(value, seps)}}),
        )],
        Lookup::Exists => match parse_bool(value) {
            Some(true) => vec![(BoolArm::Filter, json!({"exists": {"field": field}}))],
            Some(false) => vec![(BoolArm::MustNot, json!({"exists": {"field": field}}))],
            None => Vec::new(),
        },
        Lookup::Prefix | Lookup::Startswith => {
            vec![(BoolArm::Filter, json!({"prefix": {field: value}}))]
        }
        Lookup::Wildcard => vec![(BoolArm::Filter, json!({"wildcard": {field: value}}))],
        Lookup::Regexp => vec![(BoolArm::Filter, json!({"regexp": {field: value}}))],
        Lookup::Contains => vec![(
            BoolArm::Filter,
            json!({"wildcard": {field: format!("*{value}*")}}),
        )],
        Lookup::Endswith => vec![(
            BoolArm::Filter,
            json!({"wildcard": {field: format!("*{value}")}}),
        )],
        Lookup::In => {
            let terms: Vec<Value> = seps
                .split_value(value)
                .into_iter()
                .map(|item| json!({"term": {field: item}}))
                .collect();
            vec![(BoolArm::Filter, json!({"bool": {"should": terms}}))]
        }
        Lookup::Gt | Lookup::Gte | Lookup::Lt | Lookup::Lte => vec![(
            BoolArm::Filter,
            json!({"range": {field: bound_body(lookup, value, seps)}}),
        )],
        Lookup::Isnull => match parse_bool(value) {
            Some(true) => vec![(BoolArm::MustNot, json!({"exists": {"field": field}}))],
            Some(false) => vec![(BoolArm::Filter, json!({"exists": {"field": field}}))],
            None => Vec::new(),
        },
        Lookup::Exclude => seps
            .split_value(value)
            .into_iter()
            .map(|item| (BoolArm::MustNot, json!({"term": {field: item}})))
            .collect(),
        Lookup::GeoDistance | Lookup::GeoPolygon | Lookup::GeoBoundingBox | Lookup::GeoShape => {
            Vec::new()
        }
    }
}

/// `gte|lte|boost`, all kept as strings.
fn range_body(value: &str, seps: &Separators) -> Value {
    let parts = seps.split_value_n(value, 4);
    let mut body = Map::new();
    body.insert("gte".to_owned(), json!(parts[0]));
    if parts.len() > 1 {
        body.insert("lte".to_owned(), json!(parts[1]));
    }
    if parts.len() > 2 {
        body.insert("boost".to_owned(), json!(parts[2]));
    }
    Value::Object(body)
}

/// `value|boost` under a single range bound.
fn bound_body(lookup: Lookup, value: &str, seps: &Separators) -> Value {
    let parts = seps.split_value_n(value, 3);
    let mut body = Map::new();
    body.insert(lookup.as_str().to_owned(), json!(parts[0]));
    if parts.len() > 1 {
        body.insert("boost".to_owned(), json!(parts[1]));
    }
    Value::Object(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{compile, Action};
    use crate::config::{BackendKind, ViewConfig};
    use crate::descriptor::DocumentDescriptor;
    use crate::params::RequestParams;

    fn config(fields: &[(&str, FilterField)]) -> ViewConfig {
        let mut config = ViewConfig::new(
            DocumentDescriptor::new("books"),
            vec![BackendKind::Filtering],
        );
        for (name, spec) in fields {
            config.filter_fields.insert((*name).to_owned(), spec.clone());
        }
        config
    }

    fn compiled(config: &ViewConfig, query: &str) -> SearchRequest {
        let params = RequestParams::from_query_string(query, &config.separators);
        compile(&params, config, Action::List).unwrap()
    }

    #[test]
    fn term_lookup_filters_on_the_configured_field() {
        let config = config(&[(
            "state",
            FilterField {
                field: Some("state.raw".to_owned()),
                lookups: vec![Lookup::Term, Lookup::Terms, Lookup::In],
                ..FilterField::default()
            },
        )]);
        let acc = compiled(&config, "state__term=published");
        assert_eq!(
            acc.query.filter,
            vec![json!({"term": {"state.raw": "published"}})]
        );
        assert!(acc.query.must.is_empty());
    }

    #[test]
    fn bare_parameter_uses_term_and_repeats_become_terms() {
        let config = config(&[("tag", FilterField::default())]);
        let acc = compiled(&config, "tag=python");
        assert_eq!(acc.query.filter, vec![json!({"term": {"tag": "python"}})]);

        let acc = compiled(&config, "tag=python&tag=rust");
        assert_eq!(
            acc.query.filter,
            vec![json!({"terms": {"tag": ["python", "rust"]}})]
        );
    }

    #[test]
    fn default_lookup_applies_when_no_suffix_is_given() {
        let config = config(&[(
            "title",
            FilterField {
                default_lookup: Some(Lookup::Contains),
                ..FilterField::default()
            },
        )]);
        let acc = compiled(&config, "title=lorem");
        assert_eq!(
            acc.query.filter,
            vec![json!({"wildcard": {"title": "*lorem*"}})]
        );
    }

    #[test]
    fn terms_lookup_splits_the_value() {
        let config = config(&[("state", FilterField::default())]);
        let acc = compiled(&config, "state__terms=published|draft");
        assert_eq!(
            acc.query.filter,
            vec![json!({"terms": {"state": ["published", "draft"]}})]
        );
    }

    #[test]
    fn range_keeps_bounds_and_boost_as_strings() {
        let config = config(&[("price", FilterField::default())]);
        let acc = compiled(&config, "price__range=10|20|2.0");
        assert_eq!(
            acc.query.filter,
            vec![json!({"range": {"price": {"gte": "10", "lte": "20", "boost": "2.0"}}})]
        );

        let acc = compiled(&config, "price__range=10");
        assert_eq!(
            acc.query.filter,
            vec![json!({"range": {"price": {"gte": "10"}}})]
        );
    }

    #[test]
    fn single_bound_lookups_take_an_optional_boost() {
        let config = config(&[("price", FilterField::default())]);
        let acc = compiled(&config, "price__gt=9|2.0");
        assert_eq!(
            acc.query.filter,
            vec![json!({"range": {"price": {"gt": "9", "boost": "2.0"}}})]
        );
        let acc = compiled(&config, "price__lte=42");
        assert_eq!(
            acc.query.filter,
            vec![json!({"range": {"price": {"lte": "42"}}})]
        );
    }

    #[test]
    fn in_lookup_builds_a_should_of_terms() {
        let config = config(&[("state", FilterField::default())]);
        let acc = compiled(&config, "state__in=published|draft");
        assert_eq!(
            acc.query.filter,
            vec![json!({
                "bool": {"should": [
                    {"term": {"state": "published"}},
                    {"term": {"state": "draft"}}
                ]}
            })]
        );
    }

    #[test]
    fn exclude_pushes_one_must_not_per_value() {
        let config = config(&[("state", FilterField::default())]);
        let acc = compiled(&config, "state__exclude=rejected|spam");
        assert!(acc.query.filter.is_empty());
        assert_eq!(
            acc.query.must_not,
            vec![
                json!({"term": {"state": "rejected"}}),
                json!({"term": {"state": "spam"}}),
            ]
        );
    }

    #[test]
    fn exists_and_isnull_route_on_the_boolean_value() {
        let config = config(&[("summary", FilterField::default())]);
        let acc = compiled(&config, "summary__exists=true");
        assert_eq!(
            acc.query.filter,
            vec![json!({"exists": {"field": "summary"}})]
        );

        let acc = compiled(&config, "summary__isnull=true");
        assert_eq!(
            acc.query.must_not,
            vec![json!({"exists": {"field": "summary"}})]
        );

        let acc = compiled(&config, "summary__isnull=false");
        assert_eq!(
            acc.query.filter,
            vec![json!({"exists": {"field": "summary"}})]
        );

        // Not a recognized boolean literal: no clause at all.
        let acc = compiled(&config, "summary__exists=maybe");
        assert!(acc.query.filter.is_empty());
        assert!(acc.query.must_not.is_empty());
    }

    #[test]
    fn startswith_endswith_and_contains_map_onto_prefix_and_wildcard() {
        let config = config(&[("title", FilterField::default())]);
        let acc = compiled(&config, "title__startswith=lor");
        assert_eq!(acc.query.filter, vec![json!({"prefix": {"title": "lor"}})]);

        let acc = compiled(&config, "title__endswith=rem");
        assert_eq!(
            acc.query.filter,
            vec![json!({"wildcard": {"title": "*rem"}})]
        );

        let acc = compiled(&config, "title__contains=ore");
        assert_eq!(
            acc.query.filter,
            vec![json!({"wildcard": {"title": "*ore*"}})]
        );
    }

    #[test]
    fn unknown_parameters_and_suffixes_are_ignored() {
        let config = config(&[(
            "state",
            FilterField {
                lookups: vec![Lookup::Term],
                ..FilterField::default()
            },
        )]);
        // Unknown base name.
        let acc = compiled(&config, "color=red");
        assert!(acc.query.is_empty());
        // Unknown suffix on a known name.
        let acc = compiled(&config, "state__icontains=pub");
        assert!(acc.query.is_empty());
        // Known suffix outside the whitelist.
        let acc = compiled(&config, "state__range=1|2");
        assert!(acc.query.is_empty());
    }

    #[test]
    fn geo_lookups_never_match_in_the_common_backend() {
        let config = config(&[("location", FilterField::default())]);
        let acc = compiled(&config, "location__geo_distance=2km|43.5|-12.2");
        assert!(acc.query.is_empty());
    }

    #[test]
    fn each_occurrence_with_explicit_lookup_emits_its_own_clause() {
        let config = config(&[("price", FilterField::default())]);
        let acc = compiled(&config, "price__gt=10&price__gt=20");
        assert_eq!(acc.query.filter.len(), 2);
    }
}
