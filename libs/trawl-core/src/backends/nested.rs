//! Nested-object filtering.
//!
//! Identical lookup grammar to the common backend, but every clause is
//! wrapped in `{"nested": {"path": .., "query": ..}}` so term-level
//! queries hit individual nested objects instead of the flattened
//! parent. The wrapper path comes from the whitelist entry and is
//! checked at construction to prefix the target field.

use crate::error::{Error, Result};
use crate::request::{ClauseSink, SearchRequest};

use super::filtering::apply_filter_table;
use super::{CompileContext, FilterBackend};

pub struct NestedFilteringBackend;

impl FilterBackend for NestedFilteringBackend {
    fn apply(&self, ctx: &CompileContext<'_>, acc: &mut SearchRequest) -> Result<()> {
        apply_filter_table(&ctx.config.nested_filter_fields, ctx, acc, |name, spec| {
            let path = spec.path.clone().ok_or_else(|| {
                Error::Misconfigured(format!("nested filter field `{name}` has no path"))
            })?;
            Ok(ClauseSink::Nested { path })
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::backends::{compile, Action};
    use crate::config::{BackendKind, FilterField, ViewConfig};
    use crate::descriptor::DocumentDescriptor;
    use crate::lookup::Lookup;
    use crate::params::RequestParams;
    use serde_json::json;

    fn config() -> ViewConfig {
        let mut config = ViewConfig::new(
            DocumentDescriptor::new("cities"),
            vec![BackendKind::NestedFiltering],
        );
        config.nested_filter_fields.insert(
            "country".to_owned(),
            FilterField {
                field: Some("continent.country.name".to_owned()),
                path: Some("continent.country".to_owned()),
                ..FilterField::default()
            },
        );
        config
    }

    #[test]
    fn clauses_are_wrapped_in_the_nested_path() {
        let config = config();
        let params =
            RequestParams::from_query_string("country__term=Armenia", &config.separators);
        let acc = compile(&params, &config, Action::List).unwrap();
        assert_eq!(
            acc.query.filter,
            vec![json!({
                "nested": {
                    "path": "continent.country",
                    "query": {"term": {"continent.country.name": "Armenia"}}
                }
            })]
        );
    }

    #[test]
    fn negations_wrap_before_landing_in_must_not() {
        let config = config();
        let params = RequestParams::from_query_string(
            "country__exclude=Atlantis",
            &config.separators,
        );
        let acc = compile(&params, &config, Action::List).unwrap();
        assert_eq!(
            acc.query.must_not,
            vec![json!({
                "nested": {
                    "path": "continent.country",
                    "query": {"term": {"continent.country.name": "Atlantis"}}
                }
            })]
        );
    }

    #[test]
    fn lookup_whitelists_apply_to_nested_fields_too() {
        let mut config = config();
        config
            .nested_filter_fields
            .get_mut("country")
            .unwrap()
            .lookups = vec![Lookup::Term];
        let params =
            RequestParams::from_query_string("country__wildcard=Arm*", &config.separators);
        let acc = compile(&params, &config, Action::List).unwrap();
        assert!(acc.query.is_empty());
    }
}
