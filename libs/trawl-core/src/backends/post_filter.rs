//! Post-filtering.
//!
//! Same grammar and clause shapes as the common backend, but clauses
//! land in the request's `post_filter` compound, which narrows hits
//! after aggregations are computed. Facet counts therefore reflect the
//! unfiltered result set while the hit list honors the filter.

use crate::error::Result;
use crate::request::{ClauseSink, SearchRequest};

use super::filtering::apply_filter_table;
use super::{CompileContext, FilterBackend};

pub struct PostFilterBackend;

impl FilterBackend for PostFilterBackend {
    fn apply(&self, ctx: &CompileContext<'_>, acc: &mut SearchRequest) -> Result<()> {
        apply_filter_table(&ctx.config.post_filter_fields, ctx, acc, |_, _| {
            Ok(ClauseSink::PostFilter)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::backends::{compile, Action};
    use crate::config::{BackendKind, FilterField, ViewConfig};
    use crate::descriptor::DocumentDescriptor;
    use crate::params::RequestParams;
    use serde_json::json;

    #[test]
    fn clauses_land_in_post_filter_not_query() {
        let mut config = ViewConfig::new(
            DocumentDescriptor::new("books"),
            vec![BackendKind::PostFilter],
        );
        config.post_filter_fields.insert(
            "state".to_owned(),
            FilterField {
                field: Some("state.raw".to_owned()),
                ..FilterField::default()
            },
        );
        let params = RequestParams::from_query_string(
            "state__term=published",
            &config.separators,
        );
        let acc = compile(&params, &config, Action::List).unwrap();
        assert!(acc.query.is_empty());
        assert_eq!(
            acc.post_filter.filter,
            vec![json!({"term": {"state.raw": "published"}})]
        );
        let body = acc.to_body();
        assert_eq!(body["query"], json!({"match_all": {}}));
        assert_eq!(
            body["post_filter"],
            json!({"bool": {"filter": [{"term": {"state.raw": "published"}}]}})
        );
    }

    #[test]
    fn negations_land_in_post_filter_must_not() {
        let mut config = ViewConfig::new(
            DocumentDescriptor::new("books"),
            vec![BackendKind::PostFilter],
        );
        config
            .post_filter_fields
            .insert("tag".to_owned(), FilterField::default());
        let params =
            RequestParams::from_query_string("tag__exclude=spam", &config.separators);
        let acc = compile(&params, &config, Action::List).unwrap();
        assert_eq!(
            acc.post_filter.must_not,
            vec![json!({"term": {"tag": "spam"}})]
        );
    }
}
