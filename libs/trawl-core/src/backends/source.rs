//! `_source` projection backend.
//!
//! Runs last so the projection can never interfere with clause
//! construction. The engine then returns only the requested fields in
//! each hit's `_source`.

use serde_json::{json, Map, Value};

use crate::config::SourceProjection;
use crate::error::Result;
use crate::request::SearchRequest;

use super::{CompileContext, FilterBackend};

pub struct SourceBackend;

impl FilterBackend for SourceBackend {
    fn apply(&self, ctx: &CompileContext<'_>, acc: &mut SearchRequest) -> Result<()> {
        if let Some(projection) = &ctx.config.source {
            acc.source = Some(match projection {
                SourceProjection::Fields(fields) => json!(fields),
                SourceProjection::Scoped { includes, excludes } => {
                    let mut scoped = Map::new();
                    if !includes.is_empty() {
                        scoped.insert("includes".to_owned(), json!(includes));
                    }
                    if !excludes.is_empty() {
                        scoped.insert("excludes".to_owned(), json!(excludes));
                    }
                    Value::Object(scoped)
                }
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{compile, Action};
    use crate::config::{BackendKind, ViewConfig};
    use crate::descriptor::DocumentDescriptor;
    use crate::params::RequestParams;

    fn compiled(config: &ViewConfig) -> SearchRequest {
        let params = RequestParams::from_query_string("", &config.separators);
        compile(&params, config, Action::List).unwrap()
    }

    #[test]
    fn field_list_is_emitted_verbatim() {
        let mut config = ViewConfig::new(
            DocumentDescriptor::new("books"),
            vec![BackendKind::Source],
        );
        config.source = Some(SourceProjection::Fields(vec![
            "id".to_owned(),
            "title".to_owned(),
        ]));
        let acc = compiled(&config);
        assert_eq!(acc.to_body()["_source"], json!(["id", "title"]));
    }

    #[test]
    fn scoped_projection_keeps_only_populated_lists() {
        let mut config = ViewConfig::new(
            DocumentDescriptor::new("books"),
            vec![BackendKind::Source],
        );
        config.source = Some(SourceProjection::Scoped {
            includes: vec!["title.*".to_owned()],
            excludes: vec![],
        });
        let acc = compiled(&config);
        assert_eq!(acc.to_body()["_source"], json!({"includes": ["title.*"]}));
    }

    #[test]
    fn absent_projection_leaves_source_untouched() {
        let config = ViewConfig::new(
            DocumentDescriptor::new("books"),
            vec![BackendKind::Source],
        );
        let acc = compiled(&config);
        assert!(acc.to_body().get("_source").is_none());
    }
}
