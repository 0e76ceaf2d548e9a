//! Geo-spatial filtering and ordering.
//!
//! Filtering understands `geo_distance`, `geo_polygon` and
//! `geo_bounding_box` lookups over the `geo_spatial_filter_fields`
//! whitelist. Filter values are `|`-separated segments; coordinates for
//! polygon and bounding-box clauses must parse as floats, distance
//! clauses pass their segments through verbatim.
//!
//! Ordering shares the `ordering` parameter with the plain ordering
//! backend and is disambiguated by value shape: a geo sort value packs
//! `field__lat__lon[__unit[__distance_type]]` with the lookup
//! separator, which a plain sort token never contains.

use serde_json::{json, Map, Value};

use crate::error::{Error, Result};
use crate::lookup::Lookup;
use crate::request::{BoolArm, SearchRequest};

use super::{CompileContext, FilterBackend};

const ORDERING_PARAM: &str = "ordering";

const POLYGON_OPTIONS: &[&str] = &["_name", "validation_method"];
const BOUNDING_BOX_OPTIONS: &[&str] = &["_name", "validation_method", "type"];

pub struct GeoSpatialFilteringBackend;

impl FilterBackend for GeoSpatialFilteringBackend {
    fn apply(&self, ctx: &CompileContext<'_>, acc: &mut SearchRequest) -> Result<()> {
        for group in ctx.params.grouped() {
            let Some(spec) = ctx.config.geo_spatial_filter_fields.get(group.base) else {
                continue;
            };
            let lookup = match group.lookup {
                Some(suffix) => match Lookup::from_suffix(suffix) {
                    Some(lookup) if spec.allows(lookup) => lookup,
                    _ => {
                        tracing::warn!(
                            param = group.raw_name,
                            suffix,
                            "ignoring unknown or disallowed geo lookup suffix"
                        );
                        continue;
                    }
                },
                None => match spec.default_lookup {
                    Some(lookup) => lookup,
                    None => continue,
                },
            };
            if !lookup.is_geo() {
                continue;
            }
            let field = spec.resolved_field(group.base);
            for value in &group.values {
                let clause = match lookup {
                    Lookup::GeoDistance => Some(geo_distance_clause(ctx, field, value)?),
                    Lookup::GeoPolygon => geo_polygon_clause(ctx, field, value)?,
                    Lookup::GeoBoundingBox => Some(geo_bounding_box_clause(ctx, field, value)?),
                    _ => {
                        tracing::warn!(
                            param = group.raw_name,
                            lookup = lookup.as_str(),
                            "geo lookup has no clause construction"
                        );
                        None
                    }
                };
                if let Some(clause) = clause {
                    acc.query.push(BoolArm::Filter, clause);
                }
            }
        }
        Ok(())
    }
}

/// `{distance}|{lat}|{lon}[|{distance_type}]`, all segments kept verbatim.
fn geo_distance_clause(ctx: &CompileContext<'_>, field: &str, value: &str) -> Result<Value> {
    let parts = ctx.config.separators.split_value_n(value, 4);
    if parts.len() < 3 {
        return Err(Error::MalformedParameter(format!(
            "geo_distance value `{value}` needs distance, lat and lon"
        )));
    }
    let distance_type = parts.get(3).copied().unwrap_or("sloppy_arc");
    Ok(json!({
        "geo_distance": {
            "distance": parts[0],
            field: {"lat": parts[1], "lon": parts[2]},
            "distance_type": distance_type,
        }
    }))
}

/// `|`-separated `lat,lon` pairs plus `key:value` options. Returns
/// `None` when no segment parses as a point.
fn geo_polygon_clause(
    ctx: &CompileContext<'_>,
    field: &str,
    value: &str,
) -> Result<Option<Value>> {
    let seps = &ctx.config.separators;
    let mut points: Vec<Value> = Vec::new();
    let mut options = Map::new();
    for segment in seps.split_value(value) {
        if segment.contains(seps.part.as_str()) {
            let pair = seps.split_parts(segment);
            if pair.len() >= 2 {
                points.push(json!({
                    "lat": parse_coordinate(pair[0])?,
                    "lon": parse_coordinate(pair[1])?,
                }));
            }
        } else if let Some((name, option)) = seps.split_named(segment) {
            if POLYGON_OPTIONS.contains(&name) {
                options.insert(name.to_owned(), json!(option));
            }
        }
    }
    if points.is_empty() {
        return Ok(None);
    }
    let mut body = Map::new();
    body.insert(field.to_owned(), json!({"points": points}));
    body.extend(options);
    Ok(Some(json!({"geo_polygon": body})))
}

/// First two segments are the `top_left` and `bottom_right` corners as
/// `lat,lon`; trailing segments are `key:value` options.
fn geo_bounding_box_clause(ctx: &CompileContext<'_>, field: &str, value: &str) -> Result<Value> {
    let seps = &ctx.config.separators;
    let segments = seps.split_value(value);
    if segments.len() < 2 {
        return Err(Error::MalformedParameter(format!(
            "geo_bounding_box value `{value}` needs two corners"
        )));
    }
    let top_left = corner(seps, segments[0])?;
    let bottom_right = corner(seps, segments[1])?;
    let mut options = Map::new();
    for segment in &segments[2..] {
        if let Some((name, option)) = seps.split_named(segment) {
            if BOUNDING_BOX_OPTIONS.contains(&name) {
                options.insert(name.to_owned(), json!(option));
            }
        }
    }
    let mut body = Map::new();
    body.insert(
        field.to_owned(),
        json!({"top_left": top_left, "bottom_right": bottom_right}),
    );
    body.extend(options);
    Ok(json!({"geo_bounding_box": body}))
}

fn corner(seps: &crate::params::Separators, segment: &str) -> Result<Value> {
    let pair = seps.split_parts(segment);
    if pair.len() < 2 {
        return Err(Error::MalformedParameter(format!(
            "`{segment}` is not a lat,lon pair"
        )));
    }
    Ok(json!({
        "lat": parse_coordinate(pair[0])?,
        "lon": parse_coordinate(pair[1])?,
    }))
}

fn parse_coordinate(raw: &str) -> Result<f64> {
    raw.parse::<f64>()
        .map_err(|_| Error::MalformedParameter(format!("`{raw}` is not a coordinate")))
}

pub struct GeoSpatialOrderingBackend;

impl FilterBackend for GeoSpatialOrderingBackend {
    fn apply(&self, ctx: &CompileContext<'_>, acc: &mut SearchRequest) -> Result<()> {
        let seps = &ctx.config.separators;
        for value in ctx.params.values_for(ORDERING_PARAM) {
            let (direction, stripped) = match value.strip_prefix('-') {
                Some(rest) => ("desc", rest),
                None => ("asc", value),
            };
            let segments: Vec<&str> = stripped.split(seps.lookup.as_str()).collect();
            // Plain sort tokens never contain the lookup separator.
            if segments.len() < 3 {
                continue;
            }
            let Some(spec) = ctx.config.geo_spatial_ordering_fields.get(segments[0]) else {
                continue;
            };
            let field = spec.resolved_field(segments[0]);
            let unit = segments.get(3).copied().unwrap_or("m");
            let distance_type = segments.get(4).copied().unwrap_or("sloppy_arc");
            acc.sort.push(json!({
                "_geo_distance": {
                    field: {"lat": segments[1], "lon": segments[2]},
                    "unit": unit,
                    "distance_type": distance_type,
                    "order": direction,
                }
            }));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{compile, Action};
    use crate::config::{BackendKind, FilterField, OrderingField, ViewConfig};
    use crate::descriptor::DocumentDescriptor;
    use crate::params::RequestParams;

    fn filter_config() -> ViewConfig {
        let mut config = ViewConfig::new(
            DocumentDescriptor::new("publishers"),
            vec![BackendKind::GeoSpatialFiltering],
        );
        config
            .geo_spatial_filter_fields
            .insert("location".to_owned(), FilterField::default());
        config
    }

    fn ordering_config() -> ViewConfig {
        let mut config = ViewConfig::new(
            DocumentDescriptor::new("publishers"),
            vec![BackendKind::GeoSpatialOrdering],
        );
        config
            .geo_spatial_ordering_fields
            .insert("location".to_owned(), OrderingField::default());
        config
    }

    fn compiled(config: &ViewConfig, query: &str) -> Result<SearchRequest> {
        let params = RequestParams::from_query_string(query, &config.separators);
        compile(&params, config, Action::List)
    }

    #[test]
    fn geo_distance_keeps_segments_verbatim() {
        let acc = compiled(
            &filter_config(),
            "location__geo_distance=1km|48.8549|2.3000",
        )
        .unwrap();
        assert_eq!(
            acc.query.filter,
            vec![json!({
                "geo_distance": {
                    "distance": "1km",
                    "location": {"lat": "48.8549", "lon": "2.3000"},
                    "distance_type": "sloppy_arc",
                }
            })]
        );
    }

    #[test]
    fn geo_distance_honors_an_explicit_distance_type() {
        let acc = compiled(
            &filter_config(),
            "location__geo_distance=2km|43.53|-12.23|arc",
        )
        .unwrap();
        assert_eq!(
            acc.query.filter[0]["geo_distance"]["distance_type"],
            json!("arc")
        );
    }

    #[test]
    fn geo_distance_with_missing_segments_is_malformed() {
        let result = compiled(&filter_config(), "location__geo_distance=1km|48.85");
        assert!(matches!(result, Err(Error::MalformedParameter(_))));
    }

    #[test]
    fn geo_polygon_parses_points_and_named_options() {
        let acc = compiled(
            &filter_config(),
            "location__geo_polygon=40,-70|30,-80|20,-90|_name:box|validation_method:IGNORE_MALFORMED",
        )
        .unwrap();
        assert_eq!(
            acc.query.filter,
            vec![json!({
                "geo_polygon": {
                    "location": {
                        "points": [
                            {"lat": 40.0, "lon": -70.0},
                            {"lat": 30.0, "lon": -80.0},
                            {"lat": 20.0, "lon": -90.0}
                        ]
                    },
                    "_name": "box",
                    "validation_method": "IGNORE_MALFORMED",
                }
            })]
        );
    }

    #[test]
    fn geo_polygon_rejects_unparseable_coordinates() {
        let result = compiled(&filter_config(), "location__geo_polygon=40,north|30,-80");
        assert!(matches!(result, Err(Error::MalformedParameter(_))));
    }

    #[test]
    fn geo_bounding_box_builds_both_corners() {
        let acc = compiled(
            &filter_config(),
            "location__geo_bounding_box=40.73,-74.1|40.01,-71.12",
        )
        .unwrap();
        assert_eq!(
            acc.query.filter,
            vec![json!({
                "geo_bounding_box": {
                    "location": {
                        "top_left": {"lat": 40.73, "lon": -74.1},
                        "bottom_right": {"lat": 40.01, "lon": -71.12},
                    }
                }
            })]
        );
    }

    #[test]
    fn geo_bounding_box_with_one_corner_is_malformed() {
        let result = compiled(&filter_config(), "location__geo_bounding_box=40.73,-74.1");
        assert!(matches!(result, Err(Error::MalformedParameter(_))));
    }

    #[test]
    fn geo_ordering_emits_geo_distance_sort_entries() {
        let acc = compiled(&ordering_config(), "ordering=-location__45.32__-34.34|km")
            .unwrap();
        // `|km` stays glued to the lon segment and is not a unit.
        assert_eq!(acc.sort.len(), 1);

        let acc = compiled(
            &ordering_config(),
            "ordering=-location__45.3214__-34.3421__km__plane",
        )
        .unwrap();
        assert_eq!(
            acc.sort,
            vec![json!({
                "_geo_distance": {
                    "location": {"lat": "45.3214", "lon": "-34.3421"},
                    "unit": "km",
                    "distance_type": "plane",
                    "order": "desc",
                }
            })]
        );
    }

    #[test]
    fn geo_ordering_defaults_unit_and_distance_type() {
        let acc =
            compiled(&ordering_config(), "ordering=location__45.32__-34.34").unwrap();
        assert_eq!(
            acc.sort,
            vec![json!({
                "_geo_distance": {
                    "location": {"lat": "45.32", "lon": "-34.34"},
                    "unit": "m",
                    "distance_type": "sloppy_arc",
                    "order": "asc",
                }
            })]
        );
    }

    #[test]
    fn plain_sort_tokens_are_left_to_the_ordering_backend() {
        let acc = compiled(&ordering_config(), "ordering=title").unwrap();
        assert!(acc.sort.is_empty());
        let acc = compiled(&ordering_config(), "ordering=-published_on").unwrap();
        assert!(acc.sort.is_empty());
    }

    #[test]
    fn unknown_geo_field_names_are_dropped() {
        let acc = compiled(&ordering_config(), "ordering=office__45.32__-34.34").unwrap();
        assert!(acc.sort.is_empty());
    }
}
