//! Criterion benchmarks for query-string compilation.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;
use std::time::Duration;
use trawl_core::{
    compile, Action, BackendKind, DocumentDescriptor, RequestParams, SearchRequest, ViewConfig,
};

fn bench_config() -> ViewConfig {
    let mut config = ViewConfig::new(
        DocumentDescriptor::new("books"),
        vec![
            BackendKind::Filtering,
            BackendKind::PostFilter,
            BackendKind::Ids,
            BackendKind::CompoundSearch,
            BackendKind::FacetedSearch,
            BackendKind::Highlight,
            BackendKind::Ordering,
            BackendKind::DefaultOrdering,
        ],
    );
    config.filter_fields = serde_json::from_value(json!({
        "state": {"field": "state.raw"},
        "isbn": {"field": "isbn.raw"},
        "price": {},
        "pages": {},
        "tags": {"field": "tags.raw"}
    }))
    .unwrap();
    config.post_filter_fields = serde_json::from_value(json!({
        "state_pf": {"field": "state.raw"}
    }))
    .unwrap();
    config.search_fields = serde_json::from_value(json!({
        "title": {"boost": 4},
        "summary": {"boost": 2},
        "description": null
    }))
    .unwrap();
    config.faceted_search_fields = serde_json::from_value(json!({
        "state": {"field": "state.raw"}
    }))
    .unwrap();
    config.highlight_fields = serde_json::from_value(json!({
        "title": {"options": {"number_of_fragments": 0}}
    }))
    .unwrap();
    config.ordering_fields = serde_json::from_value(json!({
        "title": {"field": "title.raw"},
        "price": {},
        "publication_date": {}
    }))
    .unwrap();
    config.ordering_defaults = vec!["id".to_owned()];
    config
}

fn custom_criterion() -> Criterion {
    Criterion::default()
        .sample_size(50)
        .warm_up_time(Duration::from_millis(200))
        .measurement_time(Duration::from_secs(2))
}

fn compile_query(config: &ViewConfig, query: &str) -> SearchRequest {
    let params = RequestParams::from_query_string(query, &config.separators);
    compile(&params, config, Action::List).unwrap()
}

fn bench_parsing(c: &mut Criterion) {
    let config = bench_config();
    c.bench_function("parse_query_string", |b| {
        b.iter(|| {
            RequestParams::from_query_string(
                black_box("state=published&price__range=10|200&tags__contains=fic&page=3"),
                &config.separators,
            )
        })
    });
}

fn bench_filtering(c: &mut Criterion) {
    let config = bench_config();

    c.bench_function("term_filter", |b| {
        b.iter(|| compile_query(&config, black_box("state=published")))
    });

    c.bench_function("packed_terms_filter", |b| {
        b.iter(|| {
            compile_query(
                &config,
                black_box("state__terms=published|draft|rejected&price__range=10|200|2.0"),
            )
        })
    });
}

fn bench_search(c: &mut Criterion) {
    let config = bench_config();
    c.bench_function("boosted_search", |b| {
        b.iter(|| compile_query(&config, black_box("search=lorem%20ipsum%20dolor")))
    });
}

fn bench_full_request(c: &mut Criterion) {
    let config = bench_config();
    let query = "search=lorem&state__in=published|draft&price__gte=10&pages__lt=1000\
                 &tags__contains=fic&facet=state&state_pf=published&highlight=title\
                 &ordering=-price,title&ids=54|55|56";
    c.bench_function("full_pipeline", |b| {
        b.iter(|| compile_query(&config, black_box(query)))
    });
}

fn bench_body_render(c: &mut Criterion) {
    let config = bench_config();
    let acc = compile_query(
        &config,
        "search=lorem&state=published&facet=state&ordering=-price",
    );
    c.bench_function("render_body", |b| b.iter(|| black_box(&acc).to_body()));
}

criterion_group! {
    name = benches;
    config = custom_criterion();
    targets =
        bench_parsing,
        bench_filtering,
        bench_search,
        bench_full_request,
        bench_body_render
}
criterion_main!(benches);
