//! Pagination policies.
//!
//! Two policies are supported: page numbers (`?page=2&page_size=20`,
//! optionally absorbing a short last page into its predecessor via
//! `orphans`) and limit/offset (`?limit=20&offset=40`). The window is
//! resolved before the engine call; the total comes back with the reply,
//! so out-of-range pages are detected after the fact and the orphan
//! merge is a client-side concatenation of hits that were fetched
//! preemptively.
//!
//! `next`/`previous` links keep every non-paging parameter in request
//! order, the way DRF paginators rebuild their URLs.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::params::RequestParams;

const PAGE_PARAM: &str = "page";
const PAGE_SIZE_PARAM: &str = "page_size";
const ORPHANS_PARAM: &str = "orphans";
const LIMIT_PARAM: &str = "limit";
const OFFSET_PARAM: &str = "offset";

/// Pagination policy and its bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum PaginationConfig {
    PageNumber {
        #[serde(default = "default_size")]
        page_size: usize,
        #[serde(default = "default_max_size")]
        max_page_size: usize,
        /// A trailing page with at most this many hits is merged into
        /// the page before it. Requests may override with `?orphans=N`.
        #[serde(default)]
        orphans: usize,
    },
    LimitOffset {
        #[serde(default = "default_size")]
        default_limit: usize,
        #[serde(default = "default_max_size")]
        max_limit: usize,
    },
}

fn default_size() -> usize {
    10
}

fn default_max_size() -> usize {
    100
}

impl Default for PaginationConfig {
    fn default() -> Self {
        PaginationConfig::PageNumber {
            page_size: default_size(),
            max_page_size: default_max_size(),
            orphans: 0,
        }
    }
}

impl PaginationConfig {
    pub fn validate(&self) -> Result<()> {
        match *self {
            PaginationConfig::PageNumber {
                page_size,
                max_page_size,
                ..
            } => {
                if page_size == 0 {
                    return Err(Error::Misconfigured("page size is 0".to_owned()));
                }
                if max_page_size < page_size {
                    return Err(Error::Misconfigured(
                        "max page size is below the default page size".to_owned(),
                    ));
                }
            }
            PaginationConfig::LimitOffset {
                default_limit,
                max_limit,
            } => {
                if default_limit == 0 {
                    return Err(Error::Misconfigured("default limit is 0".to_owned()));
                }
                if max_limit < default_limit {
                    return Err(Error::Misconfigured(
                        "max limit is below the default limit".to_owned(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Resolve the request window.
    ///
    /// Size parameters are clamped to their maxima and fall back to the
    /// defaults when unparseable; a bad `page` is an error because DRF
    /// answers it with 404 rather than silently serving page one.
    pub fn resolve(&self, params: &RequestParams) -> Result<ResolvedWindow> {
        match *self {
            PaginationConfig::PageNumber {
                page_size,
                max_page_size,
                orphans,
            } => {
                let page = match params.last_value(PAGE_PARAM) {
                    None => 1,
                    Some(raw) => match raw.parse::<usize>() {
                        Ok(page) if page >= 1 => page,
                        _ => {
                            return Err(Error::InvalidPage(format!(
                                "`{raw}` is not a valid page number"
                            )))
                        }
                    },
                };
                let page_size = params
                    .last_value(PAGE_SIZE_PARAM)
                    .and_then(|raw| raw.parse::<usize>().ok())
                    .filter(|size| *size > 0)
                    .map(|size| size.min(max_page_size))
                    .unwrap_or(page_size);
                let orphans = params
                    .last_value(ORPHANS_PARAM)
                    .and_then(|raw| raw.parse::<usize>().ok())
                    .unwrap_or(orphans);
                Ok(ResolvedWindow::PageNumber {
                    page,
                    page_size,
                    orphans,
                })
            }
            PaginationConfig::LimitOffset {
                default_limit,
                max_limit,
            } => {
                let limit = params
                    .last_value(LIMIT_PARAM)
                    .and_then(|raw| raw.parse::<usize>().ok())
                    .filter(|limit| *limit > 0)
                    .map(|limit| limit.min(max_limit))
                    .unwrap_or(default_limit);
                let offset = params
                    .last_value(OFFSET_PARAM)
                    .and_then(|raw| raw.parse::<usize>().ok())
                    .unwrap_or(0);
                Ok(ResolvedWindow::LimitOffset { limit, offset })
            }
        }
    }
}

/// The window resolved for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedWindow {
    PageNumber {
        page: usize,
        page_size: usize,
        orphans: usize,
    },
    LimitOffset {
        limit: usize,
        offset: usize,
    },
}

impl ResolvedWindow {
    /// Offset of the first hit to fetch.
    pub fn from(&self) -> usize {
        match *self {
            ResolvedWindow::PageNumber {
                page, page_size, ..
            } => (page - 1) * page_size,
            ResolvedWindow::LimitOffset { offset, .. } => offset,
        }
    }

    /// Number of hits to fetch. For page numbers this includes the
    /// potential orphan tail, so the merge never needs a second call.
    pub fn fetch_size(&self) -> usize {
        match *self {
            ResolvedWindow::PageNumber {
                page_size, orphans, ..
            } => page_size + orphans,
            ResolvedWindow::LimitOffset { limit, .. } => limit,
        }
    }
}

/// One shaped page: the hits to show plus envelope fields.
#[derive(Debug, Clone)]
pub struct Paginated {
    pub count: usize,
    /// `"gte"` when the engine reported the total as a lower bound.
    pub count_relation: Option<String>,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<Value>,
}

/// Slice the fetched hits into the page the client asked for and build
/// the paging links.
pub fn paginate(
    window: &ResolvedWindow,
    mut hits: Vec<Value>,
    count: usize,
    count_relation: Option<String>,
    pairs: &[(String, String)],
    base_url: Option<&str>,
) -> Result<Paginated> {
    let count_relation = count_relation.filter(|relation| relation == "gte");
    match *window {
        ResolvedWindow::PageNumber {
            page,
            page_size,
            orphans,
        } => {
            let num_pages = {
                let paged_hits = count.saturating_sub(orphans).max(1);
                (paged_hits + page_size - 1) / page_size
            };
            if page > num_pages {
                return Err(Error::InvalidPage(format!(
                    "page {page} of {num_pages} is out of range"
                )));
            }
            let top = page * page_size;
            let absorbed = top + orphans >= count;
            if !absorbed {
                hits.truncate(page_size);
            }
            let next = (page < num_pages).then(|| {
                build_url(
                    base_url,
                    pairs,
                    &[(PAGE_PARAM, Some((page + 1).to_string()))],
                )
            });
            let previous = (page > 1).then(|| {
                let target = if page - 1 == 1 {
                    (PAGE_PARAM, None)
                } else {
                    (PAGE_PARAM, Some((page - 1).to_string()))
                };
                build_url(base_url, pairs, &[target])
            });
            Ok(Paginated {
                count,
                count_relation,
                next,
                previous,
                results: hits,
            })
        }
        ResolvedWindow::LimitOffset { limit, offset } => {
            let next = (offset + limit < count).then(|| {
                build_url(
                    base_url,
                    pairs,
                    &[
                        (LIMIT_PARAM, Some(limit.to_string())),
                        (OFFSET_PARAM, Some((offset + limit).to_string())),
                    ],
                )
            });
            let previous = (offset > 0).then(|| {
                let target = if offset <= limit {
                    (OFFSET_PARAM, None)
                } else {
                    (OFFSET_PARAM, Some((offset - limit).to_string()))
                };
                build_url(
                    base_url,
                    pairs,
                    &[(LIMIT_PARAM, Some(limit.to_string())), target],
                )
            });
            Ok(Paginated {
                count,
                count_relation,
                next,
                previous,
                results: hits,
            })
        }
    }
}

/// Rebuild the query string with the given parameters replaced, removed
/// (`None`) or appended, keeping every other parameter in request order.
fn build_url(
    base_url: Option<&str>,
    pairs: &[(String, String)],
    changes: &[(&str, Option<String>)],
) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    let mut applied: Vec<&str> = Vec::new();
    for (name, value) in pairs {
        match changes.iter().find(|(key, _)| *key == name.as_str()) {
            Some((key, Some(replacement))) => {
                // Replace the first occurrence, drop any repeats.
                if !applied.contains(key) {
                    serializer.append_pair(name, replacement);
                    applied.push(key);
                }
            }
            Some((_, None)) => {}
            None => {
                serializer.append_pair(name, value);
            }
        }
    }
    for (key, value) in changes {
        if let Some(value) = value {
            if !applied.contains(key) {
                serializer.append_pair(key, value);
            }
        }
    }
    let query = serializer.finish();
    match base_url {
        Some(base) if query.is_empty() => base.to_owned(),
        Some(base) => format!("{base}?{query}"),
        None => format!("?{query}"),
    }
}
