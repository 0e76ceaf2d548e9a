//! Query-string parameter parsing.
//!
//! Requests arrive as an ordered list of `(name, value)` pairs. Parsing
//! splits each name on the first lookup separator into a base name and an
//! optional lookup suffix, trims values and drops the empty ones. Nothing
//! is validated here; whitelist matching happens in the individual
//! backends so that unknown parameters can be ignored silently.

use serde::{Deserialize, Serialize};

use crate::constants::{
    FALSE_VALUES, SEPARATOR_LOOKUP, SEPARATOR_NAME, SEPARATOR_PART, SEPARATOR_VALUE, TRUE_VALUES,
};

/// The separator set a view speaks.
///
/// Defaults match the historical wire grammar. Only deployments that need
/// to filter on values containing `|` ever override these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Separators {
    /// Between a parameter name and its lookup suffix.
    #[serde(default = "default_lookup_separator")]
    pub lookup: String,
    /// Between multiple scalar values packed into one parameter value.
    #[serde(default = "default_value_separator")]
    pub value: String,
    /// Between parts of one composite scalar, such as `lat,lon`.
    #[serde(default = "default_part_separator")]
    pub part: String,
    /// Between an option name and its value, and between a field list and
    /// the search text.
    #[serde(default = "default_name_separator")]
    pub name: String,
}

fn default_lookup_separator() -> String {
    SEPARATOR_LOOKUP.to_owned()
}

fn default_value_separator() -> String {
    SEPARATOR_VALUE.to_owned()
}

fn default_part_separator() -> String {
    SEPARATOR_PART.to_owned()
}

fn default_name_separator() -> String {
    SEPARATOR_NAME.to_owned()
}

impl Default for Separators {
    fn default() -> Self {
        Separators {
            lookup: default_lookup_separator(),
            value: default_value_separator(),
            part: default_part_separator(),
            name: default_name_separator(),
        }
    }
}

impl Separators {
    /// Split a parameter name into base name and lookup suffix at the
    /// first occurrence of the lookup separator.
    pub fn split_name<'a>(&self, name: &'a str) -> (&'a str, Option<&'a str>) {
        match name.split_once(self.lookup.as_str()) {
            Some((base, suffix)) => (base, Some(suffix)),
            None => (name, None),
        }
    }

    /// Split a value on the value separator.
    pub fn split_value<'a>(&self, value: &'a str) -> Vec<&'a str> {
        value.split(self.value.as_str()).collect()
    }

    /// Split a value on the value separator into at most `max_parts`
    /// segments; the last segment keeps any remaining separators.
    pub fn split_value_n<'a>(&self, value: &'a str, max_parts: usize) -> Vec<&'a str> {
        value.splitn(max_parts, self.value.as_str()).collect()
    }

    /// Split a composite scalar on the part separator.
    pub fn split_parts<'a>(&self, value: &'a str) -> Vec<&'a str> {
        value.split(self.part.as_str()).collect()
    }

    /// Split `name:value` at the first name separator.
    pub fn split_named<'a>(&self, value: &'a str) -> Option<(&'a str, &'a str)> {
        value.split_once(self.name.as_str())
    }
}

/// One query parameter occurrence, name already split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawParam {
    /// The parameter name exactly as the client sent it.
    pub raw_name: String,
    /// Name part before the first lookup separator.
    pub base: String,
    /// Lookup suffix, when the name carried one.
    pub lookup: Option<String>,
    /// Trimmed value. Never empty.
    pub value: String,
}

/// All parameter occurrences of one request, in request order.
#[derive(Debug, Clone, Default)]
pub struct RequestParams {
    items: Vec<RawParam>,
}

/// Occurrences of one raw parameter name, grouped for whitelist matching.
#[derive(Debug, Clone)]
pub struct ParamGroup<'a> {
    /// The parameter name exactly as the client sent it.
    pub raw_name: &'a str,
    /// Name part before the first lookup separator.
    pub base: &'a str,
    /// Lookup suffix, when the name carried one.
    pub lookup: Option<&'a str>,
    /// Trimmed, non-empty values in request order.
    pub values: Vec<&'a str>,
}

impl RequestParams {
    /// Parse ordered `(name, value)` pairs. Values are trimmed; empty
    /// values are dropped.
    pub fn from_pairs(pairs: &[(String, String)], separators: &Separators) -> Self {
        let items = pairs
            .iter()
            .filter_map(|(name, value)| {
                let value = value.trim();
                if value.is_empty() {
                    return None;
                }
                let (base, lookup) = separators.split_name(name);
                Some(RawParam {
                    raw_name: name.clone(),
                    base: base.to_owned(),
                    lookup: lookup.map(str::to_owned),
                    value: value.to_owned(),
                })
            })
            .collect();
        RequestParams { items }
    }

    /// Parse a raw query string such as `state__terms=published|draft&page=2`.
    pub fn from_query_string(query: &str, separators: &Separators) -> Self {
        let pairs: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect();
        Self::from_pairs(&pairs, separators)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RawParam> {
        self.items.iter()
    }

    /// All values sent under one exact parameter name, in request order.
    pub fn values_for(&self, raw_name: &str) -> Vec<&str> {
        self.items
            .iter()
            .filter(|item| item.raw_name == raw_name)
            .map(|item| item.value.as_str())
            .collect()
    }

    /// First value sent under one exact parameter name.
    pub fn first_value(&self, raw_name: &str) -> Option<&str> {
        self.items
            .iter()
            .find(|item| item.raw_name == raw_name)
            .map(|item| item.value.as_str())
    }

    /// Last value sent under one exact parameter name. Repeated paging
    /// parameters resolve to the last occurrence, like Django's
    /// `QueryDict.get`.
    pub fn last_value(&self, raw_name: &str) -> Option<&str> {
        self.items
            .iter()
            .rev()
            .find(|item| item.raw_name == raw_name)
            .map(|item| item.value.as_str())
    }

    /// Occurrences grouped by raw parameter name, groups ordered by first
    /// appearance.
    pub fn grouped(&self) -> Vec<ParamGroup<'_>> {
        let mut groups: Vec<ParamGroup<'_>> = Vec::new();
        for item in &self.items {
            match groups.iter_mut().find(|g| g.raw_name == item.raw_name) {
                Some(group) => group.values.push(item.value.as_str()),
                None => groups.push(ParamGroup {
                    raw_name: &item.raw_name,
                    base: &item.base,
                    lookup: item.lookup.as_deref(),
                    values: vec![item.value.as_str()],
                }),
            }
        }
        groups
    }
}

/// Decode one of the historical pseudo-boolean literals.
///
/// Returns `None` when the value is neither a true nor a false literal;
/// callers skip the clause in that case.
pub fn parse_bool(value: &str) -> Option<bool> {
    let lower = value.to_lowercase();
    if TRUE_VALUES.contains(&lower.as_str()) {
        Some(true)
    } else if FALSE_VALUES.contains(&lower.as_str()) {
        Some(false)
    } else {
        None
    }
}
