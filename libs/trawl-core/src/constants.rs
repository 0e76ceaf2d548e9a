//! Wire-grammar constants.
//!
//! The URL grammar predates this crate and is kept bug-for-bug compatible
//! with the clients that speak it: lookup suffixes are glued to parameter
//! names with `__`, several scalar values are packed into one parameter
//! value with `|`, composite scalars (coordinate pairs, field lists) use
//! `,` and named options inside a value use `:`.

/// Separator between a parameter name and its lookup suffix.
pub const SEPARATOR_LOOKUP: &str = "__";

/// Separator between multiple scalar values packed into one parameter value.
pub const SEPARATOR_VALUE: &str = "|";

/// Separator between parts of one composite scalar, such as `lat,lon`.
pub const SEPARATOR_PART: &str = ",";

/// Separator between an option name and its value, such as `_name:box`,
/// and between a field list and the search text in search values.
pub const SEPARATOR_NAME: &str = ":";

/// Literals accepted as boolean true by `exists` and `isnull` lookups.
pub const TRUE_VALUES: &[&str] = &["true", "\"true\"", "1"];

/// Literals accepted as boolean false by `exists` and `isnull` lookups.
pub const FALSE_VALUES: &[&str] = &[
    "false", "\"false\"", "\"off\"", "\"no\"", "\"0\"", "\"\"", "", "0", "0.0",
];

/// Hard ceiling on `from + size`, mirroring the engine's own
/// `index.max_result_window` default.
pub const DEFAULT_MAX_RESULT_WINDOW: usize = 10_000;
