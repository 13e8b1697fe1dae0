//! Compiles free-form query-string parameters into a filter/sort/pagination
//! specification.

use serde_json::{Map, Value};
use std::collections::HashMap;

pub const SORT_BY: &str = "$sortBy";
pub const ORDER: &str = "$order";
pub const PAGE: &str = "$page";
pub const PAGE_SIZE: &str = "$pageSize";
pub const LIMIT: &str = "$limit";

pub const DEFAULT_PAGE_SIZE: u64 = 30;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Built fresh per request, never mutated after construction.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct QuerySpec {
    /// Equality constraints; parameter values are taken verbatim as strings.
    pub filter: Map<String, Value>,
    /// At most one field. `None` leaves documents in creation order.
    pub sort: Option<(String, SortOrder)>,
    pub skip: u64,
    /// `0` means unbounded.
    pub limit: u64,
}

/// Every non-reserved key/value pair becomes an equality filter; the
/// reserved `$`-prefixed parameters drive sort and pagination.
pub fn build(params: &HashMap<String, String>) -> QuerySpec {
    let page_size = positive_number(params.get(PAGE_SIZE)).unwrap_or(DEFAULT_PAGE_SIZE);
    QuerySpec {
        filter: build_filter(params),
        sort: build_sort(params),
        skip: (positive_number(params.get(PAGE)).unwrap_or(1) - 1).saturating_mul(page_size),
        limit: positive_number(params.get(LIMIT)).unwrap_or(page_size),
    }
}

fn build_filter(params: &HashMap<String, String>) -> Map<String, Value> {
    params
        .iter()
        .filter(|(key, _)| !is_reserved(key))
        .map(|(key, value)| (key.clone(), Value::String(value.clone())))
        .collect()
}

fn is_reserved(key: &str) -> bool {
    matches!(key, SORT_BY | ORDER | PAGE | PAGE_SIZE | LIMIT)
}

fn build_sort(params: &HashMap<String, String>) -> Option<(String, SortOrder)> {
    params.get(SORT_BY).map(|field| {
        let order = match params.get(ORDER).map(String::as_str) {
            Some("asc") => SortOrder::Ascending,
            _ => SortOrder::Descending,
        };
        (field.clone(), order)
    })
}

/// Absolute value of a numeric parameter; `None` when absent, non-numeric
/// or zero, so callers fall back to their default.
fn positive_number(param: Option<&String>) -> Option<u64> {
    param
        .and_then(|value| value.parse::<i64>().ok())
        .map(i64::unsigned_abs)
        .filter(|n| *n != 0)
}
