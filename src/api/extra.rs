//! Catalog "extra" arguments.
//!
//! Clients pass search and paging either as a trailing path segment
//! (`/catalog/movie/<id>/search=foo&page=2.json`) or as a query string. Both
//! use `key=value&...` form encoding. Unknown keys (`genre`, `skip`) are
//! ignored and nothing here ever fails.

use percent_encoding::percent_decode_str;

use crate::services::{CatalogQuery, PageParam};

/// Parses a form-encoded `key=value&...` string into a catalog query
pub fn parse_extra(raw: &str) -> CatalogQuery {
    let mut query = CatalogQuery::default();

    for pair in raw.split('&').filter(|pair| !pair.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let value = decode_component(value);

        match decode_component(key).as_str() {
            "search" => query.search = Some(value),
            "page" => query.page = Some(PageParam::Text(value)),
            _ => {}
        }
    }

    query
}

/// Combines path and query-string extras; path values take precedence
pub fn merge(path: CatalogQuery, query_string: CatalogQuery) -> CatalogQuery {
    CatalogQuery {
        search: path.search.or(query_string.search),
        page: path.page.or(query_string.page),
    }
}

/// Strips a trailing `.json` from a path segment
pub fn strip_json_suffix(segment: &str) -> &str {
    segment.strip_suffix(".json").unwrap_or(segment)
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}
