use std::sync::Arc;

use serde::Deserialize;

use crate::{catalog::Catalog, models::CatalogEntry};

/// Fixed catalog page size
pub const PAGE_SIZE: i64 = 50;

/// `page` as clients send it: a number, or a string parsed leniently
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PageParam {
    Number(i64),
    Text(String),
}

impl PageParam {
    /// Resolved page number. Missing, zero or non-numeric input means page 1;
    /// negative pages are passed through untouched.
    pub fn resolve(page: Option<&PageParam>) -> i64 {
        let parsed = match page {
            Some(PageParam::Number(n)) => Some(*n),
            Some(PageParam::Text(text)) => parse_int_prefix(text),
            None => None,
        };

        match parsed {
            Some(0) | None => 1,
            Some(n) => n,
        }
    }
}

/// Parameters of a catalog listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CatalogQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub page: Option<PageParam>,
}

impl CatalogQuery {
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: Some(term.into()),
            page: None,
        }
    }

    pub fn with_page(mut self, page: i64) -> Self {
        self.page = Some(PageParam::Number(page));
        self
    }
}

/// Search, pagination and lookup over the catalog. Never touches the network.
#[derive(Debug, Clone)]
pub struct CatalogQueryEngine {
    catalog: Arc<Catalog>,
}

impl CatalogQueryEngine {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    /// Lists one page of catalog entries, optionally filtered by a
    /// case-insensitive substring of title or overview.
    pub fn search(&self, query: &CatalogQuery) -> Vec<CatalogEntry> {
        let needle = query
            .search
            .as_deref()
            .filter(|term| !term.is_empty())
            .map(str::to_lowercase);

        let matching: Vec<&CatalogEntry> = self
            .catalog
            .folded_entries()
            .filter(|(_, title, overview)| match &needle {
                Some(needle) => {
                    title.contains(needle.as_str()) || overview.contains(needle.as_str())
                }
                None => true,
            })
            .map(|(entry, _, _)| entry)
            .collect();

        let page = PageParam::resolve(query.page.as_ref());
        let start = page.saturating_sub(1).saturating_mul(PAGE_SIZE);
        let end = start.saturating_add(PAGE_SIZE);

        let (from, to) = slice_bounds(start, end, matching.len());

        tracing::debug!(
            search = ?query.search,
            page,
            matched = matching.len(),
            returned = to - from,
            "Catalog query"
        );

        matching[from..to].iter().map(|entry| (*entry).clone()).collect()
    }

    /// Metadata of the first record carrying `external_id`
    pub fn get_metadata(&self, external_id: &str) -> Option<CatalogEntry> {
        self.catalog
            .records_for(external_id)
            .first()
            .map(|record| CatalogEntry::from(*record))
    }
}

/// Leading-integer parse: optional whitespace and sign, then decimal digits.
/// Trailing characters are ignored; `None` when no digit leads.
fn parse_int_prefix(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digit_count = digits.bytes().take_while(u8::is_ascii_digit).count();
    if digit_count == 0 {
        return None;
    }

    let magnitude = digits[..digit_count]
        .bytes()
        .fold(0i64, |acc, b| acc.saturating_mul(10).saturating_add(i64::from(b - b'0')));

    Some(if negative { -magnitude } else { magnitude })
}

/// Resolves `[start, end)` against a sequence of `len` items. Negative bounds
/// count back from the end, so negative pages select a window near the tail
/// rather than failing.
fn slice_bounds(start: i64, end: i64, len: usize) -> (usize, usize) {
    let len = len as i64;
    let resolve = |index: i64| {
        if index < 0 {
            (len + index).max(0)
        } else {
            index.min(len)
        }
    };

    let from = resolve(start);
    let to = resolve(end);
    if from >= to {
        (0, 0)
    } else {
        (from as usize, to as usize)
    }
}
