//! Immutable in-memory movie catalog.
//!
//! Built once at startup from the ingested records and shared read-only
//! (behind an `Arc`) by the query engine and the liveness verifier.

use std::collections::HashMap;

use crate::{
    error::{AppError, AppResult},
    models::{CatalogEntry, MovieRecord},
};

pub mod loader;

pub use loader::load_catalog_dir;

#[derive(Debug)]
pub struct Catalog {
    records: Vec<MovieRecord>,
    /// externalId → positions in `records`, ascending
    by_external_id: HashMap<String, Vec<usize>>,
    /// One entry per distinct externalId, first-seen order
    entries: Vec<CatalogEntry>,
    /// Lowercased `(title, overview)` per entry, same order as `entries`
    folded: Vec<(String, String)>,
}

impl Catalog {
    /// Indexes `records`, keeping their order.
    ///
    /// An empty record set is an ingestion failure: serving nothing is a
    /// misconfiguration, not a legitimate catalog.
    pub fn new(records: Vec<MovieRecord>) -> AppResult<Self> {
        if records.is_empty() {
            return Err(AppError::Ingestion(
                "catalog source yielded no movie records".to_string(),
            ));
        }

        let mut by_external_id: HashMap<String, Vec<usize>> = HashMap::new();
        let mut entries = Vec::new();

        for (position, record) in records.iter().enumerate() {
            let positions = by_external_id
                .entry(record.external_id.clone())
                .or_default();
            if positions.is_empty() {
                entries.push(CatalogEntry::from(record));
            }
            positions.push(position);
        }

        let folded = entries
            .iter()
            .map(|entry| (entry.title.to_lowercase(), entry.overview.to_lowercase()))
            .collect();

        tracing::info!(
            records = records.len(),
            movies = entries.len(),
            "Catalog indexed"
        );

        Ok(Self {
            records,
            by_external_id,
            entries,
            folded,
        })
    }

    /// All records sharing `external_id`, in catalog order
    pub fn records_for(&self, external_id: &str) -> Vec<&MovieRecord> {
        self.by_external_id
            .get(external_id)
            .map(|positions| positions.iter().map(|&i| &self.records[i]).collect())
            .unwrap_or_default()
    }

    /// Grouped metadata entries, first record per externalId wins
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Entries paired with their lowercased title and overview
    pub fn folded_entries(&self) -> impl Iterator<Item = (&CatalogEntry, &str, &str)> {
        self.entries
            .iter()
            .zip(&self.folded)
            .map(|(entry, (title, overview))| (entry, title.as_str(), overview.as_str()))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
