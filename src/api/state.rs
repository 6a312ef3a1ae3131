use std::sync::Arc;

use crate::{
    catalog::Catalog,
    config::Config,
    models::Manifest,
    services::{CatalogQueryEngine, LivenessVerifier, StreamProber},
};

/// Shared application state.
///
/// Everything in here is read-only after startup, so handlers share it
/// without locking.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub query_engine: CatalogQueryEngine,
    pub verifier: LivenessVerifier,
    pub manifest: Arc<Manifest>,
}

impl AppState {
    /// Wires the query engine and liveness verifier around one catalog
    pub fn new(catalog: Catalog, prober: Arc<dyn StreamProber>, config: &Config) -> Self {
        let catalog = Arc::new(catalog);

        Self {
            query_engine: CatalogQueryEngine::new(Arc::clone(&catalog)),
            verifier: LivenessVerifier::new(
                Arc::clone(&catalog),
                prober,
                config.probe_timeout(),
                config.max_concurrent_probes,
            ),
            manifest: Arc::new(Manifest::from_config(config)),
            catalog,
        }
    }
}
