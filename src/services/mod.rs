pub mod catalog_query;
pub mod liveness;
pub mod probe;

pub use catalog_query::{CatalogQuery, CatalogQueryEngine, PageParam, PAGE_SIZE};
pub use liveness::LivenessVerifier;
pub use probe::{HttpProber, StreamProber};
