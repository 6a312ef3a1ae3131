use serde::Serialize;

use crate::config::Config;

/// Addon manifest served at `/manifest.json`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub id: String,
    pub version: String,
    pub name: String,
    pub description: String,
    pub resources: Vec<String>,
    pub types: Vec<String>,
    pub id_prefixes: Vec<String>,
    pub catalogs: Vec<ManifestCatalog>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManifestCatalog {
    #[serde(rename = "type")]
    pub content_type: String,
    pub id: String,
    pub name: String,
    pub genres: Vec<String>,
    pub extra: Vec<ManifestExtra>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManifestExtra {
    pub name: String,
}

impl Manifest {
    pub fn from_config(config: &Config) -> Self {
        let extra = ["genre", "skip", "search"]
            .iter()
            .map(|name| ManifestExtra {
                name: name.to_string(),
            })
            .collect();

        Self {
            id: config.addon_id.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            name: config.addon_name.clone(),
            description: "Movies from streams".to_string(),
            resources: vec!["catalog".into(), "stream".into(), "meta".into()],
            types: vec!["movie".into()],
            id_prefixes: vec!["tt".into()],
            catalogs: vec![ManifestCatalog {
                content_type: "movie".to_string(),
                id: config.catalog_id.clone(),
                name: config.addon_name.clone(),
                genres: vec!["All".to_string()],
                extra,
            }],
        }
    }

    /// Whether `(content_type, catalog_id)` names the catalog this addon serves
    pub fn serves_catalog(&self, content_type: &str, catalog_id: &str) -> bool {
        self.catalogs
            .iter()
            .any(|catalog| catalog.content_type == content_type && catalog.id == catalog_id)
    }
}
