use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::MovieRecord,
};

/// Record layout of the catalog JSON files
#[derive(Debug, Clone, Deserialize)]
struct RawMovie {
    tt_id: String,
    name: String,
    #[serde(default)]
    overview: Option<String>,
    url: String,
}

impl From<RawMovie> for MovieRecord {
    fn from(raw: RawMovie) -> Self {
        MovieRecord {
            external_id: raw.tt_id.trim().to_string(),
            title: raw.name.trim().to_string(),
            overview: raw.overview.unwrap_or_default(),
            stream_url: raw.url.trim().to_string(),
        }
    }
}

/// Loads every catalog file in `dir` whose name contains `marker`.
///
/// Files are read in file-name order and their records concatenated. Fails if
/// no file matches or the files hold no usable record.
pub fn load_catalog_dir(dir: &Path, marker: &str) -> AppResult<Vec<MovieRecord>> {
    let files = catalog_files(dir, marker)?;

    if files.is_empty() {
        return Err(AppError::Ingestion(format!(
            "no files with '{}' in their names found in {}",
            marker,
            dir.display()
        )));
    }

    let mut records = Vec::new();
    for file in &files {
        let loaded = load_catalog_file(file)?;
        tracing::debug!(file = %file.display(), records = loaded.len(), "Loaded catalog file");
        records.extend(loaded);
    }

    if records.is_empty() {
        return Err(AppError::Ingestion(format!(
            "{} catalog file(s) in {} contained no movie records",
            files.len(),
            dir.display()
        )));
    }

    tracing::info!(
        files = files.len(),
        records = records.len(),
        dir = %dir.display(),
        "Catalog files ingested"
    );

    Ok(records)
}

fn catalog_files(dir: &Path, marker: &str) -> AppResult<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }

        let name_matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.contains(marker));
        let is_json = path.extension().and_then(|ext| ext.to_str()) == Some("json");

        if name_matches && is_json {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

fn load_catalog_file(path: &Path) -> AppResult<Vec<MovieRecord>> {
    let contents = std::fs::read_to_string(path)?;
    let raw: Vec<RawMovie> = serde_json::from_str(&contents).map_err(|source| AppError::Parse {
        file: path.display().to_string(),
        source,
    })?;

    let mut records = Vec::with_capacity(raw.len());
    for (index, movie) in raw.into_iter().enumerate() {
        let record = MovieRecord::from(movie);
        if record.external_id.is_empty() || record.title.is_empty() {
            tracing::warn!(
                file = %path.display(),
                index,
                "Skipping movie record without id or name"
            );
            continue;
        }
        records.push(record);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tokio_test::{assert_err, assert_ok};

    fn write(dir: &Path, name: &str, contents: &str) {
        fs::write(dir.join(name), contents).unwrap();
    }

    #[test]
    fn test_loads_matching_files_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "b_updated_movies.json",
            r#"[{"tt_id": "tt2", "name": "Baz", "overview": "", "url": "http://u3"}]"#,
        );
        write(
            dir.path(),
            "a_updated_movies.json",
            r#"[
                {"tt_id": "tt1", "name": "Foo", "overview": "A bar movie", "url": "http://u1"},
                {"tt_id": "tt1", "name": "Foo", "overview": "A bar movie", "url": "http://u2"}
            ]"#,
        );
        write(dir.path(), "notes.json", r#"[{"tt_id": "tt9"}]"#);
        write(dir.path(), "updated_movies.txt", "not json");

        let records = assert_ok!(load_catalog_dir(dir.path(), "updated_movies"));

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].stream_url, "http://u1");
        assert_eq!(records[1].stream_url, "http://u2");
        assert_eq!(records[2].external_id, "tt2");
    }

    #[test]
    fn test_missing_overview_becomes_empty() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "updated_movies_1.json",
            r#"[
                {"tt_id": "tt1", "name": "Foo", "url": "http://u1"},
                {"tt_id": "tt2", "name": "Bar", "overview": null, "url": "http://u2"}
            ]"#,
        );

        let records = assert_ok!(load_catalog_dir(dir.path(), "updated_movies"));
        assert_eq!(records[0].overview, "");
        assert_eq!(records[1].overview, "");
    }

    #[test]
    fn test_skips_records_without_id_or_name() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "updated_movies.json",
            r#"[
                {"tt_id": "", "name": "Nameless id", "url": "http://u0"},
                {"tt_id": "tt1", "name": "  ", "url": "http://u1"},
                {"tt_id": "tt2", "name": "Kept", "url": "http://u2"}
            ]"#,
        );

        let records = assert_ok!(load_catalog_dir(dir.path(), "updated_movies"));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Kept");
    }

    #[test]
    fn test_no_matching_files_is_ingestion_failure() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "movies.json", "[]");

        let err = assert_err!(load_catalog_dir(dir.path(), "updated_movies"));
        assert!(matches!(err, AppError::Ingestion(_)));
    }

    #[test]
    fn test_empty_files_are_ingestion_failure() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "updated_movies.json", "[]");

        let err = assert_err!(load_catalog_dir(dir.path(), "updated_movies"));
        assert!(matches!(err, AppError::Ingestion(_)));
    }

    #[test]
    fn test_malformed_json_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "updated_movies.json", "[{");

        let err = assert_err!(load_catalog_dir(dir.path(), "updated_movies"));
        assert!(matches!(err, AppError::Parse { .. }));
        assert!(err.to_string().contains("updated_movies.json"));
    }
}
