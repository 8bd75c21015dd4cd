use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use tracing::{error, info, warn};

use crate::error::LoadError;
use crate::models::Application;

const BUNDLED_DATA: &str = include_str!("../data/sample-applications.json");

/// Where the application records come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Bundled,
    File(PathBuf),
}

impl DataSource {
    pub fn from_path(path: Option<PathBuf>) -> Self {
        path.map_or(Self::Bundled, Self::File)
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bundled => f.write_str("bundled sample data"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Loaded,
    Failed(String),
}

/// Read-only collection of application records, loaded once.
///
/// A failed load leaves the store empty with `LoadStatus::Failed`; nothing
/// retries on its own, callers decide whether to offer `reload`.
pub struct RecordStore {
    records: Vec<Application>,
    source: DataSource,
    status: LoadStatus,
}

impl RecordStore {
    pub fn open(source: DataSource) -> Self {
        let (records, status) = match Self::load(&source) {
            Ok(records) => {
                info!(count = records.len(), source = %source, "loaded applications");
                (records, LoadStatus::Loaded)
            }
            Err(e) => {
                error!(source = %source, error = %e, "failed to load applications");
                (Vec::new(), LoadStatus::Failed(e.to_string()))
            }
        };
        Self {
            records,
            source,
            status,
        }
    }

    #[cfg(test)]
    pub fn from_records(records: Vec<Application>) -> Self {
        Self {
            records,
            source: DataSource::Bundled,
            status: LoadStatus::Loaded,
        }
    }

    pub fn load(source: &DataSource) -> Result<Vec<Application>, LoadError> {
        match source {
            DataSource::Bundled => parse_records(BUNDLED_DATA),
            DataSource::File(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| LoadError::Read {
                    path: path.clone(),
                    source: e,
                })?;
                parse_records(&content)
            }
        }
    }

    /// Manual retry after a failed load.
    pub fn reload(&mut self) {
        *self = Self::open(self.source.clone());
    }

    pub fn records(&self) -> &[Application] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&Application> {
        self.records.iter().find(|r| r.id == id)
    }

    #[cfg(test)]
    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn failure(&self) -> Option<&str> {
        match &self.status {
            LoadStatus::Failed(message) => Some(message),
            LoadStatus::Loaded => None,
        }
    }

    pub fn source(&self) -> &DataSource {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Parse and check a record array. Skill names are joined with commas in
/// the view link, so a skill whose name contains one is dropped.
pub fn parse_records(json: &str) -> Result<Vec<Application>, LoadError> {
    let mut records: Vec<Application> = serde_json::from_str(json)?;
    let mut seen = HashSet::with_capacity(records.len());
    for record in &records {
        if !seen.insert(record.id.as_str()) {
            return Err(LoadError::DuplicateId(record.id.clone()));
        }
    }
    for record in &mut records {
        record.skills.retain(|skill| {
            let keep = !skill.name.contains(',');
            if !keep {
                warn!(id = %record.id, skill = %skill.name, "skipping skill with a comma in its name");
            }
            keep
        });
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn bundled_data_loads() {
        let store = RecordStore::open(DataSource::Bundled);
        assert_eq!(store.status(), &LoadStatus::Loaded);
        assert!(store.len() >= 10);
        let first = &store.records()[0];
        assert!(store.get(&first.id).is_some());
    }

    #[test]
    fn missing_file_yields_empty_failed_store() {
        let store = RecordStore::open(DataSource::File(PathBuf::from("/nonexistent/apps.json")));
        assert!(store.is_empty());
        assert!(store.failure().unwrap().contains("failed to read"));
    }

    #[test]
    fn malformed_file_yields_empty_failed_store() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[{{\"id\": ").unwrap();
        let store = RecordStore::open(DataSource::File(file.path().to_path_buf()));
        assert!(store.is_empty());
        assert!(matches!(store.status(), LoadStatus::Failed(_)));
    }

    #[test]
    fn reload_picks_up_fixed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let mut store = RecordStore::open(DataSource::File(file.path().to_path_buf()));
        assert!(store.failure().is_some());

        std::fs::write(file.path(), r#"[{"id": "1", "name": "Alice Smith"}]"#).unwrap();
        store.reload();
        assert_eq!(store.status(), &LoadStatus::Loaded);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let json = r#"[{"id": "1", "name": "A"}, {"id": "1", "name": "B"}]"#;
        assert!(matches!(parse_records(json), Err(LoadError::DuplicateId(id)) if id == "1"));
    }

    #[test]
    fn skills_with_commas_are_dropped() {
        let json = r#"[{"id": "1", "name": "A", "skills": [
            {"name": "C,C++", "years": 2},
            {"name": "Go", "years": 3}
        ]}]"#;
        let records = parse_records(json).unwrap();
        let names: Vec<&str> = records[0].skills.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Go"]);
    }
}
