//! Persistence of the plan snapshot behind an injected get/put abstraction.

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::models::PlanSnapshot;
use crate::normalize::snapshot_from_json;

/// Default storage key for the persisted plan.
pub const DEFAULT_STORAGE_KEY: &str = "portfolio-plan";

/// Errors from loading or saving a snapshot.
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Failed to serialize plan: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Where a plan snapshot lives between sessions.
pub trait SnapshotRepository {
    /// Load the stored snapshot, normalized. `Ok(None)` when nothing is stored.
    fn get(&self) -> Result<Option<PlanSnapshot>, RepositoryError>;

    /// Persist the snapshot, replacing whatever was stored.
    fn put(&mut self, snapshot: &PlanSnapshot) -> Result<(), RepositoryError>;
}

/// Key/value store holding serialized JSON, one document per key.
#[derive(Debug, Clone)]
pub struct InMemoryRepository {
    key: String,
    documents: FxHashMap<String, String>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::with_key(DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            documents: FxHashMap::default(),
        }
    }

    /// Raw stored document, if any.
    pub fn raw(&self) -> Option<&str> {
        self.documents.get(&self.key).map(String::as_str)
    }

    /// Store a raw document as-is (e.g. one written by an older version).
    pub fn put_raw(&mut self, json: impl Into<String>) {
        self.documents.insert(self.key.clone(), json.into());
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotRepository for InMemoryRepository {
    fn get(&self) -> Result<Option<PlanSnapshot>, RepositoryError> {
        match self.raw() {
            Some(json) => Ok(Some(snapshot_from_json(json)?)),
            None => Ok(None),
        }
    }

    fn put(&mut self, snapshot: &PlanSnapshot) -> Result<(), RepositoryError> {
        let json = serde_json::to_string(snapshot)?;
        self.put_raw(json);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LineItem, Override};

    #[test]
    fn test_empty_repository() {
        let repo = InMemoryRepository::new();
        assert!(repo.get().unwrap().is_none());
    }

    #[test]
    fn test_put_then_get() {
        let mut repo = InMemoryRepository::with_key("plan-a");
        let mut snapshot = PlanSnapshot {
            line_items: vec![LineItem::new(1, "Alpha").with_duration(3.0)],
            disciplines: vec!["Eng".to_string()],
            ..Default::default()
        };
        snapshot.team_capacities.insert("Eng".to_string(), 2.0);
        snapshot.scheduler_overrides.insert(1, Override::frozen(4));

        repo.put(&snapshot).unwrap();
        assert!(repo.raw().unwrap().contains("\"lineItems\""));
        assert_eq!(repo.get().unwrap(), Some(snapshot));
    }

    #[test]
    fn test_stored_document_is_normalized() {
        let mut repo = InMemoryRepository::new();
        repo.put_raw(r#"{"lineItems":[{"id":1,"dependencyIds":[1,5]}],"teamCapacities":{"Ghost":1}}"#);
        let loaded = repo.get().unwrap().unwrap();
        assert!(loaded.line_items[0].dependency_ids.is_empty());
        assert!(loaded.team_capacities.is_empty());
    }

    #[test]
    fn test_corrupt_document_is_an_error() {
        let mut repo = InMemoryRepository::new();
        repo.put_raw("{broken");
        assert!(matches!(repo.get(), Err(RepositoryError::Serialization(_))));
    }
}
