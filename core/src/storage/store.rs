use crate::prelude::{CoreError, CoreResult};
use crate::storage::Settings;
use crate::survey::Waypoint;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Everything a survey needs to resume after a restart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveyState {
    pub settings: Settings,
    pub revolutions: u64,
    /// Centimeters walked, each revolution priced at the circumference in
    /// force when it was counted. Absent in older files.
    pub distance_cm: Option<f64>,
    pub waypoints: Vec<Waypoint>,
}

/// Persistence handle owned by whichever component writes survey state.
pub trait StateStore: Send + Sync {
    fn load(&self) -> CoreResult<Option<SurveyState>>;
    fn save(&self, state: &SurveyState) -> CoreResult<()>;
    fn clear(&self) -> CoreResult<()>;
}

/// Stores the state as a single JSON document, replaced atomically on save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> CoreResult<Option<SurveyState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)?;
        let state = serde_json::from_str(&contents)?;
        Ok(Some(state))
    }

    fn save(&self, state: &SurveyState) -> CoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, serde_json::to_vec_pretty(state)?)?;
        fs::rename(&staging, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> CoreResult<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// Volatile store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Option<SurveyState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> CoreResult<Option<SurveyState>> {
        self.inner
            .lock()
            .map(|guard| guard.clone())
            .map_err(|_| CoreError::Storage("memory store lock poisoned".into()))
    }

    fn save(&self, state: &SurveyState) -> CoreResult<()> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| CoreError::Storage("memory store lock poisoned".into()))?;
        *guard = Some(state.clone());
        Ok(())
    }

    fn clear(&self) -> CoreResult<()> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| CoreError::Storage("memory store lock poisoned".into()))?;
        *guard = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::SourceKind;

    fn sample_state() -> SurveyState {
        SurveyState {
            settings: Settings {
                wheel_circumference_cm: 20.0,
                ..Default::default()
            },
            revolutions: 12,
            distance_cm: Some(240.0),
            waypoints: vec![Waypoint {
                sequence_number: 0,
                distance: 2.4,
                heading: 135.25,
                depth: -3.0,
                source_kind: SourceKind::Manual,
            }],
        }
    }

    #[test]
    fn file_store_round_trips_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("survey.json"));
        assert_eq!(store.load().unwrap(), None);

        store.save(&sample_state()).unwrap();
        assert_eq!(store.load().unwrap(), Some(sample_state()));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn corrupt_file_reports_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("survey.json");
        fs::write(&path, b"{not json").unwrap();
        let store = JsonFileStore::new(&path);
        assert!(matches!(store.load(), Err(CoreError::Serialization(_))));
    }

    #[test]
    fn memory_store_keeps_last_save() {
        let store = MemoryStore::new();
        store.save(&SurveyState::default()).unwrap();
        store.save(&sample_state()).unwrap();
        assert_eq!(store.load().unwrap().unwrap().revolutions, 12);
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
