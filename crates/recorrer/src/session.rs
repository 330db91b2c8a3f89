//! Authenticated-session persistence and cross-suite handoff records.
//!
//! A session snapshot is the engine's serialized storage state (cookies
//! plus local storage). It is treated as opaque JSON: captured from the
//! driver, written to disk, and handed back to the engine on the next run.
//! Suites that create data for other suites to consume leave a handoff
//! record next to the snapshot.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::driver::PageDriver;
use crate::result::{Error, Result};

/// A captured authenticated-session snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Opaque engine storage state, persisted as-is
    pub storage: serde_json::Value,
    /// When the snapshot was captured
    pub captured_at: DateTime<Utc>,
}

impl SessionState {
    /// Capture the current storage state from a live page.
    pub fn capture(driver: &dyn PageDriver) -> Result<Self> {
        Ok(Self {
            storage: driver.storage_snapshot()?,
            captured_at: Utc::now(),
        })
    }

    /// Write the snapshot to `path` as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!(path = %path.display(), "session snapshot saved");
        Ok(())
    }

    /// Load a previously saved snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Session`] when the file is missing, so callers can
    /// distinguish "log in fresh" from real I/O failures.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::Session {
                message: format!("no session snapshot at {}", path.display()),
            });
        }
        let text = std::fs::read_to_string(path)?;
        let state: Self = serde_json::from_str(&text).map_err(|e| Error::Session {
            message: format!("corrupt session snapshot at {}: {e}", path.display()),
        })?;
        Ok(state)
    }

    /// True when the snapshot is older than `max_age_hours`
    #[must_use]
    pub fn is_stale(&self, max_age_hours: i64) -> bool {
        Utc::now() - self.captured_at > chrono::Duration::hours(max_age_hours)
    }
}

/// Record left by a producing suite for a consuming suite: which entity was
/// created and when. Field names stay camelCase on disk for compatibility
/// with the records the app's other tooling reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandoffRecord {
    /// Name of the created entity (project, property, ...)
    pub project_name: String,
    /// Free-text description of what was set up
    pub description: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl HandoffRecord {
    /// Create a record timestamped now
    #[must_use]
    pub fn new(project_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            description: description.into(),
            created_at: Utc::now(),
        }
    }

    /// Write the record to `path` as JSON.
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!(path = %path.display(), project = %self.project_name, "handoff record written");
        Ok(())
    }

    /// Read a record a producing suite left behind.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Handoff`] when the record is missing or malformed:
    /// the consuming suite cannot run without it.
    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::Handoff {
                message: format!(
                    "no handoff record at {}; run the producing suite first",
                    path.display()
                ),
            });
        }
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| Error::Handoff {
            message: format!("corrupt handoff record at {}: {e}", path.display()),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::sim::SimulatedPage;

    #[test]
    fn test_capture_save_load_round_trip() {
        let page = SimulatedPage::new();
        page.mutate(|dom| {
            dom.set_storage(serde_json::json!({"cookies": [{"name": "sid", "value": "abc"}]}));
        });
        let state = SessionState::capture(&page).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth").join("sessionState.json");
        state.save(&path).unwrap();

        let loaded = SessionState::load(&path).unwrap();
        assert_eq!(loaded.storage, state.storage);
    }

    #[test]
    fn test_load_missing_is_session_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SessionState::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, Error::Session { .. }));
    }

    #[test]
    fn test_load_corrupt_is_session_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessionState.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = SessionState::load(&path).unwrap_err();
        assert!(matches!(err, Error::Session { .. }));
    }

    #[test]
    fn test_staleness() {
        let fresh = SessionState {
            storage: serde_json::Value::Null,
            captured_at: Utc::now(),
        };
        assert!(!fresh.is_stale(8));

        let old = SessionState {
            storage: serde_json::Value::Null,
            captured_at: Utc::now() - chrono::Duration::hours(24),
        };
        assert!(old.is_stale(8));
    }

    mod handoff_tests {
        use super::*;

        #[test]
        fn test_record_round_trip() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("handoff.json");
            let record = HandoffRecord::new("PROJ_20250101_ABC123", "seeded bid project");
            record.write(&path).unwrap();
            let read = HandoffRecord::read(&path).unwrap();
            assert_eq!(read, record);
        }

        #[test]
        fn test_record_uses_camel_case_on_disk() {
            let record = HandoffRecord::new("P1", "desc");
            let json = serde_json::to_string(&record).unwrap();
            assert!(json.contains("\"projectName\""));
            assert!(json.contains("\"createdAt\""));
            assert!(!json.contains("project_name"));
        }

        #[test]
        fn test_missing_record_names_the_producer() {
            let dir = tempfile::tempdir().unwrap();
            let err = HandoffRecord::read(&dir.path().join("handoff.json")).unwrap_err();
            assert!(err.to_string().contains("producing suite"));
        }
    }
}
