//! Local file backend for state storage
//!
//! Stores state as pretty-printed JSON (default: awx.state.json). Writes go
//! to a sibling `.tmp` file first and are renamed into place.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::debug;

use crate::backend::{BackendConfig, BackendError, BackendResult, StateBackend};
use crate::state::StateFile;

/// Local file backend
pub struct LocalBackend {
    state_path: PathBuf,
}

impl LocalBackend {
    pub const DEFAULT_STATE_FILE: &'static str = "awx.state.json";

    pub fn new() -> Self {
        Self::with_path(PathBuf::from(Self::DEFAULT_STATE_FILE))
    }

    pub fn with_path(state_path: impl Into<PathBuf>) -> Self {
        Self {
            state_path: state_path.into(),
        }
    }

    pub fn from_config(config: &BackendConfig) -> BackendResult<Self> {
        match config.get_string("path") {
            Some("") => Err(BackendError::configuration("'path' must not be empty")),
            Some(path) => Ok(Self::with_path(path)),
            None => Ok(Self::new()),
        }
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.state_path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl Default for LocalBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StateBackend for LocalBackend {
    async fn read_state(&self) -> BackendResult<Option<StateFile>> {
        let content = match tokio::fs::read_to_string(&self.state_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(BackendError::Io(format!("Failed to read state file: {}", e)));
            }
        };

        let state: StateFile = serde_json::from_str(&content).map_err(|e| {
            BackendError::InvalidState(format!("Failed to parse state file: {}", e))
        })?;

        debug!(
            "Read state serial {} from {}",
            state.serial,
            self.state_path.display()
        );
        Ok(Some(state))
    }

    async fn write_state(&self, state: &StateFile) -> BackendResult<()> {
        if let Some(existing) = self.read_state().await?
            && existing.lineage != state.lineage
        {
            return Err(BackendError::LineageMismatch {
                expected: existing.lineage,
                actual: state.lineage.clone(),
            });
        }

        let content = serde_json::to_string_pretty(state).map_err(|e| {
            BackendError::Serialization(format!("Failed to serialize state: {}", e))
        })?;

        let temp = self.temp_path();
        tokio::fs::write(&temp, content)
            .await
            .map_err(|e| BackendError::Io(format!("Failed to write state file: {}", e)))?;
        tokio::fs::rename(&temp, &self.state_path)
            .await
            .map_err(|e| BackendError::Io(format!("Failed to replace state file: {}", e)))?;

        debug!(
            "Wrote state serial {} to {}",
            state.serial,
            self.state_path.display()
        );
        Ok(())
    }

    fn location(&self) -> String {
        self.state_path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ResourceState;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_local_backend_read_write() {
        let dir = tempdir().unwrap();
        let backend = LocalBackend::with_path(dir.path().join("test.state.json"));

        assert!(backend.read_state().await.unwrap().is_none());

        let mut state = StateFile::new();
        state.upsert_resource(ResourceState::new("job_template", "deploy").with_identifier("11"));
        state.increment_serial();
        backend.write_state(&state).await.unwrap();

        let read = backend.read_state().await.unwrap().unwrap();
        assert_eq!(read.serial, 1);
        assert_eq!(read.lineage, state.lineage);
        assert_eq!(read.resources, state.resources);
        assert!(!backend.temp_path().exists());
    }

    #[tokio::test]
    async fn test_write_rejects_foreign_lineage() {
        let dir = tempdir().unwrap();
        let backend = LocalBackend::with_path(dir.path().join("test.state.json"));

        let first = StateFile::new();
        backend.write_state(&first).await.unwrap();

        let other = StateFile::new();
        let err = backend.write_state(&other).await.unwrap_err();
        assert!(matches!(err, BackendError::LineageMismatch { .. }));

        let read = backend.read_state().await.unwrap().unwrap();
        assert_eq!(read.lineage, first.lineage);
    }

    #[tokio::test]
    async fn test_corrupt_state_is_invalid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.state.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = LocalBackend::with_path(path).read_state().await.unwrap_err();
        assert!(matches!(err, BackendError::InvalidState(_)));
    }

    #[test]
    fn test_from_config_paths() {
        let config = BackendConfig {
            backend_type: "local".to_string(),
            attributes: HashMap::new(),
        };
        let backend = LocalBackend::from_config(&config).unwrap();
        assert_eq!(backend.state_path(), Path::new("awx.state.json"));

        let backend = LocalBackend::from_config(&BackendConfig::local("custom.state.json")).unwrap();
        assert_eq!(backend.state_path(), Path::new("custom.state.json"));

        assert!(LocalBackend::from_config(&BackendConfig::local("")).is_err());
    }
}
