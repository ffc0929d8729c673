//! Authentication settings persistence.
//!
//! Settings live in the platform-specific config directory:
//! - Linux: ~/.config/warden/auth.json
//! - macOS: ~/Library/Application Support/warden/auth.json
//! - Windows: %APPDATA%/warden/auth.json

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;
use warden_domain::AuthSettings;

use crate::serialization::{SerializationError, from_json_bytes, to_json_stable_bytes};

/// Error type for settings operations.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),

    /// Could not determine config directory.
    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Repository for [`AuthSettings`].
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    path: Option<PathBuf>,
}

impl Default for SettingsRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsRepository {
    /// Creates a repository backed by the user's config directory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            path: dirs::config_dir().map(|p| p.join("warden").join("auth.json")),
        }
    }

    /// Creates a repository backed by an explicit file.
    #[must_use]
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Returns the path where settings are stored, if available.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Loads settings, falling back to defaults when the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load(&self) -> Result<AuthSettings, SettingsError> {
        let Some(path) = &self.path else {
            return Ok(AuthSettings::default());
        };

        match fs::read(path).await {
            Ok(content) => Ok(from_json_bytes(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No settings file, using defaults");
                Ok(AuthSettings::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Saves settings, creating the parent directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no config directory or the write fails.
    pub async fn save(&self, settings: &AuthSettings) -> Result<(), SettingsError> {
        let Some(path) = &self.path else {
            return Err(SettingsError::NoConfigDir);
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = to_json_stable_bytes(settings)?;
        fs::write(path, content).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_default_path() {
        if let Some(path) = SettingsRepository::new().path() {
            assert!(path.ends_with("warden/auth.json"));
        }
    }

    #[tokio::test]
    async fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let repo = SettingsRepository::with_path(dir.path().join("auth.json"));
        assert_eq!(repo.load().await.unwrap(), AuthSettings::default());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let repo = SettingsRepository::with_path(dir.path().join("nested").join("auth.json"));
        let settings = AuthSettings {
            capture_timeout_secs: 60,
            redirect_bind_address: "127.0.0.1:9000".to_string(),
            ..AuthSettings::default()
        };

        repo.save(&settings).await.unwrap();
        assert_eq!(repo.load().await.unwrap(), settings);
    }

    #[tokio::test]
    async fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.json");
        fs::write(&path, b"{ not json").await.unwrap();

        let err = SettingsRepository::with_path(path).load().await.unwrap_err();
        assert!(matches!(err, SettingsError::Serialization(_)));
    }
}
