//! Session configuration

use crate::error::SessionError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Editor session configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Quiet period after the last edit before an autosave fires
    pub debounce_ms: u64,
    /// Whether edit-mode mutations schedule autosaves
    pub autosave: bool,
    /// Maximum rows requested per preview
    pub preview_row_limit: usize,
    /// Stamped as `createdBy` on first save
    pub author: Option<String>,
}

impl SessionConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With debounce window in milliseconds
    #[inline]
    #[must_use]
    pub fn with_debounce_ms(mut self, debounce_ms: u64) -> Self {
        self.debounce_ms = debounce_ms;
        self
    }

    /// With autosave enabled or disabled
    #[inline]
    #[must_use]
    pub fn with_autosave(mut self, autosave: bool) -> Self {
        self.autosave = autosave;
        self
    }

    /// With preview row limit
    #[inline]
    #[must_use]
    pub fn with_preview_row_limit(mut self, limit: usize) -> Self {
        self.preview_row_limit = limit;
        self
    }

    /// With author
    #[inline]
    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Debounce window as a [`Duration`]
    #[inline]
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Parse from TOML; missing keys take their defaults
    ///
    /// # Errors
    /// [`SessionError::Config`] on malformed TOML or an invalid value.
    pub fn from_toml_str(text: &str) -> Result<Self, SessionError> {
        let config: Self = toml::from_str(text).map_err(|e| SessionError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// [`SessionError::Config`] when the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| SessionError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// [`SessionError::Config`] describing the first bad value.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.preview_row_limit == 0 {
            return Err(SessionError::Config(
                "preview_row_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 2000,
            autosave: true,
            preview_row_limit: 100,
            author: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.debounce(), Duration::from_secs(2));
        assert!(config.autosave);
        assert_eq!(config.preview_row_limit, 100);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = SessionConfig::from_toml_str("debounce_ms = 500\nauthor = \"dana\"").unwrap();
        assert_eq!(config.debounce_ms, 500);
        assert_eq!(config.author.as_deref(), Some("dana"));
        assert_eq!(config.preview_row_limit, 100);
    }

    #[test]
    fn rejects_zero_row_limit() {
        let err = SessionConfig::from_toml_str("preview_row_limit = 0").unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "autosave = false").unwrap();
        let config = SessionConfig::load(file.path()).unwrap();
        assert!(!config.autosave);

        assert!(SessionConfig::load("/definitely/not/here.toml").is_err());
    }

    #[test]
    fn builders() {
        let config = SessionConfig::new()
            .with_debounce_ms(10)
            .with_autosave(false)
            .with_preview_row_limit(5)
            .with_author("ops");
        assert_eq!(config.debounce_ms, 10);
        assert_eq!(config.preview_row_limit, 5);
    }
}
