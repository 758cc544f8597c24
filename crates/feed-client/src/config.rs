//! Client configuration
//!
//! Loaded from TOML; every field has a default so an empty file is valid.
//!
//! ```toml
//! max_content_chars = 160
//! default_view = "most_liked"
//! require_ownership_for_delete = true
//! refresh_on_open = false
//! ```

use crate::error::ConfigError;
use feed_tree::{ViewMode, MAX_CONTENT_CHARS};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Feed session configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Maximum post body length in characters
    pub max_content_chars: usize,
    /// View shown when the caller has not picked one
    pub default_view: ViewMode,
    /// Refuse deletes of posts the caller did not write
    pub require_ownership_for_delete: bool,
    /// Reload the feed before opening a thread
    pub refresh_on_open: bool,
}

impl ClientConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With content limit
    #[inline]
    #[must_use]
    pub fn with_max_content_chars(mut self, max: usize) -> Self {
        self.max_content_chars = max;
        self
    }

    /// With default view
    #[inline]
    #[must_use]
    pub fn with_default_view(mut self, mode: ViewMode) -> Self {
        self.default_view = mode;
        self
    }

    /// With delete ownership check
    #[inline]
    #[must_use]
    pub fn with_ownership_check(mut self, enabled: bool) -> Self {
        self.require_ownership_for_delete = enabled;
        self
    }

    /// With refresh before thread open
    #[inline]
    #[must_use]
    pub fn with_refresh_on_open(mut self, enabled: bool) -> Self {
        self.refresh_on_open = enabled;
        self
    }

    /// Parse from TOML text
    ///
    /// # Errors
    /// Returns error if the text is not valid TOML or values are out of range
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] for a zero content limit
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_content_chars == 0 {
            return Err(ConfigError::Invalid(
                "max_content_chars must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_content_chars: MAX_CONTENT_CHARS,
            default_view: ViewMode::Timeline,
            require_ownership_for_delete: true,
            refresh_on_open: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(ClientConfig::from_toml_str("").unwrap(), ClientConfig::default());
    }

    #[test]
    fn parses_view_names() {
        let config = ClientConfig::from_toml_str("default_view = \"most_liked\"").unwrap();
        assert_eq!(config.default_view, ViewMode::MostLiked);
        assert_eq!(config.max_content_chars, 160);
    }

    #[test]
    fn rejects_unknown_view() {
        let err = ClientConfig::from_toml_str("default_view = \"popular\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn rejects_zero_limit() {
        let err = ClientConfig::from_toml_str("max_content_chars = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_content_chars = 280\nrefresh_on_open = true").unwrap();

        let config = ClientConfig::from_file(file.path()).unwrap();
        assert_eq!(config.max_content_chars, 280);
        assert!(config.refresh_on_open);
        assert!(config.require_ownership_for_delete);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ClientConfig::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
