use crate::error::SettingsError;
use crate::types::block::BlockAttributes;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_APPEND_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct HostSettings {
    pub review_ratings_enabled: bool,
    pub show_avatars: bool,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            review_ratings_enabled: true,
            show_avatars: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    pub attributes: BlockAttributes,
    pub settings: HostSettings,
    pub append_debounce: Duration,
}

impl FeedConfig {
    pub fn new(attributes: BlockAttributes, settings: HostSettings) -> Self {
        Self {
            attributes,
            settings,
            append_debounce: DEFAULT_APPEND_DEBOUNCE,
        }
    }

    pub fn with_append_debounce(mut self, delay: Duration) -> Self {
        self.append_debounce = delay;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FeedSection {
    pub append_debounce_ms: u64,
    pub max_lines: usize,
}

impl Default for FeedSection {
    fn default() -> Self {
        Self {
            append_debounce_ms: 300,
            max_lines: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub db_path: String,
    pub port: u16,
    pub base_url: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            db_path: ".revfeed/reviews.db".to_string(),
            port: 4821,
            base_url: "http://127.0.0.1:4821".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SettingsFile {
    pub settings: HostSettings,
    pub feed: FeedSection,
    pub server: ServerSection,
}

impl SettingsFile {
    /// Reads `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => {
                return Err(SettingsError::Read {
                    path: path.display().to_string(),
                    message: err.to_string(),
                })
            }
        };
        toml::from_str(&content).map_err(|err| SettingsError::Parse {
            path: path.display().to_string(),
            message: err.to_string(),
        })
    }

    pub fn feed_config(&self, attributes: BlockAttributes) -> FeedConfig {
        FeedConfig::new(attributes, self.settings)
            .with_append_debounce(Duration::from_millis(self.feed.append_debounce_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = SettingsFile::load(&dir.path().join("revfeed.toml")).unwrap();
        assert_eq!(loaded, SettingsFile::default());
        assert!(loaded.settings.review_ratings_enabled);
    }

    #[test]
    fn test_partial_file_overrides_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("revfeed.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[settings]\nreview_ratings_enabled = false\n\n[feed]\nappend_debounce_ms = 50\n\n[server]\nport = 9000"
        )
        .unwrap();

        let loaded = SettingsFile::load(&path).unwrap();
        assert!(!loaded.settings.review_ratings_enabled);
        assert!(loaded.settings.show_avatars);
        assert_eq!(loaded.server.port, 9000);
        assert_eq!(loaded.server.db_path, ".revfeed/reviews.db");

        let config = loaded.feed_config(BlockAttributes::default());
        assert_eq!(config.append_debounce, Duration::from_millis(50));
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("revfeed.toml");
        fs::write(&path, "[settings\n").unwrap();
        assert!(matches!(
            SettingsFile::load(&path),
            Err(SettingsError::Parse { .. })
        ));
    }
}
