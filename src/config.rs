//! Slideshow settings loaded from YAML or the legacy JSON layout.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_DELAY_MILLISECONDS: u64 = 6_000;
pub const DEFAULT_TITLE: &str = "Hi!";

/// Slideshow settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Configuration {
    /// Roots scanned recursively for pictures.
    pub directories: Vec<PathBuf>,
    /// File suffixes to include, dot included (`.jpg`). Matched case-sensitively.
    pub extensions: Vec<String>,
    /// Time each picture stays up before the next tick.
    #[serde(default = "Configuration::default_delay_milliseconds")]
    pub delay_milliseconds: u64,
    /// Window title for the presentation layer.
    #[serde(default)]
    pub title: Option<String>,
    /// Picture shown by the boss action.
    pub override_file: PathBuf,
}

impl Configuration {
    const fn default_delay_milliseconds() -> u64 {
        DEFAULT_DELAY_MILLISECONDS
    }

    /// Load from YAML, or from the legacy JSON layout when the file ends in `.json`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_legacy_json(&s)
        } else {
            Self::from_yaml_str(&s)
        }
    }

    pub fn from_yaml_str(s: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Parse the JSON layout with a `PICTURES` section and comma-separated lists.
    pub fn from_legacy_json(s: &str) -> Result<Self> {
        let legacy: LegacyFile = serde_json::from_str(s)?;
        Ok(legacy.pictures.into())
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(self) -> Result<Self> {
        ensure!(
            !self.directories.is_empty(),
            "directories must list at least one path"
        );
        ensure!(
            !self.extensions.is_empty(),
            "extensions must list at least one suffix"
        );
        ensure!(
            self.extensions.iter().all(|e| !e.is_empty()),
            "extensions must not contain empty entries"
        );
        ensure!(
            self.delay_milliseconds > 0,
            "delay-milliseconds must be greater than zero"
        );
        for ext in &self.extensions {
            if !ext.starts_with('.') {
                warn!(extension = %ext, "extension has no leading '.' and will never match");
            }
        }
        if !self.override_file.is_file() {
            warn!(path = %self.override_file.display(), "override file does not exist yet");
        }
        Ok(self)
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_milliseconds)
    }

    #[must_use]
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(DEFAULT_TITLE)
    }
}

#[derive(Debug, Deserialize)]
struct LegacyFile {
    #[serde(rename = "PICTURES")]
    pictures: LegacyPictures,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct LegacyPictures {
    directories: String,
    extensions: String,
    #[serde(default)]
    delay: Option<u64>,
    #[serde(default)]
    title: Option<String>,
    boss_file: PathBuf,
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

impl From<LegacyPictures> for Configuration {
    fn from(legacy: LegacyPictures) -> Self {
        Self {
            directories: split_list(&legacy.directories).map(PathBuf::from).collect(),
            extensions: split_list(&legacy.extensions).map(str::to_owned).collect(),
            delay_milliseconds: legacy.delay.unwrap_or(DEFAULT_DELAY_MILLISECONDS),
            title: legacy.title,
            override_file: legacy.boss_file,
        }
    }
}
