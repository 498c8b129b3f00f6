//! Add-on configuration.
//!
//! Every section derives `serde(default)`, so a config file only needs the keys it overrides
//! and a missing key keeps its default value. An unrecognised choice value falls back to its
//! default on its own and leaves the other keys alone.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Deserializes one field, replacing a value it cannot read with the field's default.
fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;

    Ok(serde_json::from_value(value.clone()).unwrap_or_else(|error| {
        tracing::warn!("Ignoring config value {}: {}", value, error);
        T::default()
    }))
}

/// Label shown in front of each choice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChoicePrefix {
    None,
    Index,
    #[default]
    Letter,
}

/// How the correct-answer summary lists positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrectFormat {
    #[default]
    Index,
    Letter,
}

/// Where the explanation block sits relative to the result block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplanationPosition {
    Top,
    #[default]
    Bottom,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub editor_button_label: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            editor_button_label: "MCQ Builder".to_string(),
        }
    }
}

/// Settings consumed by the card renderers. This section is also embedded in the card
/// templates, so the behaviour module sees the same values the host loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    #[serde(deserialize_with = "or_default")]
    pub choice_prefix: ChoicePrefix,
    #[serde(deserialize_with = "or_default")]
    pub correct_format: CorrectFormat,
    pub unanswered_text: String,
    /// Kept for older config files; judgement columns only use `correct_mark`.
    pub wrong_mark: String,
    pub correct_mark: String,
    #[serde(deserialize_with = "or_default")]
    pub explanation_position: ExplanationPosition,
    /// Delete the saved selection once the answer side has read it.
    pub clear_selection_on_back: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            choice_prefix: ChoicePrefix::Letter,
            correct_format: CorrectFormat::Index,
            unanswered_text: "Unanswered.".to_string(),
            wrong_mark: "×".to_string(),
            correct_mark: "✓".to_string(),
            explanation_position: ExplanationPosition::Bottom,
            clear_selection_on_back: false,
        }
    }
}

impl DisplayConfig {
    /// Reads the section embedded in a card template. Blank or unreadable text yields the
    /// defaults.
    pub fn from_embedded(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Self::default();
        }

        serde_json::from_str(raw).unwrap_or_else(|error| {
            tracing::debug!("Card display config unreadable, using defaults: {}", error);
            Self::default()
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteTypeConfig {
    pub name: String,
    /// Rewrite templates and stylesheet on every sync, not only when they are broken.
    pub force_template_sync: bool,
}

impl Default for NoteTypeConfig {
    fn default() -> Self {
        Self {
            name: "MCQ (Addon)".to_string(),
            force_template_sync: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddonConfig {
    pub ui: UiConfig,
    pub display: DisplayConfig,
    pub note_type: NoteTypeConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file at {path}: {source}")]
    ReadError {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config file at {path}: {source}")]
    ParseError {
        path: String,
        source: serde_json::Error,
    },
}

impl AddonConfig {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Loads the config file at `path`. A file that does not exist yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();

        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(source) if source.kind() == ErrorKind::NotFound => {
                tracing::debug!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigLoadError::ReadError {
                    path: path.display().to_string(),
                    source,
                });
            }
        };

        Self::from_json_str(&data).map_err(|source| ConfigLoadError::ParseError {
            path: path.display().to_string(),
            source,
        })
    }

    /// Like [`AddonConfig::load`], but an unreadable or malformed file falls back to the
    /// defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(path).unwrap_or_else(|error| {
            tracing::warn!("Falling back to default config: {}", error);
            Self::default()
        })
    }
}
