//! Storage keys and autosave timing
//!
//! Passed into the storage gateway and controller at construction so tests can
//! point them at an in-memory store.

use serde::{Deserialize, Serialize};

/// Default key of the current-sheet slot
pub const CURRENT_SHEET_KEY: &str = "lotr_react_character_data";
/// Default key of the named-collection slot
pub const SHEET_COLLECTION_KEY: &str = "lotr_react_character_sheets";
/// Quiet period before an edit burst is written (ms)
pub const AUTOSAVE_DELAY_MS: f64 = 500.0;

/// Names of the two storage slots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageKeys {
    pub current: String,
    pub collection: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            current: CURRENT_SHEET_KEY.to_string(),
            collection: SHEET_COLLECTION_KEY.to_string(),
        }
    }
}

/// Sheet editor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetConfig {
    pub keys: StorageKeys,
    /// Autosave debounce delay in milliseconds
    pub autosave_delay_ms: f64,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            keys: StorageKeys::default(),
            autosave_delay_ms: AUTOSAVE_DELAY_MS,
        }
    }
}

impl SheetConfig {
    /// Parse a JSON config; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = SheetConfig::from_json(r#"{"keys":{"current":"test_current"}}"#).unwrap();
        assert_eq!(config.keys.current, "test_current");
        assert_eq!(config.keys.collection, SHEET_COLLECTION_KEY);
        assert_eq!(config.autosave_delay_ms, AUTOSAVE_DELAY_MS);
    }

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(SheetConfig::from_json("{}").unwrap(), SheetConfig::default());
    }
}
