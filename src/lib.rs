//! Remnant Sheet - Legacy of the Remnant character sheet editor
//!
//! Core modules:
//! - `record`: Character record model, defaults and numeric coercion
//! - `validation`: Skill allocation rule (advisory)
//! - `change`: Typed field edits
//! - `persistence`: Current-sheet and named-collection storage
//! - `controller`: Session state, sheet identity and debounced autosave
//! - `config`: Storage keys and autosave timing
//! - `image`: Portrait data URIs

pub mod change;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod error;
pub mod image;
pub mod persistence;
pub mod record;
pub mod validation;

pub use change::FieldChange;
pub use config::{SheetConfig, StorageKeys};
pub use controller::{SheetController, SheetIdentity};
pub use error::{ImageError, StoreError};
pub use persistence::{KeyValueStore, MemoryStore, SheetCollection, SheetStorage};
pub use record::{
    CharacterRecord, Meter, NUMERIC_FIELD_NAMES, NumericField, Quadrant, StressTrack, TextField,
    default_record,
};
pub use validation::{SkillScores, is_valid_allocation};

/// Open a controller over an arbitrary backend using `config`
pub fn open_sheets<S: KeyValueStore>(store: S, config: &SheetConfig) -> SheetController<S> {
    let storage = SheetStorage::new(store, config.keys.clone());
    SheetController::initialize(storage, config.autosave_delay_ms)
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::persistence::FileStore;

    #[test]
    fn test_sessions_share_a_store_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheets.json");
        let config = SheetConfig::default();

        let mut first = open_sheets(FileStore::open(&path), &config);
        first.apply_change(
            FieldChange::Text(record::TextField::CharacterName, "Elias".into()),
            0.0,
        );
        assert!(first.poll_autosave(config.autosave_delay_ms));
        first.save_as("Elias");

        let second = open_sheets(FileStore::open(&path), &config);
        assert_eq!(second.record().character_name, "Elias");
        assert_eq!(second.saved_names(), vec!["Elias"]);
        // Reopening never resumes a named identity
        assert_eq!(second.identity(), SheetIdentity::Draft);
    }

    #[test]
    fn test_unwritable_store_file_saves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let config = SheetConfig::default();

        let mut sheets = open_sheets(FileStore::open(blocker.join("sheets.json")), &config);
        assert!(sheets.save_as("Elias"));
        assert!(sheets.collection().is_empty());
        assert_eq!(sheets.storage().load_current(), None);
    }
}
