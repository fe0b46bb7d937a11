//! Sheet persistence
//!
//! Two slots in a key-value store, both JSON text:
//! - current sheet: the record being edited, rewritten by autosave
//! - named collection: object mapping sheet name -> record
//!
//! Everything here is best-effort. Read failures fall back to "absent" or an
//! empty collection, write failures are logged and dropped.

#[cfg(not(target_arch = "wasm32"))]
pub mod file;
#[cfg(target_arch = "wasm32")]
pub mod local;
pub mod store;

use std::collections::BTreeMap;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStore;
#[cfg(target_arch = "wasm32")]
pub use local::LocalStore;
pub use store::{KeyValueStore, MemoryStore};

use crate::config::StorageKeys;
use crate::record::CharacterRecord;

/// Saved sheets by name, iterated in name order
pub type SheetCollection = BTreeMap<String, CharacterRecord>;

/// Storage gateway over a key-value backend
#[derive(Debug, Clone)]
pub struct SheetStorage<S> {
    store: S,
    keys: StorageKeys,
}

impl<S: KeyValueStore> SheetStorage<S> {
    pub fn new(store: S, keys: StorageKeys) -> Self {
        Self { store, keys }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    /// Load the current-sheet slot. Absent or undecodable data yields None.
    pub fn load_current(&self) -> Option<CharacterRecord> {
        let json = self.read(&self.keys.current)?;
        match serde_json::from_str::<CharacterRecord>(&json) {
            Ok(record) => {
                log::info!("Loaded current sheet from storage");
                Some(record)
            }
            Err(e) => {
                log::warn!("Could not load current sheet: {}", e);
                None
            }
        }
    }

    /// Write the current-sheet slot
    pub fn save_current(&mut self, record: &CharacterRecord) {
        let key = self.keys.current.clone();
        if self.write(&key, record) {
            log::debug!("Current sheet saved");
        }
    }

    /// Load every saved sheet. Entries that fail to decode are skipped.
    pub fn load_collection(&self) -> SheetCollection {
        self.load_raw_collection()
            .into_iter()
            .filter_map(|(name, value)| match serde_json::from_value(value) {
                Ok(record) => Some((name, record)),
                Err(e) => {
                    log::warn!("Skipping saved sheet '{}': {}", name, e);
                    None
                }
            })
            .collect()
    }

    pub fn load_named(&self, name: &str) -> Option<CharacterRecord> {
        self.load_collection().remove(name)
    }

    /// Insert or replace a named sheet. Only that entry is touched; sibling
    /// entries are written back as stored, even ones that no longer decode.
    pub fn save_named(&mut self, name: &str, record: &CharacterRecord) {
        let value = match serde_json::to_value(record) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Could not encode sheet '{}': {}", name, e);
                return;
            }
        };
        let mut raw = self.load_raw_collection();
        raw.insert(name.to_string(), value);
        let key = self.keys.collection.clone();
        if self.write(&key, &raw) {
            log::info!("Saved sheet '{}' ({} total)", name, raw.len());
        }
    }

    /// Remove a named sheet; absent names are a no-op. The slot itself is
    /// removed once the last sheet is gone.
    pub fn delete_named(&mut self, name: &str) {
        let mut raw = self.load_raw_collection();
        if raw.remove(name).is_none() {
            log::debug!("No saved sheet '{}' to delete", name);
            return;
        }
        let key = self.keys.collection.clone();
        let written = if raw.is_empty() {
            match self.store.remove(&key) {
                Ok(()) => true,
                Err(e) => {
                    log::warn!("Could not remove '{}': {}", key, e);
                    false
                }
            }
        } else {
            self.write(&key, &raw)
        };
        if written {
            log::info!("Deleted sheet '{}'", name);
        }
    }

    /// The collection slot as undecoded entries. Absent or non-object data
    /// reads as empty.
    fn load_raw_collection(&self) -> BTreeMap<String, serde_json::Value> {
        let Some(json) = self.read(&self.keys.collection) else {
            return BTreeMap::new();
        };
        match serde_json::from_str(&json) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("Could not load saved sheets: {}", e);
                BTreeMap::new()
            }
        }
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Could not read '{}': {}", key, e);
                None
            }
        }
    }

    fn write<T: serde::Serialize>(&mut self, key: &str, value: &T) -> bool {
        let result = serde_json::to_string(value)
            .map_err(crate::error::StoreError::from)
            .and_then(|json| self.store.set(key, &json));
        match result {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Could not save '{}': {}", key, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SHEET_COLLECTION_KEY;
    use crate::record::{Quadrant, default_record};
    use proptest::prelude::*;

    fn storage() -> SheetStorage<MemoryStore> {
        SheetStorage::new(MemoryStore::new(), StorageKeys::default())
    }

    fn elias() -> CharacterRecord {
        let mut r = default_record();
        r.character_name = "Elias".into();
        r.heart = 3;
        r.soul = 1;
        r.mind = 2;
        r.strength = 2;
        r.fear = 4;
        r.mind_stress = [true, false, true];
        r
    }

    #[test]
    fn test_current_round_trip() {
        let mut s = storage();
        assert_eq!(s.load_current(), None);
        s.save_current(&elias());
        assert_eq!(s.load_current(), Some(elias()));
    }

    #[test]
    fn test_corrupt_current_is_absent() {
        let store = MemoryStore::new().with_entry(&StorageKeys::default().current, "{oops");
        let s = SheetStorage::new(store, StorageKeys::default());
        assert_eq!(s.load_current(), None);
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        let mut s = storage();
        s.store_mut().set_fail_writes(true);
        s.save_current(&elias());
        s.save_named("Elias", &elias());
        assert_eq!(s.load_current(), None);
        assert!(s.load_collection().is_empty());
    }

    #[test]
    fn test_named_save_load_delete() {
        let mut s = storage();
        s.save_named("Elias", &elias());
        s.save_named("Blank", &default_record());
        assert_eq!(
            s.load_collection().keys().cloned().collect::<Vec<_>>(),
            vec!["Blank".to_string(), "Elias".to_string()]
        );
        assert_eq!(s.load_named("Elias"), Some(elias()));

        s.delete_named("Elias");
        assert_eq!(s.load_named("Elias"), None);
        assert!(s.load_named("Blank").is_some());

        // Absent name is a no-op
        s.delete_named("Nobody");
        assert_eq!(s.load_collection().len(), 1);
    }

    #[test]
    fn test_last_write_wins_per_name() {
        let mut s = storage();
        s.save_named("Elias", &default_record());
        s.save_named("Elias", &elias());
        let collection = s.load_collection();
        assert_eq!(collection.len(), 1);
        assert_eq!(collection["Elias"].skill(Quadrant::Heart), 3);
    }

    #[test]
    fn test_collection_with_textual_numbers() {
        let json = r#"{"Old":{"characterName":"Old","Heart":"2","grace":"1"}}"#;
        let s = SheetStorage::new(
            MemoryStore::new().with_entry(SHEET_COLLECTION_KEY, json),
            StorageKeys::default(),
        );
        let old = s.load_named("Old").unwrap();
        assert_eq!(old.heart, 2);
        assert_eq!(old.grace, 1);
    }

    #[test]
    fn test_bad_collection_entry_is_skipped() {
        let json = r#"{"Good":{"characterName":"Good"},"Bad":{"heartStress":"broken"}}"#;
        let s = SheetStorage::new(
            MemoryStore::new().with_entry(SHEET_COLLECTION_KEY, json),
            StorageKeys::default(),
        );
        let collection = s.load_collection();
        assert!(collection.contains_key("Good"));
        assert!(!collection.contains_key("Bad"));
    }

    #[test]
    fn test_undecodable_sibling_survives_save_and_delete() {
        let json = r#"{"Old":{"characterName":"Old","notes":null}}"#;
        let mut s = SheetStorage::new(
            MemoryStore::new().with_entry(SHEET_COLLECTION_KEY, json),
            StorageKeys::default(),
        );
        assert!(s.load_named("Old").is_none());

        s.save_named("New", &default_record());
        s.save_named("Other", &elias());
        s.delete_named("Other");

        let raw: serde_json::Value =
            serde_json::from_str(s.store().raw(SHEET_COLLECTION_KEY).unwrap()).unwrap();
        assert_eq!(raw["Old"]["characterName"], "Old");
        assert!(raw["Old"]["notes"].is_null());
        assert!(raw.get("New").is_some());
        assert!(raw.get("Other").is_none());
    }

    #[test]
    fn test_deleting_last_sheet_removes_slot() {
        let mut s = storage();
        s.save_named("Elias", &elias());
        s.delete_named("Elias");
        assert_eq!(s.store().raw(SHEET_COLLECTION_KEY), None);
        assert!(s.load_collection().is_empty());
    }

    #[test]
    fn test_corrupt_collection_is_empty() {
        let s = SheetStorage::new(
            MemoryStore::new().with_entry(SHEET_COLLECTION_KEY, "[1,2,3]"),
            StorageKeys::default(),
        );
        assert!(s.load_collection().is_empty());
    }

    fn arb_text() -> impl Strategy<Value = String> {
        ".{0,24}"
    }

    fn arb_record() -> impl Strategy<Value = CharacterRecord> {
        let identity = (arb_text(), arb_text());
        let narrative = (arb_text(), arb_text(), arb_text(), arb_text(), arb_text());
        let aspects = proptest::array::uniform4(arb_text());
        let numbers = (
            proptest::array::uniform4(0u8..=3),
            (0u8..=3, 0u8..=5, 0u8..=5),
        );
        let stress = proptest::array::uniform4(proptest::array::uniform3(any::<bool>()));
        let image = proptest::option::of("data:image/png;base64,[A-Za-z0-9+/]{0,16}");

        (identity, narrative, aspects, numbers, stress, image).prop_map(
            |(
                (character_name, player_name),
                (appearance, flaw, verse, stunt, notes),
                [heart_aspect, soul_aspect, mind_aspect, strength_aspect],
                ([heart, soul, mind, strength], (grace, fear, fury)),
                [heart_stress, soul_stress, mind_stress, strength_stress],
                character_image,
            )| CharacterRecord {
                character_name,
                player_name,
                appearance,
                flaw,
                verse,
                stunt,
                notes,
                grace,
                fear,
                fury,
                character_image,
                heart,
                soul,
                mind,
                strength,
                heart_aspect,
                soul_aspect,
                mind_aspect,
                strength_aspect,
                heart_stress,
                soul_stress,
                mind_stress,
                strength_stress,
            },
        )
    }

    proptest! {
        #[test]
        fn current_slot_round_trips(record in arb_record()) {
            let mut s = storage();
            s.save_current(&record);
            prop_assert_eq!(s.load_current(), Some(record));
        }
    }
}
