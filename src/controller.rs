//! Sheet controller
//!
//! Owns the session record and which saved sheet (if any) it belongs to, and
//! ties edits to storage:
//!
//! ```text
//! Draft --save_as(n)--> Named(n) --overwrite--> Named(n)
//! Named(n) --load(m)--> Named(m)
//! Named(n) --delete(n)--> Draft (record reset)
//! Named(n) --delete(m)--> Named(n)
//! ```
//!
//! Edits are autosaved to the current slot after a quiet period. The caller
//! drives time: `apply_change` arms the debounce, `poll_autosave` performs the
//! write once it is due.

use crate::change::FieldChange;
use crate::debounce::Debounce;
use crate::persistence::{KeyValueStore, SheetCollection, SheetStorage};
use crate::record::{CharacterRecord, default_record};
use crate::validation::is_valid_allocation;

/// Whether the session record is tied to a saved sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetIdentity<'a> {
    /// Never saved under a name
    Draft,
    Named(&'a str),
}

pub struct SheetController<S> {
    storage: SheetStorage<S>,
    record: CharacterRecord,
    current_name: Option<String>,
    collection: SheetCollection,
    autosave: Debounce,
}

impl<S: KeyValueStore> SheetController<S> {
    /// Start a session from whatever storage holds. The current slot does
    /// not remember which named sheet produced it, so this always starts
    /// as a draft.
    pub fn initialize(storage: SheetStorage<S>, autosave_delay_ms: f64) -> Self {
        let record = storage.load_current().unwrap_or_else(|| {
            log::info!("No current sheet found, starting fresh");
            default_record()
        });
        let collection = storage.load_collection();
        log::info!("{} saved sheets available", collection.len());

        Self {
            storage,
            record,
            current_name: None,
            collection,
            autosave: Debounce::new(autosave_delay_ms),
        }
    }

    pub fn record(&self) -> &CharacterRecord {
        &self.record
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current_name.as_deref()
    }

    pub fn identity(&self) -> SheetIdentity<'_> {
        match &self.current_name {
            Some(name) => SheetIdentity::Named(name.as_str()),
            None => SheetIdentity::Draft,
        }
    }

    /// In-memory view of the saved sheets
    pub fn collection(&self) -> &SheetCollection {
        &self.collection
    }

    /// Saved sheet names, sorted
    pub fn saved_names(&self) -> Vec<&str> {
        self.collection.keys().map(String::as_str).collect()
    }

    /// Advisory skill check for the banner
    pub fn allocation_valid(&self) -> bool {
        is_valid_allocation(&self.record.skill_scores())
    }

    pub fn storage(&self) -> &SheetStorage<S> {
        &self.storage
    }

    // === Editing ===

    /// Apply one edit and (re)arm the autosave timer from `now_ms`
    pub fn apply_change(&mut self, change: FieldChange, now_ms: f64) -> bool {
        let key = change.key();
        if !change.apply(&mut self.record) {
            return false;
        }
        log::debug!("Field '{}' changed", key);
        self.autosave.schedule(now_ms);
        true
    }

    pub fn autosave_pending(&self) -> bool {
        self.autosave.is_pending()
    }

    /// Time left before the pending autosave is due
    pub fn autosave_remaining(&self, now_ms: f64) -> Option<f64> {
        self.autosave.remaining(now_ms)
    }

    /// Write the current slot if the quiet period has elapsed
    pub fn poll_autosave(&mut self, now_ms: f64) -> bool {
        if !self.autosave.fire_if_due(now_ms) {
            return false;
        }
        self.storage.save_current(&self.record);
        true
    }

    /// Write a pending autosave right away
    pub fn flush_autosave(&mut self) -> bool {
        if !self.autosave.take() {
            return false;
        }
        self.storage.save_current(&self.record);
        true
    }

    /// Drop a pending autosave without writing (teardown)
    pub fn cancel_autosave(&mut self) {
        self.autosave.cancel();
    }

    // === Named sheets ===

    /// Save the session under a new (or existing) name and make it current.
    /// Blank names are ignored.
    pub fn save_as(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            log::debug!("Ignoring save with a blank name");
            return false;
        }
        self.storage.save_named(name, &self.record);
        self.refresh_collection();
        self.current_name = Some(name.to_string());
        true
    }

    /// Re-save the session under the current name. No-op for drafts.
    pub fn overwrite(&mut self) -> bool {
        let Some(name) = self.current_name.as_deref() else {
            log::debug!("Nothing to overwrite: sheet has no name");
            return false;
        };
        self.storage.save_named(name, &self.record);
        self.refresh_collection();
        true
    }

    /// Open a saved sheet, replacing the session record. Unknown names are
    /// a no-op.
    pub fn load(&mut self, name: &str) -> bool {
        let Some(record) = self.collection.get(name).cloned() else {
            log::warn!("No saved sheet named '{}'", name);
            return false;
        };
        self.replace_record(record);
        self.current_name = Some(name.to_string());
        log::info!("Loaded sheet '{}'", name);
        true
    }

    /// Delete a saved sheet. Deleting the open sheet resets the session to a
    /// fresh draft.
    pub fn delete(&mut self, name: &str) -> bool {
        let existed = self.collection.contains_key(name);
        self.storage.delete_named(name);
        self.refresh_collection();

        if self.current_name.as_deref() == Some(name) {
            self.current_name = None;
            self.replace_record(default_record());
            log::info!("Open sheet '{}' deleted, session reset", name);
        }
        existed
    }

    fn refresh_collection(&mut self) {
        self.collection = self.storage.load_collection();
    }

    /// Swap the whole record. The current slot follows immediately and any
    /// pending edit autosave is superseded.
    fn replace_record(&mut self, record: CharacterRecord) {
        self.autosave.cancel();
        self.record = record;
        self.storage.save_current(&self.record);
    }
}
