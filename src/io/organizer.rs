use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::io::store::{self, KeyValueStore, StoreError};
use crate::model::record::{DurationUnit, Record, RecordDraft};
use crate::model::settings::{Settings, Theme, is_default_tag};
use crate::ops::validate::{FieldError, FormErrors, validate_tag};

/// Error type for organizer mutations
#[derive(Debug, thiserror::Error)]
pub enum OrganizerError {
    #[error("{0}")]
    Validation(#[from] FormErrors),
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    InvalidTag(FieldError),
    #[error("weekly cap must be a positive number of hours")]
    InvalidCap,
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Owns the record collection and settings for one store.
///
/// All mutations go through here. Each one is written to the store first
/// and only then applied to the loaded state, so a failed write changes
/// nothing.
pub struct Organizer<S: KeyValueStore> {
    store: S,
    records: Vec<Record>,
    settings: Settings,
}

impl<S: KeyValueStore> Organizer<S> {
    /// Load records and settings from the store. Unreadable documents fall
    /// back to empty/default state.
    pub fn open(store: S) -> Self {
        let records = store::load_records(&store);
        let settings = store::load_settings(&store)
            .map(Settings::merged_with_defaults)
            .unwrap_or_default();
        tracing::debug!(records = records.len(), "organizer opened");
        Organizer {
            store,
            records,
            settings,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // -----------------------------------------------------------------------
    // Records
    // -----------------------------------------------------------------------

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn record(&self, id: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }

    fn position(&self, id: &str) -> Result<usize, OrganizerError> {
        self.records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| OrganizerError::NotFound(id.to_string()))
    }

    /// Write `records` to the store, then adopt them. A failed write leaves
    /// the loaded collection as it was.
    fn commit_records(&mut self, records: Vec<Record>) -> Result<(), OrganizerError> {
        store::save_records(&mut self.store, &records)?;
        self.records = records;
        Ok(())
    }

    fn commit_settings(&mut self, settings: Settings) -> Result<(), OrganizerError> {
        store::save_settings(&mut self.store, &settings)?;
        self.settings = settings;
        Ok(())
    }

    /// Swap in a replacement snapshot for the record at `idx`
    fn commit_record_at(&mut self, idx: usize, record: Record) -> Result<(), OrganizerError> {
        let mut records = self.records.clone();
        records[idx] = record;
        self.commit_records(records)
    }

    /// A fresh id not used by any stored record
    fn next_id(&self) -> String {
        loop {
            let simple = Uuid::new_v4().simple().to_string();
            let id = format!("evt_{}", &simple[..12]);
            if self.record(&id).is_none() {
                return id;
            }
        }
    }

    /// Validate a draft and append it as a new record
    pub fn add_record(&mut self, draft: &RecordDraft, now: DateTime<Utc>) -> Result<Record, OrganizerError> {
        let fields = draft.validate()?;
        let record = Record::create(self.next_id(), fields, now);
        let mut records = self.records.clone();
        records.push(record.clone());
        self.commit_records(records)?;
        tracing::info!(id = %record.id, "record added");
        Ok(record)
    }

    /// Replace a record's fields with a validated draft
    pub fn update_record(
        &mut self,
        id: &str,
        draft: &RecordDraft,
        now: DateTime<Utc>,
    ) -> Result<Record, OrganizerError> {
        let idx = self.position(id)?;
        let fields = draft.validate()?;
        let updated = self.records[idx].with_fields(fields, now);
        self.commit_record_at(idx, updated.clone())?;
        tracing::info!(id, "record updated");
        Ok(updated)
    }

    pub fn set_done(&mut self, id: &str, done: bool, now: DateTime<Utc>) -> Result<Record, OrganizerError> {
        let idx = self.position(id)?;
        let updated = self.records[idx].with_done(done, now);
        self.commit_record_at(idx, updated.clone())?;
        tracing::info!(id, done, "record completion changed");
        Ok(updated)
    }

    pub fn toggle_done(&mut self, id: &str, now: DateTime<Utc>) -> Result<Record, OrganizerError> {
        let done = self.record(id).map(|r| r.done).unwrap_or_default();
        self.set_done(id, !done, now)
    }

    /// Remove a record. Returns false if no record had that id.
    pub fn delete_record(&mut self, id: &str) -> Result<bool, OrganizerError> {
        let Some(idx) = self.records.iter().position(|r| r.id == id) else {
            return Ok(false);
        };
        let mut records = self.records.clone();
        records.remove(idx);
        self.commit_records(records)?;
        tracing::info!(id, "record deleted");
        Ok(true)
    }

    /// Replace the whole collection (import, clear)
    pub fn replace_records(&mut self, records: Vec<Record>) -> Result<(), OrganizerError> {
        self.commit_records(records)?;
        tracing::info!(count = self.records.len(), "record collection replaced");
        Ok(())
    }

    /// Drop both stored documents and return to a fresh state
    pub fn reset(&mut self) -> Result<(), OrganizerError> {
        store::clear_all(&mut self.store)?;
        self.records.clear();
        self.settings = Settings::default();
        tracing::info!("store cleared");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Settings
    // -----------------------------------------------------------------------

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<(), OrganizerError> {
        let settings = Settings {
            theme,
            ..self.settings.clone()
        };
        self.commit_settings(settings)
    }

    pub fn set_default_unit(&mut self, unit: DurationUnit) -> Result<(), OrganizerError> {
        let settings = Settings {
            default_unit: unit,
            ..self.settings.clone()
        };
        self.commit_settings(settings)
    }

    pub fn set_weekly_cap(&mut self, hours: f64) -> Result<(), OrganizerError> {
        if !(hours.is_finite() && hours > 0.0) {
            return Err(OrganizerError::InvalidCap);
        }
        let settings = Settings {
            weekly_cap_hours: hours,
            ..self.settings.clone()
        };
        self.commit_settings(settings)
    }

    pub fn tags(&self) -> &[String] {
        &self.settings.tags
    }

    pub fn is_default_tag(&self, tag: &str) -> bool {
        is_default_tag(tag)
    }

    /// Add a tag to the vocabulary. Returns false if it is already there.
    pub fn add_tag(&mut self, tag: &str) -> Result<bool, OrganizerError> {
        let tag = tag.trim();
        validate_tag(tag).map_err(OrganizerError::InvalidTag)?;
        if self.settings.tags.iter().any(|t| t == tag) {
            return Ok(false);
        }
        let mut settings = self.settings.clone();
        settings.tags.push(tag.to_string());
        self.commit_settings(settings)?;
        Ok(true)
    }

    /// Remove a tag from the vocabulary. Default tags are never removed.
    pub fn remove_tag(&mut self, tag: &str) -> Result<bool, OrganizerError> {
        if is_default_tag(tag) {
            return Ok(false);
        }
        if !self.settings.tags.iter().any(|t| t == tag) {
            return Ok(false);
        }
        let mut settings = self.settings.clone();
        settings.tags.retain(|t| t != tag);
        self.commit_settings(settings)?;
        Ok(true)
    }
}
