use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Unit a duration was entered in. Stored durations are always hours;
/// the unit only controls how the value is displayed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    #[default]
    Hours,
    Minutes,
}

impl DurationUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            DurationUnit::Hours => "hours",
            DurationUnit::Minutes => "minutes",
        }
    }

    /// Convert a value entered in this unit into hours
    pub fn to_hours(self, value: f64) -> f64 {
        match self {
            DurationUnit::Hours => value,
            DurationUnit::Minutes => value / 60.0,
        }
    }

    /// Convert `value` from one unit to another
    pub fn convert(value: f64, from: DurationUnit, to: DurationUnit) -> f64 {
        match (from, to) {
            (DurationUnit::Minutes, DurationUnit::Hours) => value / 60.0,
            (DurationUnit::Hours, DurationUnit::Minutes) => value * 60.0,
            _ => value,
        }
    }
}

impl fmt::Display for DurationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DurationUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hours" | "h" => Ok(DurationUnit::Hours),
            "minutes" | "min" | "m" => Ok(DurationUnit::Minutes),
            other => Err(format!("unknown unit: {} (expected hours or minutes)", other)),
        }
    }
}

/// A single dated task or event.
///
/// Records are value snapshots: edits build a replacement record with a new
/// `updated_at` rather than mutating the stored one in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    pub title: String,
    /// `YYYY-MM-DD`
    pub due_date: String,
    /// Always in hours, whatever `unit` says
    pub duration: f64,
    #[serde(default)]
    pub unit: DurationUnit,
    pub tag: String,
    /// Optional 24-hour `HH:MM`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Record {
    /// Build a new record from already-validated fields
    pub fn create(id: String, fields: ValidFields, now: DateTime<Utc>) -> Self {
        Record {
            id,
            title: fields.title,
            due_date: fields.due_date,
            duration: fields.duration_hours,
            unit: fields.unit,
            tag: fields.tag,
            time: fields.time,
            notes: fields.notes,
            done: false,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    /// Replacement snapshot carrying new field values. Identity, completion
    /// state and creation time are kept.
    pub fn with_fields(&self, fields: ValidFields, now: DateTime<Utc>) -> Self {
        Record {
            id: self.id.clone(),
            title: fields.title,
            due_date: fields.due_date,
            duration: fields.duration_hours,
            unit: fields.unit,
            tag: fields.tag,
            time: fields.time,
            notes: fields.notes,
            done: self.done,
            created_at: self.created_at,
            updated_at: Some(now),
        }
    }

    /// Replacement snapshot with a different completion state
    pub fn with_done(&self, done: bool, now: DateTime<Utc>) -> Self {
        Record {
            done,
            updated_at: Some(now),
            ..self.clone()
        }
    }

    /// Parsed due date, if the stored string is a real calendar date.
    /// Imported records may carry dates the grammar accepts but the calendar
    /// does not (`2025-02-30`), so callers must handle `None`.
    pub fn due(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.due_date, "%Y-%m-%d").ok()
    }

    /// The day this record counts as "active" for trend and streak purposes
    pub fn activity_date(&self) -> Option<NaiveDate> {
        match self.created_at {
            Some(ts) => Some(ts.date_naive()),
            None => self.due(),
        }
    }

    pub fn notes_or_empty(&self) -> &str {
        self.notes.as_deref().unwrap_or("")
    }

    /// A draft pre-filled with this record's values, for editing
    pub fn to_draft(&self) -> RecordDraft {
        let duration = match self.unit {
            DurationUnit::Hours => format_number(self.duration),
            DurationUnit::Minutes => format_number(self.duration * 60.0),
        };
        RecordDraft {
            title: self.title.clone(),
            due_date: self.due_date.clone(),
            duration,
            unit: self.unit,
            tag: self.tag.clone(),
            time: self.time.clone().unwrap_or_default(),
            notes: self.notes.clone().unwrap_or_default(),
            stored_hours: Some(self.duration),
        }
    }
}

/// Raw, unvalidated form input for a record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordDraft {
    pub title: String,
    pub due_date: String,
    pub duration: String,
    pub unit: DurationUnit,
    pub tag: String,
    pub time: String,
    pub notes: String,
    /// Length carried over untouched from the record being edited. While set,
    /// `duration` is display-only and is neither validated nor reparsed.
    pub stored_hours: Option<f64>,
}

/// Field values that passed every validator
#[derive(Debug, Clone, PartialEq)]
pub struct ValidFields {
    pub title: String,
    pub due_date: String,
    pub duration_hours: f64,
    pub unit: DurationUnit,
    pub tag: String,
    pub time: Option<String>,
    pub notes: Option<String>,
}

/// Format a number the way a person would type it: no trailing `.0`,
/// at most two decimals.
pub fn format_number(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        let s = format!("{:.2}", rounded);
        s.trim_end_matches('0').to_string()
    }
}
