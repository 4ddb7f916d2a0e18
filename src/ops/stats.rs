//! Dashboard and home-page figures derived from the record collection.
//!
//! Every function takes `today` explicitly; nothing here reads the clock.

use chrono::{Days, NaiveDate};
use indexmap::IndexMap;
use serde::Serialize;

use crate::model::record::{DurationUnit, Record, format_number};
use crate::model::settings::Settings;

/// Longest streak we bother counting back
const MAX_STREAK_DAYS: u32 = 365;
/// Days shown in the trend chart, ending today
const TREND_DAYS: u64 = 7;
pub const WEEK_DAYS: u64 = 7;
pub const DUE_SOON_DAYS: u64 = 3;
/// A pending task this close to its due date is flagged
const URGENT_DAYS: i64 = 2;
pub const TAG_DISTRIBUTION_LIMIT: usize = 6;
pub const TRENDING_LIMIT: usize = 3;
pub const UPCOMING_LIMIT: usize = 5;

pub fn total_hours(records: &[Record]) -> f64 {
    records.iter().map(|r| r.duration).sum()
}

/// Record count per tag, in order of first appearance
pub fn tag_counts(records: &[Record]) -> IndexMap<String, usize> {
    let mut counts = IndexMap::new();
    for r in records {
        *counts.entry(r.tag.clone()).or_insert(0) += 1;
    }
    counts
}

/// Tags by descending count; ties keep first-appearance order
fn ranked_tags(records: &[Record]) -> Vec<(String, usize)> {
    let mut ranked: Vec<(String, usize)> = tag_counts(records).into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

pub fn top_tag(records: &[Record]) -> Option<String> {
    ranked_tags(records).into_iter().next().map(|(tag, _)| tag)
}

pub fn tag_distribution(records: &[Record], limit: usize) -> Vec<(String, usize)> {
    let mut ranked = ranked_tags(records);
    ranked.truncate(limit);
    ranked
}

pub fn trending_tags(records: &[Record]) -> Vec<(String, usize)> {
    tag_distribution(records, TRENDING_LIMIT)
}

/// Records due between today and `days` days from now, inclusive.
/// Records whose due date is not a real calendar date are skipped.
pub fn due_within<'a>(records: &'a [Record], today: NaiveDate, days: u64) -> Vec<&'a Record> {
    let end = today.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX);
    records
        .iter()
        .filter(|r| r.due().is_some_and(|d| d >= today && d <= end))
        .collect()
}

// ---------------------------------------------------------------------------
// Weekly cap
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapStatus {
    pub used_hours: f64,
    pub cap_hours: f64,
    /// Clamped to 0..=100
    pub percent: f64,
    /// Hours left, zero when over the cap
    pub remaining_hours: f64,
    /// Hours beyond the cap, zero when under it
    pub over_hours: f64,
}

impl CapStatus {
    pub fn is_over(&self) -> bool {
        self.over_hours > 0.0
    }

    /// One-line summary, e.g. "12.5h used · 27.5h remaining of 40h cap"
    pub fn summary(&self) -> String {
        if self.is_over() {
            format!(
                "Over cap by {:.1}h! Total: {:.1}h / {}h",
                self.over_hours,
                self.used_hours,
                format_number(self.cap_hours)
            )
        } else {
            format!(
                "{:.1}h used · {:.1}h remaining of {}h cap",
                self.used_hours,
                self.remaining_hours,
                format_number(self.cap_hours)
            )
        }
    }
}

pub fn cap_status(records: &[Record], cap_hours: f64) -> CapStatus {
    let used = total_hours(records);
    let percent = if cap_hours > 0.0 {
        (used / cap_hours * 100.0).min(100.0)
    } else {
        100.0
    };
    CapStatus {
        used_hours: used,
        cap_hours,
        percent,
        remaining_hours: (cap_hours - used).max(0.0),
        over_hours: (used - cap_hours).max(0.0),
    }
}

// ---------------------------------------------------------------------------
// Activity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendDay {
    pub date: NaiveDate,
    /// Short weekday name
    pub label: String,
    pub count: usize,
}

/// Records created on each of the last seven days, oldest first
pub fn trend(records: &[Record], today: NaiveDate) -> Vec<TrendDay> {
    (0..TREND_DAYS)
        .rev()
        .filter_map(|back| today.checked_sub_days(Days::new(back)))
        .map(|date| TrendDay {
            date,
            label: date.format("%a").to_string(),
            count: records
                .iter()
                .filter(|r| r.activity_date() == Some(date))
                .count(),
        })
        .collect()
}

/// Consecutive days, ending today, on which at least one record was created
pub fn streak(records: &[Record], today: NaiveDate) -> u32 {
    let active: std::collections::HashSet<NaiveDate> =
        records.iter().filter_map(Record::activity_date).collect();
    let mut count = 0;
    let mut day = today;
    while count < MAX_STREAK_DAYS && active.contains(&day) {
        count += 1;
        match day.pred_opt() {
            Some(prev) => day = prev,
            None => break,
        }
    }
    count
}

// ---------------------------------------------------------------------------
// Upcoming
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Urgency {
    Overdue,
    DueSoon,
    Later,
}

/// How pressing a record is. Done records are never urgent.
pub fn urgency(record: &Record, today: NaiveDate) -> Urgency {
    if record.done {
        return Urgency::Later;
    }
    match record.due() {
        Some(d) if d < today => Urgency::Overdue,
        Some(d) if (d - today).num_days() <= URGENT_DAYS => Urgency::DueSoon,
        _ => Urgency::Later,
    }
}

/// Records due today or later, soonest first, optionally for one tag
pub fn upcoming<'a>(
    records: &'a [Record],
    today: NaiveDate,
    tag: Option<&str>,
    limit: usize,
) -> Vec<&'a Record> {
    let mut list: Vec<&Record> = records
        .iter()
        .filter(|r| tag.is_none_or(|t| t.is_empty() || r.tag == t))
        .filter(|r| r.due().is_some_and(|d| d >= today))
        .collect();
    list.sort_by(|a, b| a.due_date.cmp(&b.due_date));
    list.truncate(limit);
    list
}

/// The soonest records overall, whatever their date, for the task list
pub fn soonest(records: &[Record], limit: usize) -> Vec<&Record> {
    let mut list: Vec<&Record> = records.iter().collect();
    list.sort_by(|a, b| a.due_date.cmp(&b.due_date));
    list.truncate(limit);
    list
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// "30 min" below an hour or when shown in minutes, otherwise "1.5h"
pub fn format_duration(hours: f64, unit: DurationUnit) -> String {
    if unit == DurationUnit::Minutes || hours < 1.0 {
        format!("{} min", (hours * 60.0).round() as i64)
    } else {
        format!("{}h", format_number(hours))
    }
}

/// Total duration for the dashboard card: "90m" or "1.5h"
pub fn format_total(hours: f64, unit: DurationUnit) -> String {
    match unit {
        DurationUnit::Minutes => format!("{}m", (hours * 60.0).round() as i64),
        DurationUnit::Hours => format!("{:.1}h", hours),
    }
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub total_records: usize,
    pub total_hours: f64,
    pub top_tag: Option<String>,
    pub due_this_week: usize,
    pub due_soon: usize,
    pub streak_days: u32,
    pub cap: CapStatus,
    pub trend: Vec<TrendDay>,
    pub tag_distribution: Vec<(String, usize)>,
    pub trending: Vec<(String, usize)>,
}

impl Dashboard {
    pub fn build(records: &[Record], settings: &Settings, today: NaiveDate) -> Self {
        Dashboard {
            total_records: records.len(),
            total_hours: total_hours(records),
            top_tag: top_tag(records),
            due_this_week: due_within(records, today, WEEK_DAYS).len(),
            due_soon: due_within(records, today, DUE_SOON_DAYS).len(),
            streak_days: streak(records, today),
            cap: cap_status(records, settings.weekly_cap_hours),
            trend: trend(records, today),
            tag_distribution: tag_distribution(records, TAG_DISTRIBUTION_LIMIT),
            trending: trending_tags(records),
        }
    }
}
