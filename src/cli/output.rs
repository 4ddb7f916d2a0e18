use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;

use crate::model::record::{DurationUnit, Record, format_number};
use crate::model::settings::Settings;
use crate::ops::search::{highlight_terminal_truncated, match_field};
use crate::ops::stats::{Dashboard, Urgency, format_duration, format_total, urgency};
use crate::util::unicode::{column_width, fit_to_width, truncate_to_width};

/// Widest a title may be in the list table
const TITLE_CELLS: usize = 48;
/// Widest bar in the trend chart
const BAR_CELLS: usize = 20;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordJson<'a> {
    #[serde(flatten)]
    pub record: &'a Record,
    pub urgency: Urgency,
    /// Field the search query matched first
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched: Option<&'static str>,
}

#[derive(Serialize)]
pub struct ListJson<'a> {
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub records: Vec<RecordJson<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingJson<'a> {
    pub upcoming: Vec<RecordJson<'a>>,
    pub due_soon: Vec<RecordJson<'a>>,
}

#[derive(Serialize)]
pub struct ValidateJson {
    pub field: String,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Serialize)]
pub struct TagJson<'a> {
    pub name: &'a str,
    pub default: bool,
}

#[derive(Serialize)]
pub struct ImportJson {
    pub imported: usize,
    pub skipped: usize,
}

#[derive(Serialize)]
pub struct ConvertJson {
    pub value: f64,
    pub from: DurationUnit,
    pub to: DurationUnit,
    pub result: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationJson<'a> {
    pub id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn record_to_json<'a>(record: &'a Record, pattern: Option<&Regex>, today: NaiveDate) -> RecordJson<'a> {
    RecordJson {
        record,
        urgency: urgency(record, today),
        matched: pattern.and_then(|re| match_field(re, record)).map(|f| f.as_str()),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

fn done_box(record: &Record) -> &'static str {
    if record.done { "[x]" } else { "[ ]" }
}

fn urgency_suffix(u: Urgency) -> &'static str {
    match u {
        Urgency::Overdue => "  (overdue)",
        Urgency::DueSoon => "  (due soon)",
        Urgency::Later => "",
    }
}

/// Due date with the optional start time
fn when(record: &Record) -> String {
    match &record.time {
        Some(t) => format!("{} {}", record.due_date, t),
        None => format!("{}      ", record.due_date),
    }
}

/// One line per record: done box, id, date, tag, duration, title.
/// When `styled`, query matches in the title are highlighted.
pub fn format_record_table(
    records: &[&Record],
    pattern: Option<&Regex>,
    today: NaiveDate,
    styled: bool,
) -> Vec<String> {
    let id_w = column_width(records.iter().map(|r| r.id.as_str()), 2);
    let tag_w = column_width(records.iter().map(|r| r.tag.as_str()), 3);
    let durations: Vec<String> = records
        .iter()
        .map(|r| format_duration(r.duration, r.unit))
        .collect();
    let dur_w = column_width(durations.iter().map(String::as_str), 1);

    records
        .iter()
        .zip(&durations)
        .map(|(r, dur)| {
            let title = if styled {
                highlight_terminal_truncated(&r.title, pattern, TITLE_CELLS)
            } else {
                truncate_to_width(&r.title, TITLE_CELLS)
            };
            format!(
                "{} {}  {}  {}  {:>dw$}  {}{}",
                done_box(r),
                fit_to_width(&r.id, id_w),
                when(r),
                fit_to_width(&r.tag, tag_w),
                dur,
                title,
                urgency_suffix(urgency(r, today)),
                dw = dur_w,
            )
        })
        .collect()
}

/// Detailed view of a single record
pub fn format_record_detail(record: &Record, today: NaiveDate) -> Vec<String> {
    let mut lines = vec![format!("{} {} {}", done_box(record), record.id, record.title)];
    lines.push(format!("due: {}{}", when(record).trim_end(), urgency_suffix(urgency(record, today))));
    lines.push(format!("tag: {}", record.tag));
    lines.push(format!(
        "duration: {} ({})",
        format_duration(record.duration, record.unit),
        record.unit
    ));
    if let Some(created) = record.created_at {
        lines.push(format!("created: {}", created.format("%Y-%m-%d %H:%M")));
    }
    if let Some(updated) = record.updated_at {
        lines.push(format!("updated: {}", updated.format("%Y-%m-%d %H:%M")));
    }
    if let Some(notes) = &record.notes {
        lines.push("notes:".to_string());
        for line in notes.lines() {
            lines.push(format!("  {}", line));
        }
    }
    lines
}

/// Dashboard cards, trend chart and tag breakdown
pub fn format_dashboard(dash: &Dashboard, unit: DurationUnit) -> Vec<String> {
    let mut lines = vec![
        format!("Records        {}", dash.total_records),
        format!("Total time     {}", format_total(dash.total_hours, unit)),
        format!("Top tag        {}", dash.top_tag.as_deref().unwrap_or("-")),
        format!("Due this week  {}", dash.due_this_week),
        format!("Due soon       {}", dash.due_soon),
        format!(
            "Streak         {} day{}",
            dash.streak_days,
            if dash.streak_days == 1 { "" } else { "s" }
        ),
        format!("Weekly cap     {} ({:.0}%)", dash.cap.summary(), dash.cap.percent),
    ];

    lines.push(String::new());
    lines.push("Last 7 days".to_string());
    let peak = dash.trend.iter().map(|d| d.count).max().unwrap_or(0);
    for day in &dash.trend {
        let bar = if peak == 0 {
            0
        } else {
            (day.count * BAR_CELLS).div_ceil(peak)
        };
        lines.push(format!(
            "  {} {}  {:<bw$}  {}",
            day.label,
            day.date.format("%d"),
            "#".repeat(bar),
            day.count,
            bw = BAR_CELLS
        ));
    }

    if !dash.tag_distribution.is_empty() {
        lines.push(String::new());
        lines.push("Tags".to_string());
        let w = column_width(dash.tag_distribution.iter().map(|(t, _)| t.as_str()), 3);
        for (tag, count) in &dash.tag_distribution {
            lines.push(format!("  {}  {}", fit_to_width(tag, w), count));
        }
    }
    if !dash.trending.is_empty() {
        let names: Vec<&str> = dash.trending.iter().map(|(t, _)| t.as_str()).collect();
        lines.push(String::new());
        lines.push(format!("Trending: {}", names.join(", ")));
    }
    lines
}

pub fn format_settings(settings: &Settings) -> Vec<String> {
    vec![
        format!("theme: {}", settings.theme),
        format!("unit: {}", settings.default_unit),
        format!("weekly cap: {}h", format_number(settings.weekly_cap_hours)),
        format!("tags: {}", settings.tags.join(", ")),
    ]
}
