use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use crossterm::style::Stylize;
use regex::Regex;

use crate::model::record::Record;
use crate::ops::validate::{PatternError, compile_pattern};
use crate::util::unicode::{ELLIPSIS, truncate_to_width};

/// Which field of a record matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchField {
    Title,
    Tag,
    DueDate,
    Notes,
}

impl MatchField {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchField::Title => "title",
            MatchField::Tag => "tag",
            MatchField::DueDate => "dueDate",
            MatchField::Notes => "notes",
        }
    }
}

/// Result of filtering by a search query
#[derive(Debug, Clone)]
pub struct FilterResult<'a> {
    pub records: Vec<&'a Record>,
    /// The compiled pattern, kept for highlighting. `None` when the query
    /// was blank or invalid.
    pub pattern: Option<Regex>,
    pub error: Option<PatternError>,
}

/// Collect all non-overlapping, non-empty match byte-ranges in the text.
pub fn find_matches(re: &Regex, text: &str) -> Vec<Range<usize>> {
    re.find_iter(text)
        .filter(|m| !m.is_empty())
        .map(|m| m.start()..m.end())
        .collect()
}

/// The first field of `record` the pattern matches, checked in order
/// title, tag, due date, notes.
pub fn match_field(re: &Regex, record: &Record) -> Option<MatchField> {
    if re.is_match(&record.title) {
        Some(MatchField::Title)
    } else if re.is_match(&record.tag) {
        Some(MatchField::Tag)
    } else if re.is_match(&record.due_date) {
        Some(MatchField::DueDate)
    } else if re.is_match(record.notes_or_empty()) {
        Some(MatchField::Notes)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Filter records by a query interpreted as a regular expression.
///
/// A blank query keeps every record. A query that does not compile yields
/// no records and an error, never the unfiltered list.
pub fn filter_records<'a>(records: &'a [Record], query: &str, case_sensitive: bool) -> FilterResult<'a> {
    if query.trim().is_empty() {
        return FilterResult {
            records: records.iter().collect(),
            pattern: None,
            error: None,
        };
    }

    match compile_pattern(query, case_sensitive) {
        Ok(Some(re)) => {
            let matched: Vec<&Record> = records
                .iter()
                .filter(|r| match_field(&re, r).is_some())
                .collect();
            tracing::debug!(query, matched = matched.len(), total = records.len(), "filtered records");
            FilterResult {
                records: matched,
                pattern: Some(re),
                error: None,
            }
        }
        Ok(None) => FilterResult {
            records: records.iter().collect(),
            pattern: None,
            error: None,
        },
        Err(e) => {
            tracing::debug!(query, detail = %e.detail, "search pattern rejected");
            FilterResult {
                records: Vec::new(),
                pattern: None,
                error: Some(e),
            }
        }
    }
}

/// Narrow to records whose tag equals `tag` exactly. `None` or an empty tag
/// keeps everything.
pub fn filter_by_tag<'a>(records: Vec<&'a Record>, tag: Option<&str>) -> Vec<&'a Record> {
    match tag {
        Some(tag) if !tag.is_empty() => records.into_iter().filter(|r| r.tag == tag).collect(),
        _ => records,
    }
}

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

/// The six record orderings, plus identity for unrecognized keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    DateAsc,
    DateDesc,
    TitleAsc,
    TitleDesc,
    DurationAsc,
    DurationDesc,
    /// Keep input order
    Unsorted,
}

impl SortKey {
    /// Parse a sort key; anything unrecognized means "keep input order"
    pub fn parse(s: &str) -> SortKey {
        s.parse().unwrap_or(SortKey::Unsorted)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::DateAsc => "date-asc",
            SortKey::DateDesc => "date-desc",
            SortKey::TitleAsc => "title-asc",
            SortKey::TitleDesc => "title-desc",
            SortKey::DurationAsc => "duration-asc",
            SortKey::DurationDesc => "duration-desc",
            SortKey::Unsorted => "none",
        }
    }

    fn compare(self, a: &Record, b: &Record) -> Ordering {
        match self {
            SortKey::DateAsc => a.due_date.cmp(&b.due_date),
            SortKey::DateDesc => b.due_date.cmp(&a.due_date),
            SortKey::TitleAsc => a.title.cmp(&b.title),
            SortKey::TitleDesc => b.title.cmp(&a.title),
            SortKey::DurationAsc => a.duration.total_cmp(&b.duration),
            SortKey::DurationDesc => b.duration.total_cmp(&a.duration),
            SortKey::Unsorted => Ordering::Equal,
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date-asc" => Ok(SortKey::DateAsc),
            "date-desc" => Ok(SortKey::DateDesc),
            "title-asc" => Ok(SortKey::TitleAsc),
            "title-desc" => Ok(SortKey::TitleDesc),
            "duration-asc" => Ok(SortKey::DurationAsc),
            "duration-desc" => Ok(SortKey::DurationDesc),
            other => Err(format!("unknown sort key: {}", other)),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Return a sorted copy of `records`. The input is left untouched and ties
/// keep their input order.
pub fn sort_records<R>(records: &[R], key: SortKey) -> Vec<R>
where
    R: Borrow<Record> + Clone,
{
    let mut copy = records.to_vec();
    if key != SortKey::Unsorted {
        copy.sort_by(|a, b| key.compare(a.borrow(), b.borrow()));
    }
    copy
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Everything the records view is driven by
#[derive(Debug, Clone, Default)]
pub struct RecordQuery {
    pub text: String,
    pub case_sensitive: bool,
    pub tag: Option<String>,
    pub sort: SortKey,
}

/// Output of one pipeline run
#[derive(Debug, Clone)]
pub struct QueryOutcome<'a> {
    pub records: Vec<&'a Record>,
    pub pattern: Option<Regex>,
    pub error: Option<PatternError>,
}

/// Query filter, then tag filter, then sort. Stateless: rerun on every change.
pub fn run_query<'a>(records: &'a [Record], query: &RecordQuery) -> QueryOutcome<'a> {
    let FilterResult {
        records: filtered,
        pattern,
        error,
    } = filter_records(records, &query.text, query.case_sensitive);
    let by_tag = filter_by_tag(filtered, query.tag.as_deref());
    let sorted = sort_records(&by_tag, query.sort);
    QueryOutcome {
        records: sorted,
        pattern,
        error,
    }
}

// ---------------------------------------------------------------------------
// Highlighting
// ---------------------------------------------------------------------------

/// Escape text for safe display inside HTML
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Split `text` into alternating unmatched/matched segments and hand each to
/// the matching formatter. Matching runs on the raw text.
fn mark_spans(
    text: &str,
    pattern: Option<&Regex>,
    plain: impl Fn(&str) -> String,
    marked: impl Fn(&str) -> String,
) -> String {
    let spans = pattern.map(|re| find_matches(re, text)).unwrap_or_default();
    paint_spans(text, &spans, plain, marked)
}

/// `spans` must be sorted, disjoint and on char boundaries of `text`
fn paint_spans(
    text: &str,
    spans: &[Range<usize>],
    plain: impl Fn(&str) -> String,
    marked: impl Fn(&str) -> String,
) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for span in spans {
        out.push_str(&plain(&text[last..span.start]));
        out.push_str(&marked(&text[span.clone()]));
        last = span.end;
    }
    out.push_str(&plain(&text[last..]));
    out
}

/// Escape `text` and wrap every match of `pattern` in `<mark>` tags.
/// Matched and unmatched segments are escaped separately, so the markup
/// can never be double-escaped or broken by the input.
pub fn highlight(text: &str, pattern: Option<&Regex>) -> String {
    mark_spans(text, pattern, escape_html, |m| {
        format!("<mark>{}</mark>", escape_html(m))
    })
}

fn strip_controls(s: &str) -> String {
    s.chars().filter(|c| !c.is_control()).collect()
}

fn terminal_mark(s: &str) -> String {
    strip_controls(s).reverse().bold().to_string()
}

/// Terminal flavor of [`highlight`]: matches are shown reversed, control
/// characters in the text are dropped.
pub fn highlight_terminal(text: &str, pattern: Option<&Regex>) -> String {
    mark_spans(text, pattern, strip_controls, terminal_mark)
}

/// [`highlight_terminal`] for a column at most `max_cells` wide.
///
/// Matching runs on the whole text before it is cut. A match crossing the
/// cut stays highlighted up to it, and the ellipsis is highlighted when any
/// match reaches past the cut.
pub fn highlight_terminal_truncated(text: &str, pattern: Option<&Regex>, max_cells: usize) -> String {
    let cut = truncate_to_width(text, max_cells);
    let Some(kept) = cut.strip_suffix(ELLIPSIS).filter(|_| cut != text) else {
        return highlight_terminal(&cut, pattern);
    };
    let spans = pattern.map(|re| find_matches(re, text)).unwrap_or_default();
    let end = kept.len();
    let visible: Vec<Range<usize>> = spans
        .iter()
        .filter(|s| s.start < end)
        .map(|s| s.start..s.end.min(end))
        .collect();
    let mut out = paint_spans(kept, &visible, strip_controls, terminal_mark);
    if spans.iter().any(|s| s.end > end) {
        out.push_str(&terminal_mark(ELLIPSIS));
    } else {
        out.push_str(ELLIPSIS);
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
