use std::fmt;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use crate::model::record::{RecordDraft, ValidFields};

/// No leading/trailing whitespace
static RE_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\S(?:.*\S)?$").expect("title pattern"));

/// Non-negative number with at most two decimals, no leading zeros
static RE_DURATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(0|[1-9][0-9]*)(\.[0-9]{1,2})?$").expect("duration pattern"));

/// Strict YYYY-MM-DD; month and day ranges only, no calendar check
static RE_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{4}-(0[1-9]|1[0-2])-(0[1-9]|[12][0-9]|3[01])$").expect("date pattern")
});

/// Letter runs separated by single spaces or hyphens
static RE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]+(?:[ -][A-Za-z]+)*$").expect("tag pattern"));

/// 24-hour HH:MM
static RE_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([01][0-9]|2[0-3]):[0-5][0-9]$").expect("time pattern"));

static RE_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9_]+").expect("word pattern"));

pub const MAX_TITLE_CHARS: usize = 120;

/// Upper bound on the compiled size of a user-supplied search pattern
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

/// Which form field an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Duration,
    Date,
    Tag,
    Time,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Title => "title",
            Field::Duration => "duration",
            Field::Date => "date",
            Field::Tag => "tag",
            Field::Time => "time",
        })
    }
}

/// A user-correctable problem with one field. The message is what the
/// user sees next to the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("Title is required.")]
    TitleRequired,
    #[error("Title must not have leading or trailing spaces.")]
    TitleEdgeSpaces,
    #[error("Title must not contain consecutive spaces.")]
    TitleDoubleSpace,
    #[error("Title must be 120 characters or fewer.")]
    TitleTooLong,
    #[error("Duration is required.")]
    DurationRequired,
    #[error("Duration must be a non-negative number (e.g. 1.5).")]
    DurationFormat,
    #[error("Duration must be greater than 0.")]
    DurationZero,
    #[error("Date is required.")]
    DateRequired,
    #[error("Date must be in YYYY-MM-DD format (e.g. 2025-09-29).")]
    DateFormat,
    #[error("Tag is required.")]
    TagRequired,
    #[error("Tag must start with a letter.")]
    TagStart,
    #[error("Tag may only contain letters, spaces, or hyphens.")]
    TagFormat,
    #[error("Time must be in HH:MM (24-hour) format.")]
    TimeFormat,
}

/// Every failing field of a form, in field order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormErrors(pub Vec<(Field, FieldError)>);

impl FormErrors {
    pub fn get(&self, field: Field) -> Option<FieldError> {
        self.0.iter().find(|(f, _)| *f == field).map(|(_, e)| *e)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, err)) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}: {}", field, err)?;
        }
        Ok(())
    }
}

impl std::error::Error for FormErrors {}

/// A search pattern that failed to compile
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid regex pattern.")]
pub struct PatternError {
    /// The compiler's own explanation, for logs and `--verbose` output
    pub detail: String,
}

// ---------------------------------------------------------------------------
// Field validators
// ---------------------------------------------------------------------------

pub fn validate_title(value: &str) -> Result<(), FieldError> {
    if value.trim().is_empty() {
        return Err(FieldError::TitleRequired);
    }
    if !RE_TITLE.is_match(value) {
        return Err(FieldError::TitleEdgeSpaces);
    }
    if value.contains("  ") {
        return Err(FieldError::TitleDoubleSpace);
    }
    if value.chars().count() > MAX_TITLE_CHARS {
        return Err(FieldError::TitleTooLong);
    }
    Ok(())
}

pub fn validate_duration(value: &str) -> Result<(), FieldError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(FieldError::DurationRequired);
    }
    if !RE_DURATION.is_match(value) {
        return Err(FieldError::DurationFormat);
    }
    // The grammar guarantees a parseable number
    match value.parse::<f64>() {
        Ok(n) if n == 0.0 => Err(FieldError::DurationZero),
        Ok(_) => Ok(()),
        Err(_) => Err(FieldError::DurationFormat),
    }
}

pub fn validate_date(value: &str) -> Result<(), FieldError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(FieldError::DateRequired);
    }
    if !RE_DATE.is_match(value) {
        return Err(FieldError::DateFormat);
    }
    Ok(())
}

pub fn validate_tag(value: &str) -> Result<(), FieldError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(FieldError::TagRequired);
    }
    if !value.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return Err(FieldError::TagStart);
    }
    if !RE_TAG.is_match(value) {
        return Err(FieldError::TagFormat);
    }
    Ok(())
}

/// Time is optional: empty input is valid
pub fn validate_time(value: &str) -> Result<(), FieldError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(());
    }
    if !RE_TIME.is_match(value) {
        return Err(FieldError::TimeFormat);
    }
    Ok(())
}

/// True if the text repeats a word with only whitespace between the two
/// occurrences ("the the"), ignoring case. Used as a soft warning.
pub fn check_duplicate_word(text: &str) -> bool {
    let mut prev: Option<regex::Match<'_>> = None;
    for word in RE_WORD.find_iter(text) {
        if let Some(p) = prev {
            let gap = &text[p.end()..word.start()];
            if !gap.is_empty()
                && gap.chars().all(char::is_whitespace)
                && p.as_str().eq_ignore_ascii_case(word.as_str())
            {
                return true;
            }
        }
        prev = Some(word);
    }
    false
}

// ---------------------------------------------------------------------------
// Pattern compiler
// ---------------------------------------------------------------------------

/// Compile user input as a regular expression.
///
/// Returns `Ok(None)` for empty input and `Err` for malformed patterns;
/// never panics on user input.
pub fn compile_pattern(input: &str, case_sensitive: bool) -> Result<Option<Regex>, PatternError> {
    if input.is_empty() {
        return Ok(None);
    }
    RegexBuilder::new(input)
        .case_insensitive(!case_sensitive)
        .size_limit(PATTERN_SIZE_LIMIT)
        .build()
        .map(Some)
        .map_err(|e| PatternError {
            detail: e.to_string(),
        })
}

// ---------------------------------------------------------------------------
// Import shape check
// ---------------------------------------------------------------------------

/// Structural check for an imported record: an object with string `id`,
/// `title`, `dueDate`, `tag` and a numeric `duration`.
///
/// Field grammars are deliberately not re-run here, so an imported record
/// can carry a date or tag the form would reject.
pub fn validate_import_record(value: &serde_json::Value) -> bool {
    let Some(obj) = value.as_object() else {
        return false;
    };
    let is_str = |key: &str| obj.get(key).is_some_and(|v| v.is_string());
    is_str("id")
        && is_str("title")
        && is_str("dueDate")
        && obj.get("duration").is_some_and(|v| v.is_number())
        && is_str("tag")
}

// ---------------------------------------------------------------------------
// Whole-form validation
// ---------------------------------------------------------------------------

impl RecordDraft {
    /// Run every field validator independently and either return the
    /// normalized values or the full list of field errors.
    pub fn validate(&self) -> Result<ValidFields, FormErrors> {
        let title = self.title.trim();
        let due_date = self.due_date.trim();
        let duration = self.duration.trim();
        let tag = self.tag.trim();
        let time = self.time.trim();
        let notes = self.notes.trim();

        let checks = [
            (Field::Title, validate_title(title)),
            (Field::Date, validate_date(due_date)),
            (
                Field::Duration,
                match self.stored_hours {
                    Some(_) => Ok(()),
                    None => validate_duration(duration),
                },
            ),
            (Field::Tag, validate_tag(tag)),
            (Field::Time, validate_time(time)),
        ];
        let errors: Vec<(Field, FieldError)> = checks
            .into_iter()
            .filter_map(|(field, res)| res.err().map(|e| (field, e)))
            .collect();
        if !errors.is_empty() {
            return Err(FormErrors(errors));
        }

        let duration_hours = match self.stored_hours {
            Some(hours) => hours,
            None => {
                let amount: f64 = duration
                    .parse()
                    .map_err(|_| FormErrors(vec![(Field::Duration, FieldError::DurationFormat)]))?;
                self.unit.to_hours(amount)
            }
        };

        Ok(ValidFields {
            title: title.to_string(),
            due_date: due_date.to_string(),
            duration_hours,
            unit: self.unit,
            tag: tag.to_string(),
            time: (!time.is_empty()).then(|| time.to_string()),
            notes: (!notes.is_empty()).then(|| notes.to_string()),
        })
    }
}
