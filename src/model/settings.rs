use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::record::DurationUnit;

/// Tags that are always present in the vocabulary and cannot be removed
pub const DEFAULT_TAGS: [&str; 8] = [
    "Lecture",
    "Assignment",
    "Exam",
    "Study",
    "Project",
    "Meeting",
    "Lab",
    "Other",
];

/// Default: 40 hours a week
pub const DEFAULT_WEEKLY_CAP_HOURS: f64 = 40.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    /// Follow the system preference
    Auto,
}

impl Theme {
    /// Resolve `Auto` against the system preference
    pub fn resolve(self, system: Theme) -> Theme {
        match self {
            Theme::Auto => match system {
                Theme::Dark => Theme::Dark,
                _ => Theme::Light,
            },
            other => other,
        }
    }

    /// The opposite of the resolved theme
    pub fn toggled(self, system: Theme) -> Theme {
        match self.resolve(system) {
            Theme::Light => Theme::Dark,
            _ => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::Auto => "auto",
        })
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "auto" => Ok(Theme::Auto),
            other => Err(format!("unknown theme: {} (expected light, dark or auto)", other)),
        }
    }
}

/// User preferences, persisted as one JSON document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub default_unit: DurationUnit,
    #[serde(default = "default_weekly_cap")]
    pub weekly_cap_hours: f64,
    /// Ordered tag vocabulary; always contains every default tag
    #[serde(default = "default_tags")]
    pub tags: Vec<String>,
}

fn default_weekly_cap() -> f64 {
    DEFAULT_WEEKLY_CAP_HOURS
}

fn default_tags() -> Vec<String> {
    DEFAULT_TAGS.iter().map(|t| t.to_string()).collect()
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            theme: Theme::default(),
            default_unit: DurationUnit::default(),
            weekly_cap_hours: DEFAULT_WEEKLY_CAP_HOURS,
            tags: default_tags(),
        }
    }
}

impl Settings {
    /// Take settings loaded from storage and restore anything the defaults
    /// guarantee: the default tags (listed first) and a usable weekly cap.
    pub fn merged_with_defaults(mut self) -> Self {
        let mut tags = default_tags();
        for tag in self.tags.drain(..) {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        self.tags = tags;
        if !(self.weekly_cap_hours.is_finite() && self.weekly_cap_hours > 0.0) {
            self.weekly_cap_hours = DEFAULT_WEEKLY_CAP_HOURS;
        }
        self
    }
}

pub fn is_default_tag(tag: &str) -> bool {
    DEFAULT_TAGS.contains(&tag)
}
