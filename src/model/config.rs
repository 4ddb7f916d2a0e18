use serde::{Deserialize, Serialize};

/// Configuration from config.toml. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding the record and settings documents.
    /// If absent, the XDG data directory is used.
    #[serde(default)]
    pub dir: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub case_sensitive: bool,
    /// One of the sort keys accepted by `list --sort`
    #[serde(default = "default_sort")]
    pub default_sort: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            case_sensitive: false,
            default_sort: default_sort(),
        }
    }
}

fn default_sort() -> String {
    "date-asc".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// tracing filter directive, e.g. "info" or "campusflow=debug"
    #[serde(default)]
    pub level: Option<String>,
}
