use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::model::record::DurationUnit;
use crate::model::settings::Theme;

#[derive(Parser)]
#[command(name = "cf", about = concat!("campusflow v", env!("CARGO_PKG_VERSION"), " - dated tasks and events for your semester"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Directory holding the record and settings files
    #[arg(short = 'D', long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a record
    Add(AddArgs),
    /// Change fields of a record
    Edit(EditArgs),
    /// Flip a record between pending and done
    Toggle(IdArg),
    /// Permanently delete a record
    Delete(IdArg),
    /// List records, optionally filtered by a regex query
    List(ListArgs),
    /// Show record details
    Show(IdArg),
    /// Upcoming records and tasks due soon
    Upcoming(UpcomingArgs),
    /// Dashboard statistics
    Stats,
    /// Check a single field value
    Validate(ValidateArgs),
    /// Replace all records with the contents of a JSON export
    Import(ImportArgs),
    /// Write all records as JSON
    Export(ExportArgs),
    /// Delete every record
    Clear(ClearArgs),
    /// List the tag vocabulary, or add/remove a tag
    Tags(TagsCmd),
    /// Show or change settings
    Settings(SettingsArgs),
    /// Convert a duration between hours and minutes
    Convert(ConvertArgs),
}

// ---------------------------------------------------------------------------
// Record args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct IdArg {
    /// Record ID
    pub id: String,
}

#[derive(Args)]
pub struct AddArgs {
    /// Title (1-120 characters)
    pub title: String,
    /// Due date, YYYY-MM-DD
    #[arg(long)]
    pub due: String,
    /// How long it takes, in --unit
    #[arg(long)]
    pub duration: String,
    /// Unit of --duration (default: the settings default unit)
    #[arg(long, value_parser = parse_unit)]
    pub unit: Option<DurationUnit>,
    #[arg(long)]
    pub tag: String,
    /// Start time, HH:MM (24-hour)
    #[arg(long)]
    pub time: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Args)]
pub struct EditArgs {
    /// Record ID
    pub id: String,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub due: Option<String>,
    #[arg(long)]
    pub duration: Option<String>,
    #[arg(long, value_parser = parse_unit)]
    pub unit: Option<DurationUnit>,
    #[arg(long)]
    pub tag: Option<String>,
    /// Start time, HH:MM (pass "" to clear)
    #[arg(long)]
    pub time: Option<String>,
    /// Notes (pass "" to clear)
    #[arg(long)]
    pub notes: Option<String>,
}

// ---------------------------------------------------------------------------
// Read command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ListArgs {
    /// Regex matched against title, tag, due date and notes
    pub query: Option<String>,
    /// Match case exactly
    #[arg(short = 'c', long, conflicts_with = "ignore_case")]
    pub case_sensitive: bool,
    /// Ignore case even when the config asks for case-sensitive search
    #[arg(short = 'i', long)]
    pub ignore_case: bool,
    /// Only records with this tag
    #[arg(long)]
    pub tag: Option<String>,
    /// date-asc, date-desc, title-asc, title-desc, duration-asc, duration-desc
    #[arg(long)]
    pub sort: Option<String>,
}

#[derive(Args)]
pub struct UpcomingArgs {
    /// Only records with this tag
    #[arg(long)]
    pub tag: Option<String>,
    /// Maximum number of upcoming records
    #[arg(long, default_value_t = 5)]
    pub limit: usize,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum FieldArg {
    Title,
    Duration,
    Date,
    Tag,
    Time,
    /// Warns about repeated words
    Notes,
}

#[derive(Args)]
pub struct ValidateArgs {
    pub field: FieldArg,
    pub value: String,
}

// ---------------------------------------------------------------------------
// Data management args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ImportArgs {
    /// JSON file produced by `cf export`
    pub file: PathBuf,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Output file (default: stdout)
    pub file: Option<PathBuf>,
}

#[derive(Args)]
pub struct ClearArgs {
    /// Confirm deleting every record
    #[arg(long)]
    pub yes: bool,
    /// Also reset settings and custom tags
    #[arg(long)]
    pub settings: bool,
}

#[derive(Args)]
pub struct TagsCmd {
    #[command(subcommand)]
    pub action: Option<TagsAction>,
}

#[derive(Subcommand)]
pub enum TagsAction {
    /// Add a custom tag
    Add { tag: String },
    /// Remove a custom tag (default tags stay)
    Remove { tag: String },
}

#[derive(Args)]
pub struct SettingsArgs {
    /// light, dark or auto
    #[arg(long, value_parser = parse_theme, conflicts_with = "toggle_theme")]
    pub theme: Option<Theme>,
    /// Switch between light and dark, resolving auto first
    #[arg(long)]
    pub toggle_theme: bool,
    /// Default duration unit for new records
    #[arg(long, value_parser = parse_unit)]
    pub unit: Option<DurationUnit>,
    /// Weekly workload cap in hours
    #[arg(long)]
    pub cap: Option<f64>,
}

#[derive(Args)]
pub struct ConvertArgs {
    pub value: f64,
    #[arg(long, value_parser = parse_unit)]
    pub from: DurationUnit,
    #[arg(long, value_parser = parse_unit)]
    pub to: DurationUnit,
}

fn parse_unit(s: &str) -> Result<DurationUnit, String> {
    s.parse()
}

fn parse_theme(s: &str) -> Result<Theme, String> {
    s.parse()
}
