use std::fs;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use crossterm::tty::IsTty;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::organizer::{Organizer, OrganizerError};
use crate::io::store::{FileStore, atomic_write};
use crate::model::config::AppConfig;
use crate::model::record::{DurationUnit, RecordDraft, format_number};
use crate::model::settings::Theme;
use crate::ops::search::{RecordQuery, SortKey, run_query};
use crate::ops::stats::{self, DUE_SOON_DAYS, Dashboard};
use crate::ops::{import, validate};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Everything a command needs: the opened store plus the run's clock
struct Context {
    org: Organizer<FileStore>,
    config: AppConfig,
    json: bool,
    now: DateTime<Utc>,
    today: NaiveDate,
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli, config: AppConfig) -> CmdResult {
    let json = cli.json;
    let data_dir = cli.data_dir;

    match cli.command {
        // No store needed
        Commands::Validate(args) => cmd_validate(args, json),
        Commands::Convert(args) => cmd_convert(args, json),

        // Read commands
        Commands::List(args) => cmd_list(&open_context(data_dir.as_deref(), config, json)?, args),
        Commands::Show(args) => cmd_show(&open_context(data_dir.as_deref(), config, json)?, args),
        Commands::Upcoming(args) => cmd_upcoming(&open_context(data_dir.as_deref(), config, json)?, args),
        Commands::Stats => cmd_stats(&open_context(data_dir.as_deref(), config, json)?),
        Commands::Export(args) => cmd_export(&open_context(data_dir.as_deref(), config, json)?, args),

        // Write commands
        Commands::Add(args) => cmd_add(&mut open_context(data_dir.as_deref(), config, json)?, args),
        Commands::Edit(args) => cmd_edit(&mut open_context(data_dir.as_deref(), config, json)?, args),
        Commands::Toggle(args) => cmd_toggle(&mut open_context(data_dir.as_deref(), config, json)?, args),
        Commands::Delete(args) => cmd_delete(&mut open_context(data_dir.as_deref(), config, json)?, args),
        Commands::Import(args) => cmd_import(&mut open_context(data_dir.as_deref(), config, json)?, args),
        Commands::Clear(args) => cmd_clear(&mut open_context(data_dir.as_deref(), config, json)?, args),
        Commands::Tags(args) => cmd_tags(&mut open_context(data_dir.as_deref(), config, json)?, args),
        Commands::Settings(args) => cmd_settings(&mut open_context(data_dir.as_deref(), config, json)?, args),
    }
}

fn open_context(data_dir: Option<&Path>, config: AppConfig, json: bool) -> Result<Context, Box<dyn std::error::Error>> {
    let dir = config_io::resolve_data_dir(data_dir, &config);
    tracing::debug!(dir = %dir.display(), "opening store");
    let store = FileStore::open(dir)?;
    // Creation timestamps are UTC, so "today" is the UTC date as well
    let now = Utc::now();
    Ok(Context {
        org: Organizer::open(store),
        config,
        json,
        now,
        today: now.date_naive(),
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

fn stdout_is_tty() -> bool {
    std::io::stdout().is_tty()
}

/// The terminal's own light/dark preference, read from `COLORFGBG`
/// (`fg;bg`, where background colors 0-6 and 8 are dark). Light when unknown.
fn terminal_theme() -> Theme {
    let dark = std::env::var("COLORFGBG")
        .ok()
        .and_then(|v| v.rsplit(';').next().and_then(|bg| bg.parse::<u8>().ok()))
        .is_some_and(|bg| bg <= 6 || bg == 8);
    if dark { Theme::Dark } else { Theme::Light }
}

/// Soft warnings for text fields that repeat a word
fn duplicate_word_warnings(draft: &RecordDraft) -> Vec<String> {
    let mut warnings = Vec::new();
    if validate::check_duplicate_word(&draft.title) {
        warnings.push("title repeats a word".to_string());
    }
    if validate::check_duplicate_word(&draft.notes) {
        warnings.push("notes repeat a word".to_string());
    }
    warnings
}

fn report_mutation(ctx: &Context, id: &str, done: Option<bool>, warnings: Vec<String>, text: String) -> CmdResult {
    if ctx.json {
        return print_json(&MutationJson { id, done, warnings });
    }
    for w in &warnings {
        eprintln!("warning: {}", w);
    }
    println!("{}", text);
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(ctx: &Context, args: ListArgs) -> CmdResult {
    let sort_name = args
        .sort
        .unwrap_or_else(|| ctx.config.search.default_sort.clone());
    let sort = SortKey::parse(&sort_name);
    if sort == SortKey::Unsorted && sort_name != SortKey::Unsorted.as_str() {
        tracing::warn!(sort = %sort_name, "unknown sort key, keeping stored order");
    }
    let query = RecordQuery {
        text: args.query.unwrap_or_default(),
        case_sensitive: !args.ignore_case && (args.case_sensitive || ctx.config.search.case_sensitive),
        tag: args.tag,
        sort,
    };
    let outcome = run_query(ctx.org.records(), &query);

    if let Some(err) = &outcome.error {
        tracing::debug!(detail = %err.detail, "query did not compile");
    }

    if ctx.json {
        return print_json(&ListJson {
            count: outcome.records.len(),
            error: outcome.error.as_ref().map(|e| e.to_string()),
            records: outcome
                .records
                .iter()
                .map(|r| record_to_json(r, outcome.pattern.as_ref(), ctx.today))
                .collect(),
        });
    }

    // An invalid pattern is an answer, not a failure
    if let Some(err) = outcome.error {
        println!("{}", err);
        return Ok(());
    }
    if outcome.records.is_empty() {
        println!("No records.");
        return Ok(());
    }
    print_lines(&format_record_table(
        &outcome.records,
        outcome.pattern.as_ref(),
        ctx.today,
        stdout_is_tty(),
    ));
    Ok(())
}

fn cmd_show(ctx: &Context, args: IdArg) -> CmdResult {
    let record = ctx
        .org
        .record(&args.id)
        .ok_or_else(|| OrganizerError::NotFound(args.id.clone()))?;
    if ctx.json {
        return print_json(&record_to_json(record, None, ctx.today));
    }
    print_lines(&format_record_detail(record, ctx.today));
    Ok(())
}

fn cmd_upcoming(ctx: &Context, args: UpcomingArgs) -> CmdResult {
    let records = ctx.org.records();
    let upcoming = stats::upcoming(records, ctx.today, args.tag.as_deref(), args.limit);
    let due_soon: Vec<_> = stats::due_within(records, ctx.today, DUE_SOON_DAYS)
        .into_iter()
        .filter(|r| !r.done)
        .collect();

    if ctx.json {
        return print_json(&UpcomingJson {
            upcoming: upcoming
                .iter()
                .map(|r| record_to_json(r, None, ctx.today))
                .collect(),
            due_soon: due_soon
                .iter()
                .map(|r| record_to_json(r, None, ctx.today))
                .collect(),
        });
    }

    let styled = stdout_is_tty();
    println!("Upcoming");
    if upcoming.is_empty() {
        println!("  nothing scheduled");
    } else {
        print_lines(&format_record_table(&upcoming, None, ctx.today, styled));
    }
    println!();
    println!("Due soon");
    if due_soon.is_empty() {
        println!("  nothing due in the next {} days", DUE_SOON_DAYS);
    } else {
        print_lines(&format_record_table(&due_soon, None, ctx.today, styled));
    }
    Ok(())
}

fn cmd_stats(ctx: &Context) -> CmdResult {
    let settings = ctx.org.settings();
    let dash = Dashboard::build(ctx.org.records(), settings, ctx.today);
    if ctx.json {
        return print_json(&dash);
    }
    print_lines(&format_dashboard(&dash, settings.default_unit));
    Ok(())
}

fn cmd_validate(args: ValidateArgs, json: bool) -> CmdResult {
    let value = args.value.as_str();
    let (name, result) = match args.field {
        FieldArg::Title => ("title", validate::validate_title(value)),
        FieldArg::Duration => ("duration", validate::validate_duration(value)),
        FieldArg::Date => ("date", validate::validate_date(value)),
        FieldArg::Tag => ("tag", validate::validate_tag(value)),
        FieldArg::Time => ("time", validate::validate_time(value)),
        FieldArg::Notes => ("notes", Ok(())),
    };
    let warning = match args.field {
        FieldArg::Title | FieldArg::Notes if validate::check_duplicate_word(value) => {
            Some("repeated word".to_string())
        }
        _ => None,
    };

    if json {
        return print_json(&ValidateJson {
            field: name.to_string(),
            valid: result.is_ok(),
            error: result.err().map(|e| e.to_string()),
            warning,
        });
    }

    result?;
    if let Some(w) = warning {
        eprintln!("warning: {}", w);
    }
    println!("{}: ok", name);
    Ok(())
}

fn cmd_export(ctx: &Context, args: ExportArgs) -> CmdResult {
    let text = import::export_json(ctx.org.records())?;
    match args.file {
        Some(path) => {
            atomic_write(&path, text.as_bytes())?;
            if !ctx.json {
                println!("Exported {} records to {}", ctx.org.records().len(), path.display());
            }
        }
        None => println!("{}", text),
    }
    Ok(())
}

fn cmd_convert(args: ConvertArgs, json: bool) -> CmdResult {
    if !args.value.is_finite() {
        return Err("value must be a finite number".into());
    }
    let result = DurationUnit::convert(args.value, args.from, args.to);
    if json {
        return print_json(&ConvertJson {
            value: args.value,
            from: args.from,
            to: args.to,
            result,
        });
    }
    println!("{} {}", format_number(result), args.to);
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_add(ctx: &mut Context, args: AddArgs) -> CmdResult {
    let draft = RecordDraft {
        title: args.title,
        due_date: args.due,
        duration: args.duration,
        unit: args.unit.unwrap_or(ctx.org.settings().default_unit),
        tag: args.tag,
        time: args.time.unwrap_or_default(),
        notes: args.notes.unwrap_or_default(),
        stored_hours: None,
    };
    let warnings = duplicate_word_warnings(&draft);
    let record = ctx.org.add_record(&draft, ctx.now)?;
    let text = record.id.clone();
    report_mutation(ctx, &record.id, None, warnings, text)
}

fn cmd_edit(ctx: &mut Context, args: EditArgs) -> CmdResult {
    let record = ctx
        .org
        .record(&args.id)
        .ok_or_else(|| OrganizerError::NotFound(args.id.clone()))?;
    // Without --duration the stored length is kept exactly, even when the
    // unit changes
    let mut draft = record.to_draft();
    if let Some(unit) = args.unit {
        draft.unit = unit;
    }
    if let Some(v) = args.title {
        draft.title = v;
    }
    if let Some(v) = args.due {
        draft.due_date = v;
    }
    if let Some(v) = args.duration {
        draft.duration = v;
        draft.stored_hours = None;
    }
    if let Some(v) = args.tag {
        draft.tag = v;
    }
    if let Some(v) = args.time {
        draft.time = v;
    }
    if let Some(v) = args.notes {
        draft.notes = v;
    }

    let warnings = duplicate_word_warnings(&draft);
    let updated = ctx.org.update_record(&args.id, &draft, ctx.now)?;
    let text = format!("Updated {}", updated.id);
    report_mutation(ctx, &updated.id, None, warnings, text)
}

fn cmd_toggle(ctx: &mut Context, args: IdArg) -> CmdResult {
    let record = ctx.org.toggle_done(&args.id, ctx.now)?;
    let state = if record.done { "done" } else { "pending" };
    let text = format!("{} is now {}", record.id, state);
    report_mutation(ctx, &record.id, Some(record.done), Vec::new(), text)
}

fn cmd_delete(ctx: &mut Context, args: IdArg) -> CmdResult {
    if !ctx.org.delete_record(&args.id)? {
        return Err(OrganizerError::NotFound(args.id).into());
    }
    let text = format!("Deleted {}", args.id);
    report_mutation(ctx, &args.id, None, Vec::new(), text)
}

fn cmd_import(ctx: &mut Context, args: ImportArgs) -> CmdResult {
    let text = fs::read_to_string(&args.file)
        .map_err(|e| format!("could not read {}: {}", args.file.display(), e))?;
    let report = import::parse_import(&text)?;
    let imported = report.records.len();
    let skipped = report.skipped;
    let summary = report.summary();
    ctx.org.replace_records(report.records)?;

    if ctx.json {
        return print_json(&ImportJson { imported, skipped });
    }
    println!("{}", summary);
    Ok(())
}

fn cmd_clear(ctx: &mut Context, args: ClearArgs) -> CmdResult {
    if !args.yes {
        return Err("refusing to delete every record without --yes".into());
    }
    let count = ctx.org.records().len();
    if args.settings {
        ctx.org.reset()?;
    } else {
        ctx.org.replace_records(Vec::new())?;
    }
    if ctx.json {
        return print_json(&serde_json::json!({ "deleted": count }));
    }
    println!("Deleted {} records.", count);
    Ok(())
}

fn cmd_tags(ctx: &mut Context, args: TagsCmd) -> CmdResult {
    match args.action {
        None => {
            if ctx.json {
                let tags: Vec<TagJson> = ctx
                    .org
                    .tags()
                    .iter()
                    .map(|t| TagJson {
                        name: t,
                        default: ctx.org.is_default_tag(t),
                    })
                    .collect();
                return print_json(&tags);
            }
            for tag in ctx.org.tags() {
                if ctx.org.is_default_tag(tag) {
                    println!("{}", tag);
                } else {
                    println!("{} (custom)", tag);
                }
            }
        }
        Some(TagsAction::Add { tag }) => {
            if ctx.org.add_tag(&tag)? {
                println!("Added tag {}", tag.trim());
            } else {
                println!("Tag {} already exists", tag.trim());
            }
        }
        Some(TagsAction::Remove { tag }) => {
            if ctx.org.is_default_tag(&tag) {
                return Err(format!("cannot remove default tag {}", tag).into());
            }
            if !ctx.org.remove_tag(&tag)? {
                return Err(format!("no such tag: {}", tag).into());
            }
            println!("Removed tag {}", tag);
        }
    }
    Ok(())
}

fn cmd_settings(ctx: &mut Context, args: SettingsArgs) -> CmdResult {
    if let Some(theme) = args.theme {
        ctx.org.set_theme(theme)?;
    }
    if args.toggle_theme {
        let theme = ctx.org.settings().theme.toggled(terminal_theme());
        ctx.org.set_theme(theme)?;
    }
    if let Some(unit) = args.unit {
        ctx.org.set_default_unit(unit)?;
    }
    if let Some(cap) = args.cap {
        ctx.org.set_weekly_cap(cap)?;
    }
    if ctx.json {
        return print_json(ctx.org.settings());
    }
    print_lines(&format_settings(ctx.org.settings()));
    Ok(())
}
