//! Integration tests for the `cf` CLI.
//!
//! Each test gets a temp data directory, runs `cf` as a subprocess,
//! and checks stdout, stderr and the stored files.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

/// Get the path to the built `cf` binary.
fn cf_bin() -> PathBuf {
    // cargo test builds to target/debug/
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("cf");
    path
}

/// Run `cf` against `<tmp>/data` with no user config or log env leaking in.
fn run_cf_env(tmp: &Path, envs: &[(&str, &str)], args: &[&str]) -> (String, String, bool) {
    let data = tmp.join("data");
    let mut cmd = Command::new(cf_bin());
    cmd.arg("-D")
        .arg(&data)
        .args(args)
        .current_dir(tmp)
        .env("CAMPUSFLOW_CONFIG", tmp.join("no-config.toml"))
        .env_remove("CAMPUSFLOW_DATA_DIR")
        .env_remove("CAMPUSFLOW_LOG");
    for (k, v) in envs {
        cmd.env(k, v);
    }
    let output = cmd.output().expect("failed to run cf");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn run_cf(tmp: &Path, args: &[&str]) -> (String, String, bool) {
    run_cf_env(tmp, &[], args)
}

/// Run `cf` expecting success, return stdout.
fn run_cf_ok(tmp: &Path, args: &[&str]) -> String {
    let (stdout, stderr, success) = run_cf(tmp, args);
    if !success {
        panic!("cf {:?} failed:\nstdout: {}\nstderr: {}", args, stdout, stderr);
    }
    stdout
}

fn run_cf_json(tmp: &Path, args: &[&str]) -> serde_json::Value {
    let mut full = vec!["--json"];
    full.extend_from_slice(args);
    let out = run_cf_ok(tmp, &full);
    serde_json::from_str(&out).unwrap_or_else(|e| panic!("bad json from {:?}: {}\n{}", args, e, out))
}

/// Add a record far in the future and return its id
fn add(tmp: &Path, title: &str, tag: &str, due: &str, duration: &str) -> String {
    run_cf_ok(
        tmp,
        &["add", title, "--due", due, "--duration", duration, "--tag", tag],
    )
    .trim()
    .to_string()
}

fn titles(list: &serde_json::Value) -> Vec<String> {
    list["records"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["title"].as_str().unwrap().to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Record commands
// ---------------------------------------------------------------------------

#[test]
fn test_add_and_list() {
    let tmp = TempDir::new().unwrap();
    let id = add(tmp.path(), "Physics lab report", "Lab", "2099-03-01", "2");
    assert!(id.starts_with("evt_"));

    let out = run_cf_ok(tmp.path(), &["list"]);
    assert!(out.contains("Physics lab report"));
    assert!(out.contains(&id));
    assert!(tmp.path().join("data/organizer-records.json").exists());

    let list = run_cf_json(tmp.path(), &["list"]);
    assert_eq!(list["count"], 1);
    assert_eq!(list["records"][0]["tag"], "Lab");
    assert_eq!(list["records"][0]["duration"], 2.0);
}

#[test]
fn test_add_minutes_stores_hours() {
    let tmp = TempDir::new().unwrap();
    let out = run_cf_ok(
        tmp.path(),
        &["add", "Quiz", "--due", "2099-03-01", "--duration", "90", "--unit", "minutes", "--tag", "Exam"],
    );
    let id = out.trim();
    let rec = run_cf_json(tmp.path(), &["show", id]);
    assert_eq!(rec["duration"], 1.5);
    assert_eq!(rec["unit"], "minutes");
}

#[test]
fn test_add_reports_every_invalid_field() {
    let tmp = TempDir::new().unwrap();
    let (stdout, stderr, ok) = run_cf(
        tmp.path(),
        &["add", "", "--due", "03/01/2099", "--duration", "0", "--tag", "9am", "--time", "25:00"],
    );
    assert!(!ok);
    assert!(stdout.is_empty());
    assert!(stderr.contains("Title is required."));
    assert!(stderr.contains("Date must be in YYYY-MM-DD format"));
    assert!(stderr.contains("Duration must be greater than 0."));
    assert!(stderr.contains("Tag must start with a letter."));
    assert!(stderr.contains("Time must be in HH:MM (24-hour) format."));
    assert!(!tmp.path().join("data/organizer-records.json").exists());
}

#[test]
fn test_add_warns_on_repeated_word() {
    let tmp = TempDir::new().unwrap();
    let (stdout, stderr, ok) = run_cf(
        tmp.path(),
        &["add", "Read the the chapter", "--due", "2099-03-01", "--duration", "1", "--tag", "Study"],
    );
    assert!(ok);
    assert!(stdout.trim().starts_with("evt_"));
    assert!(stderr.contains("warning: title repeats a word"));
}

#[test]
fn test_edit_merges_flags() {
    let tmp = TempDir::new().unwrap();
    let id = add(tmp.path(), "Essay draft", "Assignment", "2099-03-01", "2");
    run_cf_ok(tmp.path(), &["edit", &id, "--title", "Essay final", "--notes", "cite sources"]);

    let rec = run_cf_json(tmp.path(), &["show", &id]);
    assert_eq!(rec["title"], "Essay final");
    assert_eq!(rec["notes"], "cite sources");
    assert_eq!(rec["dueDate"], "2099-03-01");
    assert_eq!(rec["duration"], 2.0);

    // Changing only the unit keeps the stored length
    run_cf_ok(tmp.path(), &["edit", &id, "--unit", "minutes"]);
    let rec = run_cf_json(tmp.path(), &["show", &id]);
    assert_eq!(rec["duration"], 2.0);
    assert_eq!(rec["unit"], "minutes");

    let (_, stderr, ok) = run_cf(tmp.path(), &["edit", &id, "--tag", "9bad"]);
    assert!(!ok);
    assert!(stderr.contains("Tag must start with a letter."));
}

#[test]
fn test_edit_keeps_imported_duration() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("in.json");
    fs::write(
        &file,
        r#"[
            {"id":"odd","title":"Odd length","dueDate":"2099-01-01","duration":1.555,"tag":"Lab"},
            {"id":"tiny","title":"Tiny","dueDate":"2099-01-02","duration":0.004,"tag":"Lab"}
        ]"#,
    )
    .unwrap();
    let file_str = file.to_string_lossy().to_string();
    run_cf_ok(tmp.path(), &["import", &file_str]);

    run_cf_ok(tmp.path(), &["edit", "odd", "--title", "Renamed"]);
    let rec = run_cf_json(tmp.path(), &["show", "odd"]);
    assert_eq!(rec["title"], "Renamed");
    assert_eq!(rec["duration"], 1.555);

    run_cf_ok(tmp.path(), &["edit", "tiny", "--notes", "still tiny"]);
    assert_eq!(run_cf_json(tmp.path(), &["show", "tiny"])["duration"], 0.004);

    // A newly typed duration is validated
    let (_, stderr, ok) = run_cf(tmp.path(), &["edit", "tiny", "--duration", "0"]);
    assert!(!ok);
    assert!(stderr.contains("Duration must be greater than 0."));
}

#[test]
fn test_toggle_and_delete() {
    let tmp = TempDir::new().unwrap();
    let id = add(tmp.path(), "Lecture notes", "Lecture", "2099-03-01", "1");

    let out = run_cf_ok(tmp.path(), &["toggle", &id]);
    assert!(out.contains("is now done"));
    assert_eq!(run_cf_json(tmp.path(), &["show", &id])["done"], true);

    run_cf_ok(tmp.path(), &["delete", &id]);
    let (_, stderr, ok) = run_cf(tmp.path(), &["delete", &id]);
    assert!(!ok);
    assert!(stderr.contains("record not found"));
    assert_eq!(run_cf_json(tmp.path(), &["list"])["count"], 0);
}

#[test]
fn test_show_missing_record() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, ok) = run_cf(tmp.path(), &["show", "evt_missing"]);
    assert!(!ok);
    assert!(stderr.starts_with("error: record not found: evt_missing"));
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[test]
fn test_list_case_sensitivity() {
    let tmp = TempDir::new().unwrap();
    add(tmp.path(), "exam prep", "Study", "2099-03-02", "1");
    add(tmp.path(), "Exam Review", "Exam", "2099-03-01", "1");

    let list = run_cf_json(tmp.path(), &["list", "exam"]);
    assert_eq!(list["count"], 2);

    let list = run_cf_json(tmp.path(), &["list", "exam", "-c"]);
    assert_eq!(titles(&list), vec!["exam prep"]);
    assert_eq!(list["records"][0]["matched"], "title");
}

#[test]
fn test_list_invalid_regex_is_not_an_error() {
    let tmp = TempDir::new().unwrap();
    add(tmp.path(), "Anything", "Other", "2099-03-01", "1");

    let out = run_cf_ok(tmp.path(), &["list", "(unclosed"]);
    assert_eq!(out.trim(), "Invalid regex pattern.");

    let list = run_cf_json(tmp.path(), &["list", "[z-a]"]);
    assert_eq!(list["count"], 0);
    assert_eq!(list["error"], "Invalid regex pattern.");
}

#[test]
fn test_list_sort_and_tag_filter() {
    let tmp = TempDir::new().unwrap();
    add(tmp.path(), "Beta", "Lab", "2099-03-01", "3");
    add(tmp.path(), "Alpha", "Lab", "2099-03-03", "1");
    add(tmp.path(), "Gamma", "Exam", "2099-03-02", "2");

    let list = run_cf_json(tmp.path(), &["list"]);
    assert_eq!(titles(&list), vec!["Beta", "Gamma", "Alpha"]);

    let list = run_cf_json(tmp.path(), &["list", "--sort", "title-asc"]);
    assert_eq!(titles(&list), vec!["Alpha", "Beta", "Gamma"]);

    let list = run_cf_json(tmp.path(), &["list", "--sort", "duration-desc", "--tag", "Lab"]);
    assert_eq!(titles(&list), vec!["Beta", "Alpha"]);

    let list = run_cf_json(tmp.path(), &["list", "2099-03-0[12]"]);
    assert_eq!(titles(&list), vec!["Beta", "Gamma"]);
}

#[test]
fn test_config_file_sets_search_defaults() {
    let tmp = TempDir::new().unwrap();
    let config = tmp.path().join("config.toml");
    fs::write(&config, "[search]\ncase_sensitive = true\ndefault_sort = \"title-desc\"\n").unwrap();
    let config = config.to_string_lossy().to_string();
    let env = [("CAMPUSFLOW_CONFIG", config.as_str())];

    add(tmp.path(), "exam prep", "Study", "2099-03-02", "1");
    add(tmp.path(), "Exam Review", "Exam", "2099-03-01", "1");
    add(tmp.path(), "final exam", "Exam", "2099-03-05", "1");

    let (out, _, ok) = run_cf_env(tmp.path(), &env, &["--json", "list", "exam"]);
    assert!(ok);
    let list: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(titles(&list), vec!["final exam", "exam prep"]);
}

#[test]
fn test_ignore_case_overrides_config() {
    let tmp = TempDir::new().unwrap();
    let config = tmp.path().join("config.toml");
    fs::write(&config, "[search]\ncase_sensitive = true\n").unwrap();
    let config = config.to_string_lossy().to_string();
    let env = [("CAMPUSFLOW_CONFIG", config.as_str())];

    add(tmp.path(), "exam prep", "Study", "2099-03-02", "1");
    add(tmp.path(), "Exam Review", "Exam", "2099-03-01", "1");

    let (out, _, ok) = run_cf_env(tmp.path(), &env, &["--json", "list", "exam"]);
    assert!(ok);
    let list: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(list["count"], 1);

    let (out, _, ok) = run_cf_env(tmp.path(), &env, &["--json", "list", "exam", "-i"]);
    assert!(ok);
    let list: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(titles(&list), vec!["Exam Review", "exam prep"]);
}

#[test]
fn test_malformed_config_is_reported() {
    let tmp = TempDir::new().unwrap();
    let config = tmp.path().join("config.toml");
    fs::write(&config, "[search\n").unwrap();
    let config = config.to_string_lossy().to_string();
    let (_, stderr, ok) = run_cf_env(tmp.path(), &[("CAMPUSFLOW_CONFIG", config.as_str())], &["list"]);
    assert!(!ok);
    assert!(stderr.contains("invalid config"));
}

// ---------------------------------------------------------------------------
// Data management
// ---------------------------------------------------------------------------

#[test]
fn test_export_clear_import() {
    let tmp = TempDir::new().unwrap();
    add(tmp.path(), "First", "Study", "2099-03-01", "1");
    add(tmp.path(), "Second", "Project", "2099-03-02", "4");

    let export = tmp.path().join("backup.json");
    let export_str = export.to_string_lossy().to_string();
    run_cf_ok(tmp.path(), &["export", &export_str]);

    let (_, stderr, ok) = run_cf(tmp.path(), &["clear"]);
    assert!(!ok);
    assert!(stderr.contains("--yes"));
    assert_eq!(run_cf_json(tmp.path(), &["list"])["count"], 2);

    let out = run_cf_ok(tmp.path(), &["clear", "--yes"]);
    assert!(out.contains("Deleted 2 records."));
    assert_eq!(run_cf_json(tmp.path(), &["list"])["count"], 0);

    let out = run_cf_ok(tmp.path(), &["import", &export_str]);
    assert_eq!(out.trim(), "Imported 2 records.");
    let list = run_cf_json(tmp.path(), &["list"]);
    assert_eq!(titles(&list), vec!["First", "Second"]);
}

#[test]
fn test_export_to_stdout_is_json_array() {
    let tmp = TempDir::new().unwrap();
    add(tmp.path(), "Only", "Other", "2099-03-01", "1");
    let out = run_cf_ok(tmp.path(), &["export"]);
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value.as_array().unwrap().len(), 1);
    assert_eq!(value[0]["title"], "Only");
}

#[test]
fn test_import_skips_invalid_and_rejects_non_arrays() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("in.json");
    fs::write(
        &file,
        r#"[
            {"id":"a","title":"Kept","dueDate":"2099-01-01","duration":1,"tag":"Lab"},
            {"id":"b","title":"No duration","dueDate":"2099-01-01","tag":"Lab"}
        ]"#,
    )
    .unwrap();
    let file_str = file.to_string_lossy().to_string();
    let out = run_cf_ok(tmp.path(), &["import", &file_str]);
    assert_eq!(out.trim(), "Imported 1 records. Skipped 1 invalid.");

    fs::write(&file, r#"{"id":"a"}"#).unwrap();
    let (_, stderr, ok) = run_cf(tmp.path(), &["import", &file_str]);
    assert!(!ok);
    assert!(stderr.contains("File must contain a JSON array."));
    // the failed import left the collection alone
    assert_eq!(run_cf_json(tmp.path(), &["list"])["count"], 1);
}

#[test]
fn test_corrupt_store_starts_empty() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("data")).unwrap();
    fs::write(tmp.path().join("data/organizer-records.json"), "{{not json").unwrap();
    let out = run_cf_ok(tmp.path(), &["list"]);
    assert_eq!(out.trim(), "No records.");
}

// ---------------------------------------------------------------------------
// Tags and settings
// ---------------------------------------------------------------------------

#[test]
fn test_tags_vocabulary() {
    let tmp = TempDir::new().unwrap();
    let out = run_cf_ok(tmp.path(), &["tags"]);
    assert!(out.starts_with("Lecture\n"));

    assert!(run_cf_ok(tmp.path(), &["tags", "add", "Gym"]).contains("Added tag Gym"));
    assert!(run_cf_ok(tmp.path(), &["tags", "add", "Gym"]).contains("already exists"));

    let tags = run_cf_json(tmp.path(), &["tags"]);
    let last = tags.as_array().unwrap().last().unwrap().clone();
    assert_eq!(last["name"], "Gym");
    assert_eq!(last["default"], false);

    let (_, stderr, ok) = run_cf(tmp.path(), &["tags", "remove", "Exam"]);
    assert!(!ok);
    assert!(stderr.contains("cannot remove default tag Exam"));

    run_cf_ok(tmp.path(), &["tags", "remove", "Gym"]);
    assert!(!run_cf_ok(tmp.path(), &["tags"]).contains("Gym"));
}

#[test]
fn test_settings_update() {
    let tmp = TempDir::new().unwrap();
    let settings = run_cf_json(tmp.path(), &["settings", "--theme", "dark", "--cap", "20", "--unit", "minutes"]);
    assert_eq!(settings["theme"], "dark");
    assert_eq!(settings["weeklyCapHours"], 20.0);
    assert_eq!(settings["defaultUnit"], "minutes");

    let out = run_cf_ok(tmp.path(), &["settings"]);
    assert!(out.contains("theme: dark"));
    assert!(out.contains("weekly cap: 20h"));

    let (_, stderr, ok) = run_cf(tmp.path(), &["settings", "--cap", "0"]);
    assert!(!ok);
    assert!(stderr.contains("weekly cap must be a positive number"));
}

#[test]
fn test_settings_toggle_theme() {
    let tmp = TempDir::new().unwrap();
    let light_term: &[(&str, &str)] = &[("COLORFGBG", "0;15")];
    let dark_term: &[(&str, &str)] = &[("COLORFGBG", "15;0")];
    let theme = |env: &[(&str, &str)]| {
        let (out, stderr, ok) = run_cf_env(tmp.path(), env, &["--json", "settings", "--toggle-theme"]);
        assert!(ok, "{}", stderr);
        let settings: serde_json::Value = serde_json::from_str(&out).unwrap();
        settings["theme"].as_str().unwrap().to_string()
    };

    assert_eq!(theme(light_term), "dark");
    assert_eq!(theme(light_term), "light");

    // auto resolves against the terminal before flipping
    run_cf_ok(tmp.path(), &["settings", "--theme", "auto"]);
    assert_eq!(theme(dark_term), "light");
    run_cf_ok(tmp.path(), &["settings", "--theme", "auto"]);
    assert_eq!(theme(light_term), "dark");
}

#[test]
fn test_clear_with_settings_resets_everything() {
    let tmp = TempDir::new().unwrap();
    add(tmp.path(), "Gone", "Other", "2099-03-01", "1");
    run_cf_ok(tmp.path(), &["settings", "--theme", "dark"]);
    run_cf_ok(tmp.path(), &["clear", "--yes", "--settings"]);
    assert!(!tmp.path().join("data/organizer-settings.json").exists());
    assert_eq!(run_cf_json(tmp.path(), &["settings"])["theme"], "light");
}

// ---------------------------------------------------------------------------
// Stateless commands
// ---------------------------------------------------------------------------

#[test]
fn test_validate_fields() {
    let tmp = TempDir::new().unwrap();
    assert_eq!(run_cf_ok(tmp.path(), &["validate", "date", "2025-09-29"]).trim(), "date: ok");

    let (_, stderr, ok) = run_cf(tmp.path(), &["validate", "title", " padded"]);
    assert!(!ok);
    assert!(stderr.contains("Title must not have leading or trailing spaces."));

    let v = run_cf_json(tmp.path(), &["validate", "time", "7:30"]);
    assert_eq!(v["valid"], false);
    assert_eq!(v["error"], "Time must be in HH:MM (24-hour) format.");

    let v = run_cf_json(tmp.path(), &["validate", "notes", "see see you"]);
    assert_eq!(v["valid"], true);
    assert_eq!(v["warning"], "repeated word");

    // never opens the store
    assert!(!tmp.path().join("data").exists());
}

#[test]
fn test_convert() {
    let tmp = TempDir::new().unwrap();
    assert_eq!(
        run_cf_ok(tmp.path(), &["convert", "90", "--from", "minutes", "--to", "hours"]).trim(),
        "1.5 hours"
    );
    let v = run_cf_json(tmp.path(), &["convert", "2", "--from", "h", "--to", "m"]);
    assert_eq!(v["result"], 120.0);
}

#[test]
fn test_stats_and_upcoming() {
    let tmp = TempDir::new().unwrap();
    add(tmp.path(), "Big project", "Project", "2099-03-01", "30");
    add(tmp.path(), "Small lab", "Lab", "2099-03-02", "15");

    let stats = run_cf_json(tmp.path(), &["stats"]);
    assert_eq!(stats["total_records"], 2);
    assert_eq!(stats["total_hours"], 45.0);
    assert_eq!(stats["cap"]["over_hours"], 5.0);
    // both records were created today
    assert_eq!(stats["streak_days"], 1);

    let out = run_cf_ok(tmp.path(), &["stats"]);
    assert!(out.contains("Over cap by 5.0h!"));

    let upcoming = run_cf_json(tmp.path(), &["upcoming", "--limit", "1"]);
    assert_eq!(upcoming["upcoming"].as_array().unwrap().len(), 1);
    assert_eq!(upcoming["upcoming"][0]["title"], "Big project");
    assert_eq!(upcoming["dueSoon"].as_array().unwrap().len(), 0);
}
