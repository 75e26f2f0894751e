//! Integration tests for the `stk` CLI.
//!
//! Each test creates a temp directory, runs `stk` as a subprocess,
//! and verifies stdout and/or the stored notes document.

use std::fs;
use std::path::Path;
use std::process::Command;

use pretty_assertions::assert_eq;
use serde_json::Value;

/// Run `stk` in `dir`, returning (stdout, stderr, success).
fn run_stk(dir: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(env!("CARGO_BIN_EXE_stk"))
        .args(args)
        .current_dir(dir)
        .env_remove("STK_LOG")
        .output()
        .expect("failed to run stk");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

/// Run `stk` expecting success, return stdout.
fn run_stk_ok(dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, success) = run_stk(dir, args);
    if !success {
        panic!(
            "stk {:?} failed:\nstdout: {}\nstderr: {}",
            args, stdout, stderr
        );
    }
    stdout
}

fn init(dir: &Path) {
    run_stk_ok(dir, &["init"]);
}

/// The stored `notes` object
fn stored(dir: &Path) -> serde_json::Map<String, Value> {
    let text = fs::read_to_string(dir.join(".stickies/notes.json")).unwrap();
    let doc: Value = serde_json::from_str(&text).unwrap();
    doc["notes"].as_object().cloned().unwrap_or_default()
}

fn new_note(dir: &Path, extra: &[&str]) -> String {
    let mut args = vec!["new"];
    args.extend_from_slice(extra);
    run_stk_ok(dir, &args).trim().to_string()
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

#[test]
fn test_init_creates_store() {
    let tmp = tempfile::TempDir::new().unwrap();
    let out = run_stk_ok(tmp.path(), &["init"]);
    assert!(out.contains("Initialized ./.stickies/"));
    assert!(tmp.path().join(".stickies/notes.json").is_file());
    assert!(tmp.path().join(".stickies/config.toml").is_file());

    let (_, stderr, success) = run_stk(tmp.path(), &["init"]);
    assert!(!success);
    assert!(stderr.contains("already initialized"));
}

#[test]
fn test_commands_need_a_store() {
    let tmp = tempfile::TempDir::new().unwrap();
    let (_, stderr, success) = run_stk(tmp.path(), &["list"]);
    assert!(!success);
    assert!(stderr.contains("stk init"));
}

#[test]
fn test_store_is_found_from_subdirectory() {
    let tmp = tempfile::TempDir::new().unwrap();
    init(tmp.path());
    let nested = tmp.path().join("deep/er");
    fs::create_dir_all(&nested).unwrap();

    new_note(&nested, &["--content", "from below"]);
    assert_eq!(stored(tmp.path()).len(), 1);
}

// ---------------------------------------------------------------------------
// Creating and placing
// ---------------------------------------------------------------------------

#[test]
fn test_new_notes_fill_the_row() {
    let tmp = tempfile::TempDir::new().unwrap();
    init(tmp.path());

    let a = new_note(tmp.path(), &[]);
    let b = new_note(tmp.path(), &[]);
    let c = new_note(tmp.path(), &["--content", "# third", "--color", "blue"]);

    let notes = stored(tmp.path());
    assert_eq!(notes[&a]["left"], "100px");
    assert_eq!(notes[&b]["left"], "320px");
    assert_eq!(notes[&c]["left"], "540px");
    assert_eq!(notes[&c]["top"], "100px");
    assert_eq!(notes[&c]["content"], "# third");
    assert_eq!(notes[&c]["backgroundColor"], "blue");
    assert_eq!(notes[&c]["zIndex"], 3);
}

#[test]
fn test_new_json_reports_position() {
    let tmp = tempfile::TempDir::new().unwrap();
    init(tmp.path());
    let out = run_stk_ok(tmp.path(), &["new", "--json"]);
    let created: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(created["left"], 100);
    assert_eq!(created["top"], 100);
    assert!(created["id"].as_str().is_some());
}

#[test]
fn test_new_rejects_unknown_color() {
    let tmp = tempfile::TempDir::new().unwrap();
    init(tmp.path());
    let (_, stderr, success) = run_stk(tmp.path(), &["new", "--color", "teal"]);
    assert!(!success);
    assert!(stderr.contains("unknown color"));
    assert!(stored(tmp.path()).is_empty());
}

// ---------------------------------------------------------------------------
// Editing
// ---------------------------------------------------------------------------

#[test]
fn test_edit_stamps_content() {
    let tmp = tempfile::TempDir::new().unwrap();
    init(tmp.path());
    let id = new_note(tmp.path(), &[]);

    run_stk_ok(tmp.path(), &["edit", &id, "**buy milk**"]);
    let notes = stored(tmp.path());
    assert_eq!(notes[&id]["content"], "**buy milk**");
    assert!(notes[&id]["lastEditTimestamp"].as_i64().is_some());

    let out = run_stk_ok(tmp.path(), &["list"]);
    assert!(out.contains("buy milk"));
    assert!(!out.contains("**"));
}

#[test]
fn test_move_anchors_to_nearer_edge() {
    let tmp = tempfile::TempDir::new().unwrap();
    init(tmp.path());
    let id = new_note(tmp.path(), &[]);

    run_stk_ok(
        tmp.path(),
        &["move", &id, "1100", "30", "--viewport-width", "1400"],
    );
    let notes = stored(tmp.path());
    assert_eq!(notes[&id]["edge"], "right");
    assert_eq!(notes[&id]["right"], "100px");
    assert_eq!(notes[&id]["left"], Value::Null);
    assert_eq!(notes[&id]["top"], "30px");
}

#[test]
fn test_resize_color_minimize_raise() {
    let tmp = tempfile::TempDir::new().unwrap();
    init(tmp.path());
    let a = new_note(tmp.path(), &[]);
    new_note(tmp.path(), &[]);

    run_stk_ok(tmp.path(), &["resize", &a, "50", "300"]);
    run_stk_ok(tmp.path(), &["color", &a, "Red"]);
    assert_eq!(run_stk_ok(tmp.path(), &["minimize", &a]).trim(), "minimized");
    assert_eq!(run_stk_ok(tmp.path(), &["raise", &a]).trim(), "3");

    let notes = stored(tmp.path());
    assert_eq!(notes[&a]["width"], "150px");
    assert_eq!(notes[&a]["height"], "300px");
    assert_eq!(notes[&a]["backgroundColor"], "red");
    assert_eq!(notes[&a]["minimized"], true);
    assert_eq!(notes[&a]["zIndex"], 3);

    assert_eq!(run_stk_ok(tmp.path(), &["minimize", &a]).trim(), "expanded");
}

#[test]
fn test_rm_and_missing_ids() {
    let tmp = tempfile::TempDir::new().unwrap();
    init(tmp.path());
    let id = new_note(tmp.path(), &[]);

    run_stk_ok(tmp.path(), &["rm", &id]);
    assert!(stored(tmp.path()).is_empty());

    let (_, stderr, success) = run_stk(tmp.path(), &["rm", &id]);
    assert!(!success);
    assert!(stderr.contains("note not found"));
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

#[test]
fn test_list_and_count() {
    let tmp = tempfile::TempDir::new().unwrap();
    init(tmp.path());
    assert!(run_stk_ok(tmp.path(), &["list"]).contains("No notes"));
    assert_eq!(run_stk_ok(tmp.path(), &["count"]).trim(), "0");

    new_note(tmp.path(), &["--content", "one"]);
    new_note(tmp.path(), &["--content", "two"]);

    // bare `stk` lists
    let out = run_stk_ok(tmp.path(), &[]);
    assert_eq!(out.lines().count(), 2);

    let count: Value = serde_json::from_str(&run_stk_ok(tmp.path(), &["count", "--json"])).unwrap();
    assert_eq!(count["count"], 2);
    assert_eq!(count["badge"], "2");

    let list: Value = serde_json::from_str(&run_stk_ok(tmp.path(), &["list", "--json"])).unwrap();
    let items = list.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["content"], "one");
    assert!(items[0]["id"].as_str().is_some());
}

#[test]
fn test_show_detail() {
    let tmp = tempfile::TempDir::new().unwrap();
    init(tmp.path());
    let id = new_note(tmp.path(), &["--content", "line one\nline two"]);

    let out = run_stk_ok(tmp.path(), &["show", &id]);
    assert!(out.starts_with(&format!("id: {}\n", id)));
    assert!(out.contains("position: left 100px top 100"));
    assert!(out.contains("size: 200x200"));
    assert!(out.ends_with("line one\nline two\n"));
}

#[test]
fn test_badge_hidden_by_config() {
    let tmp = tempfile::TempDir::new().unwrap();
    init(tmp.path());
    new_note(tmp.path(), &[]);

    run_stk_ok(tmp.path(), &["config", "set", "display.show_badge_count", "false"]);
    assert_eq!(
        run_stk_ok(tmp.path(), &["config", "get", "display.show_badge_count"]).trim(),
        "false"
    );
    let count: Value = serde_json::from_str(&run_stk_ok(tmp.path(), &["count", "--json"])).unwrap();
    assert_eq!(count["badge"], "");

    let (_, stderr, success) = run_stk(tmp.path(), &["config", "set", "display.nope", "1"]);
    assert!(!success);
    assert!(stderr.contains("unknown config key"));
}

// ---------------------------------------------------------------------------
// Backup and restore
// ---------------------------------------------------------------------------

#[test]
fn test_export_import_round_trip() {
    let tmp = tempfile::TempDir::new().unwrap();
    init(tmp.path());
    let id = new_note(tmp.path(), &["--content", "keep me"]);

    let out = run_stk_ok(tmp.path(), &["export"]);
    let backup = fs::read_dir(tmp.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .find(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("sticky-notes-backup-"))
        })
        .expect("backup file written");
    assert!(out.contains("Exported 1 notes"));

    run_stk_ok(tmp.path(), &["clear", "--yes"]);
    assert!(stored(tmp.path()).is_empty());

    let out = run_stk_ok(tmp.path(), &["import", backup.to_str().unwrap()]);
    assert!(out.contains("Imported 1 notes"));
    assert_eq!(stored(tmp.path())[&id]["content"], "keep me");

    // the clear left its payload in the recovery log
    let out = run_stk_ok(tmp.path(), &["recovery"]);
    assert!(out.contains("clear: deleted 1 notes"));
    assert!(out.contains("keep me"));
}

#[test]
fn test_export_refuses_empty_collection() {
    let tmp = tempfile::TempDir::new().unwrap();
    init(tmp.path());
    let (_, stderr, success) = run_stk(tmp.path(), &["export"]);
    assert!(!success);
    assert!(stderr.contains("no notes to export"));
}

#[test]
fn test_import_rejects_non_object() {
    let tmp = tempfile::TempDir::new().unwrap();
    init(tmp.path());
    let path = tmp.path().join("bad.json");
    fs::write(&path, "[1, 2, 3]").unwrap();

    let (_, stderr, success) = run_stk(tmp.path(), &["import", path.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("invalid backup"));
}

#[test]
fn test_clear_needs_confirmation() {
    let tmp = tempfile::TempDir::new().unwrap();
    init(tmp.path());
    new_note(tmp.path(), &[]);

    let (_, stderr, success) = run_stk(tmp.path(), &["clear"]);
    assert!(!success);
    assert!(stderr.contains("--yes"));
    assert_eq!(stored(tmp.path()).len(), 1);
}

#[test]
fn test_quota_failure_is_recorded() {
    let tmp = tempfile::TempDir::new().unwrap();
    init(tmp.path());
    let id = new_note(tmp.path(), &[]);
    run_stk_ok(tmp.path(), &["config", "set", "store.quota_bytes", "200"]);

    let long = "x".repeat(500);
    let (_, stderr, success) = run_stk(tmp.path(), &["edit", &id, &long]);
    assert!(!success);
    assert!(stderr.contains("quota exceeded"));
    assert_eq!(stored(tmp.path())[&id]["content"], "");

    let out = run_stk_ok(tmp.path(), &["recovery", "--json"]);
    let entries: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(entries[0]["category"], "write");
    assert!(entries[0]["body"].as_str().unwrap().contains(&long));
}
