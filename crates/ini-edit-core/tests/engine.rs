use std::path::PathBuf;

use ini_edit_core::error::EditError;
use ini_edit_core::{EditOptions, IniEditor, MatchPolicy, Syntax};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

const SAMPLE: &str = "\
; application settings
[server]
host = localhost
port = 8080

[paths]
data = /var/lib/app
";

fn write_fixture(initial: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.ini");
    std::fs::write(&path, initial).unwrap();
    (dir, path)
}

fn open(path: &PathBuf) -> IniEditor {
    IniEditor::open(path, EditOptions::default()).unwrap()
}

#[test]
fn write_then_read_round_trips() {
    let (dir, path) = write_fixture(SAMPLE);
    let mut editor = open(&path);

    let outcome = editor.write_value("server", "host", "db.internal").unwrap();
    assert!(outcome.changed);
    assert_eq!(editor.read_value("server", "host").unwrap(), "db.internal");

    let reopened = open(&path);
    assert_eq!(reopened.read_value("server", "host").unwrap(), "db.internal");
    drop(dir);
}

#[test]
fn write_rewrites_only_the_matched_line() {
    let (dir, path) = write_fixture(SAMPLE);
    let mut editor = open(&path);

    editor.write_value("server", "port", "9090").unwrap();

    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "\
; application settings
[server]
host = localhost
port = 9090

[paths]
data = /var/lib/app
"
    );
    drop(dir);
}

#[test]
fn repeated_writes_are_idempotent() {
    let (dir, path) = write_fixture(SAMPLE);

    let mut editor = open(&path);
    editor.write_value("server", "port", "9090").unwrap();
    let first_pass = std::fs::read_to_string(&path).unwrap();

    let mut editor = open(&path);
    let outcome = editor.write_value("server", "port", "9090").unwrap();
    assert!(!outcome.changed);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), first_pass);
    drop(dir);
}

#[test]
fn new_keys_land_before_trailing_blank_separators() {
    let (dir, path) = write_fixture(SAMPLE);
    let mut editor = open(&path);

    editor.write_value("server", "timeout", "30").unwrap();

    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "\
; application settings
[server]
host = localhost
port = 8080
timeout = 30

[paths]
data = /var/lib/app
"
    );
    drop(dir);
}

#[test]
fn missing_sections_are_appended_at_the_end() {
    let (dir, path) = write_fixture(SAMPLE);
    let mut editor = open(&path);

    editor.write_value("cache", "size", "64").unwrap();

    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "\
; application settings
[server]
host = localhost
port = 8080

[paths]
data = /var/lib/app
[cache]
size = 64
"
    );
    drop(dir);
}

#[test]
fn writing_to_a_missing_file_creates_it() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("fresh.ini");
    let mut editor = IniEditor::open(&path, EditOptions::default()).unwrap();

    editor.write_value("core", "enabled", "true").unwrap();

    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "[core]\nenabled = true\n"
    );
    assert!(!path.with_extension("bak").exists());
    drop(dir);
}

#[test]
fn writes_reactivate_commented_sections() {
    let (dir, path) = write_fixture("; [cache]\n; size = 64\n");
    let mut editor = open(&path);

    editor.write_value("cache", "size", "128").unwrap();

    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "[cache]\nsize = 128\n"
    );
    drop(dir);
}

#[test]
fn writes_reactivate_commented_keys_in_place() {
    let (dir, path) = write_fixture("[server]\n; host = old\nport = 8080\n");
    let mut editor = open(&path);

    editor.write_value("server", "host", "new").unwrap();

    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "[server]\nhost = new\nport = 8080\n"
    );
    drop(dir);
}

#[test]
fn strict_reads_treat_commented_entries_as_absent() {
    let (dir, path) = write_fixture("; [cache]\n; size = 64\n[server]\n; host = old\n");
    let editor = open(&path);

    let err = editor.read_value("cache", "size").unwrap_err();
    assert!(matches!(err, EditError::SectionNotFound { .. }));

    let err = editor.read_value("server", "host").unwrap_err();
    assert!(matches!(err, EditError::KeyNotFound { .. }));
    drop(dir);
}

#[test]
fn strict_reads_fail_on_missing_files() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.ini");
    let editor = IniEditor::open(&path, EditOptions::default()).unwrap();

    let err = editor.read_value("server", "host").unwrap_err();
    assert!(matches!(err, EditError::FileMissing { .. }));

    let err = editor.read_all().unwrap_err();
    assert!(matches!(err, EditError::FileMissing { .. }));
    drop(dir);
}

#[test]
fn default_reads_swallow_every_failure() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.ini");
    let editor = IniEditor::open(&path, EditOptions::default()).unwrap();
    assert_eq!(editor.read_value_or("server", "host", "fallback"), "fallback");
    drop(dir);

    let (dir, path) = write_fixture(SAMPLE);
    let editor = open(&path);
    assert_eq!(editor.read_value_or("server", "host", "fallback"), "localhost");
    assert_eq!(editor.read_value_or("server", "missing", "fallback"), "fallback");
    drop(dir);
}

#[test]
fn read_all_collects_active_pairs_only() {
    let (dir, path) = write_fixture(
        "\
[server]
host = localhost
; host = staged
port = 8080

; [cache]
; size = 64

[server]
host = shadowed
retries = 3
",
    );
    let editor = open(&path);

    let all = editor.read_all().unwrap();
    assert_eq!(all.len(), 1);

    let server = &all["server"];
    assert_eq!(server.len(), 3);
    assert_eq!(server["host"], "localhost");
    assert_eq!(server["port"], "8080");
    assert_eq!(server["retries"], "3");
    drop(dir);
}

#[test]
fn duplicate_names_resolve_to_the_first_occurrence() {
    let (dir, path) = write_fixture("[a]\nkey = first\nkey = second\n[a]\nkey = third\n");
    let mut editor = open(&path);

    assert_eq!(editor.read_value("a", "key").unwrap(), "first");

    editor.write_value("a", "key", "updated").unwrap();
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "[a]\nkey = updated\nkey = second\n[a]\nkey = third\n"
    );
    drop(dir);
}

#[test]
fn commenting_the_last_active_key_disables_the_section() {
    let (dir, path) = write_fixture("[cache]\nsize = 64\n; ttl = 60\n\n[server]\nhost = a\n");
    let mut editor = open(&path);

    let outcome = editor.comment_key("cache", "size").unwrap();
    assert!(outcome.changed);

    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "; [cache]\n; size = 64\n; ttl = 60\n\n[server]\nhost = a\n"
    );

    let reopened = open(&path);
    let err = reopened.read_value("cache", "size").unwrap_err();
    assert!(matches!(err, EditError::SectionNotFound { .. }));
    drop(dir);
}

#[test]
fn commenting_one_of_several_keys_keeps_the_header() {
    let (dir, path) = write_fixture("[server]\nhost = a\nport = 1\n");
    let mut editor = open(&path);

    editor.comment_key("server", "host").unwrap();

    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "[server]\n; host = a\nport = 1\n"
    );
    assert_eq!(editor.read_value("server", "port").unwrap(), "1");
    drop(dir);
}

#[test]
fn comment_toggles_noop_on_missing_targets() {
    let (dir, path) = write_fixture(SAMPLE);
    let mut editor = open(&path);

    assert!(!editor.comment_key("ghost", "host").unwrap().changed);
    assert!(!editor.comment_key("server", "ghost").unwrap().changed);

    editor.comment_key("server", "host").unwrap();
    assert!(!editor.comment_key("server", "host").unwrap().changed);

    drop(dir);
}

#[test]
fn lookup_policy_applies_to_sections_and_keys() {
    let (dir, path) = write_fixture("[Server]\nHost = a\n");

    let editor = open(&path);
    assert!(editor.read_value("server", "host").is_err());

    let editor = IniEditor::open(
        &path,
        EditOptions {
            policy: MatchPolicy::IgnoreCase,
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(editor.read_value("server", "host").unwrap(), "a");
    drop(dir);
}

#[test]
fn crlf_terminators_survive_edits() {
    let (dir, path) = write_fixture("[server]\r\nhost = a\r\nport = 1\r\n");
    let mut editor = open(&path);

    editor.write_value("server", "host", "b").unwrap();

    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "[server]\r\nhost = b\r\nport = 1\r\n"
    );
    drop(dir);
}

#[test]
fn missing_final_newline_survives_edits() {
    let (dir, path) = write_fixture("[server]\nhost = a");
    let mut editor = open(&path);

    editor.write_value("server", "host", "b").unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "[server]\nhost = b");
    drop(dir);
}

#[test]
fn dry_run_reports_a_diff_without_writing() {
    let (dir, path) = write_fixture(SAMPLE);
    let mut editor = IniEditor::open(
        &path,
        EditOptions {
            dry_run: true,
            ..Default::default()
        },
    )
    .unwrap();

    let outcome = editor.write_value("server", "host", "changed").unwrap();

    assert!(outcome.changed);
    let diff = outcome.diff.unwrap();
    assert!(diff.contains("-host = localhost"));
    assert!(diff.contains("+host = changed"));
    assert!(outcome.result.contains("host = changed"));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), SAMPLE);
    assert!(!path.with_extension("bak").exists());
    drop(dir);
}

#[test]
fn backups_accompany_rewrites_when_enabled() {
    let (dir, path) = write_fixture(SAMPLE);
    let mut editor = open(&path);
    editor.write_value("server", "host", "b").unwrap();
    assert_eq!(
        std::fs::read_to_string(path.with_extension("bak")).unwrap(),
        SAMPLE
    );
    drop(dir);

    let (dir, path) = write_fixture(SAMPLE);
    let mut editor = IniEditor::open(
        &path,
        EditOptions {
            backup: false,
            ..Default::default()
        },
    )
    .unwrap();
    editor.write_value("server", "host", "b").unwrap();
    assert!(!path.with_extension("bak").exists());
    drop(dir);
}

#[test]
fn values_keep_their_inline_comment_text() {
    let (dir, path) = write_fixture("[server]\nhost = db ; primary\n");
    let editor = open(&path);
    assert_eq!(editor.read_value("server", "host").unwrap(), "db ; primary");
    drop(dir);
}

#[test]
fn values_containing_equals_stay_whole() {
    let (dir, path) = write_fixture("[db]\nconnection = host=a;port=5432\n");
    let editor = open(&path);
    assert_eq!(
        editor.read_value("db", "connection").unwrap(),
        "host=a;port=5432"
    );
    drop(dir);
}

#[test]
fn custom_markers_drive_comment_detection_and_writing() {
    let (dir, path) = write_fixture("[unit]\nExecStart = /bin/app\nRestart = always\n");
    let syntax = Syntax::new(vec!['#'], '#').unwrap();
    let mut editor = IniEditor::open(
        &path,
        EditOptions {
            syntax,
            ..Default::default()
        },
    )
    .unwrap();

    editor.comment_key("unit", "Restart").unwrap();

    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "[unit]\nExecStart = /bin/app\n# Restart = always\n"
    );
    drop(dir);
}

#[test]
fn unrecognized_lines_pass_through_untouched() {
    let (dir, path) = write_fixture(
        "\
stray line without a pair
[server
host = a

[server]
port = 1
",
    );
    let mut editor = open(&path);

    editor.write_value("server", "port", "2").unwrap();

    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "\
stray line without a pair
[server
host = a

[server]
port = 2
",
    );
    drop(dir);
}
