//! CLI integration tests for sift commands.
//!
//! These tests focus on exit codes and behavior visible in JSON output,
//! not exact terminal formatting.

// Integration tests live outside cfg(test) by design
#![allow(clippy::tests_outside_test_module)]

use std::{fs, path::Path};

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

/// Helper to create a temp directory for tests.
fn temp_dir() -> tempfile::TempDir {
    tempfile::tempdir().unwrap()
}

/// Helper to run `sift` in `dir` with HOME isolated to it.
fn sift_in(dir: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("sift").unwrap();
    cmd.env("HOME", dir).env_remove("RUST_LOG").current_dir(dir);
    cmd
}

/// Strips ANSI escape sequences from a string.
fn strip_ansi(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\u{1b}' {
            for c in chars.by_ref() {
                if c == 'm' {
                    break;
                }
            }
        } else {
            output.push(ch);
        }
    }

    output
}

/// Runs a command expected to succeed and returns its stripped stdout.
fn stdout_of(cmd: &mut Command) -> String {
    let assert = cmd.assert().success();
    strip_ansi(&String::from_utf8_lossy(&assert.get_output().stdout))
}

/// Runs a command and parses its stdout as JSON.
fn json_of(cmd: &mut Command) -> Value {
    let output = cmd.output().unwrap();
    serde_json::from_slice(&output.stdout).unwrap()
}

/// Writes the standard queries and documents files into `dir`.
fn write_inputs(dir: &Path, queries: &str, documents: &str) {
    fs::write(dir.join("queries.json"), queries).unwrap();
    fs::write(dir.join("docs.json"), documents).unwrap();
}

/// Queries used by most match tests.
const QUERIES: &str = r#"[
    {"id": "fox", "query": "+quick +fox"},
    {"id": "cat", "query": "cat"},
    {"id": "phrase", "query": "\"brown fox\" OR dog"}
]"#;

/// Documents used by most match tests.
const DOCUMENTS: &str = r#"[
    {"id": "d1", "fields": {"text": "The quick brown fox"}},
    {"id": "d2", "fields": {"text": ["a lazy cat", "and a dog"]}},
    {"id": "d3", "fields": {"title": "nothing here"}}
]"#;

mod init {
    use super::*;

    #[test]
    fn creates_config_file() {
        let dir = temp_dir();

        let stdout = stdout_of(sift_in(dir.path()).arg("init"));
        assert!(stdout.contains("Created"));
        assert!(stdout.contains("[presearcher]"));

        let contents = fs::read_to_string(dir.path().join(".sift.toml")).unwrap();
        assert!(contents.contains("[analysis]"));
        assert!(contents.contains("kind = \"field-term\""));
    }

    #[test]
    fn fails_if_config_exists() {
        let dir = temp_dir();
        fs::write(dir.path().join(".sift.toml"), "existing").unwrap();

        sift_in(dir.path())
            .arg("init")
            .assert()
            .failure()
            .stderr(predicate::str::contains("--force"));

        let contents = fs::read_to_string(dir.path().join(".sift.toml")).unwrap();
        assert_eq!(contents, "existing");
    }

    #[test]
    fn force_overwrites_invalid_config() {
        let dir = temp_dir();
        fs::write(dir.path().join(".sift.toml"), "not [valid toml").unwrap();

        sift_in(dir.path())
            .args(["init", "--force"])
            .assert()
            .success();

        let contents = fs::read_to_string(dir.path().join(".sift.toml")).unwrap();
        assert!(contents.contains("[weighting]"));
    }

    #[test]
    fn written_config_loads() {
        let dir = temp_dir();
        sift_in(dir.path()).arg("init").assert().success();

        sift_in(dir.path())
            .arg("check")
            .assert()
            .success()
            .stdout(predicate::str::contains("No configuration issues."));
    }
}

mod config {
    use super::*;

    #[test]
    fn shows_defaults_without_config() {
        let dir = temp_dir();

        let stdout = stdout_of(sift_in(dir.path()).arg("config"));
        assert!(stdout.contains("default_field = \"text\""));
        assert!(stdout.contains("kind = \"field-term\""));
    }

    #[test]
    fn shows_discovered_settings_and_source() {
        let dir = temp_dir();
        fs::write(
            dir.path().join(".sift.toml"),
            "[analysis]\nstemmer = \"english\"\n",
        )
        .unwrap();

        let stdout = stdout_of(sift_in(dir.path()).arg("config"));
        assert!(stdout.contains("stemmer = \"english\""));
        assert!(stdout.contains(".sift.toml"));
    }

    #[test]
    fn explicit_config_file() {
        let dir = temp_dir();
        fs::write(
            dir.path().join("custom.toml"),
            "[presearcher]\nkind = \"match-all\"\n",
        )
        .unwrap();

        let stdout = stdout_of(sift_in(dir.path()).args(["config", "--config", "custom.toml"]));
        assert!(stdout.contains("kind = \"match-all\""));
    }

    #[test]
    fn invalid_config_fails() {
        let dir = temp_dir();
        fs::write(dir.path().join(".sift.toml"), "[presearcher]\nkind = \"bogus\"\n").unwrap();

        sift_in(dir.path())
            .arg("config")
            .assert()
            .failure()
            .stderr(predicate::str::contains("failed to load configuration"));
    }

    #[test]
    fn missing_explicit_config_fails() {
        let dir = temp_dir();

        sift_in(dir.path())
            .args(["config", "--config", "nope.toml"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("nope.toml"));
    }
}

mod matching {
    use super::*;

    #[test]
    fn json_reports_matches_per_document() {
        let dir = temp_dir();
        write_inputs(dir.path(), QUERIES, DOCUMENTS);

        let json = json_of(sift_in(dir.path()).args([
            "match",
            "-q",
            "queries.json",
            "-d",
            "docs.json",
            "--json",
        ]));

        assert_eq!(json["registered"].as_array().unwrap().len(), 3);
        assert!(json["failures"].as_object().unwrap().is_empty());

        let documents = json["documents"].as_array().unwrap();
        let ids: Vec<&str> = documents
            .iter()
            .map(|d| d["document_id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["d1", "d2", "d3"]);

        let d1: Vec<&String> = documents[0]["matches"].as_object().unwrap().keys().collect();
        assert_eq!(d1, vec!["fox", "phrase"]);
        let d2: Vec<&String> = documents[1]["matches"].as_object().unwrap().keys().collect();
        assert_eq!(d2, vec!["cat", "phrase"]);
        assert!(documents[2]["matches"].as_object().unwrap().is_empty());
        assert_eq!(documents[2]["candidates"], 0);
        assert_eq!(documents[0]["total_queries"], 3);
    }

    #[test]
    fn text_output_lists_matches() {
        let dir = temp_dir();
        write_inputs(dir.path(), QUERIES, DOCUMENTS);

        let stdout = stdout_of(sift_in(dir.path()).args([
            "match",
            "--queries",
            "queries.json",
            "--documents",
            "docs.json",
        ]));
        assert!(stdout.contains("d1"));
        assert!(stdout.contains("(no matches)"));
        assert!(stdout.contains("3 queries registered"));
    }

    #[test]
    fn highlight_matcher_reports_hits() {
        let dir = temp_dir();
        write_inputs(dir.path(), QUERIES, DOCUMENTS);

        let stdout = stdout_of(sift_in(dir.path()).args([
            "match",
            "-q",
            "queries.json",
            "-d",
            "docs.json",
            "--matcher",
            "highlight",
        ]));
        assert!(stdout.contains("text:fox@3"));
        assert!(stdout.contains("text:brown@2"));

        let json = json_of(sift_in(dir.path()).args([
            "match",
            "-q",
            "queries.json",
            "-d",
            "docs.json",
            "--matcher",
            "highlight",
            "--json",
        ]));
        let hits = json["documents"][0]["matches"]["fox"]["hits"]
            .as_array()
            .unwrap();
        let tokens: Vec<&str> = hits.iter().map(|h| h["token"].as_str().unwrap()).collect();
        assert_eq!(tokens, vec!["quick", "fox"]);
    }

    #[test]
    fn match_all_presearcher_selects_everything() {
        let dir = temp_dir();
        write_inputs(dir.path(), QUERIES, DOCUMENTS);

        let json = json_of(sift_in(dir.path()).args([
            "match",
            "-q",
            "queries.json",
            "-d",
            "docs.json",
            "--presearcher",
            "match-all",
            "--json",
        ]));
        for document in json["documents"].as_array().unwrap() {
            assert_eq!(document["candidates"], 3);
        }
        let d1: Vec<&String> = json["documents"][0]["matches"]
            .as_object()
            .unwrap()
            .keys()
            .collect();
        assert_eq!(d1, vec!["fox", "phrase"]);
    }

    #[test]
    fn failed_queries_exit_nonzero_but_others_match() {
        let dir = temp_dir();
        write_inputs(
            dir.path(),
            r#"[
                {"id": "good", "query": "fox"},
                {"id": "broken", "query": "(fox"}
            ]"#,
            DOCUMENTS,
        );

        let output = sift_in(dir.path())
            .args(["match", "-q", "queries.json", "-d", "docs.json", "--json"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("'broken' failed to register"))
            .get_output()
            .clone();

        let json: Value = serde_json::from_slice(&output.stdout).unwrap();
        assert!(json["failures"]["broken"].is_string());
        assert!(json["documents"][0]["matches"]["good"].is_object());
    }

    #[test]
    fn numeric_fields_from_config() {
        let dir = temp_dir();
        fs::write(
            dir.path().join(".sift.toml"),
            "[fields]\nage = \"integer\"\nprice = \"float\"\n",
        )
        .unwrap();
        write_inputs(
            dir.path(),
            r#"[
                {"id": "age", "query": "age:1"},
                {"id": "price", "query": "price:1.0"},
                {"id": "other", "query": "price:2"}
            ]"#,
            r#"[{"id": "d", "fields": {"age": 1, "price": 1}}]"#,
        );

        let json = json_of(sift_in(dir.path()).args([
            "match",
            "-q",
            "queries.json",
            "-d",
            "docs.json",
            "--json",
        ]));
        let matched: Vec<&String> = json["documents"][0]["matches"]
            .as_object()
            .unwrap()
            .keys()
            .collect();
        assert_eq!(matched, vec!["age", "price"]);
    }

    #[test]
    fn filter_field_restricts_candidates() {
        let dir = temp_dir();
        fs::write(
            dir.path().join(".sift.toml"),
            "[presearcher]\nfilter_field = \"language\"\n",
        )
        .unwrap();
        write_inputs(
            dir.path(),
            r#"[
                {"id": "en", "query": "fox", "metadata": {"language": "en"}},
                {"id": "de", "query": "fox", "metadata": {"language": "de"}}
            ]"#,
            r#"[{"id": "d", "fields": {"language": "en", "text": "fox"}}]"#,
        );

        let json = json_of(sift_in(dir.path()).args([
            "match",
            "-q",
            "queries.json",
            "-d",
            "docs.json",
            "--json",
        ]));
        assert_eq!(json["documents"][0]["candidates"], 1);
        assert!(json["documents"][0]["matches"]["en"].is_object());
    }

    #[test]
    fn malformed_documents_file_fails() {
        let dir = temp_dir();
        write_inputs(dir.path(), QUERIES, "{not json");

        sift_in(dir.path())
            .args(["match", "-q", "queries.json", "-d", "docs.json"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("invalid documents file"));
    }

    #[test]
    fn missing_queries_file_fails() {
        let dir = temp_dir();

        sift_in(dir.path())
            .args(["match", "-q", "missing.json", "-d", "docs.json"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("failed to read"));
    }
}

mod explain {
    use super::*;

    #[test]
    fn shows_tree_and_terms() {
        let dir = temp_dir();

        let stdout = stdout_of(sift_in(dir.path()).args(["explain", "+quick +fox"]));
        assert!(stdout.contains("Query tree:"));
        assert!(stdout.contains("Extracted terms:"));
        assert!(stdout.contains("quick"));
        assert!(stdout.contains("aggregate weight:"));
    }

    #[test]
    fn conjunction_indexes_heaviest_term() {
        let dir = temp_dir();

        let json = json_of(sift_in(dir.path()).args(["explain", "+quick +fox", "--json"]));
        assert_eq!(json["any"], false);
        let terms = json["terms"].as_array().unwrap();
        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0]["field"], "text");
        assert_eq!(terms[0]["text"], "quick");
    }

    #[test]
    fn disjunction_indexes_every_term() {
        let dir = temp_dir();

        let json = json_of(sift_in(dir.path()).args(["explain", "fox OR title:hound", "--json"]));
        let terms: Vec<(&str, &str)> = json["terms"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| (t["field"].as_str().unwrap(), t["text"].as_str().unwrap()))
            .collect();
        assert_eq!(terms, vec![("text", "fox"), ("title", "hound")]);
    }

    #[test]
    fn match_all_is_any() {
        let dir = temp_dir();

        let stdout = stdout_of(sift_in(dir.path()).args(["explain", "*:*"]));
        assert!(stdout.contains("ANY"));

        let json = json_of(sift_in(dir.path()).args(["explain", "*:*", "--json"]));
        assert_eq!(json["any"], true);
        assert!(json["terms"].as_array().unwrap().is_empty());
    }

    #[test]
    fn invalid_query_fails_with_hint() {
        let dir = temp_dir();

        sift_in(dir.path())
            .args(["explain", "(fox"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("error:"))
            .stderr(predicate::str::contains("hint:"));
    }
}

mod check {
    use super::*;

    #[test]
    fn defaults_are_clean() {
        let dir = temp_dir();

        let stdout = stdout_of(sift_in(dir.path()).arg("check"));
        assert!(stdout.contains("No configuration files found"));
        assert!(stdout.contains("No configuration issues."));
    }

    #[test]
    fn warnings_fail() {
        let dir = temp_dir();
        fs::write(
            dir.path().join(".sift.toml"),
            "[analysis]\nstemmer = \"klingon\"\n",
        )
        .unwrap();

        let assert = sift_in(dir.path()).arg("check").assert().failure();
        let stdout = strip_ansi(&String::from_utf8_lossy(&assert.get_output().stdout));
        assert!(stdout.contains("Warnings (1):"));
        assert!(stdout.contains("klingon"));
        assert!(stdout.contains("Hints:"));
    }

    #[test]
    fn reports_query_failures() {
        let dir = temp_dir();
        write_inputs(
            dir.path(),
            r#"[
                {"id": "ok", "query": "fox OR hound"},
                {"id": "bad", "query": "title:"}
            ]"#,
            "[]",
        );

        let assert = sift_in(dir.path())
            .args(["check", "--queries", "queries.json"])
            .assert()
            .failure();
        let stdout = strip_ansi(&String::from_utf8_lossy(&assert.get_output().stdout));
        assert!(stdout.contains("1 registered, 1 failed"));
        assert!(stdout.contains("bad:"));
        assert!(stdout.contains("text:fox | text:hound"));
    }

    #[test]
    fn valid_queries_pass() {
        let dir = temp_dir();
        write_inputs(dir.path(), QUERIES, "[]");

        sift_in(dir.path())
            .args(["check", "-q", "queries.json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("3 registered, 0 failed"));
    }
}
