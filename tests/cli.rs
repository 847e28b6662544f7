mod common;

use std::fs;

use assert_cmd::Command;
use common::{TestWorkspace, fixture_path};
use json_sift::schema::{FieldType, Schema};
use predicates::str::contains;
use serde_json::{Value, json};

fn sift() -> Command {
    Command::cargo_bin("json-sift").expect("binary exists")
}

fn people() -> String {
    fixture_path("people.json").to_str().unwrap().to_string()
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn describe_prints_inferred_schema() {
    let assert = sift()
        .args(["describe", "-i", &people()])
        .assert()
        .success();
    let schema = stdout_json(assert.get_output());
    let fields = schema.as_array().expect("schema array");
    assert_eq!(fields.len(), 7);
    assert_eq!(fields[1]["name"], json!("age"));
    assert_eq!(fields[1]["type"], json!("INTEGER"));
    assert_eq!(fields[5]["options"], json!(["red", "blue", "green"]));
}

#[test]
fn describe_writes_yaml_schema_that_query_can_reuse() {
    let workspace = TestWorkspace::new();
    let schema_path = workspace.path().join("people.yml");
    sift()
        .args([
            "describe",
            "-i",
            &people(),
            "-o",
            schema_path.to_str().unwrap(),
        ])
        .assert()
        .success();

    let schema = Schema::load(&schema_path).expect("load saved schema");
    assert_eq!(schema.field("joined").unwrap().field_type, FieldType::Date);

    let assert = sift()
        .args([
            "query",
            "-i",
            &people(),
            "--schema",
            schema_path.to_str().unwrap(),
            "--filter",
            "member=true",
        ])
        .assert()
        .success();
    let rows = stdout_json(assert.get_output());
    assert_eq!(rows.as_array().unwrap().len(), 3);
}

#[test]
fn describe_respects_option_thresholds() {
    let assert = sift()
        .args(["describe", "-i", &people(), "--max-options", "2"])
        .assert()
        .success();
    let schema = stdout_json(assert.get_output());
    // Three teams no longer fit in the option vocabulary.
    assert_eq!(schema[5]["type"], json!("TEXT"));
    assert_eq!(schema[5]["options"], json!([]));
}

#[test]
fn query_combines_shorthand_filters() {
    let assert = sift()
        .args([
            "query",
            "-i",
            &people(),
            "--filter",
            "age>18",
            "--filter",
            "team=Red",
        ])
        .assert()
        .success();
    let rows = stdout_json(assert.get_output());
    let names: Vec<&str> = rows
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["fullName"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["ada lovelace", "alan turing"]);
}

#[test]
fn query_with_where_json_limit_and_compact_output() {
    let assert = sift()
        .args([
            "query",
            "-i",
            &people(),
            "--where",
            r#"{"age": {"gt": 18}}"#,
            "--limit",
            "1",
            "--compact",
        ])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert_eq!(stdout.trim_end().lines().count(), 1);
    let rows: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(rows.as_array().unwrap().len(), 1);
    assert_eq!(rows[0]["age"], json!(36));
    assert_eq!(rows[0]["joined"], json!("2020-01-02T00:00:00.000Z"));
}

#[test]
fn query_reads_where_file_and_stdin() {
    let workspace = TestWorkspace::new();
    let where_path = workspace.write("where.json", r#"{"score": {"lt": 70}}"#);
    let data = fs::read_to_string(fixture_path("people.json")).unwrap();

    let assert = sift()
        .args([
            "query",
            "-i",
            "-",
            "--where-file",
            where_path.to_str().unwrap(),
        ])
        .write_stdin(data)
        .assert()
        .success();
    let rows = stdout_json(assert.get_output());
    assert_eq!(rows[0]["fullName"], json!("edsger dijkstra"));
    assert_eq!(rows.as_array().unwrap().len(), 1);
}

#[test]
fn query_writes_output_file() {
    let workspace = TestWorkspace::new();
    let output = workspace.path().join("adults.json");
    sift()
        .args([
            "query",
            "-i",
            &people(),
            "--filter",
            "age>60",
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .success();
    let rows: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    let ages: Vec<i64> = rows
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["age"].as_i64().unwrap())
        .collect();
    assert_eq!(ages, vec![85, 72]);
}

#[test]
fn query_reports_unknown_fields() {
    sift()
        .args(["query", "-i", &people(), "--filter", "height>180"])
        .assert()
        .failure()
        .stderr(contains("error:"))
        .stderr(contains("Field 'height' does not exist"));
}

#[test]
fn query_reports_non_numeric_comparisons() {
    sift()
        .args(["query", "-i", &people(), "--where", r#"{"team": {"gt": 1}}"#])
        .assert()
        .failure()
        .stderr(contains("Operator 'gt' requires a numeric field but 'team' is OPTION"));
}

#[test]
fn query_requires_a_condition() {
    sift()
        .args(["query", "-i", &people()])
        .assert()
        .failure()
        .stderr(contains("at least one condition"));
}

#[test]
fn field_in_where_and_filter_is_rejected() {
    sift()
        .args([
            "query",
            "-i",
            &people(),
            "--where",
            r#"{"age": {"gt": 1}}"#,
            "--filter",
            "age<90",
        ])
        .assert()
        .failure()
        .stderr(contains("constrained by both"));
}

#[test]
fn non_array_input_is_rejected() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("object.json", r#"{"records": []}"#);
    sift()
        .args(["describe", "-i", input.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("Expected a collection of records but found an object"));
}
