mod common;

use common::{TestWorkspace, fixture_json};
use json_sift::{
    classify::InferenceOptions,
    query::describe_schema,
    records::RecordCollection,
    schema::{FieldType, Schema, build_schema},
};

fn people_schema() -> Schema {
    describe_schema(&fixture_json("people.json"), &InferenceOptions::default())
        .expect("describe people")
}

#[test]
fn people_fixture_infers_expected_types() {
    let schema = people_schema();
    let summary: Vec<(&str, &str, FieldType)> = schema
        .iter()
        .map(|f| (f.display.as_str(), f.name.as_str(), f.field_type))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("Full Name", "fullName", FieldType::Option),
            ("Age", "age", FieldType::Integer),
            ("Score", "score", FieldType::Float),
            ("Member", "member", FieldType::Boolean),
            ("Joined", "joined", FieldType::Date),
            ("Team", "team", FieldType::Option),
            ("Notes", "notes", FieldType::Option),
        ]
    );
}

#[test]
fn option_vocabulary_is_normalized_and_ordered() {
    let schema = people_schema();
    let team = schema.field("team").expect("team field");
    assert_eq!(team.options, vec!["red", "blue", "green"]);

    // Empty strings are values, not nulls, during inference.
    let notes = schema.field("notes").expect("notes field");
    assert_eq!(notes.options, vec!["first", "", "last"]);

    assert!(schema.field("age").unwrap().options.is_empty());
}

#[test]
fn rebuilding_from_the_same_collection_is_stable() {
    let records = RecordCollection::from_json(&fixture_json("people.json")).unwrap();
    assert_eq!(build_schema(&records), build_schema(&records));
}

#[test]
fn schema_round_trips_through_json_and_yaml_files() {
    let workspace = TestWorkspace::new();
    let schema = people_schema();

    for name in ["schema.json", "schema.yml"] {
        let path = workspace.path().join(name);
        schema.save(&path).expect("save schema");
        let loaded = Schema::load(&path).expect("load schema");
        assert_eq!(loaded, schema, "round trip through {name}");
    }
}

#[test]
fn saved_json_schema_is_a_list_of_descriptors() {
    let text = people_schema().to_json_string(false).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    let first = &value.as_array().expect("array")[1];
    assert_eq!(
        first,
        &serde_json::json!({"display": "Age", "name": "age", "type": "INTEGER", "options": []})
    );
}

#[test]
fn loading_an_invalid_schema_fails() {
    let workspace = TestWorkspace::new();
    let path = workspace.write(
        "broken.json",
        r#"[
            {"display": "A", "name": "a", "type": "TEXT"},
            {"display": "B", "name": "a", "type": "INTEGER"}
        ]"#,
    );
    let err = Schema::load(&path).unwrap_err();
    assert!(format!("{err:#}").contains("Duplicate field name 'a'"));
}

#[test]
fn loading_accepts_descriptors_without_options() {
    let workspace = TestWorkspace::new();
    let path = workspace.write(
        "minimal.yaml",
        "- display: Age\n  name: age\n  type: INTEGER\n",
    );
    let schema = Schema::load(&path).expect("load minimal schema");
    assert_eq!(schema.len(), 1);
    assert_eq!(schema.field("age").unwrap().field_type, FieldType::Integer);
}
