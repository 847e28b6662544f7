//! The two operations exposed to callers: describing the inferred schema of a
//! dataset, and querying its typed records through a where clause.
//!
//! The dataset is always passed in by the caller. Nothing here reads files or
//! keeps state between calls, so the same decoded dataset can back any number
//! of concurrent requests.

use log::debug;
use serde_json::Value as JsonValue;

use crate::{
    classify::InferenceOptions,
    coerce::{TypedRecord, coerce},
    error::SiftResult,
    filter::{WhereClause, apply_where},
    records::RecordCollection,
    schema::{Schema, build_schema_with},
};

pub fn describe_schema(data: &JsonValue, options: &InferenceOptions) -> SiftResult<Schema> {
    let records = RecordCollection::from_json(data)?;
    Ok(build_schema_with(&records, options))
}

/// Infers the schema of `data`, then returns the typed records that satisfy
/// every condition of `where_clause`.
pub fn query_records(
    data: &JsonValue,
    where_clause: &JsonValue,
    options: &InferenceOptions,
) -> SiftResult<Vec<TypedRecord>> {
    let records = RecordCollection::from_json(data)?;
    let clause = WhereClause::parse(where_clause)?;
    let schema = build_schema_with(&records, options);
    query_with_schema(&records, &schema, &clause)
}

/// Runs `clause` against `records` using a schema the caller already has,
/// either inferred earlier or loaded from a file. The clause is fully
/// validated before any record is coerced.
pub fn query_with_schema(
    records: &RecordCollection,
    schema: &Schema,
    clause: &WhereClause,
) -> SiftResult<Vec<TypedRecord>> {
    let conditions = clause.resolve(schema)?;
    let typed = coerce(records, schema);
    debug!(
        "Coerced {} record(s) across {} field(s); applying {} condition(s)",
        typed.len(),
        schema.len(),
        conditions.len()
    );
    Ok(apply_where(typed, &conditions))
}
