//! Converts raw records into typed records according to a schema.
//!
//! Coercion never fails: a value that cannot be read as its field's type
//! becomes null for that field in that record and nothing else is affected.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer, ser::SerializeMap};

use crate::{
    records::{RawRecord, RecordCollection},
    schema::{FieldDescriptor, FieldType, Schema},
    value::{
        ScalarValue, TypedValue, date_from_epoch_millis, normalize_token, parse_boolean_token,
        parse_date_time,
    },
};

/// A record keyed by field `name`, in schema order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypedRecord {
    values: Vec<(String, TypedValue)>,
}

impl TypedRecord {
    pub fn get(&self, name: &str) -> Option<&TypedValue> {
        self.values
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TypedValue)> {
        self.values.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, TypedValue)> for TypedRecord {
    fn from_iter<I: IntoIterator<Item = (String, TypedValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl Serialize for TypedRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (key, value) in &self.values {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

pub fn coerce(records: &RecordCollection, schema: &Schema) -> Vec<TypedRecord> {
    records
        .iter()
        .map(|record| coerce_record(record, schema))
        .collect()
}

pub fn coerce_record(record: &RawRecord, schema: &Schema) -> TypedRecord {
    schema
        .iter()
        .map(|field| {
            let value = match record.get(&field.display) {
                Some(raw) => coerce_value(raw, field),
                None => TypedValue::Null,
            };
            (field.name.clone(), value)
        })
        .collect()
}

pub fn coerce_value(raw: &ScalarValue, field: &FieldDescriptor) -> TypedValue {
    if raw.is_blank() {
        return TypedValue::Null;
    }
    let coerced = match field.field_type {
        FieldType::Text => raw.stringify().map(TypedValue::Text),
        FieldType::Integer => raw.as_number().and_then(truncate_to_i64).map(TypedValue::Integer),
        FieldType::Float => raw.as_number().map(TypedValue::Float),
        FieldType::Date => coerce_date(raw).map(TypedValue::Date),
        FieldType::Boolean => coerce_boolean(raw).map(TypedValue::Boolean),
        FieldType::Option => raw
            .stringify()
            .map(|s| TypedValue::Option(normalize_token(&s))),
    };
    coerced.unwrap_or(TypedValue::Null)
}

fn truncate_to_i64(value: f64) -> Option<i64> {
    let truncated = value.trunc();
    // i64::MAX as f64 rounds up to 2^63, which is already out of range.
    if truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
        return None;
    }
    Some(truncated as i64)
}

fn coerce_date(raw: &ScalarValue) -> Option<DateTime<Utc>> {
    match raw {
        ScalarValue::Number(n) => date_from_epoch_millis(*n),
        ScalarValue::Text(s) => parse_date_time(s),
        _ => None,
    }
}

fn coerce_boolean(raw: &ScalarValue) -> Option<bool> {
    match raw {
        ScalarValue::Bool(b) => Some(*b),
        ScalarValue::Number(n) if *n == 1.0 => Some(true),
        ScalarValue::Number(n) if *n == 0.0 => Some(false),
        ScalarValue::Text(s) => parse_boolean_token(s),
        _ => None,
    }
}
