use log::debug;
use serde_json::{Map, Value as JsonValue};

use crate::{
    error::SiftError,
    value::{ScalarValue, json_kind},
};

/// One loosely structured record: display names mapped to scalar values, in
/// the order the keys appeared in the source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    entries: Vec<(String, ScalarValue)>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_object(object: &Map<String, JsonValue>) -> Self {
        let entries = object
            .iter()
            .map(|(key, value)| (key.clone(), ScalarValue::from_json(value)))
            .collect();
        Self { entries }
    }

    /// Builder used by callers assembling records by hand. A repeated key
    /// replaces the earlier value in place.
    pub fn with(mut self, display: impl Into<String>, value: impl Into<ScalarValue>) -> Self {
        self.insert(display, value);
        self
    }

    pub fn insert(&mut self, display: impl Into<String>, value: impl Into<ScalarValue>) {
        let display = display.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(key, _)| *key == display) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((display, value)),
        }
    }

    pub fn get(&self, display: &str) -> Option<&ScalarValue> {
        self.entries
            .iter()
            .find(|(key, _)| key == display)
            .map(|(_, value)| value)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &ScalarValue)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Ordered collection of raw records. Order is preserved through coercion and
/// filtering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordCollection {
    records: Vec<RawRecord>,
}

impl RecordCollection {
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self { records }
    }

    /// Decodes a JSON array of records. Entries that are not objects become
    /// empty records so positions stay aligned with the source.
    pub fn from_json(value: &JsonValue) -> Result<Self, SiftError> {
        let JsonValue::Array(items) = value else {
            return Err(SiftError::NotACollection {
                found: json_kind(value),
            });
        };
        let mut skipped = 0usize;
        let records = items
            .iter()
            .map(|item| match item {
                JsonValue::Object(object) => RawRecord::from_json_object(object),
                _ => {
                    skipped += 1;
                    RawRecord::default()
                }
            })
            .collect();
        if skipped > 0 {
            debug!("{skipped} non-object entr(ies) treated as empty records");
        }
        Ok(Self { records })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RawRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }
}

impl FromIterator<RawRecord> for RecordCollection {
    fn from_iter<I: IntoIterator<Item = RawRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a RecordCollection {
    type Item = &'a RawRecord;
    type IntoIter = std::slice::Iter<'a, RawRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
