//! Field descriptors, schema construction, and schema persistence.
//!
//! A [`Schema`] is the ordered list of [`FieldDescriptor`]s inferred from a
//! record collection. Field order follows the first time each display name is
//! seen across the collection, and every descriptor carries a lower camel case
//! `name` that keys the typed records produced by coercion.
//!
//! ## Responsibilities
//!
//! - Grouping raw values per display name and invoking the classifier once per field
//! - Deriving unique identifiers, namespacing names that collide after case folding
//! - JSON and YAML persistence so a saved schema can drive later queries
//! - Validating externally supplied schemas before they are used

use std::{
    collections::{HashMap, HashSet},
    fmt,
    fs::File,
    io::BufReader,
    path::Path,
};

use anyhow::{Context, Result};
use heck::ToLowerCamelCase;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
    classify::{InferenceOptions, classify_with},
    error::SiftError,
    records::RecordCollection,
    value::ScalarValue,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldType {
    Text,
    Integer,
    Float,
    Date,
    Boolean,
    Option,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "TEXT",
            FieldType::Integer => "INTEGER",
            FieldType::Float => "FLOAT",
            FieldType::Date => "DATE",
            FieldType::Boolean => "BOOLEAN",
            FieldType::Option => "OPTION",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Integer | FieldType::Float)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field name exactly as it appears in the source records.
    pub display: String,
    /// Identifier used as the key of typed records.
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Observed vocabulary, only populated for [`FieldType::Option`].
    #[serde(default)]
    pub options: Vec<String>,
}

impl FieldDescriptor {
    pub fn new(display: impl Into<String>, name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            display: display.into(),
            name: name.into(),
            field_type,
            options: Vec::new(),
        }
    }

    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    pub fields: Vec<FieldDescriptor>,
}

impl Schema {
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        Self { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldDescriptor> {
        self.fields.iter()
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_by_display(&self, display: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.display == display)
    }

    pub fn names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    /// Checks that names and display names are unique and that options only
    /// appear on OPTION fields.
    pub fn validate(&self) -> Result<(), SiftError> {
        let mut names = HashSet::new();
        let mut displays = HashSet::new();
        for field in &self.fields {
            if field.name.trim().is_empty() {
                return Err(SiftError::InvalidSchema(format!(
                    "Field '{}' has an empty name",
                    field.display
                )));
            }
            if !names.insert(field.name.as_str()) {
                return Err(SiftError::InvalidSchema(format!(
                    "Duplicate field name '{}'",
                    field.name
                )));
            }
            if !displays.insert(field.display.as_str()) {
                return Err(SiftError::InvalidSchema(format!(
                    "Duplicate display name '{}'",
                    field.display
                )));
            }
            if field.field_type != FieldType::Option && !field.options.is_empty() {
                return Err(SiftError::InvalidSchema(format!(
                    "Field '{}' lists options but is {}",
                    field.name, field.field_type
                )));
            }
        }
        Ok(())
    }

    pub fn to_json_string(&self, pretty: bool) -> Result<String> {
        if pretty {
            serde_json::to_string_pretty(self).context("Serializing schema to JSON")
        } else {
            serde_json::to_string(self).context("Serializing schema to JSON")
        }
    }

    /// Writes the schema as YAML for `.yml`/`.yaml` paths and as JSON otherwise.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).with_context(|| format!("Creating schema file {path:?}"))?;
        if is_yaml_path(path) {
            serde_yaml::to_writer(file, self).context("Writing schema YAML")
        } else {
            serde_json::to_writer_pretty(file, self).context("Writing schema JSON")
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening schema file {path:?}"))?;
        let reader = BufReader::new(file);
        let schema: Schema = if is_yaml_path(path) {
            serde_yaml::from_reader(reader).context("Parsing schema YAML")?
        } else {
            serde_json::from_reader(reader).context("Parsing schema JSON")?
        };
        schema
            .validate()
            .with_context(|| format!("Validating schema file {path:?}"))?;
        Ok(schema)
    }
}

impl<'a> IntoIterator for &'a Schema {
    type Item = &'a FieldDescriptor;
    type IntoIter = std::slice::Iter<'a, FieldDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

fn is_yaml_path(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some(ext) if ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml")
    )
}

pub fn build_schema(records: &RecordCollection) -> Schema {
    build_schema_with(records, &InferenceOptions::default())
}

pub fn build_schema_with(records: &RecordCollection, options: &InferenceOptions) -> Schema {
    let mut samples: Vec<(&str, Vec<ScalarValue>)> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for record in records.iter() {
        for (display, value) in record.entries() {
            let idx = *positions.entry(display).or_insert_with(|| {
                samples.push((display, Vec::new()));
                samples.len() - 1
            });
            samples[idx].1.push(value.clone());
        }
    }

    let mut used_names = HashSet::new();
    let fields = samples
        .into_iter()
        .enumerate()
        .map(|(position, (display, values))| {
            let inference = classify_with(&values, options);
            let name = allocate_name(display, position, &mut used_names);
            debug!(
                "Field '{}' -> '{}' inferred as {:?} from {} value(s)",
                display,
                name,
                inference,
                values.len()
            );
            let (field_type, field_options) = inference.into_parts();
            FieldDescriptor::new(display, name, field_type).with_options(field_options)
        })
        .collect();

    Schema { fields }
}

/// Lower camel case of `display`, suffixed with the smallest free number when
/// an earlier field already claimed it.
fn allocate_name(display: &str, position: usize, used: &mut HashSet<String>) -> String {
    let mut base = display.to_lower_camel_case();
    if base.is_empty() {
        base = format!("field{}", position + 1);
    }
    if used.insert(base.clone()) {
        return base;
    }
    let mut suffix = 2usize;
    loop {
        let candidate = format!("{base}{suffix}");
        if used.insert(candidate.clone()) {
            warn!("Field '{display}' normalizes to existing name '{base}'; using '{candidate}'");
            return candidate;
        }
        suffix += 1;
    }
}
