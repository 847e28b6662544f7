//! Field type classification from unlabelled value samples.
//!
//! Classification walks a fixed-priority list of rules (boolean, date,
//! numeric, categorical) and stops at the first rule that accepts every
//! non-null value in the sample. Anything left over is TEXT.

use itertools::Itertools;
use log::trace;

use crate::{
    schema::FieldType,
    value::{ScalarValue, normalize_token, parse_boolean_literal, parse_date_time},
};

pub const DEFAULT_MIN_OPTIONS: usize = 2;
pub const DEFAULT_MAX_OPTIONS: usize = 10;

/// Thresholds that decide when distinct categorical values become OPTION.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InferenceOptions {
    pub min_options: usize,
    pub max_options: usize,
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self {
            min_options: DEFAULT_MIN_OPTIONS,
            max_options: DEFAULT_MAX_OPTIONS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inference {
    /// The sample was empty or held only nulls.
    Undetermined,
    Typed(FieldType),
    Options(Vec<String>),
}

impl Inference {
    pub fn into_parts(self) -> (FieldType, Vec<String>) {
        match self {
            Inference::Undetermined => (FieldType::Text, Vec::new()),
            Inference::Typed(field_type) => (field_type, Vec::new()),
            Inference::Options(options) => (FieldType::Option, options),
        }
    }
}

struct Sample<'a> {
    non_null: Vec<&'a ScalarValue>,
    has_null: bool,
}

trait ClassificationRule {
    fn name(&self) -> &'static str;
    fn apply(&self, sample: &Sample<'_>, options: &InferenceOptions) -> Option<Inference>;
}

struct BooleanRule;
struct DateRule;
struct NumericRule;
struct CategoricalRule;

const RULES: &[&dyn ClassificationRule] = &[&BooleanRule, &DateRule, &NumericRule, &CategoricalRule];

impl ClassificationRule for BooleanRule {
    fn name(&self) -> &'static str {
        "boolean"
    }

    // Any null in the sample rules out BOOLEAN.
    fn apply(&self, sample: &Sample<'_>, _options: &InferenceOptions) -> Option<Inference> {
        if sample.has_null {
            return None;
        }
        let all_boolean = sample.non_null.iter().all(|value| match value {
            ScalarValue::Bool(_) => true,
            ScalarValue::Text(s) => parse_boolean_literal(s).is_some(),
            _ => false,
        });
        all_boolean.then_some(Inference::Typed(FieldType::Boolean))
    }
}

impl ClassificationRule for DateRule {
    fn name(&self) -> &'static str {
        "date"
    }

    fn apply(&self, sample: &Sample<'_>, _options: &InferenceOptions) -> Option<Inference> {
        let all_dates = sample.non_null.iter().all(|value| match value {
            ScalarValue::Text(s) => parse_date_time(s).is_some(),
            _ => false,
        });
        all_dates.then_some(Inference::Typed(FieldType::Date))
    }
}

impl ClassificationRule for NumericRule {
    fn name(&self) -> &'static str {
        "numeric"
    }

    fn apply(&self, sample: &Sample<'_>, _options: &InferenceOptions) -> Option<Inference> {
        let numbers = sample
            .non_null
            .iter()
            .map(|value| value.as_number())
            .collect::<Option<Vec<f64>>>()?;
        if numbers.iter().all(|n| n.fract() == 0.0) {
            Some(Inference::Typed(FieldType::Integer))
        } else {
            Some(Inference::Typed(FieldType::Float))
        }
    }
}

impl ClassificationRule for CategoricalRule {
    fn name(&self) -> &'static str {
        "categorical"
    }

    fn apply(&self, sample: &Sample<'_>, options: &InferenceOptions) -> Option<Inference> {
        let distinct: Vec<String> = sample
            .non_null
            .iter()
            .filter_map(|value| value.stringify())
            .map(|s| normalize_token(&s))
            .unique()
            .collect();
        (options.min_options..=options.max_options)
            .contains(&distinct.len())
            .then_some(Inference::Options(distinct))
    }
}

pub fn classify(values: &[ScalarValue]) -> Inference {
    classify_with(values, &InferenceOptions::default())
}

pub fn classify_with(values: &[ScalarValue], options: &InferenceOptions) -> Inference {
    let non_null: Vec<&ScalarValue> = values.iter().filter(|v| !v.is_null()).collect();
    if non_null.is_empty() {
        return Inference::Undetermined;
    }
    let sample = Sample {
        has_null: non_null.len() < values.len(),
        non_null,
    };

    for rule in RULES {
        if let Some(inference) = rule.apply(&sample, options) {
            trace!("Rule '{}' matched: {:?}", rule.name(), inference);
            return inference;
        }
    }
    Inference::Typed(FieldType::Text)
}
