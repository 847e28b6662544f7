use std::{fmt, str::FromStr};

use anyhow::{Result, anyhow, bail};
use itertools::Itertools;
use log::debug;
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

use crate::{
    coerce::TypedRecord,
    error::{SiftError, SiftResult},
    schema::Schema,
    value::{
        ScalarValue, TypedValue, date_from_epoch_millis, json_kind, normalize_token,
        parse_date_time,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOperator {
    Eq,
    Gt,
    Lt,
}

impl ComparisonOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOperator::Eq => "eq",
            ComparisonOperator::Gt => "gt",
            ComparisonOperator::Lt => "lt",
        }
    }

    pub fn requires_numeric(&self) -> bool {
        matches!(self, ComparisonOperator::Gt | ComparisonOperator::Lt)
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ComparisonOperator {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "eq" | "=" => Ok(ComparisonOperator::Eq),
            "gt" | ">" => Ok(ComparisonOperator::Gt),
            "lt" | "<" => Ok(ComparisonOperator::Lt),
            other => Err(anyhow!("Unknown comparison operator '{other}'")),
        }
    }
}

/// A condition exactly as decoded from a request, e.g. `{"gt": 18}`. The
/// operand is kept undecoded until it is checked against the schema.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionRequest {
    Eq(JsonValue),
    Gt(JsonValue),
    Lt(JsonValue),
}

impl ConditionRequest {
    pub fn operator(&self) -> ComparisonOperator {
        match self {
            ConditionRequest::Eq(_) => ComparisonOperator::Eq,
            ConditionRequest::Gt(_) => ComparisonOperator::Gt,
            ConditionRequest::Lt(_) => ComparisonOperator::Lt,
        }
    }

    pub fn operand(&self) -> &JsonValue {
        match self {
            ConditionRequest::Eq(value)
            | ConditionRequest::Gt(value)
            | ConditionRequest::Lt(value) => value,
        }
    }
}

/// A validated condition ready to be evaluated against typed values.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Equals(ScalarValue),
    GreaterThan(f64),
    LessThan(f64),
}

impl Condition {
    pub fn operator(&self) -> ComparisonOperator {
        match self {
            Condition::Equals(_) => ComparisonOperator::Eq,
            Condition::GreaterThan(_) => ComparisonOperator::Gt,
            Condition::LessThan(_) => ComparisonOperator::Lt,
        }
    }

    pub fn matches(&self, value: &TypedValue) -> bool {
        match self {
            Condition::Equals(operand) => equals_operand(value, operand),
            Condition::GreaterThan(threshold) => value.as_f64().is_some_and(|v| v > *threshold),
            Condition::LessThan(threshold) => value.as_f64().is_some_and(|v| v < *threshold),
        }
    }
}

fn equals_operand(value: &TypedValue, operand: &ScalarValue) -> bool {
    match (value, operand) {
        (TypedValue::Null, ScalarValue::Null) => true,
        (TypedValue::Integer(i), ScalarValue::Number(n)) => *i as f64 == *n,
        (TypedValue::Float(f), ScalarValue::Number(n)) => f == n,
        (TypedValue::Boolean(b), ScalarValue::Bool(o)) => b == o,
        (TypedValue::Text(s), ScalarValue::Text(o)) => s == o,
        (TypedValue::Option(s), other) => other
            .stringify()
            .is_some_and(|o| normalize_token(&o) == *s),
        (TypedValue::Date(d), ScalarValue::Text(o)) => parse_date_time(o) == Some(*d),
        (TypedValue::Date(d), ScalarValue::Number(ms)) => date_from_epoch_millis(*ms) == Some(*d),
        _ => false,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldCondition {
    pub field: String,
    pub condition: Condition,
}

/// Ordered field conditions of a query request, combined with AND.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WhereClause {
    requests: Vec<(String, ConditionRequest)>,
}

impl WhereClause {
    /// Decodes `{"field": {"eq"|"gt"|"lt": operand}, ...}`. Only the shape is
    /// checked here; field names and operands are checked by [`Self::resolve`].
    pub fn parse(value: &JsonValue) -> SiftResult<Self> {
        let JsonValue::Object(map) = value else {
            return Err(SiftError::MalformedWhere {
                found: json_kind(value),
            });
        };
        if map.is_empty() {
            return Err(SiftError::EmptyWhere);
        }
        let requests = map
            .iter()
            .map(|(field, raw)| {
                serde_json::from_value::<ConditionRequest>(raw.clone())
                    .map(|request| (field.clone(), request))
                    .map_err(|err| SiftError::MalformedCondition {
                        field: field.clone(),
                        reason: err.to_string(),
                    })
            })
            .collect::<SiftResult<Vec<_>>>()?;
        Ok(Self { requests })
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Checks every condition against `schema`: field existence and operator
    /// compatibility first, then numeric operands for `gt`/`lt`, then scalar
    /// operands for `eq`.
    pub fn resolve(&self, schema: &Schema) -> SiftResult<Vec<FieldCondition>> {
        if self.is_empty() {
            return Err(SiftError::EmptyWhere);
        }
        for (field, request) in &self.requests {
            let Some(descriptor) = schema.field(field) else {
                return Err(SiftError::UnknownField {
                    field: field.clone(),
                    available: schema.iter().map(|f| f.name.as_str()).join(", "),
                });
            };
            let operator = request.operator();
            if operator.requires_numeric() && !descriptor.field_type.is_numeric() {
                return Err(SiftError::NonNumericField {
                    field: field.clone(),
                    operator,
                    field_type: descriptor.field_type,
                });
            }
        }
        for (field, request) in &self.requests {
            if request.operator().requires_numeric() {
                numeric_operand(field, request)?;
            }
        }
        self.requests
            .iter()
            .map(|(field, request)| {
                let condition = match request {
                    ConditionRequest::Eq(operand) => {
                        if matches!(operand, JsonValue::Array(_) | JsonValue::Object(_)) {
                            return Err(SiftError::NonScalarOperand {
                                field: field.clone(),
                                found: json_kind(operand),
                            });
                        }
                        Condition::Equals(ScalarValue::from_json(operand))
                    }
                    ConditionRequest::Gt(_) => Condition::GreaterThan(numeric_operand(field, request)?),
                    ConditionRequest::Lt(_) => Condition::LessThan(numeric_operand(field, request)?),
                };
                Ok(FieldCondition {
                    field: field.clone(),
                    condition,
                })
            })
            .collect()
    }
}

fn numeric_operand(field: &str, request: &ConditionRequest) -> SiftResult<f64> {
    request
        .operand()
        .as_f64()
        .ok_or_else(|| SiftError::NonNumericOperand {
            field: field.to_string(),
            operator: request.operator(),
        })
}

/// Keeps the records whose `field` satisfies `condition`, preserving order.
pub fn filter(mut records: Vec<TypedRecord>, field: &str, condition: &Condition) -> Vec<TypedRecord> {
    records.retain(|record| {
        record
            .get(field)
            .is_some_and(|value| condition.matches(value))
    });
    records
}

/// Applies each condition in turn, narrowing the previous result.
pub fn apply_where(records: Vec<TypedRecord>, conditions: &[FieldCondition]) -> Vec<TypedRecord> {
    conditions.iter().fold(records, |remaining, condition| {
        let before = remaining.len();
        let narrowed = filter(remaining, &condition.field, &condition.condition);
        debug!(
            "Condition {} {} kept {} of {} record(s)",
            condition.field,
            condition.condition.operator(),
            narrowed.len(),
            before
        );
        narrowed
    })
}

/// Parses shorthand expressions such as `age>18` or `status = "shipped"` into
/// a where clause object.
pub fn parse_filter_expressions(filters: &[String]) -> Result<Map<String, JsonValue>> {
    let mut clause = Map::new();
    for filter in filters {
        let (field, operator, operand) = parse_filter(filter)?;
        if clause.contains_key(&field) {
            bail!("Field '{field}' has more than one filter; combine them into one condition");
        }
        let mut condition = Map::new();
        condition.insert(operator.as_str().to_string(), operand);
        clause.insert(field, JsonValue::Object(condition));
    }
    Ok(clause)
}

fn parse_filter(filter: &str) -> Result<(String, ComparisonOperator, JsonValue)> {
    let trimmed = filter.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("Empty filter expression"));
    }
    // The first operator character ends the field name; the operand may contain any text.
    let Some(idx) = trimmed.find(['=', '>', '<', '!']) else {
        bail!("Failed to parse filter expression '{trimmed}'");
    };
    let rest = &trimmed[idx..];
    let token = match rest.get(..2) {
        Some(pair @ ("!=" | ">=" | "<=")) => pair,
        _ => &rest[..1],
    };
    if token.len() == 2 {
        bail!("Operator '{token}' is not supported in '{trimmed}'; use =, > or <");
    }
    let operator = ComparisonOperator::from_str(token)?;
    let left = trimmed[..idx].trim();
    let right = rest[token.len()..].trim();
    if left.is_empty() {
        bail!("Filter expression '{trimmed}' is missing a field name");
    }
    Ok((left.to_string(), operator, operand_from_text(right)))
}

/// Quoted text stays a string; bare `null`, booleans, and numbers become JSON
/// scalars; anything else is a string.
fn operand_from_text(value: &str) -> JsonValue {
    if let Some(inner) = unquote(value) {
        return JsonValue::String(inner.to_string());
    }
    match serde_json::from_str::<JsonValue>(value) {
        Ok(parsed @ (JsonValue::Null | JsonValue::Bool(_) | JsonValue::Number(_))) => parsed,
        _ => JsonValue::String(value.to_string()),
    }
}

fn unquote(value: &str) -> Option<&str> {
    if value.len() >= 2 {
        let bytes = value.as_bytes();
        if (bytes[0] == b'"' && bytes[value.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[value.len() - 1] == b'\'')
        {
            return Some(&value[1..value.len() - 1]);
        }
    }
    None
}
