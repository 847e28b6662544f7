use thiserror::Error;

use crate::{filter::ComparisonOperator, schema::FieldType};

/// Broad category of a [`SiftError`], used by callers to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The dataset itself is unusable; not something the requester can fix.
    Structural,
    /// The request was rejected and can be corrected by the requester.
    Validation,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SiftError {
    #[error("Expected a collection of records but found {found}")]
    NotACollection { found: &'static str },
    #[error("Where clause must contain at least one condition")]
    EmptyWhere,
    #[error("Where clause must be an object mapping field names to conditions, found {found}")]
    MalformedWhere { found: &'static str },
    #[error("Condition for field '{field}' is malformed: {reason}")]
    MalformedCondition { field: String, reason: String },
    #[error("Field '{field}' does not exist in the schema. Available fields: {available}")]
    UnknownField { field: String, available: String },
    #[error("Operator '{operator}' requires a numeric field but '{field}' is {field_type}")]
    NonNumericField {
        field: String,
        operator: ComparisonOperator,
        field_type: FieldType,
    },
    #[error("Operator '{operator}' on field '{field}' requires a numeric operand")]
    NonNumericOperand {
        field: String,
        operator: ComparisonOperator,
    },
    #[error("Operator 'eq' on field '{field}' requires a scalar operand, found {found}")]
    NonScalarOperand { field: String, found: &'static str },
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),
}

impl SiftError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SiftError::NotACollection { .. } => ErrorKind::Structural,
            _ => ErrorKind::Validation,
        }
    }
}

pub type SiftResult<T> = Result<T, SiftError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_collection_errors_are_structural() {
        assert_eq!(
            SiftError::NotACollection { found: "null" }.kind(),
            ErrorKind::Structural
        );
        assert_eq!(SiftError::EmptyWhere.kind(), ErrorKind::Validation);
    }

    #[test]
    fn messages_name_the_offending_field() {
        let err = SiftError::NonNumericField {
            field: "color".to_string(),
            operator: ComparisonOperator::Gt,
            field_type: FieldType::Option,
        };
        assert_eq!(
            err.to_string(),
            "Operator 'gt' requires a numeric field but 'color' is OPTION"
        );
    }
}
