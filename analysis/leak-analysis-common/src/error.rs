// analysis/leak-analysis-common/src/error.rs

use crate::types::ObjectId;

/// Common error type for snapshot navigation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    #[error("Class not found in snapshot: {0}")]
    UnknownClass(String),

    #[error("Field {class}.{field} not found")]
    FieldNotFound { class: String, field: String },

    #[error("Current object is null while {0}")]
    NullObject(String),

    #[error("Expected instance of {expected}, found {actual}")]
    ClassMismatch { expected: String, actual: String },

    #[error("Object {0} not found in snapshot")]
    UnknownObject(ObjectId),
}
