//! Error types for heap graph construction.

use leak_analysis_common::ObjectId;
use thiserror::Error;

/// Errors raised while loading or indexing a snapshot.
#[derive(Debug, Error)]
pub enum GraphError {
    /// I/O error while reading a snapshot file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed snapshot description.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Two classes or objects share an id. Id `0` is reserved as well.
    #[error("Invalid or duplicate id: {0}")]
    InvalidId(ObjectId),

    /// Ids spread too far apart for an id-indexed parent list.
    #[error("Snapshot ids are too sparse: largest id {max_id} for {count} nodes")]
    SparseIds { max_id: u64, count: usize },

    /// Two classes share a name.
    #[error("Duplicate class name: {0}")]
    DuplicateClassName(String),

    /// An object or class refers to a class that is not defined.
    #[error("Object {object} refers to unknown class {class}")]
    UnknownClass { object: ObjectId, class: ObjectId },

    /// A builder call referred to an object that was never created.
    #[error("Object not found: {0}")]
    UnknownObject(ObjectId),
}

impl From<serde_json::Error> for GraphError {
    fn from(err: serde_json::Error) -> Self {
        GraphError::Serialization(err.to_string())
    }
}
