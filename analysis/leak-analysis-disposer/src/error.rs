//! Error types for disposer analysis.

use leak_analysis_common::AnalysisError;
use thiserror::Error;

/// Errors that abort a disposer analysis run.
#[derive(Debug, Error)]
pub enum Error {
    /// The snapshot could not be navigated as the registry layout expects.
    #[error("Snapshot navigation failed: {0}")]
    Navigation(#[from] AnalysisError),

    /// A registry structure that must exist was null.
    #[error("Registry layout assumption violated: {0}")]
    InvariantViolation(String),
}
