//! Error types for the element kernel

use thiserror::Error;

/// How serious a reported condition is for the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The entity keeps working in a degraded or unchanged state
    Warning,
    /// The entity (or the requested operation) cannot be used as is
    Fatal,
}

/// Main error type for kernel operations
#[derive(Error, Debug)]
pub enum FEAError {
    #[error("Node {0} not found")]
    NodeNotFound(usize),

    #[error("Element {0} not found")]
    ElementNotFound(usize),

    #[error("Duplicate tag {0} already exists")]
    DuplicateTag(usize),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Element {element}: nodes carry different DOF counts ({first} and {second})")]
    DofMismatch {
        element: usize,
        first: usize,
        second: usize,
    },

    #[error("Order mismatch: expected {expected} components, got {got}")]
    OrderMismatch { expected: usize, got: usize },

    #[error("Section error: {0}")]
    Section(String),

    #[error("Element {element} ({element_type}) does not accept load '{load}'")]
    UnsupportedLoad {
        element: usize,
        element_type: &'static str,
        load: &'static str,
    },

    #[error("{failed} of {total} members reported a failure during {operation}")]
    AggregateFailure {
        operation: &'static str,
        failed: usize,
        total: usize,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Math error: {0}")]
    MathError(String),

    #[error("Packed state is for '{found}', expected '{expected}'")]
    IncompatiblePack { expected: String, found: String },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl FEAError {
    /// Negative integer identifying the kind of failure
    pub fn code(&self) -> i32 {
        match self {
            FEAError::NodeNotFound(_) => -1,
            FEAError::ElementNotFound(_) => -2,
            FEAError::DuplicateTag(_) => -3,
            FEAError::InvalidGeometry(_) => -10,
            FEAError::DofMismatch { .. } => -11,
            FEAError::OrderMismatch { .. } => -12,
            FEAError::Section(_) => -13,
            FEAError::UnsupportedLoad { .. } => -20,
            FEAError::AggregateFailure { .. } => -31,
            FEAError::InvalidInput(_) => -40,
            FEAError::MathError(_) => -41,
            FEAError::IncompatiblePack { .. } => -50,
            FEAError::SerializationError(_) => -52,
        }
    }

    /// Severity of the condition as seen by the analysis driver
    pub fn severity(&self) -> Severity {
        match self {
            FEAError::UnsupportedLoad { .. }
            | FEAError::AggregateFailure { .. }
            | FEAError::DofMismatch { .. } => Severity::Warning,
            _ => Severity::Fatal,
        }
    }

    /// True for errors raised while binding an element to its nodes
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            FEAError::InvalidGeometry(_)
                | FEAError::DofMismatch { .. }
                | FEAError::Section(_)
                | FEAError::NodeNotFound(_)
        )
    }
}

/// Result type for kernel operations
pub type FEAResult<T> = Result<T, FEAError>;

/// Fold the outcome of a broadcast into a single result.
///
/// Every member is visited by the caller before this is evaluated; the
/// result only says whether at least one of them failed.
pub(crate) fn broadcast_result(operation: &'static str, failed: usize, total: usize) -> FEAResult<()> {
    if failed == 0 {
        Ok(())
    } else {
        log::error!("{operation}: {failed} of {total} members failed");
        Err(FEAError::AggregateFailure {
            operation,
            failed,
            total,
        })
    }
}
