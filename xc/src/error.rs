//! Error taxonomy for functional evaluation.
//!
//! Every variant is fatal for the call that produced it. Nothing in this crate
//! retries; callers decide whether to record a failure and move on.

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum XcError {
    #[error("shape mismatch in {what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("non-finite value in {stage} at point {point}, component {component}")]
    NumericDomain {
        stage: &'static str,
        point: usize,
        component: usize,
    },
    #[error("failed to load parameters for {name} from {}: {reason}", path.display())]
    ModelLoad {
        name: String,
        path: PathBuf,
        reason: String,
    },
    #[error("unknown functional: {0}")]
    UnknownFunctional(String),
    #[error("unknown evaluation mode: {0} (expected spin_resolved or libxc)")]
    UnknownMode(String),
    #[error("evaluation mode {mode} does not match {input} input")]
    ModeMismatch {
        mode: &'static str,
        input: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, XcError>;
