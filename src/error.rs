use crate::matrix::Storage;
use thiserror::Error;

// Unified error type for graphmul

#[derive(Error, Debug)]
pub enum GmError {
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),
    #[error("operand storage is unresolved; fix it with set_storage before multiplying")]
    UnresolvedStorage,
    #[error("no multiply kernel for {a} x {b}")]
    UnsupportedCombination { a: Storage, b: Storage },
    #[error("{a} x {b} does not support phased execution")]
    PhasedUnsupported { a: Storage, b: Storage },
    #[error("destination is {found} but this combination produces a {expected} result")]
    DestinationStorage { expected: Storage, found: Storage },
    #[error("stale plan: {0}")]
    StalePlan(&'static str),
    #[error("kernel failure: {0}")]
    Kernel(String),
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
}
