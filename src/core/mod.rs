//! Algebraic seams of the library: semiring and accumulator traits plus the
//! built-in operator set.

pub mod traits;
pub use traits::{BinaryOp, MatShape, Semiring};
pub mod ops;
pub use ops::{Max, MaxTimes, Min, MinPlus, OrAnd, Plus, PlusTimes, Times};
