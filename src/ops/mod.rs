//! Arithmetic and element-wise transforms.
//!
//! - **arithmetic**: in-place scalar add/subtract/multiply/divide
//! - **elementwise**: copying transforms (log, threshold, power, ...)

pub mod arithmetic;
pub mod elementwise;

pub use arithmetic::{add, apply_scalar, divide, multiply, scalar_copy, subtract, ScalarOp};
pub use elementwise::{
    abs, ceiling, exp, floor, ln, log, log10, log2, map_values, power, round, threshold,
    transform, ElementwiseOp,
};
