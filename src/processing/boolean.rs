//! Boolean operation preconditions and kernel dispatch.
//!
//! Booleans require both operands to be closed two-manifold surfaces;
//! the checks here enforce that before any kernel runs. The kernel
//! itself is a delegated algorithm this build does not carry, so
//! [`compute`] reports an algorithm failure after validating its inputs.

use crate::error::{CookError, CookResult};
use crate::geometry::GeometryContainer;
use crate::processing::adjacency;

/// Boolean set operation between two solids.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BooleanOp {
    Union,
    Intersection,
    Difference,
    SymmetricDifference,
}

impl BooleanOp {
    pub fn from_index(index: i32) -> Self {
        match index {
            0 => BooleanOp::Union,
            1 => BooleanOp::Intersection,
            2 => BooleanOp::Difference,
            _ => BooleanOp::SymmetricDifference,
        }
    }
}

/// Verify a mesh is a closed two-manifold: every edge used by exactly two
/// primitives, once in each direction.
pub fn check_closed_manifold(geo: &GeometryContainer, label: &str) -> CookResult<()> {
    if geo.primitive_count() == 0 {
        return Err(CookError::input_invalid(format!(
            "{label} input has no primitives"
        )));
    }
    for (edge, count) in adjacency::edge_use_counts(geo) {
        if count != 2 {
            return Err(CookError::input_invalid(format!(
                "{label} input is not a closed manifold (edge {}-{} used {} time(s))",
                edge.0, edge.1, count
            )));
        }
    }
    Ok(())
}

/// Run the boolean kernel. Inputs are validated here; the kernel itself
/// is delegated and not present in this build.
pub fn compute(
    a: &GeometryContainer,
    b: &GeometryContainer,
    op: BooleanOp,
) -> CookResult<GeometryContainer> {
    check_closed_manifold(a, "first")?;
    check_closed_manifold(b, "second")?;
    Err(CookError::algorithm_failure(format!(
        "boolean kernel ({op:?}) is not implemented"
    )))
}
