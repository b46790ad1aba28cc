//! The attribute-expression dialect behind the Wrangle operator.
//!
//! A program is a sequence of assignments executed once per selected
//! element:
//!
//! ```text
//! @Cd = set(1.0, 0.0, 0.0);
//! @P.y = @P.y + 0.1 * sin(@P.x * 6.2831) * ch("strength");
//! ```
//!
//! - `@name` reads/writes the attribute `name` on the element being
//!   processed (`.x`/`.y`/`.z` select a component). Missing write
//!   targets are created on first assignment, Float or Vec3f depending
//!   on the value.
//! - Built-in variables: `@ptnum` (element index), `@numpt` (element
//!   count), `@time` / `@frame` (detail attributes when present, else 0).
//! - `ch("name")` reads a Float parameter channel from the node.
//! - Arithmetic, comparison and logical operators plus a small function
//!   library (`sin`, `cos`, `tan`, `sqrt`, `abs`, `floor`, `ceil`,
//!   `pow`, `min`, `max`, `clamp`, `lerp`, `length`, `normalize`,
//!   `dot`, `cross`, `set`, `rand`). Comparisons yield 0/1 floats;
//!   scalars broadcast over vectors.
//!
//! Determinism: the same geometry, expression and channel values always
//! produce the same result (`rand` is a pure hash of its argument).

mod eval;
mod lexer;
mod parser;

use std::collections::HashMap;

use crate::attribute::ElementClass;
use crate::geometry::GeometryContainer;

pub use eval::Value;
pub use parser::{Expr, Program, Statement};

/// Parse a whole program (semicolon/newline separated assignments).
pub fn parse(source: &str) -> Result<Program, String> {
    parser::parse_program(source)
}

/// Parse a single expression (the Group operator's predicate form).
pub fn parse_expression(source: &str) -> Result<Expr, String> {
    parser::parse_single_expression(source)
}

/// Run a program over the selected elements of `class`.
pub fn run(
    geo: &mut GeometryContainer,
    class: ElementClass,
    selected: &[usize],
    program: &Program,
    channels: &HashMap<String, f32>,
) -> Result<(), String> {
    for &element in selected {
        for statement in &program.statements {
            let value = eval::evaluate(geo, class, element, &statement.value, channels)?;
            eval::write_attribute(geo, class, element, &statement.target, value)?;
        }
    }
    Ok(())
}

/// Evaluate an expression for one element and coerce the result to a
/// float (vectors yield their length).
pub fn eval_predicate(
    geo: &GeometryContainer,
    class: ElementClass,
    element: usize,
    expr: &Expr,
    channels: &HashMap<String, f32>,
) -> Result<f32, String> {
    Ok(match eval::evaluate(geo, class, element, expr, channels)? {
        Value::Float(v) => v,
        Value::Vector(v) => v.length(),
    })
}
