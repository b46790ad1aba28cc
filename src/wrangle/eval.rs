//! Expression evaluation against one geometry element.

use std::collections::HashMap;

use glam::{Vec2, Vec3};

use crate::attribute::{standard, AttributeType, ElementClass};
use crate::geometry::GeometryContainer;

use super::parser::{AssignTarget, BinaryOp, Expr, UnaryOp};

/// Runtime value: scalars and 3-vectors, with scalar broadcasting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value {
    Float(f32),
    Vector(Vec3),
}

impl Value {
    fn truthy(self) -> bool {
        match self {
            Value::Float(v) => v != 0.0,
            Value::Vector(v) => v != Vec3::ZERO,
        }
    }

    fn as_float(self) -> Result<f32, String> {
        match self {
            Value::Float(v) => Ok(v),
            Value::Vector(_) => Err("expected a float, found a vector".to_string()),
        }
    }

    fn as_vector(self) -> Vec3 {
        match self {
            Value::Float(v) => Vec3::splat(v),
            Value::Vector(v) => v,
        }
    }
}

fn numeric(op: BinaryOp, a: f32, b: f32) -> f32 {
    match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        BinaryOp::Rem => a.rem_euclid(b),
        BinaryOp::Eq => (a == b) as i32 as f32,
        BinaryOp::Ne => (a != b) as i32 as f32,
        BinaryOp::Lt => (a < b) as i32 as f32,
        BinaryOp::Le => (a <= b) as i32 as f32,
        BinaryOp::Gt => (a > b) as i32 as f32,
        BinaryOp::Ge => (a >= b) as i32 as f32,
        BinaryOp::And => (a != 0.0 && b != 0.0) as i32 as f32,
        BinaryOp::Or => (a != 0.0 || b != 0.0) as i32 as f32,
    }
}

fn binary(op: BinaryOp, a: Value, b: Value) -> Result<Value, String> {
    match (a, b) {
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(numeric(op, a, b))),
        // Vectors broadcast componentwise; comparisons compare lengths.
        (a, b) => {
            let va = a.as_vector();
            let vb = b.as_vector();
            match op {
                BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
                    Ok(Value::Vector(Vec3::new(
                        numeric(op, va.x, vb.x),
                        numeric(op, va.y, vb.y),
                        numeric(op, va.z, vb.z),
                    )))
                }
                _ => Ok(Value::Float(numeric(op, va.length(), vb.length()))),
            }
        }
    }
}

/// Deterministic hash of a float to `[0, 1)`.
fn hash_rand(seed: f32) -> f32 {
    let bits = seed.to_bits().wrapping_mul(0x9E37_79B9);
    let bits = (bits ^ (bits >> 16)).wrapping_mul(0x85EB_CA6B);
    let bits = bits ^ (bits >> 13);
    (bits & 0x00FF_FFFF) as f32 / 0x0100_0000 as f32
}

fn call(name: &str, args: &[Value]) -> Result<Value, String> {
    let arity = |n: usize| {
        if args.len() != n {
            Err(format!("{name}() expects {n} argument(s), got {}", args.len()))
        } else {
            Ok(())
        }
    };
    let unary_float = |f: fn(f32) -> f32| -> Result<Value, String> {
        match args[0] {
            Value::Float(v) => Ok(Value::Float(f(v))),
            Value::Vector(v) => Ok(Value::Vector(Vec3::new(f(v.x), f(v.y), f(v.z)))),
        }
    };

    match name {
        "sin" => {
            arity(1)?;
            unary_float(f32::sin)
        }
        "cos" => {
            arity(1)?;
            unary_float(f32::cos)
        }
        "tan" => {
            arity(1)?;
            unary_float(f32::tan)
        }
        "sqrt" => {
            arity(1)?;
            unary_float(f32::sqrt)
        }
        "abs" => {
            arity(1)?;
            unary_float(f32::abs)
        }
        "floor" => {
            arity(1)?;
            unary_float(f32::floor)
        }
        "ceil" => {
            arity(1)?;
            unary_float(f32::ceil)
        }
        "pow" => {
            arity(2)?;
            Ok(Value::Float(args[0].as_float()?.powf(args[1].as_float()?)))
        }
        "min" => {
            arity(2)?;
            Ok(Value::Float(args[0].as_float()?.min(args[1].as_float()?)))
        }
        "max" => {
            arity(2)?;
            Ok(Value::Float(args[0].as_float()?.max(args[1].as_float()?)))
        }
        "clamp" => {
            arity(3)?;
            Ok(Value::Float(args[0].as_float()?.clamp(
                args[1].as_float()?,
                args[2].as_float()?,
            )))
        }
        "lerp" => {
            arity(3)?;
            let t = args[2].as_float()?;
            match (args[0], args[1]) {
                (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a + (b - a) * t)),
                (a, b) => Ok(Value::Vector(a.as_vector().lerp(b.as_vector(), t))),
            }
        }
        "length" => {
            arity(1)?;
            Ok(Value::Float(args[0].as_vector().length()))
        }
        "normalize" => {
            arity(1)?;
            Ok(Value::Vector(
                args[0].as_vector().try_normalize().unwrap_or(Vec3::ZERO),
            ))
        }
        "dot" => {
            arity(2)?;
            Ok(Value::Float(args[0].as_vector().dot(args[1].as_vector())))
        }
        "cross" => {
            arity(2)?;
            Ok(Value::Vector(args[0].as_vector().cross(args[1].as_vector())))
        }
        "set" => {
            arity(3)?;
            Ok(Value::Vector(Vec3::new(
                args[0].as_float()?,
                args[1].as_float()?,
                args[2].as_float()?,
            )))
        }
        "rand" => {
            arity(1)?;
            Ok(Value::Float(hash_rand(args[0].as_float()?)))
        }
        other => Err(format!("unknown function '{other}'")),
    }
}

/// Position anchor used when `@P` is read from a non-point class.
fn element_position(geo: &GeometryContainer, class: ElementClass, element: usize) -> Vec3 {
    let Some(positions) = geo.positions() else {
        return Vec3::ZERO;
    };
    match class {
        ElementClass::Point => *positions.get(element),
        ElementClass::Vertex => *positions.get(geo.topology().vertex_point(element) as usize),
        ElementClass::Primitive => {
            let corners: Vec<Vec3> = geo
                .topology()
                .primitive_points(element)
                .map(|p| *positions.get(p as usize))
                .collect();
            if corners.is_empty() {
                Vec3::ZERO
            } else {
                corners.iter().sum::<Vec3>() / corners.len() as f32
            }
        }
        ElementClass::Detail => Vec3::ZERO,
    }
}

fn read_attribute(
    geo: &GeometryContainer,
    class: ElementClass,
    element: usize,
    name: &str,
) -> Result<Value, String> {
    // Built-in variables first.
    match name {
        "ptnum" | "elemnum" | "primnum" | "vtxnum" => return Ok(Value::Float(element as f32)),
        "numpt" => return Ok(Value::Float(geo.point_count() as f32)),
        "numprim" => return Ok(Value::Float(geo.primitive_count() as f32)),
        "numvtx" => return Ok(Value::Float(geo.vertex_count() as f32)),
        "time" | "frame" => {
            let value = geo
                .detail_attributes()
                .get_typed::<f32>(name)
                .map(|s| *s.get(0))
                .unwrap_or(0.0);
            return Ok(Value::Float(value));
        }
        _ => {}
    }

    let set = geo.attributes(class);
    if let Some(storage) = set.get_typed::<f32>(name) {
        return Ok(Value::Float(*storage.get(element)));
    }
    if let Some(storage) = set.get_typed::<i32>(name) {
        return Ok(Value::Float(*storage.get(element) as f32));
    }
    if let Some(storage) = set.get_typed::<Vec3>(name) {
        return Ok(Value::Vector(*storage.get(element)));
    }
    if let Some(storage) = set.get_typed::<Vec2>(name) {
        let v = *storage.get(element);
        return Ok(Value::Vector(Vec3::new(v.x, v.y, 0.0)));
    }
    // `@P` works from any class; non-point elements read their anchor
    // position.
    if name == standard::P {
        return Ok(Value::Vector(element_position(geo, class, element)));
    }
    Err(format!("unknown attribute '@{name}'"))
}

pub fn evaluate(
    geo: &GeometryContainer,
    class: ElementClass,
    element: usize,
    expr: &Expr,
    channels: &HashMap<String, f32>,
) -> Result<Value, String> {
    match expr {
        Expr::Number(value) => Ok(Value::Float(*value)),
        Expr::Attribute(name) => read_attribute(geo, class, element, name),
        Expr::Component(inner, component) => {
            let value = evaluate(geo, class, element, inner, channels)?;
            Ok(Value::Float(value.as_vector()[*component]))
        }
        Expr::Channel(name) => Ok(Value::Float(*channels.get(name).unwrap_or(&0.0))),
        Expr::Call(name, args) => {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(evaluate(geo, class, element, arg, channels)?);
            }
            call(name, &values)
        }
        Expr::Unary(op, inner) => {
            let value = evaluate(geo, class, element, inner, channels)?;
            Ok(match op {
                UnaryOp::Neg => match value {
                    Value::Float(v) => Value::Float(-v),
                    Value::Vector(v) => Value::Vector(-v),
                },
                UnaryOp::Not => Value::Float((!value.truthy()) as i32 as f32),
            })
        }
        Expr::Binary(op, a, b) => {
            let a = evaluate(geo, class, element, a, channels)?;
            let b = evaluate(geo, class, element, b, channels)?;
            binary(*op, a, b)
        }
    }
}

/// Write a value to the target attribute, creating it on first use.
pub fn write_attribute(
    geo: &mut GeometryContainer,
    class: ElementClass,
    element: usize,
    target: &AssignTarget,
    value: Value,
) -> Result<(), String> {
    let name = target.name.as_str();
    let set = geo.attributes_mut(class);

    // Create a missing target: component writes and vector values make a
    // Vec3f channel, plain float values a Float channel.
    if !set.has(name) {
        let attribute_type = match (&target.component, value) {
            (Some(_), _) | (None, Value::Vector(_)) => AttributeType::Vec3f,
            (None, Value::Float(_)) => AttributeType::Float,
        };
        set.add(name, attribute_type, Default::default());
    }

    if let Some(component) = target.component {
        let Some(storage) = set.get_typed_mut::<Vec3>(name) else {
            return Err(format!(
                "cannot assign a component of non-vector attribute '@{name}'"
            ));
        };
        let mut current = *storage.get(element);
        current[component] = value.as_float()?;
        storage.set(element, current);
        return Ok(());
    }

    match value {
        Value::Float(v) => {
            if let Some(storage) = set.get_typed_mut::<f32>(name) {
                storage.set(element, v);
            } else if let Some(storage) = set.get_typed_mut::<i32>(name) {
                storage.set(element, v.round() as i32);
            } else if let Some(storage) = set.get_typed_mut::<Vec3>(name) {
                storage.set(element, Vec3::splat(v));
            } else {
                return Err(format!("cannot assign a float to attribute '@{name}'"));
            }
        }
        Value::Vector(v) => {
            if let Some(storage) = set.get_typed_mut::<Vec3>(name) {
                storage.set(element, v);
            } else if let Some(storage) = set.get_typed_mut::<Vec2>(name) {
                storage.set(element, Vec2::new(v.x, v.y));
            } else {
                return Err(format!("cannot assign a vector to attribute '@{name}'"));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rand_is_pure() {
        assert_eq!(hash_rand(42.0), hash_rand(42.0));
        assert!(hash_rand(1.0) >= 0.0 && hash_rand(1.0) < 1.0);
    }
}
