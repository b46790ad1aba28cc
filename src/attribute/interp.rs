//! Attribute value interpolation.
//!
//! Operators that synthesize elements from existing ones (subdivision,
//! resampling, scattering, copy-to-points) consult the attribute's
//! interpolation mode when blending source values into the new element.

use super::storage::AttributeElement;
use super::InterpolationMode;

/// Blend two values by `t` in `[0, 1]` honoring `mode`.
pub fn interpolate<T: AttributeElement>(a: &T, b: &T, t: f32, mode: InterpolationMode) -> T {
    match mode {
        InterpolationMode::Linear | InterpolationMode::Weighted => T::lerp(a, b, t),
        // Hermite smoothing of the parameter keeps endpoints exact.
        InterpolationMode::Cubic => T::lerp(a, b, t * t * (3.0 - 2.0 * t)),
        InterpolationMode::Constant => {
            if t < 0.5 { a.clone() } else { b.clone() }
        }
    }
}

/// Barycentric blend over a triangle's corner values; `u` and `v` are the
/// weights of the second and third corners (`u + v <= 1`).
pub fn interpolate_barycentric<T: AttributeElement>(v0: &T, v1: &T, v2: &T, u: f32, v: f32) -> T {
    T::weighted(&[(v0, 1.0 - u - v), (v1, u), (v2, v)])
}

/// Bilinear blend over quad corner values at parametric `(u, v)`.
pub fn interpolate_bilinear<T: AttributeElement>(
    v00: &T,
    v10: &T,
    v01: &T,
    v11: &T,
    u: f32,
    v: f32,
) -> T {
    T::weighted(&[
        (v00, (1.0 - u) * (1.0 - v)),
        (v10, u * (1.0 - v)),
        (v01, (1.0 - u) * v),
        (v11, u * v),
    ])
}
