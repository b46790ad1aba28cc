//! Geometry file interchange.

pub mod obj;
