//! Concrete surface operators, grouped by category.
//!
//! Each operator is a unit (or small) struct implementing
//! [`crate::sop::Operator`]: a parameter schema, an input configuration,
//! and one `execute`. Construction goes through the factory table on
//! [`crate::sop::NodeType`]; nothing here is reachable except through a
//! node.

pub mod analysis;
pub mod attributes;
pub mod combine;
pub mod generators;
pub mod groups;
pub mod io_ops;
pub mod modify;
pub mod scatter;
pub mod select;
pub mod util;
pub mod xform;
