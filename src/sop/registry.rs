//! The closed set of node types and the operator factory table.
//!
//! Serialized graphs identify nodes by these names; `Grid` is written as
//! `"Plane"` for backward compatibility with older graph files.

use crate::ops;

use super::Operator;

/// Every operator type the engine knows. A closed set: serialization
/// rejects anything else with an unknown-node-type error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeType {
    Sphere,
    Box,
    Cylinder,
    Grid,
    Torus,
    Line,
    File,
    Export,
    Extrude,
    PolyExtrude,
    Smooth,
    Subdivide,
    Transform,
    Array,
    Mirror,
    Resample,
    NoiseDisplacement,
    Boolean,
    Scatter,
    ScatterVolume,
    CopyToPoints,
    Merge,
    Switch,
    Null,
    Cache,
    Time,
    Output,
    UvUnwrap,
    Wrangle,
    AttributeCreate,
    AttributeDelete,
    Color,
    Normal,
    Group,
    GroupDelete,
    GroupPromote,
    GroupCombine,
    GroupExpand,
    GroupTransfer,
    Blast,
    Delete,
    Sort,
    Bend,
    Twist,
    Lattice,
    Bevel,
    Remesh,
    Align,
    Split,
    Parameterize,
    Geodesic,
    Curvature,
    RepairMesh,
    Decimate,
    Fuse,
}

impl NodeType {
    /// All node types, in serialization-table order.
    pub const ALL: &'static [NodeType] = &[
        NodeType::Sphere,
        NodeType::Box,
        NodeType::Cylinder,
        NodeType::Grid,
        NodeType::Torus,
        NodeType::Line,
        NodeType::File,
        NodeType::Export,
        NodeType::Extrude,
        NodeType::PolyExtrude,
        NodeType::Smooth,
        NodeType::Subdivide,
        NodeType::Transform,
        NodeType::Array,
        NodeType::Mirror,
        NodeType::Resample,
        NodeType::NoiseDisplacement,
        NodeType::Boolean,
        NodeType::Scatter,
        NodeType::ScatterVolume,
        NodeType::CopyToPoints,
        NodeType::Merge,
        NodeType::Switch,
        NodeType::Null,
        NodeType::Cache,
        NodeType::Time,
        NodeType::Output,
        NodeType::UvUnwrap,
        NodeType::Wrangle,
        NodeType::AttributeCreate,
        NodeType::AttributeDelete,
        NodeType::Color,
        NodeType::Normal,
        NodeType::Group,
        NodeType::GroupDelete,
        NodeType::GroupPromote,
        NodeType::GroupCombine,
        NodeType::GroupExpand,
        NodeType::GroupTransfer,
        NodeType::Blast,
        NodeType::Delete,
        NodeType::Sort,
        NodeType::Bend,
        NodeType::Twist,
        NodeType::Lattice,
        NodeType::Bevel,
        NodeType::Remesh,
        NodeType::Align,
        NodeType::Split,
        NodeType::Parameterize,
        NodeType::Geodesic,
        NodeType::Curvature,
        NodeType::RepairMesh,
        NodeType::Decimate,
        NodeType::Fuse,
    ];

    /// Serialized type name. `Grid` serializes as `"Plane"`.
    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Sphere => "Sphere",
            NodeType::Box => "Box",
            NodeType::Cylinder => "Cylinder",
            NodeType::Grid => "Plane",
            NodeType::Torus => "Torus",
            NodeType::Line => "Line",
            NodeType::File => "File",
            NodeType::Export => "Export",
            NodeType::Extrude => "Extrude",
            NodeType::PolyExtrude => "PolyExtrude",
            NodeType::Smooth => "Smooth",
            NodeType::Subdivide => "Subdivide",
            NodeType::Transform => "Transform",
            NodeType::Array => "Array",
            NodeType::Mirror => "Mirror",
            NodeType::Resample => "Resample",
            NodeType::NoiseDisplacement => "NoiseDisplacement",
            NodeType::Boolean => "Boolean",
            NodeType::Scatter => "Scatter",
            NodeType::ScatterVolume => "ScatterVolume",
            NodeType::CopyToPoints => "CopyToPoints",
            NodeType::Merge => "Merge",
            NodeType::Switch => "Switch",
            NodeType::Null => "Null",
            NodeType::Cache => "Cache",
            NodeType::Time => "Time",
            NodeType::Output => "Output",
            NodeType::UvUnwrap => "UVUnwrap",
            NodeType::Wrangle => "Wrangle",
            NodeType::AttributeCreate => "AttributeCreate",
            NodeType::AttributeDelete => "AttributeDelete",
            NodeType::Color => "Color",
            NodeType::Normal => "Normal",
            NodeType::Group => "Group",
            NodeType::GroupDelete => "GroupDelete",
            NodeType::GroupPromote => "GroupPromote",
            NodeType::GroupCombine => "GroupCombine",
            NodeType::GroupExpand => "GroupExpand",
            NodeType::GroupTransfer => "GroupTransfer",
            NodeType::Blast => "Blast",
            NodeType::Delete => "Delete",
            NodeType::Sort => "Sort",
            NodeType::Bend => "Bend",
            NodeType::Twist => "Twist",
            NodeType::Lattice => "Lattice",
            NodeType::Bevel => "Bevel",
            NodeType::Remesh => "Remesh",
            NodeType::Align => "Align",
            NodeType::Split => "Split",
            NodeType::Parameterize => "Parameterize",
            NodeType::Geodesic => "Geodesic",
            NodeType::Curvature => "Curvature",
            NodeType::RepairMesh => "RepairMesh",
            NodeType::Decimate => "Decimate",
            NodeType::Fuse => "Fuse",
        }
    }

    /// Parse a serialized type name. Accepts `"Grid"` as an alias for the
    /// `"Plane"` spelling.
    pub fn parse(name: &str) -> Option<NodeType> {
        if name == "Grid" {
            return Some(NodeType::Grid);
        }
        NodeType::ALL.iter().copied().find(|t| t.as_str() == name)
    }

    /// Construct the operator implementation for this type.
    pub fn create_operator(self) -> Box<dyn Operator> {
        match self {
            NodeType::Sphere => Box::new(ops::generators::SphereSop),
            NodeType::Box => Box::new(ops::generators::BoxSop),
            NodeType::Cylinder => Box::new(ops::generators::CylinderSop),
            NodeType::Grid => Box::new(ops::generators::GridSop),
            NodeType::Torus => Box::new(ops::generators::TorusSop),
            NodeType::Line => Box::new(ops::generators::LineSop),
            NodeType::Time => Box::new(ops::generators::TimeSop),
            NodeType::File => Box::new(ops::io_ops::FileSop),
            NodeType::Export => Box::new(ops::io_ops::ExportSop),
            NodeType::Extrude => Box::new(ops::modify::ExtrudeSop),
            NodeType::PolyExtrude => Box::new(ops::modify::PolyExtrudeSop),
            NodeType::Smooth => Box::new(ops::modify::SmoothSop),
            NodeType::Subdivide => Box::new(ops::modify::SubdivideSop),
            NodeType::Transform => Box::new(ops::xform::TransformSop),
            NodeType::Array => Box::new(ops::xform::ArraySop),
            NodeType::Mirror => Box::new(ops::xform::MirrorSop),
            NodeType::Resample => Box::new(ops::modify::ResampleSop),
            NodeType::NoiseDisplacement => Box::new(ops::modify::NoiseDisplacementSop),
            NodeType::Boolean => Box::new(ops::combine::BooleanSop),
            NodeType::Scatter => Box::new(ops::scatter::ScatterSop),
            NodeType::ScatterVolume => Box::new(ops::scatter::ScatterVolumeSop),
            NodeType::CopyToPoints => Box::new(ops::combine::CopyToPointsSop),
            NodeType::Merge => Box::new(ops::combine::MergeSop),
            NodeType::Switch => Box::new(ops::combine::SwitchSop),
            NodeType::Null => Box::new(ops::util::NullSop),
            NodeType::Cache => Box::new(ops::util::CacheSop::default()),
            NodeType::Output => Box::new(ops::util::OutputSop),
            NodeType::UvUnwrap => Box::new(ops::analysis::UvUnwrapSop),
            NodeType::Wrangle => Box::new(ops::attributes::WrangleSop),
            NodeType::AttributeCreate => Box::new(ops::attributes::AttributeCreateSop),
            NodeType::AttributeDelete => Box::new(ops::attributes::AttributeDeleteSop),
            NodeType::Color => Box::new(ops::attributes::ColorSop),
            NodeType::Normal => Box::new(ops::modify::NormalSop),
            NodeType::Group => Box::new(ops::groups::GroupSop),
            NodeType::GroupDelete => Box::new(ops::groups::GroupDeleteSop),
            NodeType::GroupPromote => Box::new(ops::groups::GroupPromoteSop),
            NodeType::GroupCombine => Box::new(ops::groups::GroupCombineSop),
            NodeType::GroupExpand => Box::new(ops::groups::GroupExpandSop),
            NodeType::GroupTransfer => Box::new(ops::groups::GroupTransferSop),
            NodeType::Blast => Box::new(ops::select::BlastSop),
            NodeType::Delete => Box::new(ops::select::DeleteSop),
            NodeType::Sort => Box::new(ops::select::SortSop),
            NodeType::Bend => Box::new(ops::xform::BendSop),
            NodeType::Twist => Box::new(ops::xform::TwistSop),
            NodeType::Lattice => Box::new(ops::modify::LatticeSop),
            NodeType::Bevel => Box::new(ops::modify::BevelSop),
            NodeType::Remesh => Box::new(ops::modify::RemeshSop),
            NodeType::Align => Box::new(ops::xform::AlignSop),
            NodeType::Split => Box::new(ops::select::SplitSop),
            NodeType::Parameterize => Box::new(ops::analysis::ParameterizeSop),
            NodeType::Geodesic => Box::new(ops::analysis::GeodesicSop),
            NodeType::Curvature => Box::new(ops::analysis::CurvatureSop),
            NodeType::RepairMesh => Box::new(ops::modify::RepairMeshSop),
            NodeType::Decimate => Box::new(ops::modify::DecimateSop),
            NodeType::Fuse => Box::new(ops::modify::FuseSop),
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
