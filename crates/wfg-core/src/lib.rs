pub mod geometry;
pub mod id;
pub mod layout;
pub mod model;
pub mod path;
pub mod viewport;
pub mod workflow;

pub use geometry::{ElementRef, GeometryError, distance, screen_to_canvas, transform_to_element};
pub use id::{NodeId, PortId};
pub use layout::{Arrangement, LayoutConfig, LayoutNode, arrange, arrange_scene};
pub use model::*;
pub use path::{ConnectionPath, CurveDirection, make_path};
pub use viewport::{ViewTransform, ViewportConfig, ViewportError, label_scale};
pub use workflow::{
    MemoryWorkflow, ModelChange, ModelConnection, ModelNode, ModelPort, WorkflowModel,
    build_scene, needs_arrangement,
};

// Re-export geometry types so downstream crates share one kurbo version
pub use kurbo;
pub use petgraph::graph::{EdgeIndex, NodeIndex};
