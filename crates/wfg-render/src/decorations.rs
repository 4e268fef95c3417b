//! Ephemeral display state layered over the scene graph.
//!
//! None of this is model state: it is rebuilt by the editor from the current
//! selection, gesture, and plugin state, and only read by the renderer.

use std::collections::{BTreeSet, HashMap};
use wfg_core::kurbo::Point;
use wfg_core::{ConnectionId, ConnectionPath, EdgeKey, NodeId, NodeKind};

/// Placeholder for a workflow input/output that a port drag would create.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ghost {
    pub kind: NodeKind,
    /// Canvas-space center.
    pub position: Point,
}

/// Floating text box, positioned in canvas space.
#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub text: String,
    pub position: Point,
}

#[derive(Debug, Clone, Default)]
pub struct Decorations {
    pub selected_nodes: BTreeSet<NodeId>,
    pub selected_edges: BTreeSet<EdgeKey>,
    pub highlighted_nodes: BTreeSet<NodeId>,
    pub highlighted_edges: BTreeSet<EdgeKey>,
    pub highlighted_ports: BTreeSet<ConnectionId>,
    /// Dim everything that is neither selected nor highlighted.
    pub fade: bool,

    pub invalid_edges: BTreeSet<EdgeKey>,

    /// Valid targets of the port being dragged.
    pub suggested_ports: BTreeSet<ConnectionId>,
    pub dragging_port: Option<ConnectionId>,
    pub snapped_port: Option<ConnectionId>,
    pub floating_edge: Option<ConnectionPath>,
    pub ghost: Option<Ghost>,

    /// Live curves for edges whose endpoints are being dragged.
    pub edge_paths: HashMap<EdgeKey, ConnectionPath>,
    pub dragging_node: Option<NodeId>,

    pub tooltip: Option<Tooltip>,
    /// Mirrors the edit lock; disables drag affordances in the output.
    pub editing_enabled: bool,
}

impl Decorations {
    pub fn new() -> Self {
        Self {
            editing_enabled: true,
            ..Default::default()
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected_nodes.clear();
        self.selected_edges.clear();
        self.highlighted_nodes.clear();
        self.highlighted_edges.clear();
        self.highlighted_ports.clear();
        self.fade = false;
    }

    /// Drop everything a finished gesture left behind.
    pub fn clear_drag(&mut self) {
        self.suggested_ports.clear();
        self.dragging_port = None;
        self.snapped_port = None;
        self.floating_edge = None;
        self.ghost = None;
        self.edge_paths.clear();
        self.dragging_node = None;
    }

    pub fn has_selection(&self) -> bool {
        !self.selected_nodes.is_empty() || !self.selected_edges.is_empty()
    }

    /// Whether an element should be dimmed.
    pub fn is_faded_node(&self, id: NodeId) -> bool {
        self.fade && !self.selected_nodes.contains(&id) && !self.highlighted_nodes.contains(&id)
    }

    pub fn is_faded_edge(&self, key: &EdgeKey) -> bool {
        self.fade && !self.selected_edges.contains(key) && !self.highlighted_edges.contains(key)
    }
}
