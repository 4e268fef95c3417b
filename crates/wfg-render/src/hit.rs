//! Hit testing: canvas point → element lookup.
//!
//! Walks nodes front-to-back (reverse paint order) checking ports before
//! the node body, then falls back to edges, which are painted underneath.

use wfg_core::kurbo::{ParamCurveNearest, Point};
use wfg_core::geometry::PORT_RADIUS;
use wfg_core::{ConnectionId, EdgeKey, NodeId, SceneGraph};

/// Curve flattening accuracy for edge distance queries.
const NEAREST_ACCURACY: f64 = 0.1;

/// What lies under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    Port(ConnectionId),
    /// The node's drag handle (its outline).
    Node(NodeId),
    Edge(EdgeKey),
}

/// Find the topmost element at `point` (canvas coordinates).
/// Returns `None` for the background.
pub fn hit_test(scene: &SceneGraph, point: Point, edge_tolerance: f64) -> Option<Hit> {
    for id in scene.paint_order().iter().rev() {
        let Some(node) = scene.get_by_id(*id) else {
            continue;
        };
        if !node.visible {
            continue;
        }
        for port in node.ports() {
            let anchor = node.position + node.port_offset(port);
            if anchor.distance(point) <= PORT_RADIUS {
                return Some(Hit::Port(port.connection_id));
            }
        }
        if node.position.distance(point) <= node.radius {
            return Some(Hit::Node(node.id));
        }
    }
    hit_test_edge(scene, point, edge_tolerance).map(Hit::Edge)
}

/// Nearest visible edge within `tolerance` of `point`.
pub fn hit_test_edge(scene: &SceneGraph, point: Point, tolerance: f64) -> Option<EdgeKey> {
    let limit = tolerance * tolerance;
    let mut best: Option<(f64, EdgeKey)> = None;
    for edge in scene.edges().filter(|e| e.visible) {
        let Some(path) = scene.edge_path(edge) else {
            continue;
        };
        let d = path.to_cubic().nearest(point, NEAREST_ACCURACY).distance_sq;
        if d > limit {
            continue;
        }
        let key = edge.key();
        match best {
            Some((bd, bk)) if bd < d || (bd == d && bk <= key) => {}
            _ => best = Some((d, key)),
        }
    }
    best.map(|(_, key)| key)
}
