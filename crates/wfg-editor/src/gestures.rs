//! Per-gesture interaction state.
//!
//! Only one gesture is live at a time; the canvas holds a single
//! [`Gesture`] and replaces it wholesale on every transition.

use std::collections::BTreeSet;
use wfg_core::kurbo::{Point, Vec2};
use wfg_core::{
    ConnectionId, ConnectionPath, CurveDirection, EdgeKey, NodeId, NodeKind, SceneGraph, Side,
    WorkflowModel, make_path,
};
use wfg_render::{Decorations, Ghost};

use crate::events::{DragTracker, Scope};

#[derive(Debug, Clone, Default)]
pub enum Gesture {
    #[default]
    Idle,
    /// Pointer is down but has not moved far enough to commit to a drag.
    Pending { scope: Scope, tracker: DragTracker },
    Pan { tracker: DragTracker, origin: Vec2 },
    NodeMove { tracker: DragTracker, drag: NodeMoveGesture },
    PortDrag { tracker: DragTracker, drag: PortDragGesture },
}

impl Gesture {
    pub fn is_idle(&self) -> bool {
        matches!(self, Gesture::Idle)
    }

    /// True for gestures that can trigger auto-pan.
    pub fn is_drag(&self) -> bool {
        matches!(self, Gesture::NodeMove { .. } | Gesture::PortDrag { .. })
    }
}

// ─── Node move ───────────────────────────────────────────────────────────

/// Dragging one node. Connection curves are cached at the start and only
/// the endpoint on the dragged node moves.
#[derive(Debug, Clone)]
pub struct NodeMoveGesture {
    pub node: NodeId,
    pub start: Point,
    incoming: Vec<(EdgeKey, ConnectionPath)>,
    outgoing: Vec<(EdgeKey, ConnectionPath)>,
    /// Canvas distance scrolled by auto-pan since the drag began.
    pan_offset: Vec2,
}

impl NodeMoveGesture {
    pub fn begin(scene: &SceneGraph, node: NodeId) -> Option<Self> {
        let start = scene.get_by_id(node)?.position;
        let cache = |edges: Vec<&wfg_core::Edge>| -> Vec<(EdgeKey, ConnectionPath)> {
            edges
                .into_iter()
                .filter_map(|edge| match scene.edge_path(edge) {
                    Some(path) => Some((edge.key(), path)),
                    None => {
                        log::warn!("node move {node}: edge {:?} has no anchor", edge.key());
                        None
                    }
                })
                .collect()
        };
        let incoming = cache(scene.incoming(node));
        // Self-loops are already cached as incoming.
        let outgoing = cache(
            scene
                .outgoing(node)
                .into_iter()
                .filter(|e| e.destination.node != node)
                .collect(),
        );
        log::debug!(
            "node move {node}: start ({:.1}, {:.1}), {} in / {} out",
            start.x,
            start.y,
            incoming.len(),
            outgoing.len()
        );
        Some(Self {
            node,
            start,
            incoming,
            outgoing,
            pan_offset: Vec2::ZERO,
        })
    }

    /// Node position for a cumulative screen-space pointer delta.
    pub fn position(&self, screen_delta: Vec2, scale: f64) -> Point {
        self.start + screen_delta / scale + self.pan_offset
    }

    pub fn add_pan(&mut self, canvas_delta: Vec2) {
        self.pan_offset += canvas_delta;
    }

    /// Move the node and rewrite the cached curves touching it.
    pub fn apply(&self, scene: &mut SceneGraph, deco: &mut Decorations, position: Point) {
        if let Some(node) = scene.get_by_id_mut(self.node) {
            node.position = position;
        }
        let shift = position - self.start;
        for (key, path) in &self.incoming {
            let start = if key.source.node == self.node {
                path.start + shift
            } else {
                path.start
            };
            deco.edge_paths
                .insert(*key, make_path(start, path.end + shift, Some(CurveDirection::Right)));
        }
        for (key, path) in &self.outgoing {
            deco.edge_paths.insert(
                *key,
                make_path(path.start + shift, path.end, Some(CurveDirection::Right)),
            );
        }
        deco.dragging_node = Some(self.node);
    }
}

// ─── Port drag ───────────────────────────────────────────────────────────

/// What releasing a port drag should do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PortDragOutcome {
    Connect(EdgeKey),
    /// Create a workflow input or output at `position`, wired to the origin.
    CreateTerminal { kind: NodeKind, position: Point },
    Cancel,
}

#[derive(Debug, Clone)]
pub struct PortDragGesture {
    pub origin: ConnectionId,
    origin_anchor: Point,
    direction: CurveDirection,
    /// Opposite-side ports on other nodes, sorted by connection id.
    candidates: Vec<(ConnectionId, Point)>,
    suggestions: BTreeSet<ConnectionId>,
    snapped: Option<ConnectionId>,
    ghost_visible: bool,
    cursor: Point,
}

impl PortDragGesture {
    pub fn begin<M: WorkflowModel + ?Sized>(
        scene: &SceneGraph,
        model: &M,
        origin: ConnectionId,
    ) -> Option<Self> {
        let origin_anchor = scene.port_anchor(&origin)?;
        let direction = match origin.side {
            Side::Out => CurveDirection::Right,
            Side::In => CurveDirection::Left,
        };
        let wanted = origin.side.opposite();
        let mut candidates: Vec<(ConnectionId, Point)> = scene
            .nodes()
            .filter(|n| n.visible && n.id != origin.node)
            .flat_map(|n| {
                n.ports()
                    .filter(move |p| p.side() == wanted)
                    .map(move |p| (p.connection_id, n.position + n.port_offset(p)))
            })
            .collect();
        candidates.sort_by_key(|(cid, _)| *cid);

        let valid: BTreeSet<ConnectionId> = model
            .gather_valid_connection_points(origin)
            .into_iter()
            .collect();
        let suggestions = candidates
            .iter()
            .map(|(cid, _)| *cid)
            .filter(|cid| valid.contains(cid))
            .collect();

        log::debug!(
            "port drag {origin}: {} candidates, {} suggested",
            candidates.len(),
            valid.len()
        );
        Some(Self {
            origin,
            origin_anchor,
            direction,
            candidates,
            suggestions,
            snapped: None,
            ghost_visible: false,
            cursor: origin_anchor,
        })
    }

    pub fn snapped(&self) -> Option<ConnectionId> {
        self.snapped
    }

    pub fn ghost_visible(&self) -> bool {
        self.ghost_visible
    }

    pub fn suggestions(&self) -> &BTreeSet<ConnectionId> {
        &self.suggestions
    }

    /// Kind of node a release over empty space would create.
    pub fn ghost_kind(&self) -> NodeKind {
        match self.origin.side {
            Side::In => NodeKind::Input,
            Side::Out => NodeKind::Output,
        }
    }

    /// Track the cursor (canvas space). Thresholds are screen pixels.
    pub fn update(&mut self, cursor: Point, scale: f64, snap_threshold: f64, ghost_reveal: f64) {
        self.cursor = cursor;
        let mut nearest: Option<(f64, ConnectionId)> = None;
        for (cid, anchor) in &self.candidates {
            let d = anchor.distance(cursor) * scale;
            // Strictly closer: ties keep the earlier id.
            if nearest.is_none_or(|(best, _)| d < best) {
                nearest = Some((d, *cid));
            }
        }
        match nearest {
            Some((d, cid)) if d < snap_threshold => {
                self.snapped = Some(cid);
                self.ghost_visible = false;
            }
            _ => {
                self.snapped = None;
                self.ghost_visible = self.origin_anchor.distance(cursor) * scale > ghost_reveal;
            }
        }
        log::trace!(
            "port drag {}: snapped {:?}, ghost {}",
            self.origin,
            self.snapped,
            self.ghost_visible
        );
    }

    pub fn floating_edge(&self) -> ConnectionPath {
        make_path(self.origin_anchor, self.cursor, Some(self.direction))
    }

    pub fn decorate(&self, deco: &mut Decorations) {
        deco.dragging_port = Some(self.origin);
        deco.suggested_ports = self.suggestions.clone();
        deco.snapped_port = self.snapped;
        deco.floating_edge = Some(self.floating_edge());
        deco.ghost = self.ghost_visible.then(|| Ghost {
            kind: self.ghost_kind(),
            position: self.cursor,
        });
    }

    pub fn outcome(&self) -> PortDragOutcome {
        if let Some(target) = self.snapped {
            PortDragOutcome::Connect(EdgeKey::normalized(self.origin, target))
        } else if self.ghost_visible {
            PortDragOutcome::CreateTerminal {
                kind: self.ghost_kind(),
                position: self.cursor,
            }
        } else {
            PortDragOutcome::Cancel
        }
    }
}
