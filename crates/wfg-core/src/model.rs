//! Scene-graph data model for workflow graphs.
//!
//! The scene is the single source of truth for everything drawn on the
//! canvas. Nodes (steps, workflow inputs, workflow outputs) are petgraph
//! nodes; connections are petgraph edges running from the node that owns the
//! source port to the node that owns the destination port. Renderers and hit
//! testers only ever read from it.

use crate::geometry::{self, LABEL_OFFSET, PORT_RADIUS};
use crate::id::{NodeId, PortId};
use crate::path::{CurveDirection, ConnectionPath, make_path};
use kurbo::{Point, Rect, Vec2};
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use winnow::combinator::alt;
use winnow::prelude::*;
use winnow::token::take_till;

// ─── Connection IDs ──────────────────────────────────────────────────────

/// Which side of a node a port sits on. Input ports receive connections,
/// output ports emit them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    In,
    Out,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::In => "in",
            Side::Out => "out",
        }
    }

    pub fn opposite(&self) -> Side {
        match self {
            Side::In => Side::Out,
            Side::Out => Side::In,
        }
    }
}

/// A structured port endpoint: `{side}/{node}/{port}`.
///
/// Workflow inputs and outputs are terminal nodes whose single port carries
/// the node's own name, e.g. `out/reads/reads`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId {
    pub side: Side,
    pub node: NodeId,
    pub port: PortId,
}

impl ConnectionId {
    pub fn new(side: Side, node: NodeId, port: PortId) -> Self {
        Self { side, node, port }
    }

    /// The single port of a workflow input (`Side::Out`) or output (`Side::In`).
    pub fn terminal(side: Side, node: NodeId) -> Self {
        Self::new(side, node, node.as_port())
    }

    /// True when node and port names match, which marks a workflow
    /// input/output rather than a step port.
    pub fn is_terminal(&self) -> bool {
        self.node.as_str() == self.port.as_str()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.side.as_str(), self.node, self.port)
    }
}

impl fmt::Debug for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{self}>")
    }
}

fn parse_side(input: &mut &str) -> ModalResult<Side> {
    alt(("out".value(Side::Out), "in".value(Side::In))).parse_next(input)
}

fn parse_segment<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_till(1.., '/').parse_next(input)
}

fn parse_connection_id(input: &mut &str) -> ModalResult<ConnectionId> {
    let side = parse_side.parse_next(input)?;
    let _ = '/'.parse_next(input)?;
    let node = parse_segment.parse_next(input)?;
    let _ = '/'.parse_next(input)?;
    let port = parse_segment.parse_next(input)?;
    Ok(ConnectionId::new(side, NodeId::intern(node), PortId::intern(port)))
}

impl FromStr for ConnectionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_connection_id
            .parse(s)
            .map_err(|e| format!("Invalid connection id {s:?}: {e}"))
    }
}

impl Serialize for ConnectionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ConnectionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ─── Nodes & ports ───────────────────────────────────────────────────────

/// The three kinds of vertices in a workflow graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Step,
    Input,
    Output,
}

impl NodeKind {
    /// CSS-style class name used by the renderer.
    pub fn class_name(&self) -> &'static str {
        match self {
            NodeKind::Step => "step",
            NodeKind::Input => "input",
            NodeKind::Output => "output",
        }
    }
}

/// A connection endpoint owned by exactly one node.
#[derive(Debug, Clone)]
pub struct Port {
    pub id: PortId,
    pub connection_id: ConnectionId,
    /// Angle (degrees) on the node outline; set by `Node::distribute_ports`.
    pub angle: f64,
}

impl Port {
    pub fn new(connection_id: ConnectionId) -> Self {
        Self {
            id: connection_id.port,
            connection_id,
            angle: 0.0,
        }
    }

    pub fn side(&self) -> Side {
        self.connection_id.side
    }

    pub fn node(&self) -> NodeId {
        self.connection_id.node
    }
}

/// A single vertex in the scene graph.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub label: String,
    pub inputs: SmallVec<[Port; 4]>,
    pub outputs: SmallVec<[Port; 4]>,
    /// Center of the node outline in canvas coordinates.
    pub position: Point,
    pub radius: f64,
    pub visible: bool,
}

impl Node {
    pub fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            kind,
            label: id.as_str().to_string(),
            inputs: SmallVec::new(),
            outputs: SmallVec::new(),
            position: Point::ZERO,
            radius: geometry::NODE_RADIUS,
            visible: true,
        }
    }

    /// A step node. Ports are sorted by id so their placement is stable.
    pub fn step(
        id: NodeId,
        inputs: impl IntoIterator<Item = PortId>,
        outputs: impl IntoIterator<Item = PortId>,
    ) -> Self {
        let mut node = Self::new(id, NodeKind::Step);
        let mut ins: Vec<PortId> = inputs.into_iter().collect();
        let mut outs: Vec<PortId> = outputs.into_iter().collect();
        ins.sort();
        outs.sort();
        node.inputs = ins
            .into_iter()
            .map(|p| Port::new(ConnectionId::new(Side::In, id, p)))
            .collect();
        node.outputs = outs
            .into_iter()
            .map(|p| Port::new(ConnectionId::new(Side::Out, id, p)))
            .collect();
        node.distribute_ports();
        node
    }

    /// A workflow input: one synthetic output port named after itself.
    pub fn input(id: NodeId) -> Self {
        let mut node = Self::new(id, NodeKind::Input);
        node.outputs
            .push(Port::new(ConnectionId::terminal(Side::Out, id)));
        node.distribute_ports();
        node
    }

    /// A workflow output: one synthetic input port named after itself.
    pub fn output(id: NodeId) -> Self {
        let mut node = Self::new(id, NodeKind::Output);
        node.inputs.push(Port::new(ConnectionId::terminal(Side::In, id)));
        node.distribute_ports();
        node
    }

    pub fn with_position(mut self, position: Point) -> Self {
        self.position = position;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// All ports, inputs first.
    pub fn ports(&self) -> impl Iterator<Item = &Port> {
        self.inputs.iter().chain(self.outputs.iter())
    }

    pub fn port(&self, cid: &ConnectionId) -> Option<&Port> {
        let side = match cid.side {
            Side::In => &self.inputs,
            Side::Out => &self.outputs,
        };
        side.iter().find(|p| p.id == cid.port)
    }

    /// Place ports on the outline: outputs fan out over the right arc,
    /// inputs over the left. Crowded nodes grow so ports don't overlap.
    pub fn distribute_ports(&mut self) {
        let crowd = self.inputs.len().max(self.outputs.len());
        self.radius = geometry::radius_for_port_count(crowd);

        let n = self.outputs.len();
        for (i, port) in self.outputs.iter_mut().enumerate() {
            port.angle = geometry::output_port_angle(i, n);
        }
        let n = self.inputs.len();
        for (i, port) in self.inputs.iter_mut().enumerate() {
            port.angle = geometry::input_port_angle(i, n);
        }
    }

    /// Offset of a port's anchor from the node center.
    pub fn port_offset(&self, port: &Port) -> Vec2 {
        geometry::port_local_transform(port.angle, self.radius) * Point::ZERO - Point::ZERO
    }

    /// Port anchor in canvas coordinates.
    pub fn port_anchor(&self, cid: &ConnectionId) -> Option<Point> {
        self.port(cid).map(|p| self.position + self.port_offset(p))
    }

    /// Bounding box relative to the node center: outline, ports, and label.
    pub fn local_bounds(&self) -> Rect {
        let r = self.radius + PORT_RADIUS;
        let outline = Rect::new(-r, -r, r, r);
        let label_w = geometry::label_width(&self.label);
        let baseline = self.radius + LABEL_OFFSET;
        let label = Rect::new(
            -label_w / 2.0,
            baseline - geometry::LABEL_HEIGHT * 0.75,
            label_w / 2.0,
            baseline + geometry::LABEL_HEIGHT * 0.25,
        );
        outline.union(label)
    }

    /// Bounding box in canvas coordinates.
    pub fn bounds(&self) -> Rect {
        self.local_bounds() + self.position.to_vec2()
    }
}

// ─── Edges ───────────────────────────────────────────────────────────────

/// Identity of a connection: its (source, destination) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    pub source: ConnectionId,
    pub destination: ConnectionId,
}

impl EdgeKey {
    /// Canonical form: the output side is always the source, so an edge
    /// dragged from an input port compares equal to one dragged from the output.
    pub fn normalized(a: ConnectionId, b: ConnectionId) -> Self {
        if a.side == Side::In {
            Self {
                source: b,
                destination: a,
            }
        } else {
            Self {
                source: a,
                destination: b,
            }
        }
    }

    /// True if the connection touches `node` on either end.
    pub fn touches(&self, node: NodeId) -> bool {
        self.source.node == node || self.destination.node == node
    }
}

/// A directed connection between two ports.
#[derive(Debug, Clone)]
pub struct Edge {
    pub source: ConnectionId,
    pub destination: ConnectionId,
    pub visible: bool,
    /// Supplied by the workflow model; only affects display.
    pub valid: bool,
}

impl Edge {
    pub fn new(source: ConnectionId, destination: ConnectionId) -> Self {
        Self {
            source,
            destination,
            visible: true,
            valid: true,
        }
    }

    pub fn key(&self) -> EdgeKey {
        EdgeKey {
            source: self.source,
            destination: self.destination,
        }
    }
}

// ─── Scene Graph ─────────────────────────────────────────────────────────

/// The in-memory scene: nodes keyed by id, connections as graph edges.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    /// The underlying directed graph (owner node of source → owner node of destination).
    pub graph: StableDiGraph<Node, Edge>,

    /// Index from NodeId → NodeIndex for fast lookup.
    pub id_index: HashMap<NodeId, NodeIndex>,

    /// Paint order, back to front. Hit testing walks it in reverse.
    paint_order: Vec<NodeId>,
}

impl SceneGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, replacing any existing node with the same id.
    /// Connections of a replaced node are kept when their ports still exist.
    pub fn add_node(&mut self, node: Node) -> NodeIndex {
        let id = node.id;
        if let Some(&idx) = self.id_index.get(&id) {
            self.graph[idx] = node;
            self.prune_dangling_edges(idx);
            return idx;
        }
        let idx = self.graph.add_node(node);
        self.id_index.insert(id, idx);
        self.paint_order.push(id);
        idx
    }

    /// Remove a node and every connection touching it.
    pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        let idx = self.id_index.remove(&id)?;
        self.paint_order.retain(|n| *n != id);
        self.graph.remove_node(idx)
    }

    pub fn get_by_id(&self, id: NodeId) -> Option<&Node> {
        self.id_index.get(&id).map(|idx| &self.graph[*idx])
    }

    pub fn get_by_id_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.id_index
            .get(&id)
            .copied()
            .map(|idx| &mut self.graph[idx])
    }

    pub fn index_of(&self, id: NodeId) -> Option<NodeIndex> {
        self.id_index.get(&id).copied()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.id_index.contains_key(&id)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Nodes in paint order (back to front).
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.paint_order
            .iter()
            .filter_map(|id| self.get_by_id(*id))
    }

    pub fn paint_order(&self) -> &[NodeId] {
        &self.paint_order
    }

    /// Raise a node to the top of the paint order.
    pub fn bring_to_front(&mut self, id: NodeId) -> bool {
        match self.paint_order.iter().position(|n| *n == id) {
            Some(pos) if pos + 1 != self.paint_order.len() => {
                let id = self.paint_order.remove(pos);
                self.paint_order.push(id);
                true
            }
            _ => false,
        }
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.graph.edge_weights()
    }

    /// Look up a port by its connection id.
    pub fn port(&self, cid: &ConnectionId) -> Option<&Port> {
        self.get_by_id(cid.node).and_then(|n| n.port(cid))
    }

    /// Port anchor in canvas coordinates, if the port is in the scene.
    pub fn port_anchor(&self, cid: &ConnectionId) -> Option<Point> {
        self.get_by_id(cid.node).and_then(|n| n.port_anchor(cid))
    }

    /// Add a connection. Returns the existing edge if an equivalent one is
    /// already present, `None` if either port is not in the scene.
    pub fn add_edge(&mut self, edge: Edge) -> Option<EdgeIndex> {
        if let Some(existing) = self.find_edge(&edge.key()) {
            return Some(existing);
        }
        if self.port(&edge.source).is_none() {
            log::warn!("edge {} → {}: source port not in scene", edge.source, edge.destination);
            return None;
        }
        if self.port(&edge.destination).is_none() {
            log::warn!(
                "edge {} → {}: destination port not in scene",
                edge.source,
                edge.destination
            );
            return None;
        }
        let from = self.index_of(edge.source.node)?;
        let to = self.index_of(edge.destination.node)?;
        Some(self.graph.add_edge(from, to, edge))
    }

    pub fn find_edge(&self, key: &EdgeKey) -> Option<EdgeIndex> {
        let from = self.index_of(key.source.node)?;
        let to = self.index_of(key.destination.node)?;
        self.graph
            .edges_connecting(from, to)
            .find(|e| e.weight().key() == *key)
            .map(|e| e.id())
    }

    pub fn edge(&self, key: &EdgeKey) -> Option<&Edge> {
        self.find_edge(key).map(|idx| &self.graph[idx])
    }

    pub fn edge_mut(&mut self, key: &EdgeKey) -> Option<&mut Edge> {
        self.find_edge(key).map(move |idx| &mut self.graph[idx])
    }

    pub fn remove_edge(&mut self, key: &EdgeKey) -> Option<Edge> {
        let idx = self.find_edge(key)?;
        self.graph.remove_edge(idx)
    }

    /// Remove every connection, keeping nodes.
    pub fn clear_edges(&mut self) {
        self.graph.clear_edges();
    }

    /// Connections ending at `node`.
    pub fn incoming(&self, node: NodeId) -> Vec<&Edge> {
        self.edges_directed(node, petgraph::Direction::Incoming)
    }

    /// Connections starting at `node`.
    pub fn outgoing(&self, node: NodeId) -> Vec<&Edge> {
        self.edges_directed(node, petgraph::Direction::Outgoing)
    }

    fn edges_directed(&self, node: NodeId, dir: petgraph::Direction) -> Vec<&Edge> {
        let Some(idx) = self.index_of(node) else {
            return Vec::new();
        };
        let mut edges: Vec<&Edge> = self
            .graph
            .edges_directed(idx, dir)
            .map(|e| e.weight())
            .collect();
        edges.sort_by_key(|e| e.key());
        edges
    }

    /// Curve for a connection, computed from the current port anchors.
    pub fn edge_path(&self, edge: &Edge) -> Option<ConnectionPath> {
        let start = self.port_anchor(&edge.source)?;
        let end = self.port_anchor(&edge.destination)?;
        Some(make_path(start, end, Some(CurveDirection::Right)))
    }

    /// Union of all visible node bounds, `None` for an empty scene.
    pub fn bounds(&self) -> Option<Rect> {
        self.nodes()
            .filter(|n| n.visible)
            .map(Node::bounds)
            .reduce(|a, b| a.union(b))
    }

    /// Drop edges whose ports disappeared after a node was replaced.
    fn prune_dangling_edges(&mut self, idx: NodeIndex) {
        let stale: Vec<EdgeIndex> = self
            .graph
            .edges_directed(idx, petgraph::Direction::Outgoing)
            .chain(self.graph.edges_directed(idx, petgraph::Direction::Incoming))
            .filter(|e| {
                let w = e.weight();
                self.port(&w.source).is_none() || self.port(&w.destination).is_none()
            })
            .map(|e| e.id())
            .collect();
        for e in stale {
            self.graph.remove_edge(e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cid(s: &str) -> ConnectionId {
        s.parse().unwrap()
    }

    #[test]
    fn connection_id_roundtrip() {
        let c = cid("out/align/bam");
        assert_eq!(c.side, Side::Out);
        assert_eq!(c.node.as_str(), "align");
        assert_eq!(c.port.as_str(), "bam");
        assert_eq!(c.to_string(), "out/align/bam");
        assert!(!c.is_terminal());
        assert!(cid("out/reads/reads").is_terminal());
    }

    #[test]
    fn connection_id_rejects_garbage() {
        assert!("sideways/a/b".parse::<ConnectionId>().is_err());
        assert!("in/a".parse::<ConnectionId>().is_err());
        assert!("in//b".parse::<ConnectionId>().is_err());
        assert!("in/a/b/c".parse::<ConnectionId>().is_err());
    }

    #[test]
    fn terminal_nodes_have_one_synthetic_port() {
        let input = Node::input(NodeId::intern("reads"));
        assert!(input.inputs.is_empty());
        assert_eq!(input.outputs.len(), 1);
        assert_eq!(input.outputs[0].connection_id.to_string(), "out/reads/reads");

        let output = Node::output(NodeId::intern("report"));
        assert!(output.outputs.is_empty());
        assert_eq!(output.inputs[0].connection_id.to_string(), "in/report/report");
    }

    #[test]
    fn step_ports_are_sorted_and_fan_out() {
        let node = Node::step(
            NodeId::intern("sort"),
            [PortId::intern("b"), PortId::intern("a")],
            [PortId::intern("out")],
        );
        assert_eq!(node.inputs[0].id.as_str(), "a");
        assert_eq!(node.inputs[1].id.as_str(), "b");

        // Single output sits straight to the right of the center.
        let anchor = node.port_anchor(&cid("out/sort/out")).unwrap();
        assert!((anchor.x - node.radius).abs() < 1e-9);
        assert!(anchor.y.abs() < 1e-9);

        // Inputs sit on the left half.
        for port in &node.inputs {
            assert!(node.port_offset(port).x < 0.0);
        }
    }

    #[test]
    fn edges_resolve_and_dedupe() {
        let mut sg = SceneGraph::new();
        sg.add_node(Node::input(NodeId::intern("x")));
        sg.add_node(Node::step(
            NodeId::intern("s"),
            [PortId::intern("in")],
            [PortId::intern("out")],
        ));

        let edge = Edge::new(cid("out/x/x"), cid("in/s/in"));
        let a = sg.add_edge(edge.clone()).unwrap();
        let b = sg.add_edge(edge).unwrap();
        assert_eq!(a, b);
        assert_eq!(sg.edge_count(), 1);
        assert_eq!(sg.incoming(NodeId::intern("s")).len(), 1);
        assert_eq!(sg.outgoing(NodeId::intern("x")).len(), 1);
    }

    #[test]
    fn edge_to_missing_port_is_skipped() {
        let mut sg = SceneGraph::new();
        sg.add_node(Node::input(NodeId::intern("x2")));
        sg.add_node(Node::step(
            NodeId::intern("s2"),
            Vec::<PortId>::new(),
            Vec::<PortId>::new(),
        ));
        assert!(sg
            .add_edge(Edge::new(cid("out/x2/x2"), cid("in/s2/nope")))
            .is_none());
        assert_eq!(sg.edge_count(), 0);
    }

    #[test]
    fn removing_node_drops_its_edges() {
        let mut sg = SceneGraph::new();
        sg.add_node(Node::input(NodeId::intern("x3")));
        sg.add_node(Node::output(NodeId::intern("y3")));
        sg.add_edge(Edge::new(cid("out/x3/x3"), cid("in/y3/y3")));
        assert!(sg.remove_node(NodeId::intern("x3")).is_some());
        assert_eq!(sg.edge_count(), 0);
        assert_eq!(sg.paint_order().len(), 1);
    }

    #[test]
    fn normalized_key_puts_output_first() {
        let a = cid("in/s/in");
        let b = cid("out/x/x");
        let key = EdgeKey::normalized(a, b);
        assert_eq!(key.source, b);
        assert_eq!(key.destination, a);
        assert_eq!(key, EdgeKey::normalized(b, a));
    }

    #[test]
    fn bring_to_front_reorders_paint() {
        let mut sg = SceneGraph::new();
        sg.add_node(Node::input(NodeId::intern("p1")));
        sg.add_node(Node::input(NodeId::intern("p2")));
        assert!(sg.bring_to_front(NodeId::intern("p1")));
        assert_eq!(sg.paint_order().last(), Some(&NodeId::intern("p1")));
        assert!(!sg.bring_to_front(NodeId::intern("p1")));
    }
}
