//! The workflow model the canvas edits.
//!
//! The canvas never owns workflow semantics: it reads nodes and connections
//! through [`WorkflowModel`], asks it to mutate, and reacts to the
//! [`ModelChange`]s it reports. [`MemoryWorkflow`] is a complete in-memory
//! implementation, loadable from JSON.

use crate::id::{NodeId, PortId};
use crate::model::{ConnectionId, Edge, EdgeKey, Node, NodeKind, SceneGraph, Side};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Custom-property keys holding a node's persisted position.
pub const POSITION_X_KEY: &str = "sbg:x";
pub const POSITION_Y_KEY: &str = "sbg:y";

/// Read a persisted position. Both keys must hold numbers.
pub fn read_position(props: &Map<String, Value>) -> Option<Point> {
    let x = props.get(POSITION_X_KEY)?.as_f64()?;
    let y = props.get(POSITION_Y_KEY)?.as_f64()?;
    Some(Point::new(x, y))
}

pub fn write_position(props: &mut Map<String, Value>, position: Point) {
    props.insert(POSITION_X_KEY.to_string(), Value::from(position.x));
    props.insert(POSITION_Y_KEY.to_string(), Value::from(position.y));
}

// ─── Records ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPort {
    pub id: PortId,
    pub connection_id: ConnectionId,
    pub visible: bool,
    /// Data type; connections between mismatched types are invalid.
    pub port_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub label: Option<String>,
    pub visible: bool,
    /// Step ports. Empty for workflow inputs/outputs, whose single port is
    /// synthesized from the node itself.
    pub in_ports: Vec<ModelPort>,
    pub out_ports: Vec<ModelPort>,
    /// Data type of a workflow input/output.
    pub port_type: Option<String>,
    pub custom_props: Map<String, Value>,
}

impl ModelNode {
    pub fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            kind,
            label: None,
            visible: true,
            in_ports: Vec::new(),
            out_ports: Vec::new(),
            port_type: None,
            custom_props: Map::new(),
        }
    }

    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(self.id.as_str())
    }

    pub fn position(&self) -> Option<Point> {
        read_position(&self.custom_props)
    }

    /// Find the port behind a connection id, including the synthetic port
    /// of a workflow input/output.
    pub fn port(&self, cid: &ConnectionId) -> Option<ModelPortRef<'_>> {
        if cid.node != self.id {
            return None;
        }
        match (self.kind, cid.side) {
            (NodeKind::Input, Side::Out) | (NodeKind::Output, Side::In) => cid
                .is_terminal()
                .then_some(ModelPortRef {
                    connection_id: *cid,
                    port_type: self.port_type.as_deref(),
                }),
            (NodeKind::Step, Side::In) => find_port(&self.in_ports, cid),
            (NodeKind::Step, Side::Out) => find_port(&self.out_ports, cid),
            _ => None,
        }
    }

    /// Every port of this node as connection ids.
    pub fn connection_points(&self) -> Vec<ModelPortRef<'_>> {
        match self.kind {
            NodeKind::Input => vec![ModelPortRef {
                connection_id: ConnectionId::terminal(Side::Out, self.id),
                port_type: self.port_type.as_deref(),
            }],
            NodeKind::Output => vec![ModelPortRef {
                connection_id: ConnectionId::terminal(Side::In, self.id),
                port_type: self.port_type.as_deref(),
            }],
            NodeKind::Step => self
                .in_ports
                .iter()
                .chain(self.out_ports.iter())
                .map(|p| ModelPortRef {
                    connection_id: p.connection_id,
                    port_type: p.port_type.as_deref(),
                })
                .collect(),
        }
    }
}

fn find_port<'a>(ports: &'a [ModelPort], cid: &ConnectionId) -> Option<ModelPortRef<'a>> {
    ports
        .iter()
        .find(|p| p.connection_id == *cid)
        .map(|p| ModelPortRef {
            connection_id: p.connection_id,
            port_type: p.port_type.as_deref(),
        })
}

/// A borrowed view of a connectable endpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPortRef<'a> {
    pub connection_id: ConnectionId,
    pub port_type: Option<&'a str>,
}

impl ModelPortRef<'_> {
    /// Untyped endpoints accept anything.
    pub fn accepts(&self, other: &ModelPortRef<'_>) -> bool {
        match (self.port_type, other.port_type) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConnection {
    pub source: ConnectionId,
    pub destination: ConnectionId,
    pub visible: bool,
    pub is_valid: bool,
}

impl ModelConnection {
    pub fn key(&self) -> EdgeKey {
        EdgeKey {
            source: self.source,
            destination: self.destination,
        }
    }
}

/// Notifications the canvas reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelChange {
    StepLabelChanged(NodeId),
    ConnectionsUpdated,
    StepCreated(NodeId),
    InputCreated(NodeId),
    OutputCreated(NodeId),
    ConnectionCreated {
        source: ConnectionId,
        destination: ConnectionId,
    },
    NodeRemoved(NodeId),
}

// ─── Interface ───────────────────────────────────────────────────────────

/// The abstract workflow collaborator.
///
/// Mutators validate their own preconditions; the canvas does not retry and
/// simply re-renders from the resulting state.
pub trait WorkflowModel {
    fn steps(&self) -> &[ModelNode];
    fn inputs(&self) -> &[ModelNode];
    fn outputs(&self) -> &[ModelNode];
    fn connections(&self) -> &[ModelConnection];

    fn find_by_id(&self, id: NodeId) -> Option<&ModelNode>;
    fn custom_props_mut(&mut self, id: NodeId) -> Option<&mut Map<String, Value>>;

    fn remove_step(&mut self, id: NodeId);
    fn remove_input(&mut self, id: NodeId);
    fn remove_output(&mut self, id: NodeId);
    fn disconnect(&mut self, source: ConnectionId, destination: ConnectionId);

    /// Connect two ports. The connection is recorded even when it is not
    /// semantically valid; the return value reports validity.
    fn connect(&mut self, source: ConnectionId, destination: ConnectionId) -> bool;

    /// Synthesize a workflow input feeding the given step input port.
    fn create_input_from_port(&mut self, port: ConnectionId) -> Option<ModelNode>;
    /// Synthesize a workflow output fed by the given step output port.
    fn create_output_from_port(&mut self, port: ConnectionId) -> Option<ModelNode>;

    /// Endpoints that `port` could validly connect to.
    fn gather_valid_connection_points(&self, port: ConnectionId) -> Vec<ConnectionId>;

    /// Take pending change notifications.
    fn drain_changes(&mut self) -> Vec<ModelChange>;

    /// All nodes: inputs, steps, outputs.
    fn nodes(&self) -> Vec<&ModelNode> {
        self.inputs()
            .iter()
            .chain(self.steps())
            .chain(self.outputs())
            .collect()
    }

    fn position(&self, id: NodeId) -> Option<Point> {
        self.find_by_id(id).and_then(ModelNode::position)
    }

    /// Persist a node position. Returns false for unknown nodes.
    fn set_position(&mut self, id: NodeId, position: Point) -> bool {
        match self.custom_props_mut(id) {
            Some(props) => {
                write_position(props, position);
                true
            }
            None => false,
        }
    }
}

// ─── In-memory implementation ────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct MemoryWorkflow {
    steps: Vec<ModelNode>,
    inputs: Vec<ModelNode>,
    outputs: Vec<ModelNode>,
    connections: Vec<ModelConnection>,
    changes: Vec<ModelChange>,
}

impl MemoryWorkflow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a workflow document:
    ///
    /// ```json
    /// { "inputs": [{ "id": "reads", "type": "File" }],
    ///   "steps": [{ "id": "align", "in": ["reads"], "out": [{ "id": "bam", "type": "File" }] }],
    ///   "outputs": [{ "id": "bam" }],
    ///   "connections": [{ "source": "out/reads/reads", "destination": "in/align/reads" }] }
    /// ```
    pub fn from_json(json: &str) -> Result<Self, String> {
        let doc: WorkflowDoc =
            serde_json::from_str(json).map_err(|e| format!("Invalid workflow document: {e}"))?;
        let mut wf = Self::new();
        for input in doc.inputs {
            wf.inputs.push(input.into_node(NodeKind::Input));
        }
        for output in doc.outputs {
            wf.outputs.push(output.into_node(NodeKind::Output));
        }
        for step in doc.steps {
            wf.steps.push(step.into_node());
        }
        for conn in doc.connections {
            let key = EdgeKey::normalized(conn.source, conn.destination);
            if wf.port(&key.source).is_none() || wf.port(&key.destination).is_none() {
                return Err(format!(
                    "Connection {} → {} references an unknown port",
                    conn.source, conn.destination
                ));
            }
            let is_valid = wf.is_valid_pair(&key);
            wf.connections.push(ModelConnection {
                source: key.source,
                destination: key.destination,
                visible: conn.visible,
                is_valid,
            });
        }
        Ok(wf)
    }

    // ─── Builders ────────────────────────────────────────────────────────

    pub fn with_input(mut self, id: &str) -> Self {
        self.inputs
            .push(ModelNode::new(NodeId::intern(id), NodeKind::Input));
        self
    }

    pub fn with_output(mut self, id: &str) -> Self {
        self.outputs
            .push(ModelNode::new(NodeId::intern(id), NodeKind::Output));
        self
    }

    pub fn with_step(mut self, id: &str, inputs: &[&str], outputs: &[&str]) -> Self {
        self.steps.push(step_node(NodeId::intern(id), inputs, outputs));
        self
    }

    /// Add a connection without validation or change notification.
    pub fn with_connection(mut self, source: ConnectionId, destination: ConnectionId) -> Self {
        let key = EdgeKey::normalized(source, destination);
        let is_valid = self.is_valid_pair(&key);
        self.connections.push(ModelConnection {
            source: key.source,
            destination: key.destination,
            visible: true,
            is_valid,
        });
        self
    }

    pub fn with_position(mut self, id: &str, position: Point) -> Self {
        self.set_position(NodeId::intern(id), position);
        self
    }

    // ─── Runtime mutators ────────────────────────────────────────────────

    /// Add a new step, reporting [`ModelChange::StepCreated`].
    pub fn create_step(&mut self, id: &str, inputs: &[&str], outputs: &[&str]) -> NodeId {
        let id = self.unique_id(id);
        self.steps.push(step_node(id, inputs, outputs));
        self.changes.push(ModelChange::StepCreated(id));
        id
    }

    pub fn set_label(&mut self, id: NodeId, label: impl Into<String>) -> bool {
        let Some(node) = self.node_mut(id) else {
            return false;
        };
        node.label = Some(label.into());
        if node.kind == NodeKind::Step {
            self.changes.push(ModelChange::StepLabelChanged(id));
        }
        true
    }

    pub fn set_port_type(&mut self, port: ConnectionId, port_type: Option<&str>) {
        let Some(node) = self.node_mut(port.node) else {
            return;
        };
        let port_type = port_type.map(str::to_string);
        if node.kind != NodeKind::Step {
            node.port_type = port_type;
        } else {
            let ports = match port.side {
                Side::In => &mut node.in_ports,
                Side::Out => &mut node.out_ports,
            };
            if let Some(p) = ports.iter_mut().find(|p| p.connection_id == port) {
                p.port_type = port_type;
            }
        }
        self.revalidate();
    }

    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        if let Some(node) = self.node_mut(id) {
            node.visible = visible;
        }
    }

    // ─── Internals ───────────────────────────────────────────────────────

    fn node_mut(&mut self, id: NodeId) -> Option<&mut ModelNode> {
        self.inputs
            .iter_mut()
            .chain(self.steps.iter_mut())
            .chain(self.outputs.iter_mut())
            .find(|n| n.id == id)
    }

    fn port(&self, cid: &ConnectionId) -> Option<ModelPortRef<'_>> {
        self.find_by_id(cid.node).and_then(|n| n.port(cid))
    }

    fn is_valid_pair(&self, key: &EdgeKey) -> bool {
        if key.source.side != Side::Out || key.destination.side != Side::In {
            return false;
        }
        if key.source.node == key.destination.node {
            return false;
        }
        match (self.port(&key.source), self.port(&key.destination)) {
            (Some(a), Some(b)) => a.accepts(&b),
            _ => false,
        }
    }

    fn revalidate(&mut self) {
        let validity: Vec<bool> = self
            .connections
            .iter()
            .map(|c| self.is_valid_pair(&c.key()))
            .collect();
        let mut changed = false;
        for (conn, valid) in self.connections.iter_mut().zip(validity) {
            changed |= conn.is_valid != valid;
            conn.is_valid = valid;
        }
        if changed {
            self.changes.push(ModelChange::ConnectionsUpdated);
        }
    }

    fn unique_id(&self, base: &str) -> NodeId {
        let id = NodeId::intern(base);
        if self.find_by_id(id).is_none() {
            return id;
        }
        loop {
            let id = NodeId::with_prefix(base);
            if self.find_by_id(id).is_none() {
                return id;
            }
        }
    }

    fn remove_node(&mut self, id: NodeId, kind: NodeKind) {
        let list = match kind {
            NodeKind::Step => &mut self.steps,
            NodeKind::Input => &mut self.inputs,
            NodeKind::Output => &mut self.outputs,
        };
        let before = list.len();
        list.retain(|n| n.id != id);
        if list.len() == before {
            log::warn!("remove {}: no such {} in workflow", id, kind.class_name());
            return;
        }
        let had_connections = self.connections.iter().any(|c| c.key().touches(id));
        self.connections.retain(|c| !c.key().touches(id));
        self.changes.push(ModelChange::NodeRemoved(id));
        if had_connections {
            self.changes.push(ModelChange::ConnectionsUpdated);
        }
    }

    fn create_terminal_from_port(&mut self, port: ConnectionId, kind: NodeKind) -> Option<ModelNode> {
        let expected_side = match kind {
            NodeKind::Input => Side::In,
            NodeKind::Output => Side::Out,
            NodeKind::Step => return None,
        };
        if port.side != expected_side {
            return None;
        }
        let port_type = self.port(&port)?.port_type.map(str::to_string);

        let id = self.unique_id(port.port.as_str());
        let mut node = ModelNode::new(id, kind);
        node.port_type = port_type;

        let (source, destination, change) = match kind {
            NodeKind::Input => {
                self.inputs.push(node.clone());
                (ConnectionId::terminal(Side::Out, id), port, ModelChange::InputCreated(id))
            }
            _ => {
                self.outputs.push(node.clone());
                (port, ConnectionId::terminal(Side::In, id), ModelChange::OutputCreated(id))
            }
        };
        self.changes.push(change);
        self.connect(source, destination);
        Some(node)
    }
}

fn step_node(id: NodeId, inputs: &[&str], outputs: &[&str]) -> ModelNode {
    let ports = |side: Side, names: &[&str]| -> Vec<ModelPort> {
        names
            .iter()
            .map(|name| {
                let port = PortId::intern(name);
                ModelPort {
                    id: port,
                    connection_id: ConnectionId::new(side, id, port),
                    visible: true,
                    port_type: None,
                }
            })
            .collect()
    };
    let mut node = ModelNode::new(id, NodeKind::Step);
    node.in_ports = ports(Side::In, inputs);
    node.out_ports = ports(Side::Out, outputs);
    node
}

impl WorkflowModel for MemoryWorkflow {
    fn steps(&self) -> &[ModelNode] {
        &self.steps
    }

    fn inputs(&self) -> &[ModelNode] {
        &self.inputs
    }

    fn outputs(&self) -> &[ModelNode] {
        &self.outputs
    }

    fn connections(&self) -> &[ModelConnection] {
        &self.connections
    }

    fn find_by_id(&self, id: NodeId) -> Option<&ModelNode> {
        self.inputs
            .iter()
            .chain(&self.steps)
            .chain(&self.outputs)
            .find(|n| n.id == id)
    }

    fn custom_props_mut(&mut self, id: NodeId) -> Option<&mut Map<String, Value>> {
        self.node_mut(id).map(|n| &mut n.custom_props)
    }

    fn remove_step(&mut self, id: NodeId) {
        self.remove_node(id, NodeKind::Step);
    }

    fn remove_input(&mut self, id: NodeId) {
        self.remove_node(id, NodeKind::Input);
    }

    fn remove_output(&mut self, id: NodeId) {
        self.remove_node(id, NodeKind::Output);
    }

    fn disconnect(&mut self, source: ConnectionId, destination: ConnectionId) {
        let key = EdgeKey::normalized(source, destination);
        let before = self.connections.len();
        self.connections.retain(|c| c.key() != key);
        if self.connections.len() != before {
            self.changes.push(ModelChange::ConnectionsUpdated);
        }
    }

    fn connect(&mut self, source: ConnectionId, destination: ConnectionId) -> bool {
        let key = EdgeKey::normalized(source, destination);
        if let Some(existing) = self.connections.iter().find(|c| c.key() == key) {
            return existing.is_valid;
        }
        if self.port(&key.source).is_none() || self.port(&key.destination).is_none() {
            log::warn!("connect {} → {}: unknown port", key.source, key.destination);
            return false;
        }
        let is_valid = self.is_valid_pair(&key);
        self.connections.push(ModelConnection {
            source: key.source,
            destination: key.destination,
            visible: true,
            is_valid,
        });
        self.changes.push(ModelChange::ConnectionCreated {
            source: key.source,
            destination: key.destination,
        });
        self.changes.push(ModelChange::ConnectionsUpdated);
        is_valid
    }

    fn create_input_from_port(&mut self, port: ConnectionId) -> Option<ModelNode> {
        self.create_terminal_from_port(port, NodeKind::Input)
    }

    fn create_output_from_port(&mut self, port: ConnectionId) -> Option<ModelNode> {
        self.create_terminal_from_port(port, NodeKind::Output)
    }

    fn gather_valid_connection_points(&self, port: ConnectionId) -> Vec<ConnectionId> {
        let Some(origin) = self.port(&port) else {
            return Vec::new();
        };
        let mut points: Vec<ConnectionId> = self
            .nodes()
            .into_iter()
            .filter(|n| n.id != port.node)
            .flat_map(|n| n.connection_points())
            .filter(|p| p.connection_id.side != port.side && origin.accepts(p))
            .map(|p| p.connection_id)
            .collect();
        points.sort();
        points
    }

    fn drain_changes(&mut self) -> Vec<ModelChange> {
        std::mem::take(&mut self.changes)
    }
}

// ─── Scene construction ──────────────────────────────────────────────────

impl Node {
    /// Project a model node into a scene node. Hidden step ports are dropped.
    pub fn from_model(model: &ModelNode) -> Self {
        let node = match model.kind {
            NodeKind::Input => Node::input(model.id),
            NodeKind::Output => Node::output(model.id),
            NodeKind::Step => Node::step(
                model.id,
                model.in_ports.iter().filter(|p| p.visible).map(|p| p.id),
                model.out_ports.iter().filter(|p| p.visible).map(|p| p.id),
            ),
        };
        let mut node = node
            .with_label(model.display_label())
            .with_position(model.position().unwrap_or(Point::ZERO));
        node.visible = model.visible;
        node
    }
}

/// Build a scene holding every model node and connection.
///
/// Connections whose ports are not in the scene are logged and skipped.
pub fn build_scene<M: WorkflowModel + ?Sized>(model: &M) -> SceneGraph {
    let mut scene = SceneGraph::new();
    for node in model.nodes() {
        scene.add_node(Node::from_model(node));
    }
    for conn in model.connections() {
        let mut edge = Edge::new(conn.source, conn.destination);
        edge.visible = conn.visible;
        edge.valid = conn.is_valid;
        scene.add_edge(edge);
    }
    log::debug!(
        "built scene: {} nodes, {} edges",
        scene.node_count(),
        scene.edge_count()
    );
    scene
}

/// True when any node lacks a persisted position.
pub fn needs_arrangement<M: WorkflowModel + ?Sized>(model: &M) -> bool {
    model.nodes().iter().any(|n| n.position().is_none())
}

// ─── JSON document ───────────────────────────────────────────────────────

fn default_true() -> bool {
    true
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct WorkflowDoc {
    #[serde(default)]
    inputs: Vec<TerminalDoc>,
    #[serde(default)]
    outputs: Vec<TerminalDoc>,
    #[serde(default)]
    steps: Vec<StepDoc>,
    #[serde(default)]
    connections: Vec<ConnectionDoc>,
}

#[derive(Deserialize)]
struct TerminalDoc {
    id: NodeId,
    #[serde(default)]
    label: Option<String>,
    #[serde(default, rename = "type")]
    port_type: Option<String>,
    #[serde(default = "default_true")]
    visible: bool,
    #[serde(default, rename = "customProps")]
    custom_props: Map<String, Value>,
}

impl TerminalDoc {
    fn into_node(self, kind: NodeKind) -> ModelNode {
        let mut node = ModelNode::new(self.id, kind);
        node.label = self.label;
        node.port_type = self.port_type;
        node.visible = self.visible;
        node.custom_props = self.custom_props;
        node
    }
}

#[derive(Deserialize)]
struct StepDoc {
    id: NodeId,
    #[serde(default)]
    label: Option<String>,
    #[serde(default = "default_true")]
    visible: bool,
    #[serde(default, rename = "in")]
    in_ports: Vec<PortDoc>,
    #[serde(default, rename = "out")]
    out_ports: Vec<PortDoc>,
    #[serde(default, rename = "customProps")]
    custom_props: Map<String, Value>,
}

impl StepDoc {
    fn into_node(self) -> ModelNode {
        let id = self.id;
        let ports = |side: Side, docs: Vec<PortDoc>| -> Vec<ModelPort> {
            docs.into_iter()
                .map(|doc| {
                    let (port, port_type, visible) = match doc {
                        PortDoc::Name(port) => (port, None, true),
                        PortDoc::Full {
                            id,
                            port_type,
                            visible,
                        } => (id, port_type, visible),
                    };
                    ModelPort {
                        id: port,
                        connection_id: ConnectionId::new(side, id, port),
                        visible,
                        port_type,
                    }
                })
                .collect()
        };
        let mut node = ModelNode::new(id, NodeKind::Step);
        node.label = self.label;
        node.visible = self.visible;
        node.in_ports = ports(Side::In, self.in_ports);
        node.out_ports = ports(Side::Out, self.out_ports);
        node.custom_props = self.custom_props;
        node
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PortDoc {
    Name(PortId),
    Full {
        id: PortId,
        #[serde(default, rename = "type")]
        port_type: Option<String>,
        #[serde(default = "default_true")]
        visible: bool,
    },
}

#[derive(Deserialize)]
struct ConnectionDoc {
    source: ConnectionId,
    destination: ConnectionId,
    #[serde(default = "default_true")]
    visible: bool,
}
