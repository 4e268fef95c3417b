//! Layered arrangement of workflow graphs.
//!
//! Connected nodes are placed in columns by longest-path depth, so every
//! connection points from a lower column to a strictly higher one. Workflow
//! inputs are pulled to the column just left of their earliest consumer.
//! Nodes without any connection are packed into a wrapping grid beneath the
//! connected layout.
//!
//! The result is deterministic: identical input yields identical positions,
//! independent of node or connection order.

use crate::id::NodeId;
use crate::model::{EdgeKey, NodeKind, SceneGraph};
use kurbo::{Point, Rect};
use petgraph::Direction;
use petgraph::graphmap::DiGraphMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Spacing used by the arrangement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Vertical gap between nodes stacked in one column.
    pub node_margin: f64,
    /// Horizontal gap between columns.
    pub column_gap: f64,
    /// Gap between dangling nodes, and between the grid and the connected layout.
    pub dangling_margin: f64,
    /// Dangling rows never wrap before reaching this width.
    pub min_dangling_row_width: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_margin: 30.0,
            column_gap: 60.0,
            dangling_margin: 50.0,
            min_dangling_row_width: 600.0,
        }
    }
}

/// What the arrangement needs to know about a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutNode {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Bounding box relative to the node position.
    pub bounds: Rect,
}

/// Computed placement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arrangement {
    /// New center position of every arranged node.
    pub positions: BTreeMap<NodeId, Point>,
    /// Column index of every connected node (leftmost is 0).
    pub columns: BTreeMap<NodeId, usize>,
    /// Nodes placed by the wrap-grid pass, in placement order.
    pub dangling: Vec<NodeId>,
}

impl Arrangement {
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn column(&self, id: NodeId) -> Option<usize> {
        self.columns.get(&id).copied()
    }

    /// Connected nodes grouped by column, each column in placement order.
    pub fn column_groups(&self) -> Vec<Vec<NodeId>> {
        let mut groups: BTreeMap<usize, Vec<NodeId>> = BTreeMap::new();
        for (id, col) in &self.columns {
            groups.entry(*col).or_default().push(*id);
        }
        groups
            .into_values()
            .map(|mut ids| {
                ids.sort_by(|a, b| b.cmp(a));
                ids
            })
            .collect()
    }
}

/// Arrange the visible nodes of a scene along its visible connections.
pub fn arrange_scene(scene: &SceneGraph, config: &LayoutConfig) -> Arrangement {
    let nodes: Vec<LayoutNode> = scene
        .nodes()
        .filter(|n| n.visible)
        .map(|n| LayoutNode {
            id: n.id,
            kind: n.kind,
            bounds: n.local_bounds(),
        })
        .collect();
    let edges: Vec<EdgeKey> = scene
        .edges()
        .filter(|e| e.visible)
        .map(|e| e.key())
        .collect();
    arrange(&nodes, &edges, config)
}

/// Compute positions for `nodes` given the connections between them.
///
/// Connections touching a node not in `nodes` are ignored.
pub fn arrange(nodes: &[LayoutNode], connections: &[EdgeKey], config: &LayoutConfig) -> Arrangement {
    if nodes.is_empty() {
        return Arrangement::default();
    }
    let by_id: HashMap<NodeId, &LayoutNode> = nodes.iter().map(|n| (n.id, n)).collect();

    // Sorted so adjacency order, and therefore traversal order, is stable.
    let mut sorted: Vec<&EdgeKey> = connections.iter().collect();
    sorted.sort();

    let mut graph: DiGraphMap<NodeId, ()> = DiGraphMap::new();
    let mut terminal_sources: HashSet<NodeId> = HashSet::new();
    for key in sorted {
        let (from, to) = (key.source.node, key.destination.node);
        if !by_id.contains_key(&from) || !by_id.contains_key(&to) {
            log::warn!(
                "arrange: skipping connection {} → {} to an unknown node",
                key.source,
                key.destination
            );
            continue;
        }
        if key.source.is_terminal() {
            terminal_sources.insert(from);
        }
        graph.add_edge(from, to, ());
    }

    let connected: BTreeSet<NodeId> = graph.nodes().collect();
    let mut dangling: Vec<&LayoutNode> = nodes
        .iter()
        .filter(|n| !connected.contains(&n.id))
        .collect();

    let columns = assign_columns(&graph, &connected, |id| {
        terminal_sources.contains(&id)
            || by_id.get(&id).is_some_and(|n| n.kind == NodeKind::Input)
    });

    let mut arrangement = Arrangement {
        columns,
        ..Default::default()
    };
    let extent = place_columns(&arrangement.columns, &by_id, config, &mut arrangement.positions);

    dangling.sort_by(|a, b| {
        dangling_rank(a.kind)
            .cmp(&dangling_rank(b.kind))
            .then_with(|| a.id.cmp(&b.id))
    });
    place_dangling(&dangling, extent, config, &mut arrangement.positions);
    arrangement.dangling = dangling.iter().map(|n| n.id).collect();

    log::debug!(
        "arranged {} nodes: {} columns, {} dangling",
        arrangement.positions.len(),
        arrangement.columns.values().max().map_or(0, |c| c + 1),
        arrangement.dangling.len()
    );
    arrangement
}

// ─── Columns ─────────────────────────────────────────────────────────────

fn assign_columns(
    graph: &DiGraphMap<NodeId, ()>,
    connected: &BTreeSet<NodeId>,
    is_input: impl Fn(NodeId) -> bool,
) -> BTreeMap<NodeId, usize> {
    let mut memo: HashMap<NodeId, usize> = HashMap::new();
    let mut raw: BTreeMap<NodeId, i64> = BTreeMap::new();
    for &id in connected {
        let mut on_path = HashSet::new();
        let depth = longest_path(graph, id, &mut memo, &mut on_path);
        raw.insert(id, depth as i64 - 1);
    }

    // Inputs sit one column left of their earliest consumer.
    let overrides: Vec<(NodeId, i64)> = raw
        .keys()
        .filter(|id| is_input(**id))
        .filter_map(|&id| {
            graph
                .neighbors_directed(id, Direction::Outgoing)
                .filter_map(|consumer| raw.get(&consumer).copied())
                .min()
                .map(|min| (id, min - 1))
        })
        .collect();
    for (id, col) in overrides {
        raw.insert(id, col);
    }

    let base = raw.values().copied().min().unwrap_or(0);
    raw.into_iter()
        .map(|(id, col)| (id, (col - base) as usize))
        .collect()
}

/// Number of nodes on the longest path ending at `node`.
///
/// A node already on the current path contributes 0, so cycles terminate.
fn longest_path(
    graph: &DiGraphMap<NodeId, ()>,
    node: NodeId,
    memo: &mut HashMap<NodeId, usize>,
    on_path: &mut HashSet<NodeId>,
) -> usize {
    if let Some(&depth) = memo.get(&node) {
        return depth;
    }
    if !on_path.insert(node) {
        return 0;
    }
    let mut best = 0;
    for pred in graph.neighbors_directed(node, Direction::Incoming) {
        best = best.max(longest_path(graph, pred, memo, on_path));
    }
    on_path.remove(&node);
    memo.insert(node, best + 1);
    best + 1
}

/// Lay columns out left to right, each centered on y = 0.
/// Returns the occupied extent (`None` when no node is connected).
fn place_columns(
    columns: &BTreeMap<NodeId, usize>,
    by_id: &HashMap<NodeId, &LayoutNode>,
    config: &LayoutConfig,
    positions: &mut BTreeMap<NodeId, Point>,
) -> Option<Rect> {
    let mut groups: BTreeMap<usize, Vec<&LayoutNode>> = BTreeMap::new();
    for (id, col) in columns {
        if let Some(node) = by_id.get(id) {
            groups.entry(*col).or_default().push(node);
        }
    }

    let mut x = 0.0;
    let mut extent: Option<Rect> = None;
    for column in groups.values_mut() {
        column.sort_by(|a, b| b.id.cmp(&a.id));

        let width = column
            .iter()
            .map(|n| n.bounds.width())
            .fold(0.0_f64, f64::max);
        let height: f64 = column.iter().map(|n| n.bounds.height()).sum::<f64>()
            + config.node_margin * (column.len() - 1) as f64;

        let mut y = -height / 2.0;
        for node in column.iter() {
            let center_x = x + width / 2.0 - node.bounds.center().x;
            let position = Point::new(center_x, y - node.bounds.y0);
            positions.insert(node.id, position);
            y += node.bounds.height() + config.node_margin;
        }

        let column_rect = Rect::new(x, -height / 2.0, x + width, height / 2.0);
        extent = Some(extent.map_or(column_rect, |r| r.union(column_rect)));
        x += width + config.column_gap;
    }
    extent
}

// ─── Dangling grid ───────────────────────────────────────────────────────

fn dangling_rank(kind: NodeKind) -> u8 {
    match kind {
        NodeKind::Input => 0,
        NodeKind::Step => 1,
        NodeKind::Output => 2,
    }
}

fn place_dangling(
    nodes: &[&LayoutNode],
    connected: Option<Rect>,
    config: &LayoutConfig,
    positions: &mut BTreeMap<NodeId, Point>,
) {
    let (left, mut top, connected_width) = match connected {
        Some(r) => (r.x0, r.y1 + config.dangling_margin, r.width()),
        None => (0.0, 0.0, 0.0),
    };
    let row_limit = connected_width.max(config.min_dangling_row_width);

    let mut x = 0.0;
    let mut row_height = 0.0_f64;
    for node in nodes {
        let w = node.bounds.width();
        if x > 0.0 && x + w > row_limit {
            top += row_height + config.dangling_margin;
            x = 0.0;
            row_height = 0.0;
        }
        let position = Point::new(left + x - node.bounds.x0, top - node.bounds.y0);
        positions.insert(node.id, position);
        x += w + config.dangling_margin;
        row_height = row_height.max(node.bounds.height());
    }
}
