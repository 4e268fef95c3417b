//! Single-element selection and its highlight rules.
//!
//! Selecting a node fades the rest of the graph and highlights every
//! connection touching it plus the nodes on their far ends. Selecting a
//! connection highlights it and its two ports without fading anything.

use wfg_core::{EdgeKey, NodeId, SceneGraph};
use wfg_render::Decorations;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Node(NodeId),
    Edge(EdgeKey),
}

impl Selection {
    /// Whether the selected element is still present in the scene.
    pub fn exists_in(&self, scene: &SceneGraph) -> bool {
        match self {
            Selection::Node(id) => scene.contains(*id),
            Selection::Edge(key) => scene.find_edge(key).is_some(),
        }
    }

    /// Write selection classes into `deco`, replacing any previous ones.
    pub fn apply(&self, scene: &SceneGraph, deco: &mut Decorations) {
        deco.clear_selection();
        match *self {
            Selection::Node(id) => {
                deco.fade = true;
                deco.selected_nodes.insert(id);
                for edge in scene.incoming(id).into_iter().chain(scene.outgoing(id)) {
                    let key = edge.key();
                    deco.highlighted_edges.insert(key);
                    deco.highlighted_nodes.insert(key.source.node);
                    deco.highlighted_nodes.insert(key.destination.node);
                }
                // A node is selected, not merely highlighted.
                deco.highlighted_nodes.remove(&id);
            }
            Selection::Edge(key) => {
                deco.selected_edges.insert(key);
                deco.highlighted_edges.insert(key);
                deco.highlighted_ports.insert(key.source);
                deco.highlighted_ports.insert(key.destination);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wfg_core::{ConnectionId, Edge, Node, PortId};

    fn cid(s: &str) -> ConnectionId {
        s.parse().unwrap()
    }

    fn scene() -> SceneGraph {
        let mut sg = SceneGraph::new();
        sg.add_node(Node::input(NodeId::intern("sel_a")));
        sg.add_node(Node::step(
            NodeId::intern("sel_b"),
            [PortId::intern("i")],
            [PortId::intern("o")],
        ));
        sg.add_node(Node::output(NodeId::intern("sel_c")));
        sg.add_node(Node::output(NodeId::intern("sel_far")));
        sg.add_edge(Edge::new(cid("out/sel_a/sel_a"), cid("in/sel_b/i")));
        sg.add_edge(Edge::new(cid("out/sel_b/o"), cid("in/sel_c/sel_c")));
        sg
    }

    #[test]
    fn node_selection_highlights_neighbourhood() {
        let sg = scene();
        let mut deco = Decorations::new();
        Selection::Node(NodeId::intern("sel_b")).apply(&sg, &mut deco);

        assert!(deco.fade);
        assert!(deco.selected_nodes.contains(&NodeId::intern("sel_b")));
        assert_eq!(deco.highlighted_edges.len(), 2);
        assert!(deco.highlighted_nodes.contains(&NodeId::intern("sel_a")));
        assert!(deco.highlighted_nodes.contains(&NodeId::intern("sel_c")));
        assert!(deco.is_faded_node(NodeId::intern("sel_far")));
        assert!(!deco.is_faded_node(NodeId::intern("sel_a")));
    }

    #[test]
    fn edge_selection_highlights_ports_without_fade() {
        let sg = scene();
        let key = EdgeKey::normalized(cid("in/sel_b/i"), cid("out/sel_a/sel_a"));
        let mut deco = Decorations::new();
        Selection::Edge(key).apply(&sg, &mut deco);

        assert!(!deco.fade);
        assert!(deco.selected_edges.contains(&key));
        assert!(deco.highlighted_ports.contains(&cid("out/sel_a/sel_a")));
        assert!(deco.highlighted_ports.contains(&cid("in/sel_b/i")));
        assert!(deco.selected_nodes.is_empty());
    }

    #[test]
    fn reapplying_replaces_previous_classes() {
        let sg = scene();
        let mut deco = Decorations::new();
        Selection::Node(NodeId::intern("sel_b")).apply(&sg, &mut deco);
        Selection::Node(NodeId::intern("sel_far")).apply(&sg, &mut deco);
        assert_eq!(deco.selected_nodes.len(), 1);
        assert!(deco.highlighted_edges.is_empty());
    }

    #[test]
    fn stale_selection_is_detected() {
        let mut sg = scene();
        let sel = Selection::Node(NodeId::intern("sel_c"));
        assert!(sel.exists_in(&sg));
        sg.remove_node(NodeId::intern("sel_c"));
        assert!(!sel.exists_in(&sg));
    }
}
