//! Model → scene synchronisation.
//!
//! The scene is rebuilt from the workflow model on load and patched
//! incrementally as the model reports changes, so a single notification
//! never forces a full rebuild:
//!
//! - **Nodes**: created nodes are projected with `Node::from_model`, removed
//!   ones dropped with their connections, relabelled steps updated in place.
//! - **Connections**: a created connection is added on its own; a general
//!   "connections updated" replaces the edge set from the model.

use std::collections::BTreeMap;
use wfg_core::kurbo::Point;
use wfg_core::{Edge, EdgeKey, ModelChange, Node, NodeId, SceneGraph, WorkflowModel};

/// Apply model notifications to the scene.
pub fn apply_changes<M: WorkflowModel + ?Sized>(
    scene: &mut SceneGraph,
    model: &M,
    changes: &[ModelChange],
) {
    for change in changes {
        match change {
            ModelChange::StepLabelChanged(id) => {
                let label = model.find_by_id(*id).map(|n| n.display_label().to_string());
                match (scene.get_by_id_mut(*id), label) {
                    (Some(node), Some(label)) => node.label = label,
                    _ => log::warn!("label change for unknown node {id}"),
                }
            }
            ModelChange::StepCreated(id)
            | ModelChange::InputCreated(id)
            | ModelChange::OutputCreated(id) => match model.find_by_id(*id) {
                Some(node) => {
                    scene.add_node(Node::from_model(node));
                }
                None => log::warn!("created node {id} is not in the model"),
            },
            ModelChange::NodeRemoved(id) => {
                if scene.remove_node(*id).is_none() {
                    log::warn!("removed node {id} was not in the scene");
                }
            }
            ModelChange::ConnectionCreated {
                source,
                destination,
            } => {
                add_model_edge(scene, model, EdgeKey::normalized(*source, *destination));
            }
            ModelChange::ConnectionsUpdated => rebuild_edges(scene, model),
        }
    }
    log::debug!(
        "applied {} model changes: {} nodes, {} edges",
        changes.len(),
        scene.node_count(),
        scene.edge_count()
    );
}

/// Replace every scene edge with the model's current connections.
pub fn rebuild_edges<M: WorkflowModel + ?Sized>(scene: &mut SceneGraph, model: &M) {
    scene.clear_edges();
    for conn in model.connections() {
        let mut edge = Edge::new(conn.source, conn.destination);
        edge.visible = conn.visible;
        edge.valid = conn.is_valid;
        scene.add_edge(edge);
    }
}

fn add_model_edge<M: WorkflowModel + ?Sized>(scene: &mut SceneGraph, model: &M, key: EdgeKey) {
    let Some(conn) = model.connections().iter().find(|c| c.key() == key) else {
        log::warn!("created connection {} → {} is not in the model", key.source, key.destination);
        return;
    };
    let mut edge = Edge::new(conn.source, conn.destination);
    edge.visible = conn.visible;
    edge.valid = conn.is_valid;
    scene.add_edge(edge);
}

/// Write arranged positions to both the scene and the model.
pub fn commit_positions<M: WorkflowModel + ?Sized>(
    scene: &mut SceneGraph,
    model: &mut M,
    positions: &BTreeMap<NodeId, Point>,
) {
    for (id, position) in positions {
        if let Some(node) = scene.get_by_id_mut(*id) {
            node.position = *position;
        }
        if !model.set_position(*id, *position) {
            log::warn!("cannot persist position of {id}: not in the model");
        }
    }
}
