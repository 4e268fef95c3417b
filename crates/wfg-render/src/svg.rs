//! SVG projection of the scene graph.
//!
//! Produces a standalone `<svg>` document: one `workflow` group carrying the
//! view transform, edges painted below nodes, then the transient drag
//! visuals and the edge tooltip.

use crate::decorations::{Decorations, Ghost};
use std::fmt::Write;
use wfg_core::geometry::{LABEL_OFFSET, NODE_RADIUS, PORT_RADIUS, port_local_transform};
use wfg_core::kurbo::{Affine, Size};
use wfg_core::{ConnectionPath, Edge, Node, NodeKind, Port, SceneGraph, Side, ViewTransform};

const INNER_RATIO: f64 = 0.75;

pub fn render_svg(
    scene: &SceneGraph,
    view: &ViewTransform,
    deco: &Decorations,
    size: Size,
) -> String {
    let mut svg = String::new();
    let mut root_class = String::from("cwl-workflow");
    if deco.editing_enabled {
        root_class.push_str(" __edit-mode");
    }
    if deco.dragging_port.is_some() || deco.dragging_node.is_some() {
        root_class.push_str(" __dragging");
    }
    let _ = writeln!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" class=\"{root_class}\" width=\"{}\" height=\"{}\" viewBox=\"0 0 {} {}\">",
        size.width, size.height, size.width, size.height
    );
    svg.push_str("<style>\n");
    svg.push_str("  text { font-family: Inter, system-ui, sans-serif; }\n");
    svg.push_str("  .fade { opacity: 0.3; }\n");
    svg.push_str("  .edge.invalid .inner { stroke: #E04A4A; }\n");
    svg.push_str("</style>\n");

    let _ = writeln!(
        svg,
        "<g class=\"workflow\" transform=\"{}\">",
        matrix(view.to_affine())
    );

    svg.push_str("<g class=\"edges\">\n");
    // Highlighted connections paint last so they sit above the rest.
    let (highlighted, plain): (Vec<&Edge>, Vec<&Edge>) = scene
        .edges()
        .filter(|e| e.visible)
        .partition(|e| deco.highlighted_edges.contains(&e.key()));
    for edge in plain.into_iter().chain(highlighted) {
        render_edge(&mut svg, scene, edge, deco);
    }
    svg.push_str("</g>\n");

    let label_scale = view.label_scale();
    svg.push_str("<g class=\"nodes\">\n");
    for node in scene.nodes().filter(|n| n.visible) {
        render_node(&mut svg, node, deco, label_scale);
    }
    svg.push_str("</g>\n");

    if let Some(path) = &deco.floating_edge {
        let _ = writeln!(
            svg,
            "<g class=\"edge __dragging\"><path class=\"sub-edge inner\" d=\"{path}\" /></g>"
        );
    }
    if let Some(ghost) = &deco.ghost {
        render_ghost(&mut svg, ghost);
    }
    if let Some(tip) = &deco.tooltip {
        let t = Affine::translate(tip.position.to_vec2()) * Affine::scale(label_scale);
        let _ = writeln!(
            svg,
            "<text class=\"label edge-tooltip\" text-anchor=\"middle\" transform=\"{}\">{}</text>",
            matrix(t),
            escape(&tip.text)
        );
    }
    svg.push_str("</g>\n");
    svg.push_str("</svg>");
    log::trace!("render_svg: {} bytes", svg.len());
    svg
}

fn render_edge(out: &mut String, scene: &SceneGraph, edge: &Edge, deco: &Decorations) {
    let key = edge.key();
    let path: ConnectionPath = match deco.edge_paths.get(&key).copied() {
        Some(p) => p,
        None => match scene.edge_path(edge) {
            Some(p) => p,
            None => {
                log::warn!(
                    "edge {} → {}: port not rendered, skipping",
                    edge.source,
                    edge.destination
                );
                return;
            }
        },
    };

    let mut class = String::from("edge");
    if deco.selected_edges.contains(&key) {
        class.push_str(" selected");
    }
    if deco.highlighted_edges.contains(&key) {
        class.push_str(" highlighted");
    }
    if deco.is_faded_edge(&key) {
        class.push_str(" fade");
    }
    if deco.invalid_edges.contains(&key) {
        class.push_str(" invalid");
    }

    let _ = writeln!(
        out,
        "  <g class=\"{class}\" data-source-connection=\"{}\" data-destination-connection=\"{}\">\
<path class=\"sub-edge outer\" d=\"{path}\" /><path class=\"sub-edge inner\" d=\"{path}\" /></g>",
        edge.source, edge.destination
    );
}

fn render_node(out: &mut String, node: &Node, deco: &Decorations, label_scale: f64) {
    let mut class = format!("node {}", node.kind.class_name());
    if deco.selected_nodes.contains(&node.id) {
        class.push_str(" selected");
    }
    if deco.highlighted_nodes.contains(&node.id) {
        class.push_str(" highlighted");
    }
    if deco.is_faded_node(node.id) {
        class.push_str(" fade");
    }
    if deco.dragging_node == Some(node.id) {
        class.push_str(" __dragging");
    }

    let _ = writeln!(
        out,
        "  <g class=\"{class}\" data-id=\"{}\" transform=\"translate({} {})\">",
        escape(node.id.as_str()),
        node.position.x,
        node.position.y
    );

    let core_scale = node.radius / NODE_RADIUS;
    let _ = writeln!(
        out,
        "    <g class=\"core\" transform=\"scale({core_scale})\">\
<circle class=\"outer\" r=\"{}\" /><circle class=\"inner\" r=\"{}\" /></g>",
        NODE_RADIUS,
        NODE_RADIUS * INNER_RATIO
    );

    for port in node.ports() {
        render_port(out, node, port, deco, label_scale);
    }

    let label = Affine::translate((0.0, node.radius + LABEL_OFFSET)) * Affine::scale(label_scale);
    let _ = writeln!(
        out,
        "    <text class=\"title label\" text-anchor=\"middle\" transform=\"{}\">{}</text>",
        matrix(label),
        escape(&node.label)
    );
    out.push_str("  </g>\n");
}

fn render_port(out: &mut String, node: &Node, port: &Port, deco: &Decorations, label_scale: f64) {
    let cid = port.connection_id;
    let mut class = match port.side() {
        Side::In => String::from("port input-port"),
        Side::Out => String::from("port output-port"),
    };
    if deco.highlighted_ports.contains(&cid) {
        class.push_str(" highlighted");
    }
    if deco.suggested_ports.contains(&cid) {
        class.push_str(" __port-drag-suggestion");
    }
    if deco.snapped_port == Some(cid) {
        class.push_str(" __port-drag-snap");
    }
    if deco.dragging_port == Some(cid) {
        class.push_str(" __port-drag-origin");
    }

    let _ = write!(
        out,
        "    <g class=\"{class}\" data-connection-id=\"{}\" data-port-id=\"{}\" transform=\"{}\">\
<circle class=\"port-handle\" r=\"{PORT_RADIUS}\" />",
        escape(&cid.to_string()),
        escape(port.id.as_str()),
        matrix(port_local_transform(port.angle, node.radius))
    );
    // Terminal nodes are labelled by their title only.
    if node.kind == NodeKind::Step {
        let (dx, anchor) = match port.side() {
            Side::In => (-(PORT_RADIUS + 4.0), "end"),
            Side::Out => (PORT_RADIUS + 4.0, "start"),
        };
        let t = Affine::translate((dx, 0.0)) * Affine::scale(label_scale);
        let _ = write!(
            out,
            "<text class=\"label\" text-anchor=\"{anchor}\" transform=\"{}\">{}</text>",
            matrix(t),
            escape(port.id.as_str())
        );
    }
    out.push_str("</g>\n");
}

fn render_ghost(out: &mut String, ghost: &Ghost) {
    let _ = writeln!(
        out,
        "<g class=\"ghost node {}\" transform=\"translate({} {})\"><circle class=\"ghost-circle\" r=\"{}\" /></g>",
        ghost.kind.class_name(),
        ghost.position.x,
        ghost.position.y,
        NODE_RADIUS * INNER_RATIO
    );
}

fn matrix(t: Affine) -> String {
    let [a, b, c, d, e, f] = t.as_coeffs();
    format!("matrix({a} {b} {c} {d} {e} {f})")
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
