//! Coordinate frames and affine transforms.
//!
//! Every rendered element has an accumulated "screen CTM": the affine that
//! maps its local coordinates to viewport pixels. Frames nest as
//! canvas root → workflow group (view transform) → node (translate) → port
//! (rotate/translate around the node outline).

use crate::model::{ConnectionId, SceneGraph};
use crate::id::NodeId;
use kurbo::{Affine, Point, Vec2};
use thiserror::Error;

/// Base radius of a node outline.
pub const NODE_RADIUS: f64 = 40.0;
/// Radius of a port circle.
pub const PORT_RADIUS: f64 = 7.0;
/// Distance from the outline to the label baseline.
pub const LABEL_OFFSET: f64 = 30.0;
/// Line height used for label bounding boxes.
pub const LABEL_HEIGHT: f64 = 20.0;
/// Estimated advance per label character.
pub const LABEL_CHAR_WIDTH: f64 = 8.0;

/// Arc (degrees) over which one side's ports are spread.
const PORT_ARC: f64 = 140.0;
/// Port counts beyond which the outline stops growing.
const CROWD_START: usize = 6;
const CROWD_LIMIT: usize = 20;
const CROWD_GROWTH: f64 = 1.08;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("element is not attached to the canvas")]
    Detached,
}

/// Euclidean distance.
pub fn distance(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    ((x1 - x2).powi(2) + (y1 - y2).powi(2)).sqrt()
}

/// Angle of the `i`-th of `n` output ports, fanned over the right arc.
pub fn output_port_angle(i: usize, n: usize) -> f64 {
    -PORT_ARC / 2.0 + (i + 1) as f64 * PORT_ARC / (n + 1) as f64
}

/// Angle of the `i`-th of `n` input ports, mirrored onto the left arc.
pub fn input_port_angle(i: usize, n: usize) -> f64 {
    180.0 + PORT_ARC / 2.0 - (i + 1) as f64 * PORT_ARC / (n + 1) as f64
}

/// Outline radius for a node whose busiest side has `ports` ports.
pub fn radius_for_port_count(ports: usize) -> f64 {
    let extra = ports.clamp(CROWD_START, CROWD_LIMIT) - CROWD_START;
    NODE_RADIUS * CROWD_GROWTH.powi(extra as i32)
}

/// Local transform of a port: rotate onto the outline, then undo the
/// rotation so port glyphs stay upright.
pub fn port_local_transform(angle_deg: f64, radius: f64) -> Affine {
    let a = angle_deg.to_radians();
    Affine::rotate(a) * Affine::translate((radius, 0.0)) * Affine::rotate(-a)
}

/// Rough label width; labels are laid out without font metrics.
pub fn label_width(label: &str) -> f64 {
    label.chars().count() as f64 * LABEL_CHAR_WIDTH
}

// ─── Element frames ──────────────────────────────────────────────────────

/// A rendered element whose coordinate frame can be queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementRef {
    /// The root canvas; its frame is the screen.
    Canvas,
    /// The group holding the whole graph; carries the view transform.
    Workflow,
    Node(NodeId),
    Port(ConnectionId),
}

/// Accumulated screen transform of an element under the given view transform.
pub fn element_ctm(
    scene: &SceneGraph,
    view: Affine,
    element: ElementRef,
) -> Result<Affine, GeometryError> {
    match element {
        ElementRef::Canvas => Ok(Affine::IDENTITY),
        ElementRef::Workflow => Ok(view),
        ElementRef::Node(id) => {
            let node = scene.get_by_id(id).ok_or(GeometryError::Detached)?;
            Ok(view * Affine::translate(node.position.to_vec2()))
        }
        ElementRef::Port(cid) => {
            let node = scene.get_by_id(cid.node).ok_or(GeometryError::Detached)?;
            let port = node.port(&cid).ok_or(GeometryError::Detached)?;
            Ok(view
                * Affine::translate(node.position.to_vec2())
                * port_local_transform(port.angle, node.radius))
        }
    }
}

/// Matrix mapping `from`'s local frame into `to`'s frame.
///
/// Both frames are resolved to screen space and composed as
/// `inverse(ctm(to)) · ctm(from)`, so any common ancestor (including the
/// canvas root) cancels out. Fails with [`GeometryError::Detached`] if
/// either element is not in the scene.
pub fn transform_to_element(
    scene: &SceneGraph,
    view: Affine,
    from: ElementRef,
    to: ElementRef,
) -> Result<Affine, GeometryError> {
    let from = element_ctm(scene, view, from)?;
    let to = element_ctm(scene, view, to)?;
    Ok(to.inverse() * from)
}

/// Map a pointer position in viewport pixels into untransformed graph space.
pub fn screen_to_canvas(view: Affine, screen: Point) -> Point {
    view.inverse() * screen
}

/// Map a graph-space point to viewport pixels.
pub fn canvas_to_screen(view: Affine, canvas: Point) -> Point {
    view * canvas
}

/// Convert a screen-space delta to graph space (ignores translation).
pub fn screen_delta_to_canvas(scale: f64, delta: Vec2) -> Vec2 {
    delta / scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::PortId;
    use crate::model::Node;

    fn approx(a: Point, b: Point) -> bool {
        (a - b).hypot() < 1e-9
    }

    #[test]
    fn distance_is_euclidean() {
        assert_eq!(distance(0.0, 0.0, 3.0, 4.0), 5.0);
        assert_eq!(distance(1.0, 1.0, 1.0, 1.0), 0.0);
    }

    #[test]
    fn port_angles_fan_symmetrically() {
        assert_eq!(output_port_angle(0, 1), 0.0);
        assert_eq!(input_port_angle(0, 1), 180.0);
        // Two outputs at ±23.33°.
        let a = output_port_angle(0, 2);
        let b = output_port_angle(1, 2);
        assert!((a + b).abs() < 1e-9, "outputs should mirror around 0°");
        assert!(a < b);
    }

    #[test]
    fn crowded_nodes_grow() {
        assert_eq!(radius_for_port_count(0), NODE_RADIUS);
        assert_eq!(radius_for_port_count(6), NODE_RADIUS);
        assert!(radius_for_port_count(7) > NODE_RADIUS);
        assert_eq!(radius_for_port_count(20), radius_for_port_count(50));
    }

    #[test]
    fn port_transform_keeps_glyphs_upright() {
        let t = port_local_transform(90.0, 40.0);
        assert!(approx(t * Point::ZERO, Point::new(0.0, 40.0)));
        // Local x axis still points right after the round trip.
        let x_axis = t * Point::new(1.0, 0.0) - t * Point::ZERO;
        assert!((x_axis.x - 1.0).abs() < 1e-9 && x_axis.y.abs() < 1e-9);
    }

    #[test]
    fn screen_to_canvas_inverts_view() {
        let view = Affine::translate((100.0, 50.0)) * Affine::scale(2.0);
        let p = screen_to_canvas(view, Point::new(120.0, 70.0));
        assert!(approx(p, Point::new(10.0, 10.0)));
        assert!(approx(canvas_to_screen(view, p), Point::new(120.0, 70.0)));
    }

    #[test]
    fn transform_between_node_and_port() {
        let mut scene = SceneGraph::new();
        let id = NodeId::intern("geo_step");
        scene.add_node(
            Node::step(id, Vec::<PortId>::new(), [PortId::intern("o")])
                .with_position(Point::new(200.0, 100.0)),
        );
        let cid: ConnectionId = "out/geo_step/o".parse().unwrap();
        let view = Affine::translate((10.0, 20.0)) * Affine::scale(0.5);

        // Port origin expressed in its node's frame is the port offset.
        let m = transform_to_element(&scene, view, ElementRef::Port(cid), ElementRef::Node(id))
            .unwrap();
        assert!(approx(m * Point::ZERO, Point::new(NODE_RADIUS, 0.0)));

        // Into the canvas root the view transform applies.
        let m = transform_to_element(&scene, view, ElementRef::Port(cid), ElementRef::Canvas)
            .unwrap();
        let expected = view * Point::new(200.0 + NODE_RADIUS, 100.0);
        assert!(approx(m * Point::ZERO, expected));
    }

    #[test]
    fn detached_elements_fail() {
        let scene = SceneGraph::new();
        let err = transform_to_element(
            &scene,
            Affine::IDENTITY,
            ElementRef::Node(NodeId::intern("nowhere")),
            ElementRef::Canvas,
        );
        assert_eq!(err, Err(GeometryError::Detached));
    }
}
