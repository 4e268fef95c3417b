//! Integration tests: interactive canvas (wfg-editor ↔ wfg-core).
//!
//! Drives a `WorkflowCanvas` with raw pointer and keyboard input and checks
//! the resulting model, scene, and bus traffic. Pointer positions are derived
//! from the live view transform so the tests do not depend on the fit.

use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use wfg_core::kurbo::{ParamCurve, Point, Size, Vec2};
use wfg_core::{ConnectionId, EdgeKey, MemoryWorkflow, NodeId, WorkflowModel};
use wfg_editor::{
    CanvasConfig, CanvasError, EventKind, GraphChange, GraphEvent, InputEvent, Modifiers,
    Selection, WorkflowCanvas,
};

const VIEWPORT: Size = Size::new(1600.0, 1000.0);

type Canvas = WorkflowCanvas<MemoryWorkflow>;
type Recorded = Rc<RefCell<Vec<GraphEvent>>>;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn workflow() -> MemoryWorkflow {
    MemoryWorkflow::from_json(include_str!("fixtures/alignment.json")).unwrap()
}

fn make_canvas() -> Canvas {
    init();
    WorkflowCanvas::new(workflow(), CanvasConfig::default(), VIEWPORT)
}

fn id(s: &str) -> NodeId {
    NodeId::intern(s)
}

fn cid(s: &str) -> ConnectionId {
    s.parse().unwrap()
}

fn close(a: Point, b: Point) -> bool {
    (a - b).hypot() < 1e-6
}

fn record(canvas: &mut Canvas, kinds: &[EventKind]) -> Recorded {
    let log: Recorded = Rc::new(RefCell::new(Vec::new()));
    for kind in kinds {
        let sink = Rc::clone(&log);
        canvas
            .bus_mut()
            .on(*kind, move |event| sink.borrow_mut().push(event.clone()));
    }
    log
}

fn node_screen(canvas: &Canvas, node: &str) -> Point {
    let position = canvas.scene().get_by_id(id(node)).unwrap().position;
    canvas.view().canvas_to_screen(position)
}

fn port_screen(canvas: &Canvas, port: &str) -> Point {
    let anchor = canvas.scene().port_anchor(&cid(port)).unwrap();
    canvas.view().canvas_to_screen(anchor)
}

fn edge_midpoint_screen(canvas: &Canvas, key: &EdgeKey) -> Point {
    let edge = canvas.scene().edge(key).unwrap();
    let mid = canvas.scene().edge_path(edge).unwrap().to_cubic().eval(0.5);
    canvas.view().canvas_to_screen(mid)
}

fn click(canvas: &mut Canvas, at: Point) {
    canvas.handle_input(&InputEvent::down(at.x, at.y));
    canvas.handle_input(&InputEvent::up(at.x, at.y));
}

/// Press at `from`, cross the drag threshold, and land on `to`.
fn drag_to(canvas: &mut Canvas, from: Point, to: Point) {
    canvas.handle_input(&InputEvent::down(from.x, from.y));
    canvas.handle_input(&InputEvent::moved(from.x + 1.0, from.y));
    canvas.handle_input(&InputEvent::moved(from.x + 2.0, from.y));
    canvas.handle_input(&InputEvent::moved(to.x, to.y));
}

fn drag(canvas: &mut Canvas, from: Point, to: Point) {
    drag_to(canvas, from, to);
    canvas.handle_input(&InputEvent::up(to.x, to.y));
}

fn background(canvas: &Canvas) -> Point {
    canvas.view().canvas_to_screen(Point::new(125.0, 300.0))
}

// ─── Loading ─────────────────────────────────────────────────────────────

#[test]
fn positioned_workflow_is_fitted_not_arranged() {
    let canvas = make_canvas();
    assert_eq!(canvas.scene().node_count(), 5);
    assert_eq!(canvas.scene().edge_count(), 3);
    assert_eq!(
        canvas.scene().get_by_id(id("align")).unwrap().position,
        Point::new(250.0, 100.0)
    );
    assert!(canvas.is_arrange_needed());

    // The graph center sits at the viewport center.
    let bounds = canvas.scene().bounds().unwrap();
    let center = canvas.view().canvas_to_screen(bounds.center());
    assert!(close(center, Point::new(800.0, 500.0)));
    assert!(canvas.view().scale <= 1.0);
}

#[test]
fn unpositioned_workflow_is_arranged_on_load() {
    init();
    let wf = MemoryWorkflow::new()
        .with_input("ld_reads")
        .with_step("ld_align", &["reads"], &["bam"])
        .with_output("ld_bam")
        .with_connection(cid("out/ld_reads/ld_reads"), cid("in/ld_align/reads"))
        .with_connection(cid("out/ld_align/bam"), cid("in/ld_bam/ld_bam"));
    let mut canvas = WorkflowCanvas::new(wf, CanvasConfig::default(), VIEWPORT);

    assert!(!canvas.is_arrange_needed());
    let x = |n: &str| canvas.model().position(id(n)).unwrap().x;
    assert!(x("ld_reads") < x("ld_align"));
    assert!(x("ld_align") < x("ld_bam"));
    assert_eq!(canvas.arrange(), Err(CanvasError::ArrangeNotNeeded));
}

// ─── Node drag ───────────────────────────────────────────────────────────

#[test]
fn node_drag_moves_by_screen_delta_over_scale() {
    let mut canvas = make_canvas();
    let grab = node_screen(&canvas, "align");
    // Zoom in around the node so it stays under the pointer.
    assert_eq!(canvas.scale_at_point(2.0, grab.x, grab.y), 2.0);
    let grab = node_screen(&canvas, "align");

    let incoming = EdgeKey::normalized(cid("out/reads/reads"), cid("in/align/reads"));
    let outgoing = EdgeKey::normalized(cid("out/align/bam"), cid("in/aligned/aligned"));
    let path = |c: &Canvas, key: &EdgeKey| c.scene().edge_path(c.scene().edge(key).unwrap()).unwrap();
    let incoming_before = path(&canvas, &incoming);
    let outgoing_before = path(&canvas, &outgoing);
    let events = record(&mut canvas, &[EventKind::BeforeChange, EventKind::AfterChange]);

    drag_to(&mut canvas, grab, grab + Vec2::new(40.0, 20.0));

    // Mid-drag: only the dragged end of each attached edge follows.
    let shift = Vec2::new(20.0, 10.0);
    let live = &canvas.decorations().edge_paths;
    assert!(close(live[&incoming].start, incoming_before.start));
    assert!(close(live[&incoming].end, incoming_before.end + shift));
    assert!(close(live[&outgoing].start, outgoing_before.start + shift));
    assert!(close(live[&outgoing].end, outgoing_before.end));
    assert_eq!(canvas.decorations().dragging_node, Some(id("align")));

    canvas.handle_input(&InputEvent::up(grab.x + 40.0, grab.y + 20.0));

    let moved = canvas.model().position(id("align")).unwrap();
    assert!(close(moved, Point::new(270.0, 110.0)));
    assert!(canvas.decorations().edge_paths.is_empty());
    assert!(canvas.decorations().dragging_node.is_none());
    // A drag is not a click.
    assert_eq!(canvas.selection(), None);

    let events = events.borrow();
    assert_eq!(events.len(), 2);
    match &events[1] {
        GraphEvent::AfterChange(GraphChange::MoveNode { node, from, to }) => {
            assert_eq!(*node, id("align"));
            assert_eq!(*from, Point::new(250.0, 100.0));
            assert!(close(*to, moved));
        }
        other => panic!("expected a node move, got {other:?}"),
    }
}

#[test]
fn wheel_during_node_drag_keeps_node_under_cursor() {
    let mut canvas = make_canvas();
    let scale = canvas.view().scale;
    let grab = node_screen(&canvas, "align");
    let cursor = grab + Vec2::new(40.0, 20.0);
    drag_to(&mut canvas, grab, cursor);
    assert!(close(node_screen(&canvas, "align"), cursor));

    assert!(canvas.handle_input(&InputEvent::Wheel {
        x: cursor.x,
        y: cursor.y,
        delta_y: -250.0,
    }));
    assert_eq!(canvas.view().scale, scale);

    canvas.handle_input(&InputEvent::moved(cursor.x, cursor.y));
    assert!(close(node_screen(&canvas, "align"), cursor));
    canvas.handle_input(&InputEvent::up(cursor.x, cursor.y));

    let expected = Point::new(250.0, 100.0) + Vec2::new(40.0, 20.0) / scale;
    assert!(close(canvas.model().position(id("align")).unwrap(), expected));

    // Once the drag is over the wheel zooms again.
    canvas.handle_input(&InputEvent::Wheel {
        x: cursor.x,
        y: cursor.y,
        delta_y: -250.0,
    });
    assert!((canvas.view().scale - (scale + 0.5)).abs() < 1e-9);
}

#[test]
fn hover_brings_node_to_front() {
    let mut canvas = make_canvas();
    let over = node_screen(&canvas, "reads");
    canvas.handle_input(&InputEvent::moved(over.x, over.y));
    assert_eq!(canvas.scene().paint_order().last(), Some(&id("reads")));
}

#[test]
fn drag_near_viewport_edge_auto_pans() {
    let mut canvas = make_canvas();
    let grab = node_screen(&canvas, "align");
    let cursor = Point::new(VIEWPORT.width - 10.0, grab.y);
    drag_to(&mut canvas, grab, cursor);
    assert!(canvas.is_auto_panning());

    let before = canvas.view().translate;
    assert!(canvas.tick(0.0));
    assert!(canvas.tick(1000.0 / 60.0));
    let after = canvas.view().translate;
    assert!((before.x - after.x - 20.0).abs() < 1e-6);
    assert_eq!(before.y, after.y);
    // The node stays under the pointer while the canvas scrolls.
    assert!(close(node_screen(&canvas, "align"), cursor));

    canvas.handle_input(&InputEvent::up(cursor.x, cursor.y));
    assert!(!canvas.is_auto_panning());
    assert!(!canvas.tick(50.0));
    let stored = canvas.model().position(id("align")).unwrap();
    assert!(close(canvas.view().canvas_to_screen(stored), cursor));
}

// ─── Port drag ───────────────────────────────────────────────────────────

#[test]
fn port_drag_connects_once() {
    let mut canvas = make_canvas();
    let events = record(&mut canvas, &[EventKind::ConnectionCreate]);
    let from = port_screen(&canvas, "out/align/bam");
    let to = port_screen(&canvas, "in/summarize/bam");

    drag_to(&mut canvas, from, to);
    assert_eq!(
        canvas.decorations().snapped_port,
        Some(cid("in/summarize/bam"))
    );
    assert!(canvas.decorations().ghost.is_none());
    canvas.handle_input(&InputEvent::up(to.x, to.y));

    let key = EdgeKey::normalized(cid("out/align/bam"), cid("in/summarize/bam"));
    assert!(canvas.scene().edge(&key).unwrap().valid);
    assert_eq!(canvas.model().connections().len(), 4);
    assert!(canvas.decorations().floating_edge.is_none());
    assert!(canvas.is_arrange_needed());

    // Dragging the other way round finds the existing connection.
    drag(&mut canvas, to, from);
    assert_eq!(canvas.model().connections().len(), 4);
    assert_eq!(canvas.scene().edge_count(), 4);

    assert_eq!(
        *events.borrow(),
        vec![GraphEvent::ConnectionCreate {
            source: cid("out/align/bam"),
            destination: cid("in/summarize/bam"),
            valid: true,
        }]
    );
}

#[test]
fn port_drag_into_empty_space_creates_input() {
    let mut canvas = make_canvas();
    let events = record(&mut canvas, &[EventKind::CreateInput]);
    let from = port_screen(&canvas, "in/summarize/bam");
    let to = Point::new(from.x, from.y - 330.0);

    drag_to(&mut canvas, from, to);
    let ghost = canvas.decorations().ghost.unwrap();
    assert_eq!(ghost.kind, wfg_core::NodeKind::Input);
    canvas.handle_input(&InputEvent::up(to.x, to.y));

    let created = id("bam");
    assert_eq!(*events.borrow(), vec![GraphEvent::CreateInput(created)]);
    assert_eq!(canvas.model().inputs().len(), 3);
    let placed = canvas.model().position(created).unwrap();
    assert!(close(placed, canvas.view().screen_to_canvas(to)));
    assert_eq!(canvas.scene().get_by_id(created).unwrap().position, placed);

    let key = EdgeKey::normalized(cid("out/bam/bam"), cid("in/summarize/bam"));
    assert!(canvas.scene().edge(&key).is_some());
    assert!(canvas.decorations().ghost.is_none());
}

#[test]
fn short_port_drag_is_cancelled() {
    let mut canvas = make_canvas();
    let from = port_screen(&canvas, "in/summarize/bam");
    drag(&mut canvas, from, from + Vec2::new(30.0, -30.0));
    assert_eq!(canvas.model().connections().len(), 3);
    assert_eq!(canvas.model().inputs().len(), 2);
    assert!(canvas.decorations().floating_edge.is_none());
}

// ─── Pan & zoom ──────────────────────────────────────────────────────────

#[test]
fn background_drag_pans() {
    let mut canvas = make_canvas();
    let start = canvas.view().translate;
    let from = background(&canvas);
    drag(&mut canvas, from, from + Vec2::new(30.0, -20.0));
    assert!(close(
        (canvas.view().translate - start).to_point(),
        Point::new(30.0, -20.0)
    ));
    assert_eq!(canvas.model().position(id("align")), Some(Point::new(250.0, 100.0)));
}

#[test]
fn pan_does_not_produce_a_click() {
    let mut canvas = make_canvas();
    let at = node_screen(&canvas, "align");
    click(&mut canvas, at);
    assert_eq!(canvas.selection(), Some(Selection::Node(id("align"))));

    let from = background(&canvas);
    drag(&mut canvas, from, from + Vec2::new(50.0, 0.0));
    assert_eq!(canvas.selection(), Some(Selection::Node(id("align"))));

    // A plain click on the background does clear it.
    let at = background(&canvas);
    click(&mut canvas, at);
    assert_eq!(canvas.selection(), None);
}

#[test]
fn wheel_zoom_keeps_cursor_point_fixed() {
    let mut canvas = make_canvas();
    let events = record(&mut canvas, &[EventKind::WorkflowScale]);
    let cursor = Point::new(400.0, 300.0);
    let under = canvas.view().screen_to_canvas(cursor);
    let before = canvas.view().scale;

    assert!(canvas.handle_input(&InputEvent::Wheel {
        x: cursor.x,
        y: cursor.y,
        delta_y: -250.0,
    }));
    assert!((canvas.view().scale - (before + 0.5)).abs() < 1e-9);
    assert!(close(canvas.view().canvas_to_screen(under), cursor));
    assert_eq!(events.borrow().len(), 1);
}

#[test]
fn wheel_beyond_limits_is_ignored() {
    let mut canvas = make_canvas();
    let before = *canvas.view();
    assert!(canvas.handle_input(&InputEvent::Wheel {
        x: 10.0,
        y: 10.0,
        delta_y: 5000.0,
    }));
    assert_eq!(*canvas.view(), before);
}

#[test]
fn keyboard_zoom_and_fit() {
    let mut canvas = make_canvas();
    let fitted = *canvas.view();
    let ctrl = Modifiers {
        ctrl: true,
        ..Modifiers::NONE
    };
    assert!(canvas.handle_input(&InputEvent::Key {
        key: "=".into(),
        modifiers: ctrl,
    }));
    assert!((canvas.view().scale - (fitted.scale + 0.1)).abs() < 1e-9);

    assert!(canvas.handle_input(&InputEvent::Key {
        key: "0".into(),
        modifiers: ctrl,
    }));
    assert_eq!(*canvas.view(), fitted);
}

// ─── Selection & deletion ────────────────────────────────────────────────

#[test]
fn clicking_a_node_highlights_its_neighbourhood() {
    let mut canvas = make_canvas();
    let events = record(&mut canvas, &[EventKind::SelectionChange]);
    let at = node_screen(&canvas, "align");
    click(&mut canvas, at);

    let deco = canvas.decorations();
    assert!(deco.fade);
    assert!(deco.selected_nodes.contains(&id("align")));
    assert!(deco.highlighted_nodes.contains(&id("reads")));
    assert!(deco.highlighted_nodes.contains(&id("aligned")));
    assert!(!deco.highlighted_nodes.contains(&id("summarize")));
    assert_eq!(deco.highlighted_edges.len(), 3);

    canvas.handle_input(&InputEvent::key("Escape"));
    assert_eq!(canvas.selection(), None);
    assert_eq!(
        *events.borrow(),
        vec![
            GraphEvent::SelectionChange(Some(Selection::Node(id("align")))),
            GraphEvent::SelectionChange(None),
        ]
    );
}

#[test]
fn delete_key_removes_selected_step() {
    let mut canvas = make_canvas();
    let events = record(&mut canvas, &[EventKind::AfterChange]);
    let at = node_screen(&canvas, "align");
    click(&mut canvas, at);
    assert!(canvas.handle_input(&InputEvent::key("Delete")));

    assert!(canvas.model().find_by_id(id("align")).is_none());
    assert!(!canvas.scene().contains(id("align")));
    assert!(canvas.model().connections().is_empty());
    assert_eq!(canvas.scene().edge_count(), 0);
    assert_eq!(canvas.selection(), None);
    assert!(!canvas.decorations().has_selection());
    assert_eq!(
        *events.borrow(),
        vec![GraphEvent::AfterChange(GraphChange::RemoveStep(id("align")))]
    );
}

#[test]
fn clicking_an_edge_selects_it_for_deletion() {
    let mut canvas = make_canvas();
    let key = EdgeKey::normalized(cid("out/reads/reads"), cid("in/align/reads"));
    let at = edge_midpoint_screen(&canvas, &key);
    click(&mut canvas, at);
    assert_eq!(canvas.selection(), Some(Selection::Edge(key)));
    let deco = canvas.decorations();
    assert!(!deco.fade);
    assert!(deco.highlighted_ports.contains(&cid("in/align/reads")));

    assert!(canvas.handle_input(&InputEvent::key("Backspace")));
    assert!(canvas.scene().edge(&key).is_none());
    assert_eq!(canvas.model().connections().len(), 2);
    assert!(canvas.scene().contains(id("reads")));
}

#[test]
fn delete_without_selection_is_an_error() {
    let mut canvas = make_canvas();
    assert_eq!(canvas.delete_selection(), Err(CanvasError::NothingSelected));
    assert!(!canvas.handle_input(&InputEvent::key("Delete")));
}

#[test]
fn selection_survives_redraw_until_its_node_is_gone() {
    let mut canvas = make_canvas();
    let events = record(&mut canvas, &[EventKind::SelectionChange]);
    let at = node_screen(&canvas, "align");
    click(&mut canvas, at);

    canvas.redraw(None);
    assert_eq!(canvas.selection(), Some(Selection::Node(id("align"))));
    assert!(canvas.decorations().selected_nodes.contains(&id("align")));

    let mut replacement = workflow();
    replacement.remove_step(id("align"));
    canvas.redraw(Some(replacement));
    assert_eq!(canvas.selection(), None);
    assert_eq!(canvas.scene().node_count(), 4);
    assert_eq!(events.borrow().last(), Some(&GraphEvent::SelectionChange(None)));
}

// ─── Arrangement ─────────────────────────────────────────────────────────

#[test]
fn arrange_is_refused_until_the_model_changes() {
    let mut canvas = make_canvas();
    let events = record(&mut canvas, &[EventKind::WorkflowArrange, EventKind::WorkflowFit]);

    assert_eq!(canvas.arrange(), Ok(()));
    assert!(!canvas.is_arrange_needed());
    for node in canvas.scene().nodes() {
        assert_eq!(canvas.model().position(node.id), Some(node.position));
    }
    assert_eq!(
        *events.borrow(),
        vec![GraphEvent::WorkflowArrange, GraphEvent::WorkflowFit]
    );
    assert_eq!(canvas.arrange(), Err(CanvasError::ArrangeNotNeeded));

    // Manual placement keeps the arrangement current.
    let grab = node_screen(&canvas, "summarize");
    drag(&mut canvas, grab, grab + Vec2::new(0.0, 60.0));
    assert!(!canvas.is_arrange_needed());

    // A structural edit re-arms it.
    let key = EdgeKey::normalized(cid("out/reads/reads"), cid("in/align/reads"));
    canvas.select(Selection::Edge(key));
    canvas.delete_selection().unwrap();
    assert!(canvas.is_arrange_needed());

    let ctrl_shift = Modifiers {
        ctrl: true,
        shift: true,
        ..Modifiers::NONE
    };
    assert!(canvas.handle_input(&InputEvent::Key {
        key: "L".into(),
        modifiers: ctrl_shift,
    }));
    assert!(!canvas.is_arrange_needed());
}

#[test]
fn redraw_after_direct_model_edit_rearms_arrange() {
    let mut canvas = make_canvas();
    canvas.arrange().unwrap();
    assert!(!canvas.is_arrange_needed());

    canvas.model_mut().create_step("rd_trim", &["reads"], &["trimmed"]);
    canvas.redraw(None);

    assert!(canvas.scene().contains(id("rd_trim")));
    assert!(canvas.is_arrange_needed());
    assert_eq!(canvas.arrange(), Ok(()));

    // A redraw with nothing pending leaves the flag alone.
    canvas.redraw(None);
    assert!(!canvas.is_arrange_needed());
}

// ─── Edit lock ───────────────────────────────────────────────────────────

#[test]
fn locked_canvas_only_pans_and_selects() {
    let mut canvas = make_canvas();
    canvas.enable_editing(false);

    let grab = node_screen(&canvas, "align");
    drag(&mut canvas, grab, grab + Vec2::new(40.0, 20.0));
    assert_eq!(canvas.model().position(id("align")), Some(Point::new(250.0, 100.0)));
    assert_eq!(
        canvas.scene().get_by_id(id("align")).unwrap().position,
        Point::new(250.0, 100.0)
    );
    // The swallowed drag is not a click either.
    assert_eq!(canvas.selection(), None);

    let from = port_screen(&canvas, "out/align/bam");
    let to = port_screen(&canvas, "in/summarize/bam");
    drag(&mut canvas, from, to);
    assert_eq!(canvas.model().connections().len(), 3);

    let at = node_screen(&canvas, "align");
    click(&mut canvas, at);
    assert_eq!(canvas.selection(), Some(Selection::Node(id("align"))));
    assert!(!canvas.handle_input(&InputEvent::key("Delete")));
    assert_eq!(canvas.delete_selection(), Err(CanvasError::EditingDisabled));
    assert!(canvas.scene().contains(id("align")));

    let start = canvas.view().translate;
    let from = background(&canvas);
    drag(&mut canvas, from, from + Vec2::new(-25.0, 15.0));
    assert!(close(
        (canvas.view().translate - start).to_point(),
        Point::new(-25.0, 15.0)
    ));
}

#[test]
fn invalid_connections_are_marked_only_while_editing() {
    let mut canvas = make_canvas();
    canvas.model_mut().set_port_type(cid("in/align/reads"), Some("int"));
    canvas.sync_from_model();

    let key = EdgeKey::normalized(cid("out/reads/reads"), cid("in/align/reads"));
    assert!(!canvas.scene().edge(&key).unwrap().valid);
    assert!(canvas.decorations().invalid_edges.contains(&key));
    assert!(canvas.render_svg().contains("edge invalid"));

    canvas.enable_editing(false);
    assert!(canvas.decorations().invalid_edges.is_empty());
    canvas.enable_editing(true);
    assert_eq!(canvas.decorations().invalid_edges.len(), 1);
}

// ─── Teardown ────────────────────────────────────────────────────────────

#[test]
fn destroy_detaches_listeners_and_overlays() {
    let mut canvas = make_canvas();
    let events = record(&mut canvas, &[EventKind::WorkflowScale]);
    canvas.destroy();
    assert!(canvas.bus_mut().is_empty());

    // Wheel input reaches no plugin any more.
    assert!(!canvas.handle_input(&InputEvent::Wheel {
        x: 10.0,
        y: 10.0,
        delta_y: -100.0,
    }));
    assert!(events.borrow().is_empty());
    assert_eq!(canvas.scene().node_count(), 5);
}
