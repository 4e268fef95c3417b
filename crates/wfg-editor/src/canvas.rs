//! The interactive workflow canvas.
//!
//! `WorkflowCanvas` owns the scene graph projected from a [`WorkflowModel`],
//! the view transform, and all ephemeral interaction state. Input arrives as
//! [`InputEvent`]s; the canvas runs the gesture state machine, delegates
//! every structural mutation to the model, and re-syncs the scene from the
//! model's change notifications.

use thiserror::Error;
use wfg_core::kurbo::{Point, Size, Vec2};
use wfg_core::{
    ConnectionId, Edge, EdgeKey, NodeKind, SceneGraph, ViewTransform, ViewportError,
    WorkflowModel, arrange_scene, build_scene, needs_arrangement,
};
use wfg_render::{Decorations, hit_test, render_svg};

use crate::autopan::EdgePanner;
use crate::bus::{EventBus, GraphChange, GraphEvent};
use crate::config::CanvasConfig;
use crate::events::{DragRelease, DragTracker, DragUpdate, Scope};
use crate::gestures::{Gesture, NodeMoveGesture, PortDragGesture, PortDragOutcome};
use crate::input::InputEvent;
use crate::plugins::{self, CanvasRequest, Plugin, PluginContext};
use crate::selection::Selection;
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::sync;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CanvasError {
    #[error("arrangement is still valid; change the workflow before arranging again")]
    ArrangeNotNeeded,
    #[error(transparent)]
    Viewport(#[from] ViewportError),
    #[error("nothing is selected")]
    NothingSelected,
    #[error("editing is disabled")]
    EditingDisabled,
}

pub struct WorkflowCanvas<M: WorkflowModel> {
    model: M,
    scene: SceneGraph,
    view: ViewTransform,
    decorations: Decorations,
    config: CanvasConfig,
    viewport: Size,
    bus: EventBus,
    plugins: Vec<Box<dyn Plugin>>,
    selection: Option<Selection>,
    gesture: Gesture,
    panner: EdgePanner,
    editing_enabled: bool,
    /// Cleared by a successful arrangement, re-armed by model changes.
    arrange_needed: bool,
    /// Last pointer position in screen space.
    last_pointer: Option<Point>,
}

impl<M: WorkflowModel> WorkflowCanvas<M> {
    /// Create a canvas with the default plugins.
    pub fn new(model: M, config: CanvasConfig, viewport: Size) -> Self {
        Self::with_plugins(model, config, viewport, plugins::defaults())
    }

    /// Create a canvas. Nodes without a persisted position trigger an
    /// initial arrangement; otherwise the graph is fitted to the viewport.
    pub fn with_plugins(
        model: M,
        config: CanvasConfig,
        viewport: Size,
        plugins: Vec<Box<dyn Plugin>>,
    ) -> Self {
        let scene = build_scene(&model);
        let panner = EdgePanner::new(config.scroll_margin, config.pan_speed);
        let mut canvas = Self {
            model,
            scene,
            view: ViewTransform::IDENTITY,
            decorations: Decorations::new(),
            config,
            viewport,
            bus: EventBus::new(),
            plugins,
            selection: None,
            gesture: Gesture::Idle,
            panner,
            editing_enabled: true,
            arrange_needed: true,
            last_pointer: None,
        };
        canvas.each_plugin(|p, ctx| p.register(ctx));
        canvas.load();
        canvas
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Mutate the model directly. Call [`Self::sync_from_model`] afterwards.
    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    pub fn decorations(&self) -> &Decorations {
        &self.decorations
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn is_editing_enabled(&self) -> bool {
        self.editing_enabled
    }

    pub fn is_arrange_needed(&self) -> bool {
        self.arrange_needed
    }

    pub fn is_auto_panning(&self) -> bool {
        self.panner.is_active()
    }

    pub fn viewport_size(&self) -> Size {
        self.viewport
    }

    pub fn set_viewport_size(&mut self, size: Size) {
        self.viewport = size;
    }

    pub fn render_svg(&self) -> String {
        render_svg(&self.scene, &self.view, &self.decorations, self.viewport)
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────

    /// Rebuild the scene from the model, optionally swapping in a new one.
    pub fn redraw(&mut self, model: Option<M>) {
        let replaced = model.is_some();
        if let Some(model) = model {
            self.model = model;
            self.arrange_needed = true;
            self.cancel_gesture();
        }
        // A full rebuild supersedes pending notifications, but they still
        // mean the model changed.
        if !self.model.drain_changes().is_empty() {
            self.arrange_needed = true;
        }
        self.scene = build_scene(&self.model);
        self.decorations.clear_drag();
        if replaced {
            self.each_plugin(|p, ctx| p.register(ctx));
            self.load();
        } else {
            self.refresh_selection();
            self.after_render();
        }
    }

    fn load(&mut self) {
        if needs_arrangement(&self.model) {
            self.force_arrange();
        } else {
            if let Err(e) = self.fit_to_viewport() {
                log::warn!("initial fit skipped: {e}");
            }
            self.refresh_selection();
            self.after_render();
        }
    }

    pub fn register_plugin(&mut self, mut plugin: Box<dyn Plugin>) {
        let mut ctx = PluginContext {
            scene: &self.scene,
            view: &self.view,
            decorations: &mut self.decorations,
            config: &self.config,
            bus: &mut self.bus,
            editing_enabled: self.editing_enabled,
            gesture_active: !self.gesture.is_idle(),
        };
        plugin.register(&mut ctx);
        plugin.after_render(&mut ctx);
        log::debug!("registered plugin {}", plugin.name());
        self.plugins.push(plugin);
    }

    /// Toggle the edit lock. Pan, zoom, and selection stay available.
    pub fn enable_editing(&mut self, enabled: bool) {
        self.editing_enabled = enabled;
        self.decorations.editing_enabled = enabled;
        if !enabled && self.gesture.is_drag() {
            self.cancel_gesture();
        }
        self.each_plugin(|p, ctx| p.enable_editing(enabled, ctx));
    }

    /// Detach plugins and listeners. The canvas stays readable.
    pub fn destroy(&mut self) {
        self.cancel_gesture();
        self.each_plugin(|p, ctx| p.destroy(ctx));
        self.plugins.clear();
        self.bus.clear();
    }

    /// Pull pending model notifications into the scene.
    pub fn sync_from_model(&mut self) {
        let changes = self.model.drain_changes();
        if changes.is_empty() {
            return;
        }
        sync::apply_changes(&mut self.scene, &self.model, &changes);
        self.arrange_needed = true;
        for change in &changes {
            if let wfg_core::ModelChange::StepCreated(id) = change {
                self.bus.emit(&GraphEvent::CreateStep(*id));
            }
        }
        self.each_plugin(|p, ctx| p.after_model_change(&changes, ctx));
        self.refresh_selection();
        self.after_render();
    }

    // ─── Arrangement & viewport ──────────────────────────────────────────

    /// Re-lay-out the graph. Refused while the current layout is still valid.
    pub fn arrange(&mut self) -> Result<(), CanvasError> {
        if !self.arrange_needed {
            return Err(CanvasError::ArrangeNotNeeded);
        }
        self.force_arrange();
        Ok(())
    }

    /// Re-lay-out the graph unconditionally.
    pub fn force_arrange(&mut self) {
        self.bus.emit(&GraphEvent::BeforeChange(GraphChange::Arrange));
        let arrangement = arrange_scene(&self.scene, &self.config.layout);
        sync::commit_positions(&mut self.scene, &mut self.model, &arrangement.positions);
        self.decorations.edge_paths.clear();
        self.arrange_needed = false;
        log::debug!(
            "arranged {} nodes ({} dangling)",
            arrangement.positions.len(),
            arrangement.dangling.len()
        );
        self.bus.emit(&GraphEvent::AfterChange(GraphChange::Arrange));
        self.bus.emit(&GraphEvent::WorkflowArrange);
        if let Err(e) = self.fit_to_viewport() {
            log::warn!("fit after arrange skipped: {e}");
        }
        self.refresh_selection();
        self.after_render();
    }

    pub fn fit_to_viewport(&mut self) -> Result<(), CanvasError> {
        self.view
            .fit(self.scene.bounds(), self.viewport, &self.config.viewport)?;
        self.bus.emit(&GraphEvent::WorkflowFit);
        Ok(())
    }

    /// Zoom keeping the canvas point under screen `(x, y)` fixed.
    /// Returns the applied (clamped) scale.
    pub fn scale_at_point(&mut self, scale: f64, x: f64, y: f64) -> f64 {
        let applied = self
            .view
            .scale_at_point(scale, Point::new(x, y), &self.config.viewport);
        self.bus.emit(&GraphEvent::WorkflowScale(applied));
        applied
    }

    /// Pan the view by a screen-space delta.
    pub fn pan_by(&mut self, delta: Vec2) {
        self.view.pan_by(delta);
    }

    fn zoom_by(&mut self, step: f64) {
        let center = Point::new(self.viewport.width / 2.0, self.viewport.height / 2.0);
        self.scale_at_point(self.view.scale + step, center.x, center.y);
    }

    // ─── Selection & deletion ────────────────────────────────────────────

    pub fn select(&mut self, selection: Selection) {
        if !selection.exists_in(&self.scene) {
            log::warn!("cannot select {selection:?}: not in the scene");
            return;
        }
        selection.apply(&self.scene, &mut self.decorations);
        self.selection = Some(selection);
        self.bus.emit(&GraphEvent::SelectionChange(Some(selection)));
    }

    pub fn clear_selection(&mut self) {
        let had = self.selection.take().is_some();
        self.decorations.clear_selection();
        if had {
            self.bus.emit(&GraphEvent::SelectionChange(None));
        }
    }

    /// Remove the selected node or connection through the model.
    pub fn delete_selection(&mut self) -> Result<(), CanvasError> {
        if !self.editing_enabled {
            return Err(CanvasError::EditingDisabled);
        }
        let selection = self.selection.ok_or(CanvasError::NothingSelected)?;
        let change = match selection {
            Selection::Node(id) => {
                let kind = self
                    .model
                    .find_by_id(id)
                    .map(|n| n.kind)
                    .or_else(|| self.scene.get_by_id(id).map(|n| n.kind))
                    .ok_or(CanvasError::NothingSelected)?;
                match kind {
                    NodeKind::Step => GraphChange::RemoveStep(id),
                    NodeKind::Input => GraphChange::RemoveInput(id),
                    NodeKind::Output => GraphChange::RemoveOutput(id),
                }
            }
            Selection::Edge(key) => GraphChange::Disconnect {
                source: key.source,
                destination: key.destination,
            },
        };
        self.bus.emit(&GraphEvent::BeforeChange(change.clone()));
        match &change {
            GraphChange::RemoveStep(id) => self.model.remove_step(*id),
            GraphChange::RemoveInput(id) => self.model.remove_input(*id),
            GraphChange::RemoveOutput(id) => self.model.remove_output(*id),
            GraphChange::Disconnect {
                source,
                destination,
            } => self.model.disconnect(*source, *destination),
            _ => {}
        }
        self.clear_selection();
        self.sync_from_model();
        self.bus.emit(&GraphEvent::AfterChange(change));
        Ok(())
    }

    fn refresh_selection(&mut self) {
        match self.selection {
            Some(sel) if sel.exists_in(&self.scene) => sel.apply(&self.scene, &mut self.decorations),
            Some(_) => self.clear_selection(),
            None => self.decorations.clear_selection(),
        }
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Feed one input event. Returns true if it was consumed.
    pub fn handle_input(&mut self, event: &InputEvent) -> bool {
        if let Some(p) = event.position()
            && !matches!(event, InputEvent::Wheel { .. })
        {
            self.last_pointer = Some(p);
        }

        let mut requests = Vec::new();
        self.each_plugin(|p, ctx| requests.extend(p.on_input(event, ctx)));
        if !requests.is_empty() {
            for request in requests {
                self.perform(request);
            }
            return true;
        }

        match event {
            InputEvent::PointerDown { x, y, .. } => self.pointer_down(Point::new(*x, *y)),
            InputEvent::PointerMove { x, y, .. } => self.pointer_move(Point::new(*x, *y)),
            InputEvent::PointerUp { .. } => self.pointer_up(),
            InputEvent::Wheel { .. } => false,
            InputEvent::Key { key, modifiers } => ShortcutMap::resolve(key, *modifiers)
                .is_some_and(|action| self.run_shortcut(action)),
        }
    }

    /// Advance auto-pan by one animation frame.
    pub fn tick(&mut self, now_ms: f64) -> bool {
        let Some(step) = self.panner.tick(now_ms) else {
            return false;
        };
        self.view.translate -= step;
        let canvas_step = step / self.view.scale;
        match &mut self.gesture {
            Gesture::NodeMove { tracker, drag } => {
                drag.add_pan(canvas_step);
                let position = drag.position(tracker.delta(), self.view.scale);
                drag.apply(&mut self.scene, &mut self.decorations, position);
            }
            Gesture::PortDrag { drag, .. } => {
                if let Some(pointer) = self.last_pointer {
                    let cursor = self.view.screen_to_canvas(pointer);
                    drag.update(
                        cursor,
                        self.view.scale,
                        self.config.snap_threshold,
                        self.config.ghost_reveal_threshold,
                    );
                    drag.decorate(&mut self.decorations);
                }
            }
            _ => {}
        }
        true
    }

    fn perform(&mut self, request: CanvasRequest) {
        match request {
            CanvasRequest::ScaleAtPoint { scale, anchor } => {
                self.scale_at_point(scale, anchor.x, anchor.y);
            }
            CanvasRequest::Fit => {
                if let Err(e) = self.fit_to_viewport() {
                    log::warn!("fit skipped: {e}");
                }
            }
            CanvasRequest::Handled => {}
        }
    }

    fn run_shortcut(&mut self, action: ShortcutAction) -> bool {
        match action {
            ShortcutAction::Delete => match self.delete_selection() {
                Ok(()) => true,
                Err(e) => {
                    log::debug!("delete ignored: {e}");
                    false
                }
            },
            ShortcutAction::Deselect => {
                self.clear_selection();
                true
            }
            ShortcutAction::ZoomIn => {
                self.zoom_by(self.config.zoom_step);
                true
            }
            ShortcutAction::ZoomOut => {
                self.zoom_by(-self.config.zoom_step);
                true
            }
            ShortcutAction::ZoomToFit => self.fit_to_viewport().is_ok(),
            ShortcutAction::Arrange => match self.arrange() {
                Ok(()) => true,
                Err(e) => {
                    log::debug!("arrange ignored: {e}");
                    false
                }
            },
        }
    }

    fn hit(&self, screen: Point) -> Option<wfg_render::Hit> {
        let canvas = self.view.screen_to_canvas(screen);
        hit_test(
            &self.scene,
            canvas,
            self.config.edge_hit_tolerance / self.view.scale,
        )
    }

    fn pointer_down(&mut self, screen: Point) -> bool {
        if !self.gesture.is_idle() {
            return false;
        }
        let scope = Scope::from(self.hit(screen));
        log::trace!("pointer down on {scope:?}");
        self.gesture = Gesture::Pending {
            scope,
            tracker: DragTracker::new(screen, self.config.drag_threshold),
        };
        true
    }

    fn pointer_move(&mut self, screen: Point) -> bool {
        match std::mem::take(&mut self.gesture) {
            Gesture::Idle => {
                let node = match self.hit(screen) {
                    Some(wfg_render::Hit::Node(id)) => Some(id),
                    Some(wfg_render::Hit::Port(cid)) => Some(cid.node),
                    _ => None,
                };
                node.is_some_and(|id| self.scene.bring_to_front(id))
            }
            Gesture::Pending { scope, mut tracker } => {
                if let DragUpdate::Started { .. } = tracker.moved(screen) {
                    self.start_gesture(scope, tracker);
                } else {
                    self.gesture = Gesture::Pending { scope, tracker };
                }
                true
            }
            Gesture::Pan {
                mut tracker,
                origin,
            } => {
                tracker.moved(screen);
                self.view.translate = origin + tracker.delta();
                self.gesture = Gesture::Pan { tracker, origin };
                true
            }
            Gesture::NodeMove {
                mut tracker,
                drag,
            } => {
                tracker.moved(screen);
                self.panner.update(screen, self.viewport);
                let position = drag.position(tracker.delta(), self.view.scale);
                drag.apply(&mut self.scene, &mut self.decorations, position);
                self.gesture = Gesture::NodeMove { tracker, drag };
                true
            }
            Gesture::PortDrag {
                mut tracker,
                mut drag,
            } => {
                tracker.moved(screen);
                self.panner.update(screen, self.viewport);
                self.update_port_drag(&mut drag, screen);
                self.gesture = Gesture::PortDrag { tracker, drag };
                true
            }
        }
    }

    fn start_gesture(&mut self, scope: Scope, tracker: DragTracker) {
        let locked = !self.editing_enabled;
        match scope {
            Scope::Background | Scope::Edge(_) => {
                let origin = self.view.translate;
                self.view.translate = origin + tracker.delta();
                log::debug!("pan start");
                self.gesture = Gesture::Pan { tracker, origin };
            }
            Scope::NodeHandle(id) if !locked => match NodeMoveGesture::begin(&self.scene, id) {
                Some(drag) => {
                    self.scene.bring_to_front(id);
                    let position = drag.position(tracker.delta(), self.view.scale);
                    drag.apply(&mut self.scene, &mut self.decorations, position);
                    self.panner
                        .update(tracker.origin() + tracker.delta(), self.viewport);
                    self.gesture = Gesture::NodeMove { tracker, drag };
                }
                None => self.gesture = Gesture::Pending { scope, tracker },
            },
            Scope::Port(cid) if !locked => {
                match PortDragGesture::begin(&self.scene, &self.model, cid) {
                    Some(mut drag) => {
                        let screen = tracker.origin() + tracker.delta();
                        self.update_port_drag(&mut drag, screen);
                        self.panner.update(screen, self.viewport);
                        self.gesture = Gesture::PortDrag { tracker, drag };
                    }
                    None => {
                        log::warn!("port drag {cid}: port is not rendered");
                        self.gesture = Gesture::Pending { scope, tracker };
                    }
                }
            }
            // Locked: the drag is swallowed and produces no click.
            _ => self.gesture = Gesture::Pending { scope, tracker },
        }
    }

    fn update_port_drag(&mut self, drag: &mut PortDragGesture, screen: Point) {
        let cursor = self.view.screen_to_canvas(screen);
        drag.update(
            cursor,
            self.view.scale,
            self.config.snap_threshold,
            self.config.ghost_reveal_threshold,
        );
        drag.decorate(&mut self.decorations);
    }

    fn pointer_up(&mut self) -> bool {
        match std::mem::take(&mut self.gesture) {
            Gesture::Idle => false,
            Gesture::Pending { scope, tracker } => {
                if tracker.release() == DragRelease::Click {
                    self.click(scope);
                }
                true
            }
            Gesture::Pan { .. } => {
                log::debug!("pan end: translate {:?}", self.view.translate);
                true
            }
            Gesture::NodeMove { drag, .. } => {
                self.panner.stop();
                self.finish_node_move(drag);
                true
            }
            Gesture::PortDrag { drag, .. } => {
                self.panner.stop();
                self.finish_port_drag(drag);
                true
            }
        }
    }

    fn click(&mut self, scope: Scope) {
        match scope {
            Scope::Background => self.clear_selection(),
            Scope::NodeHandle(id) => self.select(Selection::Node(id)),
            Scope::Port(cid) => self.select(Selection::Node(cid.node)),
            Scope::Edge(key) => self.select(Selection::Edge(key)),
        }
    }

    fn finish_node_move(&mut self, drag: NodeMoveGesture) {
        self.decorations.clear_drag();
        let Some(to) = self.scene.get_by_id(drag.node).map(|n| n.position) else {
            return;
        };
        let change = GraphChange::MoveNode {
            node: drag.node,
            from: drag.start,
            to,
        };
        self.bus.emit(&GraphEvent::BeforeChange(change.clone()));
        // A manual placement does not re-arm arrangement.
        if !self.model.set_position(drag.node, to) {
            log::warn!("node move {}: not in the model", drag.node);
        }
        log::debug!("node move {} → ({:.1}, {:.1})", drag.node, to.x, to.y);
        self.bus.emit(&GraphEvent::AfterChange(change));
        self.after_render();
    }

    fn finish_port_drag(&mut self, drag: PortDragGesture) {
        self.decorations.clear_drag();
        match drag.outcome() {
            PortDragOutcome::Connect(key) => self.connect(key),
            PortDragOutcome::CreateTerminal { kind, position } => {
                self.create_terminal(drag.origin, kind, position)
            }
            PortDragOutcome::Cancel => {
                log::debug!("port drag {}: cancelled", drag.origin);
                self.after_render();
            }
        }
    }

    /// Connect two ports unless an equivalent connection already exists.
    fn connect(&mut self, key: EdgeKey) {
        if self.scene.find_edge(&key).is_some() {
            log::debug!("connect {} → {}: already connected", key.source, key.destination);
            self.after_render();
            return;
        }
        let change = GraphChange::Connect {
            source: key.source,
            destination: key.destination,
        };
        self.bus.emit(&GraphEvent::BeforeChange(change.clone()));
        let valid = self.model.connect(key.source, key.destination);
        self.sync_from_model();
        // Keep the edge on screen even if the model did not record it.
        if self.scene.find_edge(&key).is_none() {
            let mut edge = Edge::new(key.source, key.destination);
            edge.valid = valid;
            self.scene.add_edge(edge);
            self.after_render();
        }
        self.bus.emit(&GraphEvent::AfterChange(change));
        self.bus.emit(&GraphEvent::ConnectionCreate {
            source: key.source,
            destination: key.destination,
            valid,
        });
    }

    fn create_terminal(&mut self, port: ConnectionId, kind: NodeKind, position: Point) {
        let change = match kind {
            NodeKind::Input => GraphChange::CreateInput { port },
            _ => GraphChange::CreateOutput { port },
        };
        self.bus.emit(&GraphEvent::BeforeChange(change.clone()));
        let created = match kind {
            NodeKind::Input => self.model.create_input_from_port(port),
            _ => self.model.create_output_from_port(port),
        };
        let Some(node) = created else {
            log::warn!("create {} from {port}: rejected by the model", kind.class_name());
            self.after_render();
            return;
        };
        self.model.set_position(node.id, position);
        self.sync_from_model();
        self.bus.emit(&GraphEvent::AfterChange(change));
        self.bus.emit(&match kind {
            NodeKind::Input => GraphEvent::CreateInput(node.id),
            _ => GraphEvent::CreateOutput(node.id),
        });
    }

    fn cancel_gesture(&mut self) {
        self.panner.stop();
        if self.gesture.is_drag() {
            log::debug!("cancelled {:?}", self.gesture);
        }
        self.gesture = Gesture::Idle;
        self.decorations.clear_drag();
    }

    // ─── Plugin plumbing ─────────────────────────────────────────────────

    fn after_render(&mut self) {
        self.each_plugin(|p, ctx| p.after_render(ctx));
    }

    fn each_plugin(&mut self, mut f: impl FnMut(&mut dyn Plugin, &mut PluginContext<'_>)) {
        let mut plugins = std::mem::take(&mut self.plugins);
        {
            let mut ctx = PluginContext {
                scene: &self.scene,
                view: &self.view,
                decorations: &mut self.decorations,
                config: &self.config,
                bus: &mut self.bus,
                editing_enabled: self.editing_enabled,
                gesture_active: !self.gesture.is_idle(),
            };
            for plugin in plugins.iter_mut() {
                f(plugin.as_mut(), &mut ctx);
            }
        }
        self.plugins = plugins;
    }
}

impl<M: WorkflowModel> std::fmt::Debug for WorkflowCanvas<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowCanvas")
            .field("nodes", &self.scene.node_count())
            .field("edges", &self.scene.edge_count())
            .field("view", &self.view)
            .field("selection", &self.selection)
            .field("gesture", &self.gesture)
            .field("editing_enabled", &self.editing_enabled)
            .field("arrange_needed", &self.arrange_needed)
            .finish()
    }
}
