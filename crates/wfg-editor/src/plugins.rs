//! Optional canvas features attached through lifecycle hooks.
//!
//! The canvas only ever talks to a plugin through [`Plugin`]; each hook
//! receives a [`PluginContext`] with read access to the scene and view and
//! write access to the decorations and the event bus.

use wfg_core::kurbo::Point;
use wfg_core::{ConnectionId, ModelChange, SceneGraph, ViewTransform};
use wfg_render::{Decorations, Hit, Tooltip, hit_test};

use crate::bus::EventBus;
use crate::config::CanvasConfig;
use crate::input::InputEvent;

/// Everything a plugin may look at or touch during a hook.
pub struct PluginContext<'a> {
    pub scene: &'a SceneGraph,
    pub view: &'a ViewTransform,
    pub decorations: &'a mut Decorations,
    pub config: &'a CanvasConfig,
    pub bus: &'a mut EventBus,
    pub editing_enabled: bool,
    /// A pointer gesture (pan or drag) is in progress.
    pub gesture_active: bool,
}

/// Something a plugin asks the canvas to do in response to input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CanvasRequest {
    /// `anchor` is in screen space.
    ScaleAtPoint { scale: f64, anchor: Point },
    Fit,
    /// Swallow the event without further action.
    Handled,
}

pub trait Plugin {
    fn name(&self) -> &'static str;

    /// Called once when attached, and again whenever a new model is loaded.
    fn register(&mut self, _ctx: &mut PluginContext<'_>) {}

    fn after_render(&mut self, _ctx: &mut PluginContext<'_>) {}

    fn after_model_change(&mut self, _changes: &[ModelChange], _ctx: &mut PluginContext<'_>) {}

    fn enable_editing(&mut self, _enabled: bool, _ctx: &mut PluginContext<'_>) {}

    /// Sees input before the canvas does. Returning a request consumes it.
    fn on_input(
        &mut self,
        _event: &InputEvent,
        _ctx: &mut PluginContext<'_>,
    ) -> Option<CanvasRequest> {
        None
    }

    fn destroy(&mut self, _ctx: &mut PluginContext<'_>) {}
}

/// The plugins a canvas gets unless told otherwise.
pub fn defaults() -> Vec<Box<dyn Plugin>> {
    vec![
        Box::new(ValidatePlugin),
        Box::new(ZoomPlugin),
        Box::new(EdgeHoverPlugin),
    ]
}

// ─── Validation overlay ──────────────────────────────────────────────────

/// Marks connections the model reports as invalid while editing.
#[derive(Debug, Default)]
pub struct ValidatePlugin;

impl ValidatePlugin {
    fn mark(ctx: &mut PluginContext<'_>) {
        ctx.decorations.invalid_edges = ctx
            .scene
            .edges()
            .filter(|e| !e.valid)
            .map(|e| e.key())
            .collect();
    }

    fn unmark(ctx: &mut PluginContext<'_>) {
        ctx.decorations.invalid_edges.clear();
    }
}

impl Plugin for ValidatePlugin {
    fn name(&self) -> &'static str {
        "validate"
    }

    fn after_render(&mut self, ctx: &mut PluginContext<'_>) {
        if ctx.editing_enabled {
            Self::mark(ctx);
        }
    }

    fn after_model_change(&mut self, changes: &[ModelChange], ctx: &mut PluginContext<'_>) {
        if ctx.editing_enabled && changes.contains(&ModelChange::ConnectionsUpdated) {
            Self::mark(ctx);
        }
    }

    fn enable_editing(&mut self, enabled: bool, ctx: &mut PluginContext<'_>) {
        if enabled {
            Self::mark(ctx);
        } else {
            Self::unmark(ctx);
        }
    }

    fn destroy(&mut self, ctx: &mut PluginContext<'_>) {
        Self::unmark(ctx);
    }
}

// ─── Wheel zoom ──────────────────────────────────────────────────────────

/// Zooms around the cursor on wheel input.
#[derive(Debug, Default)]
pub struct ZoomPlugin;

impl Plugin for ZoomPlugin {
    fn name(&self) -> &'static str {
        "zoom"
    }

    fn on_input(
        &mut self,
        event: &InputEvent,
        ctx: &mut PluginContext<'_>,
    ) -> Option<CanvasRequest> {
        let InputEvent::Wheel { x, y, delta_y } = *event else {
            return None;
        };
        // Pan and drag positions are derived from the scale at press time.
        if ctx.gesture_active {
            return Some(CanvasRequest::Handled);
        }
        let limits = &ctx.config.viewport;
        let scale = ctx.view.scale - delta_y / ctx.config.wheel_divisor;
        if scale <= limits.min_scale || scale >= limits.max_scale {
            return Some(CanvasRequest::Handled);
        }
        Some(CanvasRequest::ScaleAtPoint {
            scale,
            anchor: Point::new(x, y),
        })
    }
}

// ─── Edge hover tooltip ──────────────────────────────────────────────────

/// Shows `source → destination` next to the cursor while over a connection.
#[derive(Debug, Default)]
pub struct EdgeHoverPlugin;

/// Tooltip offset above the cursor, in canvas units.
const TOOLTIP_LIFT: f64 = 16.0;

pub fn endpoint_label(cid: &ConnectionId) -> String {
    if cid.is_terminal() {
        cid.node.to_string()
    } else {
        format!("{} ({})", cid.node, cid.port)
    }
}

impl Plugin for EdgeHoverPlugin {
    fn name(&self) -> &'static str {
        "edge-hover"
    }

    fn on_input(
        &mut self,
        event: &InputEvent,
        ctx: &mut PluginContext<'_>,
    ) -> Option<CanvasRequest> {
        match event {
            InputEvent::PointerMove { x, y, .. } if !ctx.gesture_active => {
                let canvas = ctx.view.screen_to_canvas(Point::new(*x, *y));
                let tolerance = ctx.config.edge_hit_tolerance / ctx.view.scale;
                ctx.decorations.tooltip = match hit_test(ctx.scene, canvas, tolerance) {
                    Some(Hit::Edge(key)) => Some(Tooltip {
                        text: format!(
                            "{} → {}",
                            endpoint_label(&key.source),
                            endpoint_label(&key.destination)
                        ),
                        position: Point::new(canvas.x, canvas.y - TOOLTIP_LIFT),
                    }),
                    _ => None,
                };
            }
            InputEvent::PointerDown { .. } => ctx.decorations.tooltip = None,
            _ => {}
        }
        None
    }

    fn destroy(&mut self, ctx: &mut PluginContext<'_>) {
        ctx.decorations.tooltip = None;
    }
}
