//! Canvas tuning knobs.

use serde::{Deserialize, Serialize};
use wfg_core::{LayoutConfig, ViewportConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Pointer moves required before a press turns into a drag.
    pub drag_threshold: u32,
    /// Screen distance within which a dragged port snaps to a target.
    pub snap_threshold: f64,
    /// Screen distance from the origin port before the ghost node appears.
    pub ghost_reveal_threshold: f64,
    /// Border band (screen pixels) that triggers auto-pan during drags.
    pub scroll_margin: f64,
    /// Auto-pan speed in pixels per 60 Hz frame.
    pub pan_speed: f64,
    /// Screen distance within which a pointer hits a connection.
    pub edge_hit_tolerance: f64,
    /// Scale increment for the zoom shortcuts.
    pub zoom_step: f64,
    /// Wheel delta that changes the scale by 1.
    pub wheel_divisor: f64,
    pub layout: LayoutConfig,
    pub viewport: ViewportConfig,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            drag_threshold: 3,
            snap_threshold: 150.0,
            ghost_reveal_threshold: 120.0,
            scroll_margin: 50.0,
            pan_speed: 10.0,
            edge_hit_tolerance: 6.0,
            zoom_step: 0.1,
            wheel_divisor: 500.0,
            layout: LayoutConfig::default(),
            viewport: ViewportConfig::default(),
        }
    }
}

impl CanvasConfig {
    /// Parse a (possibly partial) JSON config; missing keys keep defaults.
    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| format!("Invalid canvas config: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = CanvasConfig::from_json(r#"{ "snap_threshold": 80, "viewport": { "max_scale": 2 } }"#)
            .unwrap();
        assert_eq!(cfg.snap_threshold, 80.0);
        assert_eq!(cfg.viewport.max_scale, 2.0);
        assert_eq!(cfg.viewport.min_scale, 0.15);
        assert_eq!(cfg.drag_threshold, 3);
    }

    #[test]
    fn bad_json_is_reported() {
        let err = CanvasConfig::from_json("{ \"drag_threshold\": \"many\" }").unwrap_err();
        assert!(err.starts_with("Invalid canvas config"));
    }
}
