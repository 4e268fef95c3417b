//! View transform: pan, anchor-preserving zoom, and fit-to-viewport.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ViewportError {
    #[error("cannot fit into an empty viewport ({width}×{height})")]
    EmptyViewport { width: f64, height: f64 },
}

/// Zoom limits and fit padding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub min_scale: f64,
    pub max_scale: f64,
    /// Total padding (both sides) kept around the graph when fitting.
    pub fit_padding: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.15,
            max_scale: 3.0,
            fit_padding: 200.0,
        }
    }
}

/// Uniform scale followed by a translation, applied to the whole graph group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub scale: f64,
    pub translate: Vec2,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewTransform {
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        translate: Vec2::ZERO,
    };

    pub fn to_affine(&self) -> Affine {
        Affine::translate(self.translate) * Affine::scale(self.scale)
    }

    pub fn screen_to_canvas(&self, screen: Point) -> Point {
        crate::geometry::screen_to_canvas(self.to_affine(), screen)
    }

    pub fn canvas_to_screen(&self, canvas: Point) -> Point {
        self.to_affine() * canvas
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.translate += delta;
    }

    /// Scale compensation applied to labels so text keeps its on-screen size.
    pub fn label_scale(&self) -> f64 {
        label_scale(self.scale)
    }

    /// Zoom to `scale` (clamped) keeping the canvas point under the screen
    /// point `anchor` fixed. Returns the applied scale.
    pub fn scale_at_point(&mut self, scale: f64, anchor: Point, config: &ViewportConfig) -> f64 {
        let scale = scale.clamp(config.min_scale, config.max_scale);
        let canvas = (anchor.to_vec2() - self.translate) / self.scale;
        self.translate = anchor.to_vec2() - canvas * scale;
        self.scale = scale;
        log::trace!("scale_at_point: {scale:.3} @ ({:.1}, {:.1})", anchor.x, anchor.y);
        scale
    }

    /// Fit `bounds` (graph space, untransformed) into a viewport of `size`.
    ///
    /// The scale never exceeds 1. An empty graph resets to identity.
    pub fn fit(
        &mut self,
        bounds: Option<Rect>,
        size: Size,
        config: &ViewportConfig,
    ) -> Result<(), ViewportError> {
        if size.width <= 0.0 || size.height <= 0.0 {
            return Err(ViewportError::EmptyViewport {
                width: size.width,
                height: size.height,
            });
        }
        *self = Self::IDENTITY;
        let Some(bounds) = bounds else {
            return Ok(());
        };

        let vertical = (bounds.height() + config.fit_padding) / size.height;
        let horizontal = (bounds.width() + config.fit_padding) / size.width;
        let factor = vertical.max(horizontal);
        let scale = if factor > 0.0 { (1.0 / factor).min(1.0) } else { 1.0 };

        let viewport_center = Point::new(size.width / 2.0, size.height / 2.0);
        self.scale = scale;
        self.translate = viewport_center.to_vec2() - bounds.center().to_vec2() * scale;
        log::debug!(
            "fit: bounds {:.0}×{:.0} into {:.0}×{:.0} → scale {scale:.3}",
            bounds.width(),
            bounds.height(),
            size.width,
            size.height
        );
        Ok(())
    }
}

/// `1 + (1 - s) / (2 s)`: enlarges labels when zoomed out, shrinks them when zoomed in.
pub fn label_scale(scale: f64) -> f64 {
    1.0 + (1.0 - scale) / (scale * 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point, b: Point) -> bool {
        (a - b).hypot() < 1e-9
    }

    #[test]
    fn zoom_keeps_anchor_fixed() {
        let cfg = ViewportConfig::default();
        let mut view = ViewTransform {
            scale: 0.8,
            translate: Vec2::new(35.0, -12.0),
        };
        let anchor = Point::new(310.0, 140.0);
        let under = view.screen_to_canvas(anchor);

        for s in [0.2, 0.5, 1.7, 2.9] {
            view.scale_at_point(s, anchor, &cfg);
            assert!(
                close(view.canvas_to_screen(under), anchor),
                "anchor drifted at scale {s}"
            );
        }
    }

    #[test]
    fn zoom_is_clamped() {
        let cfg = ViewportConfig::default();
        let mut view = ViewTransform::IDENTITY;
        assert_eq!(view.scale_at_point(10.0, Point::ZERO, &cfg), 3.0);
        assert_eq!(view.scale_at_point(0.01, Point::ZERO, &cfg), 0.15);
    }

    #[test]
    fn label_scale_compensates() {
        assert_eq!(label_scale(1.0), 1.0);
        assert_eq!(label_scale(0.5), 1.5);
        assert!(label_scale(2.0) < 1.0);
    }

    #[test]
    fn fit_never_zooms_past_one() {
        let cfg = ViewportConfig::default();
        let mut view = ViewTransform::IDENTITY;
        let bounds = Rect::new(0.0, 0.0, 100.0, 50.0);
        view.fit(Some(bounds), Size::new(1000.0, 800.0), &cfg).unwrap();
        assert_eq!(view.scale, 1.0);
        // Graph center lands on viewport center.
        assert!(close(view.canvas_to_screen(bounds.center()), Point::new(500.0, 400.0)));
    }

    #[test]
    fn fit_shrinks_large_graphs() {
        let cfg = ViewportConfig::default();
        let mut view = ViewTransform::IDENTITY;
        let bounds = Rect::new(-500.0, -100.0, 1300.0, 300.0);
        view.fit(Some(bounds), Size::new(1000.0, 500.0), &cfg).unwrap();
        // Horizontal ratio (1800 + 200) / 1000 = 2 dominates.
        assert!((view.scale - 0.5).abs() < 1e-12);
        assert!(close(view.canvas_to_screen(bounds.center()), Point::new(500.0, 250.0)));
    }

    #[test]
    fn fit_rejects_empty_viewport() {
        let cfg = ViewportConfig::default();
        let mut view = ViewTransform {
            scale: 2.0,
            translate: Vec2::new(5.0, 5.0),
        };
        let before = view;
        let err = view.fit(Some(Rect::new(0.0, 0.0, 1.0, 1.0)), Size::new(0.0, 300.0), &cfg);
        assert_eq!(
            err,
            Err(ViewportError::EmptyViewport {
                width: 0.0,
                height: 300.0
            })
        );
        assert_eq!(view, before, "a failed fit must not touch the transform");
    }

    #[test]
    fn fit_empty_graph_resets() {
        let cfg = ViewportConfig::default();
        let mut view = ViewTransform {
            scale: 2.0,
            translate: Vec2::new(5.0, 5.0),
        };
        view.fit(None, Size::new(10.0, 10.0), &cfg).unwrap();
        assert_eq!(view, ViewTransform::IDENTITY);
    }
}
