//! Edge auto-panning while dragging.
//!
//! When the pointer comes within `margin` of the viewport border during a
//! drag, the view scrolls in that direction once per animation frame. The
//! state machine owns the single frame handle: starting a new pan always
//! cancels the previous one, so two loops can never run at once.

use wfg_core::kurbo::{Point, Size, Vec2};

/// Duration of one frame at 60 Hz, in milliseconds.
const FRAME_MS: f64 = 1000.0 / 60.0;

/// Token for the scheduled per-frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHandle(u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanState {
    Idle,
    Panning {
        /// Per-axis sign (-1, 0, 1) of the scroll.
        direction: Vec2,
        /// Screen pixels scrolled since this pan started.
        accumulated: Vec2,
    },
}

#[derive(Debug, Clone)]
pub struct EdgePanner {
    state: PanState,
    handle: Option<FrameHandle>,
    next_handle: u64,
    last_tick: Option<f64>,
    margin: f64,
    speed: f64,
}

impl EdgePanner {
    /// `speed` is pixels per 60 Hz frame.
    pub fn new(margin: f64, speed: f64) -> Self {
        Self {
            state: PanState::Idle,
            handle: None,
            next_handle: 0,
            last_tick: None,
            margin,
            speed,
        }
    }

    pub fn state(&self) -> PanState {
        self.state
    }

    pub fn handle(&self) -> Option<FrameHandle> {
        self.handle
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, PanState::Panning { .. })
    }

    /// Scroll direction for a pointer at `cursor` (screen space).
    pub fn direction_for(&self, cursor: Point, viewport: Size) -> Vec2 {
        let axis = |pos: f64, extent: f64| {
            if pos < self.margin {
                -1.0
            } else if pos > extent - self.margin {
                1.0
            } else {
                0.0
            }
        };
        Vec2::new(axis(cursor.x, viewport.width), axis(cursor.y, viewport.height))
    }

    /// Re-evaluate after a pointer move. Returns whether a pan is running.
    pub fn update(&mut self, cursor: Point, viewport: Size) -> bool {
        let direction = self.direction_for(cursor, viewport);
        if direction == Vec2::ZERO {
            self.stop();
            return false;
        }
        match self.state {
            PanState::Panning { direction: d, .. } if d == direction => {}
            _ => self.start(direction),
        }
        true
    }

    fn start(&mut self, direction: Vec2) {
        // Drop any stale loop before scheduling the new one.
        self.stop();
        let handle = FrameHandle(self.next_handle);
        self.next_handle += 1;
        self.handle = Some(handle);
        self.state = PanState::Panning {
            direction,
            accumulated: Vec2::ZERO,
        };
        log::debug!("autopan: start {direction:?} ({handle:?})");
    }

    /// Advance one frame. Returns the screen-space scroll to apply, scaled
    /// by the time elapsed since the previous tick.
    pub fn tick(&mut self, now_ms: f64) -> Option<Vec2> {
        let PanState::Panning {
            direction,
            accumulated,
        } = self.state
        else {
            return None;
        };
        let elapsed = self.last_tick.map_or(FRAME_MS, |last| (now_ms - last).max(0.0));
        self.last_tick = Some(now_ms);

        let step = direction * (self.speed * elapsed / FRAME_MS);
        self.state = PanState::Panning {
            direction,
            accumulated: accumulated + step,
        };
        log::trace!("autopan: tick {step:?}");
        Some(step)
    }

    /// Cancel the loop. Returns the distance scrolled by it.
    pub fn stop(&mut self) -> Vec2 {
        let accumulated = match self.state {
            PanState::Panning { accumulated, .. } => accumulated,
            PanState::Idle => Vec2::ZERO,
        };
        if let Some(handle) = self.handle.take() {
            log::debug!("autopan: stop ({handle:?})");
        }
        self.state = PanState::Idle;
        self.last_tick = None;
        accumulated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEW: Size = Size::new(800.0, 600.0);

    #[test]
    fn interior_does_not_pan() {
        let mut p = EdgePanner::new(50.0, 10.0);
        assert!(!p.update(Point::new(400.0, 300.0), VIEW));
        assert_eq!(p.tick(0.0), None);
    }

    #[test]
    fn near_edge_pans_outward() {
        let mut p = EdgePanner::new(50.0, 10.0);
        assert!(p.update(Point::new(790.0, 10.0), VIEW));
        assert_eq!(p.direction_for(Point::new(790.0, 10.0), VIEW), Vec2::new(1.0, -1.0));

        let first = p.tick(1000.0).unwrap();
        assert_eq!(first, Vec2::new(10.0, -10.0));

        // Two frames elapsed: twice the distance.
        let second = p.tick(1000.0 + 2.0 * FRAME_MS).unwrap();
        assert!((second.x - 20.0).abs() < 1e-9);
    }

    #[test]
    fn one_handle_at_a_time() {
        let mut p = EdgePanner::new(50.0, 10.0);
        p.update(Point::new(790.0, 300.0), VIEW);
        let first = p.handle().unwrap();

        // Same direction keeps the running loop.
        p.update(Point::new(795.0, 300.0), VIEW);
        assert_eq!(p.handle(), Some(first));

        // Direction change replaces it.
        p.update(Point::new(5.0, 300.0), VIEW);
        let second = p.handle().unwrap();
        assert_ne!(first, second);

        p.tick(0.0);
        let scrolled = p.stop();
        assert_eq!(scrolled, Vec2::new(-10.0, 0.0));
        assert_eq!(p.handle(), None);
        assert!(!p.is_active());
    }
}
