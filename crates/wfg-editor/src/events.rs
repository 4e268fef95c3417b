//! Pointer dispatch helpers.
//!
//! `Scope` is the closed set of interactive regions a pointer-down can land
//! in; every gesture is bound to exactly one of them. `DragTracker` turns a
//! down → move* → up sequence into either a click or a drag with cumulative
//! deltas, ignoring jitter below a move-count threshold.

use wfg_core::kurbo::{Point, Vec2};
use wfg_core::{ConnectionId, EdgeKey, NodeId};
use wfg_render::Hit;

/// Where a pointer-down landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Background,
    NodeHandle(NodeId),
    Port(ConnectionId),
    Edge(EdgeKey),
}

impl From<Option<Hit>> for Scope {
    fn from(hit: Option<Hit>) -> Self {
        match hit {
            None => Scope::Background,
            Some(Hit::Node(id)) => Scope::NodeHandle(id),
            Some(Hit::Port(cid)) => Scope::Port(cid),
            Some(Hit::Edge(key)) => Scope::Edge(key),
        }
    }
}

/// Progress of a tracked pointer after a move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragUpdate {
    /// Still under the threshold; not a drag yet.
    Pending,
    /// The threshold was reached on this move.
    Started { delta: Vec2 },
    Moved { delta: Vec2 },
}

/// How a tracked pointer was released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragRelease {
    Click,
    /// A drag ended; no click is produced.
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragTracker {
    origin: Point,
    last: Point,
    moves: u32,
    threshold: u32,
    dragging: bool,
}

impl DragTracker {
    pub fn new(origin: Point, threshold: u32) -> Self {
        Self {
            origin,
            last: origin,
            moves: 0,
            threshold,
            dragging: false,
        }
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Delta from the pointer-down position to the latest move.
    pub fn delta(&self) -> Vec2 {
        self.last - self.origin
    }

    pub fn moved(&mut self, to: Point) -> DragUpdate {
        self.last = to;
        self.moves += 1;
        if self.dragging {
            return DragUpdate::Moved {
                delta: self.delta(),
            };
        }
        if self.moves >= self.threshold {
            self.dragging = true;
            return DragUpdate::Started {
                delta: self.delta(),
            };
        }
        DragUpdate::Pending
    }

    pub fn release(self) -> DragRelease {
        if self.dragging {
            DragRelease::Ended
        } else {
            DragRelease::Click
        }
    }
}
