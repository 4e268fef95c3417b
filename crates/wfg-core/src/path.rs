//! Cubic Bézier connection curves.
//!
//! A connection leaves an output port heading right and enters an input port
//! heading left, so control points are pushed horizontally away from the
//! endpoints by half the horizontal span.

use kurbo::{BezPath, CubicBez, Point};
use std::fmt;
use std::str::FromStr;
use winnow::ascii::{float, multispace0, multispace1};
use winnow::combinator::{alt, opt};
use winnow::prelude::*;

/// Which way a curve bulges out of its starting endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveDirection {
    /// Start is an input port: leave leftward, enter the end from the right.
    Left,
    /// Start is an output port: leave rightward, enter the end from the left.
    Right,
}

/// Start, two control points, end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectionPath {
    pub start: Point,
    pub c1: Point,
    pub c2: Point,
    pub end: Point,
}

/// Build a connection curve between two points.
///
/// With `None` both control points sit at the horizontal midpoint.
pub fn make_path(start: Point, end: Point, direction: Option<CurveDirection>) -> ConnectionPath {
    let half = (start.x - end.x).abs() / 2.0;
    let (c1x, c2x) = match direction {
        Some(CurveDirection::Right) => (start.x + half, end.x - half),
        Some(CurveDirection::Left) => (start.x - half, end.x + half),
        None => {
            let mid = start.x + (end.x - start.x) / 2.0;
            (mid, mid)
        }
    };
    ConnectionPath {
        start,
        c1: Point::new(c1x, start.y),
        c2: Point::new(c2x, end.y),
        end,
    }
}

impl ConnectionPath {
    /// The same curve traversed end to start.
    pub fn reversed(&self) -> Self {
        Self {
            start: self.end,
            c1: self.c2,
            c2: self.c1,
            end: self.start,
        }
    }

    pub fn to_cubic(&self) -> CubicBez {
        CubicBez::new(self.start, self.c1, self.c2, self.end)
    }

    pub fn to_bez_path(&self) -> BezPath {
        let mut path = BezPath::new();
        path.move_to(self.start);
        path.curve_to(self.c1, self.c2, self.end);
        path
    }
}

impl fmt::Display for ConnectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "M {} {} C {} {} {} {} {} {}",
            self.start.x,
            self.start.y,
            self.c1.x,
            self.c1.y,
            self.c2.x,
            self.c2.y,
            self.end.x,
            self.end.y
        )
    }
}

// ─── Parsing ─────────────────────────────────────────────────────────────

fn separator(input: &mut &str) -> ModalResult<()> {
    alt(((multispace0, ',', multispace0).void(), multispace1.void())).parse_next(input)
}

fn coord(input: &mut &str) -> ModalResult<f64> {
    let _ = opt(separator).parse_next(input)?;
    float.parse_next(input)
}

fn point(input: &mut &str) -> ModalResult<Point> {
    let x = coord.parse_next(input)?;
    let y = coord.parse_next(input)?;
    Ok(Point::new(x, y))
}

fn parse_path(input: &mut &str) -> ModalResult<ConnectionPath> {
    let _ = (multispace0, 'M').parse_next(input)?;
    let start = point.parse_next(input)?;
    let _ = (multispace0, 'C').parse_next(input)?;
    let c1 = point.parse_next(input)?;
    let c2 = point.parse_next(input)?;
    let end = point.parse_next(input)?;
    let _ = multispace0.parse_next(input)?;
    Ok(ConnectionPath { start, c1, c2, end })
}

impl FromStr for ConnectionPath {
    type Err = String;

    /// Parse a single `M x y C x y x y x y` path descriptor.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_path
            .parse(s)
            .map_err(|e| format!("Invalid connection path: {e}"))
    }
}
