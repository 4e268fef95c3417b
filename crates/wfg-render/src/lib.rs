//! Projection of the workflow scene graph: SVG output and hit testing.

pub mod decorations;
pub mod hit;
pub mod svg;

pub use decorations::{Decorations, Ghost, Tooltip};
pub use hit::{Hit, hit_test, hit_test_edge};
pub use svg::render_svg;
