//! Geometry pipeline
//!
//! Outlines are resolved from the font model, rasterized into coverage
//! grids, wrapped in convex hulls and finally compared side by side to find
//! kerning gaps.

pub mod bubble;
pub mod buffer;
pub mod canvas;
pub mod distance;
pub mod hull;
pub mod outline;
pub mod raster;

// Re-export commonly used items
pub use bubble::{kern_sequence, Bubble, KerningOptions, KerningRun};
pub use buffer::{
    expand, expanded_hull_coverage, fill_polygon, CapStyle, ExpansionOptions, JoinStyle,
};
pub use canvas::assemble_canvas;
pub use distance::{min_horizontal_distance, DistancePolicy};
pub use hull::{convex_hull, raster_hull, Hull};
pub use outline::{layer_to_svg, resolve_glyphs, Frame, Outline, OutlineResolver};
pub use raster::{
    layer_canvas, layer_coverage, Canvas, Coverage, Rasterizer, ScanlineRasterizer,
};
