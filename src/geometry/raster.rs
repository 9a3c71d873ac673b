//! Raster silhouettes
//!
//! The rest of the pipeline only ever sees [`Coverage`] grids, so the
//! rasterizer is a trait. [`ScanlineRasterizer`] is the built-in
//! implementation: nonzero winding over flattened contours with N×N
//! supersampling per pixel.

use kurbo::{PathEl, Point};

use super::outline::{Frame, Outline, OutlineResolver};
use crate::core::errors::GeometryError;
use crate::font_source::metrics::{DEFAULT_ASCENDER, DEFAULT_DESCENDER};
use crate::font_source::{Document, Layer};

/// A row-major grid of pixel coverage values in `[0, 1]`. Row 0 is the top.
#[derive(Debug, Clone, PartialEq)]
pub struct Coverage {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl Coverage {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width * height],
        }
    }

    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> f32) -> Self {
        let mut grid = Self::new(width, height);
        for row in 0..height {
            for col in 0..width {
                grid.data[row * width + col] = f(row, col);
            }
        }
        grid
    }

    /// Build a grid from rows of equal length; `None` if they are ragged
    pub fn from_rows(rows: &[Vec<f32>]) -> Option<Self> {
        let width = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != width) {
            return None;
        }
        Some(Self {
            width,
            height: rows.len(),
            data: rows.concat(),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.width + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        self.data[row * self.width + col] = value;
    }

    pub fn row(&self, row: usize) -> &[f32] {
        &self.data[row * self.width..(row + 1) * self.width]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        // chunks() panics on zero; an empty-width grid has no visible rows
        self.data.chunks(self.width.max(1))
    }

    pub fn row_is_empty(&self, row: usize) -> bool {
        self.row(row).iter().all(|&v| v <= 0.0)
    }

    pub fn leftmost_nonzero(&self, row: usize) -> Option<usize> {
        self.row(row).iter().position(|&v| v > 0.0)
    }

    pub fn rightmost_nonzero(&self, row: usize) -> Option<usize> {
        self.row(row).iter().rposition(|&v| v > 0.0)
    }

    /// 1 where coverage is above `level`, 0 elsewhere
    pub fn threshold(&self, level: f32) -> Coverage {
        Coverage {
            width: self.width,
            height: self.height,
            data: self
                .data
                .iter()
                .map(|&v| if v > level { 1.0 } else { 0.0 })
                .collect(),
        }
    }

    /// Paint `value` wherever `mask` is nonzero. Grids must be the same size.
    pub fn overlay(&mut self, mask: &Coverage, value: f32) {
        debug_assert_eq!((self.width, self.height), (mask.width, mask.height));
        for (dst, &m) in self.data.iter_mut().zip(&mask.data) {
            if m > 0.0 {
                *dst = value;
            }
        }
    }

    /// Add another grid into this one with its left edge at `col_offset`.
    /// Columns that fall outside are dropped.
    pub fn add_at(&mut self, other: &Coverage, col_offset: usize) {
        let rows = self.height.min(other.height);
        for row in 0..rows {
            for col in 0..other.width {
                let target = col_offset + col;
                if target >= self.width {
                    break;
                }
                self.data[row * self.width + target] += other.get(row, col);
            }
        }
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().map(|&v| v as f64).sum()
    }

    pub fn count_nonzero(&self) -> usize {
        self.data.iter().filter(|&&v| v > 0.0).count()
    }

    pub fn values(&self) -> &[f32] {
        &self.data
    }
}

/// Canvas extent in font units plus the pixels-per-unit scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
    pub scale: f64,
}

impl Canvas {
    pub fn new(width: f64, height: f64, scale: f64) -> Self {
        Self {
            width,
            height,
            scale,
        }
    }

    /// Grid size in pixels, `(columns, rows)`
    pub fn pixel_size(&self) -> (usize, usize) {
        let px = |v: f64| (v * self.scale).ceil().max(0.0) as usize;
        (px(self.width), px(self.height))
    }
}

/// Produces a coverage grid for an outline.
///
/// The outline is in device orientation (y down, origin at the top-left
/// of the canvas) but unscaled; implementations apply `canvas.scale`.
pub trait Rasterizer {
    fn rasterize(&self, outline: &Outline, canvas: Canvas) -> Coverage;
}

/// Nonzero-winding scanline fill with supersampling
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanlineRasterizer {
    /// Samples per pixel along each axis
    pub samples: usize,
    /// Curve flattening tolerance in pixels
    pub tolerance: f64,
}

impl Default for ScanlineRasterizer {
    fn default() -> Self {
        Self {
            samples: 4,
            tolerance: 0.1,
        }
    }
}

impl ScanlineRasterizer {
    pub fn with_samples(samples: usize) -> Self {
        Self {
            samples: samples.max(1),
            ..Default::default()
        }
    }
}

/// A polygon edge in pixel space with its winding direction
#[derive(Debug, Clone, Copy)]
struct Edge {
    from: Point,
    to: Point,
    winding: i32,
}

impl Edge {
    fn new(from: Point, to: Point) -> Option<Self> {
        if from.y == to.y {
            return None;
        }
        let winding = if to.y > from.y { 1 } else { -1 };
        Some(Self { from, to, winding })
    }

    fn crossing(&self, y: f64) -> Option<f64> {
        let (lo, hi) = if self.from.y < self.to.y {
            (self.from.y, self.to.y)
        } else {
            (self.to.y, self.from.y)
        };
        if y < lo || y >= hi {
            return None;
        }
        let dx = self.to.x - self.from.x;
        Some(self.from.x + (y - self.from.y) * dx / (self.to.y - self.from.y))
    }
}

fn collect_edges(outline: &Outline, scale: f64, tolerance: f64) -> Vec<Edge> {
    let mut edges = Vec::new();
    let to_px = |p: Point| Point::new(p.x * scale, p.y * scale);
    // Tolerance is given in pixels; flattening happens in font units
    let tolerance = if scale > 0.0 { tolerance / scale } else { tolerance };

    for contour in &outline.contours {
        let mut start: Option<Point> = None;
        let mut last: Option<Point> = None;
        let close = |edges: &mut Vec<Edge>, start: Option<Point>, last: Option<Point>| {
            if let (Some(s), Some(l)) = (start, last) {
                edges.extend(Edge::new(l, s));
            }
        };
        kurbo::flatten(contour, tolerance, |el| match el {
            PathEl::MoveTo(p) => {
                close(&mut edges, start, last);
                start = Some(to_px(p));
                last = start;
            }
            PathEl::LineTo(p) => {
                let p = to_px(p);
                if let Some(l) = last {
                    edges.extend(Edge::new(l, p));
                }
                last = Some(p);
            }
            PathEl::ClosePath => {
                close(&mut edges, start, last);
                last = start;
            }
            _ => {}
        });
        close(&mut edges, start, last);
    }
    edges
}

/// Spans `[x0, x1)` of a scanline that are inside under the nonzero rule
fn winding_spans(edges: &[Edge], y: f64, crossings: &mut Vec<(f64, i32)>) -> Vec<(f64, f64)> {
    crossings.clear();
    crossings.extend(
        edges
            .iter()
            .filter_map(|e| e.crossing(y).map(|x| (x, e.winding))),
    );
    crossings.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut spans = Vec::new();
    let mut winding = 0;
    let mut span_start = 0.0;
    for &(x, dir) in crossings.iter() {
        let was_inside = winding != 0;
        winding += dir;
        match (was_inside, winding != 0) {
            (false, true) => span_start = x,
            (true, false) => spans.push((span_start, x)),
            _ => {}
        }
    }
    spans
}

impl Rasterizer for ScanlineRasterizer {
    fn rasterize(&self, outline: &Outline, canvas: Canvas) -> Coverage {
        let (width, height) = canvas.pixel_size();
        let mut grid = Coverage::new(width, height);
        if width == 0 || height == 0 {
            return grid;
        }

        let n = self.samples.max(1);
        let edges = collect_edges(outline, canvas.scale, self.tolerance);
        let sub_columns = width * n;
        let per_pixel = (n * n) as f32;
        let mut hits = vec![0u32; width];
        let mut crossings = Vec::new();

        for row in 0..height {
            hits.iter_mut().for_each(|h| *h = 0);
            for sy in 0..n {
                let y = row as f64 + (sy as f64 + 0.5) / n as f64;
                for (x0, x1) in winding_spans(&edges, y, &mut crossings) {
                    // Sub-column k is covered when its centre (k + 0.5) / n is in [x0, x1)
                    let first = (x0 * n as f64 - 0.5).ceil().max(0.0) as usize;
                    let end = (x1 * n as f64 - 0.5).ceil().min(sub_columns as f64);
                    if end <= 0.0 {
                        continue;
                    }
                    for k in first..end as usize {
                        hits[k / n] += 1;
                    }
                }
            }
            for (col, &h) in hits.iter().enumerate() {
                grid.set(row, col, h as f32 / per_pixel);
            }
        }
        grid
    }
}

/// Fill a polygon given in pixel coordinates, marking every pixel whose
/// centre lies inside it (even-odd rule). Values are 0 or 1.
pub fn fill_pixel_polygon(polygon: &[Point], width: usize, height: usize) -> Coverage {
    let mut grid = Coverage::new(width, height);
    if polygon.len() < 3 {
        return grid;
    }
    let edges: Vec<(Point, Point)> = polygon
        .iter()
        .zip(polygon.iter().cycle().skip(1))
        .map(|(&a, &b)| (a, b))
        .collect();

    let mut xs = Vec::new();
    for row in 0..height {
        let y = row as f64 + 0.5;
        xs.clear();
        for &(a, b) in &edges {
            if (a.y <= y && b.y > y) || (b.y <= y && a.y > y) {
                xs.push(a.x + (y - a.y) * (b.x - a.x) / (b.y - a.y));
            }
        }
        xs.sort_by(|a, b| a.total_cmp(b));
        for pair in xs.chunks_exact(2) {
            // Centres c + 0.5 with pair[0] <= c + 0.5 <= pair[1]
            let first = (pair[0] - 0.5).ceil().max(0.0) as usize;
            let last = (pair[1] - 0.5).floor();
            if last < 0.0 {
                continue;
            }
            let last = (last as usize).min(width.saturating_sub(1));
            for col in first..=last {
                if col < width {
                    grid.set(row, col, 1.0);
                }
            }
        }
    }
    grid
}

/// Canvas for a layer: its advance width by the master's line height
pub fn layer_canvas(document: &Document, layer: &Layer, scale: f64) -> Canvas {
    let (ascender, descender) = layer
        .master(document)
        .map(|m| (m.ascender, m.descender))
        .unwrap_or((DEFAULT_ASCENDER, DEFAULT_DESCENDER));
    Canvas::new(layer.width, ascender - descender, scale)
}

/// Resolve and rasterize a layer in one go
pub fn layer_coverage(
    document: &Document,
    layer: &Layer,
    rasterizer: &dyn Rasterizer,
    resolver: &OutlineResolver<'_>,
    scale: f64,
) -> Result<Coverage, GeometryError> {
    let outline = resolver.resolve(layer, Frame::for_layer(document, layer))?;
    Ok(rasterizer.rasterize(&outline, layer_canvas(document, layer, scale)))
}
