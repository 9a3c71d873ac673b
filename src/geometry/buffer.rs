//! Growing a convex hull outward by a fixed distance
//!
//! Style codes follow the usual buffering convention: caps are
//! 1 = round, 2 = flat, 3 = square and joins are 1 = round, 2 = mitre,
//! 3 = bevel. Caps only matter for hulls that collapsed to a point or a
//! segment; joins only for real polygons.

use std::f64::consts::FRAC_PI_2;

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::hull::Hull;
use super::outline::OutlineResolver;
use super::raster::{fill_pixel_polygon, layer_canvas, Canvas, Coverage};
use crate::core::errors::GeometryError;
use crate::font_source::metrics::DEFAULT_ASCENDER;
use crate::font_source::{Document, Layer};

/// Segments used to approximate a quarter circle
pub const QUADRANT_SEGMENTS: usize = 16;

/// Mitre joins reaching further than this multiple of the distance are
/// clipped at that length
pub const MITRE_LIMIT: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapStyle {
    Round,
    Flat,
    #[default]
    Square,
}

impl CapStyle {
    pub fn from_code(code: u8) -> Result<Self, GeometryError> {
        match code {
            1 => Ok(CapStyle::Round),
            2 => Ok(CapStyle::Flat),
            3 => Ok(CapStyle::Square),
            _ => Err(GeometryError::UnsupportedStyle { kind: "cap", code }),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            CapStyle::Round => 1,
            CapStyle::Flat => 2,
            CapStyle::Square => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinStyle {
    Round,
    Mitre,
    #[default]
    Bevel,
}

impl JoinStyle {
    pub fn from_code(code: u8) -> Result<Self, GeometryError> {
        match code {
            1 => Ok(JoinStyle::Round),
            2 => Ok(JoinStyle::Mitre),
            3 => Ok(JoinStyle::Bevel),
            _ => Err(GeometryError::UnsupportedStyle { kind: "join", code }),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            JoinStyle::Round => 1,
            JoinStyle::Mitre => 2,
            JoinStyle::Bevel => 3,
        }
    }
}

/// Parameters for [`expanded_hull_coverage`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpansionOptions {
    /// Outward distance in font units
    pub distance: f64,
    pub cap: CapStyle,
    pub join: JoinStyle,
    /// Pixels per font unit
    pub scale: f64,
}

impl Default for ExpansionOptions {
    fn default() -> Self {
        Self {
            distance: 100.0,
            cap: CapStyle::Square,
            join: JoinStyle::Bevel,
            scale: 1.0,
        }
    }
}

impl ExpansionOptions {
    /// Options from raw style codes, rejecting unknown codes up front
    pub fn from_codes(distance: f64, cap: u8, join: u8, scale: f64) -> Result<Self, GeometryError> {
        Ok(Self {
            distance,
            cap: CapStyle::from_code(cap)?,
            join: JoinStyle::from_code(join)?,
            scale,
        })
    }
}

/// Points on an arc around `center` from angle `start` sweeping `sweep`
/// radians (positive is counter-clockwise), endpoints included
fn arc(center: Point, radius: f64, start: f64, sweep: f64, out: &mut Vec<Point>) {
    let step = FRAC_PI_2 / QUADRANT_SEGMENTS as f64;
    // Slack keeps an exact quarter turn at QUADRANT_SEGMENTS segments
    let segments = (sweep.abs() / step - 1e-9).ceil().max(1.0) as usize;
    for i in 0..=segments {
        let angle = start + sweep * i as f64 / segments as f64;
        out.push(center + Vec2::from_angle(angle) * radius);
    }
}

/// Outward unit normal of a counter-clockwise edge
fn outward_normal(from: Point, to: Point) -> Vec2 {
    let d = (to - from).normalize();
    Vec2::new(d.y, -d.x)
}

fn expand_polygon(vertices: &[Point], distance: f64, join: JoinStyle) -> Vec<Point> {
    let n = vertices.len();
    let mut out = Vec::new();
    for i in 0..n {
        let prev = vertices[(i + n - 1) % n];
        let here = vertices[i];
        let next = vertices[(i + 1) % n];
        let n_in = outward_normal(prev, here);
        let n_out = outward_normal(here, next);
        let start = here + n_in * distance;
        let end = here + n_out * distance;

        match join {
            JoinStyle::Bevel => out.extend([start, end]),
            JoinStyle::Round => {
                // Convex counter-clockwise corners always turn left
                let sweep = n_in.cross(n_out).atan2(n_in.dot(n_out));
                arc(here, distance, n_in.atan2(), sweep, &mut out);
            }
            JoinStyle::Mitre => {
                let bisector = n_in + n_out;
                let cos_half = (bisector.hypot() / 2.0).max(f64::EPSILON);
                if 1.0 / cos_half <= MITRE_LIMIT {
                    out.push(here + bisector.normalize() * (distance / cos_half));
                } else {
                    // Cut the spike square to the bisector at the limit
                    let axis = bisector.normalize();
                    let reach = MITRE_LIMIT * distance;
                    let along_in = (here - prev).normalize();
                    let along_out = (next - here).normalize();
                    let t_in = (reach - distance * n_in.dot(axis)) / along_in.dot(axis);
                    let t_out = (reach - distance * n_out.dot(axis)) / -along_out.dot(axis);
                    out.extend([start + along_in * t_in, end - along_out * t_out]);
                }
            }
        }
    }
    out
}

fn expand_segment(a: Point, b: Point, distance: f64, cap: CapStyle) -> Vec<Point> {
    let along = (b - a).normalize();
    let normal = Vec2::new(-along.y, along.x);
    match cap {
        CapStyle::Flat => vec![
            a - normal * distance,
            b - normal * distance,
            b + normal * distance,
            a + normal * distance,
        ],
        CapStyle::Square => {
            let (a, b) = (a - along * distance, b + along * distance);
            vec![
                a - normal * distance,
                b - normal * distance,
                b + normal * distance,
                a + normal * distance,
            ]
        }
        CapStyle::Round => {
            let mut out = Vec::new();
            let base = (-normal).atan2();
            arc(b, distance, base, std::f64::consts::PI, &mut out);
            arc(a, distance, base + std::f64::consts::PI, std::f64::consts::PI, &mut out);
            out
        }
    }
}

fn expand_point(p: Point, distance: f64, cap: CapStyle) -> Vec<Point> {
    match cap {
        // A flat-capped point has no area
        CapStyle::Flat => Vec::new(),
        CapStyle::Square => vec![
            Point::new(p.x - distance, p.y - distance),
            Point::new(p.x + distance, p.y - distance),
            Point::new(p.x + distance, p.y + distance),
            Point::new(p.x - distance, p.y + distance),
        ],
        CapStyle::Round => {
            let mut out = Vec::new();
            arc(p, distance, 0.0, 4.0 * FRAC_PI_2, &mut out);
            out.pop();
            out
        }
    }
}

/// Expand a hull outward by `distance`.
///
/// Returns the expanded polygon's vertices; a zero distance gives back a
/// polygon hull unchanged and no area for lower-dimensional hulls.
pub fn expand(
    hull: &Hull,
    distance: f64,
    cap: CapStyle,
    join: JoinStyle,
) -> Result<Vec<Point>, GeometryError> {
    if !distance.is_finite() || distance < 0.0 {
        return Err(GeometryError::InvalidDistance(distance));
    }
    let polygon = match hull {
        Hull::Empty => return Err(GeometryError::EmptyInput("convex hull expansion")),
        Hull::Polygon(vertices) if distance == 0.0 => vertices.clone(),
        _ if distance == 0.0 => Vec::new(),
        Hull::Point(p) => expand_point(*p, distance, cap),
        Hull::Segment(a, b) => expand_segment(*a, *b, distance, cap),
        Hull::Polygon(vertices) => expand_polygon(vertices, distance, join),
    };
    Ok(polygon)
}

/// Same as [`expand`] but with raw style codes, validated before anything
/// else happens
pub fn expand_with_codes(
    hull: &Hull,
    distance: f64,
    cap: u8,
    join: u8,
) -> Result<Vec<Point>, GeometryError> {
    let cap = CapStyle::from_code(cap)?;
    let join = JoinStyle::from_code(join)?;
    expand(hull, distance, cap, join)
}

/// Rasterize a polygon in font units onto a canvas, flipping y around the
/// ascender. A pixel is set when its centre is inside the polygon.
pub fn fill_polygon(polygon: &[Point], canvas: Canvas, ascender: f64) -> Coverage {
    let (width, height) = canvas.pixel_size();
    let mapped: Vec<Point> = polygon
        .iter()
        .map(|p| Point::new(p.x * canvas.scale, (ascender - p.y) * canvas.scale))
        .collect();
    fill_pixel_polygon(&mapped, width, height)
}

/// The layer's convex hull, expanded and rasterized on the layer canvas
pub fn expanded_hull_coverage(
    document: &Document,
    layer: &Layer,
    resolver: &OutlineResolver<'_>,
    options: &ExpansionOptions,
) -> Result<Coverage, GeometryError> {
    let points: Vec<Point> = resolver
        .collect_polygons(layer)?
        .into_iter()
        .flatten()
        .collect();
    let hull = Hull::from_points(&points);
    let polygon = expand(&hull, options.distance, options.cap, options.join)?;
    debug!(
        "Expanded hull of '{}' by {} into {} vertices",
        layer.glyph_name,
        options.distance,
        polygon.len()
    );

    let ascender = layer
        .master(document)
        .map(|m| m.ascender)
        .unwrap_or(DEFAULT_ASCENDER);
    let canvas = layer_canvas(document, layer, options.scale);
    Ok(fill_polygon(&polygon, canvas, ascender))
}
