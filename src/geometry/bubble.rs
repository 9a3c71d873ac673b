//! Bubble kerning
//!
//! A glyph's "bubble" is its silhouette drawn on top of its raster convex
//! hull, drawn on top of its expanded vector hull. Neighbouring bubbles
//! are pushed together until they touch, and the gap that was closed is
//! the kerning value for the pair.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::buffer::{expanded_hull_coverage, CapStyle, ExpansionOptions, JoinStyle};
use super::canvas::assemble_canvas;
use super::distance::{min_horizontal_distance, DistancePolicy};
use super::hull::raster_hull;
use super::outline::{OutlineResolver, DEFAULT_MAX_DEPTH};
use super::raster::{layer_coverage, Coverage, Rasterizer};
use crate::core::errors::{BubbleKernError, BubbleKernResult, GeometryError};
use crate::font_source::{Document, Layer};

/// Overlay values, later layers win
pub const EXPANDED_HULL_VALUE: f32 = 1.0;
pub const RASTER_HULL_VALUE: f32 = 2.0;
pub const GLYPH_VALUE: f32 = 3.0;

/// Everything that shapes a kerning run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KerningOptions {
    /// Pixels per font unit
    pub scale: f64,
    /// How far the vector hull grows, in font units
    pub expansion_distance: f64,
    pub cap_style: CapStyle,
    pub join_style: JoinStyle,
    pub policy: DistancePolicy,
    pub max_component_depth: usize,
}

impl Default for KerningOptions {
    fn default() -> Self {
        let expansion = ExpansionOptions::default();
        Self {
            scale: 0.1,
            expansion_distance: expansion.distance,
            cap_style: expansion.cap,
            join_style: expansion.join,
            policy: DistancePolicy::default(),
            max_component_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl KerningOptions {
    pub fn expansion(&self) -> ExpansionOptions {
        ExpansionOptions {
            distance: self.expansion_distance,
            cap: self.cap_style,
            join: self.join_style,
            scale: self.scale,
        }
    }
}

/// The three rasters that make up a glyph's bubble
#[derive(Debug, Clone, PartialEq)]
pub struct Bubble {
    pub glyph: String,
    pub silhouette: Coverage,
    pub hull: Coverage,
    pub expanded: Coverage,
}

impl Bubble {
    pub fn build(
        document: &Document,
        layer: &Layer,
        rasterizer: &dyn Rasterizer,
        options: &KerningOptions,
    ) -> Result<Self, GeometryError> {
        let resolver = OutlineResolver::new(document).with_max_depth(options.max_component_depth);
        let silhouette = layer_coverage(document, layer, rasterizer, &resolver, options.scale)?;
        let hull = raster_hull(&silhouette);
        let expanded = expanded_hull_coverage(document, layer, &resolver, &options.expansion())?;
        Ok(Self {
            glyph: layer.glyph_name.clone(),
            silhouette,
            hull,
            expanded,
        })
    }

    /// Single grid with expanded hull = 1, raster hull = 2, glyph = 3
    pub fn overlay(&self) -> Coverage {
        let mut grid = Coverage::new(self.expanded.width(), self.expanded.height());
        grid.overlay(&self.expanded, EXPANDED_HULL_VALUE);
        grid.overlay(&self.hull, RASTER_HULL_VALUE);
        grid.overlay(&self.silhouette, GLYPH_VALUE);
        grid
    }
}

/// Result of kerning a run of glyphs
#[derive(Debug, Clone, PartialEq)]
pub struct KerningRun {
    pub glyphs: Vec<String>,
    /// Gap between each neighbouring pair, in pixels
    pub gaps: Vec<i64>,
    /// All bubbles composed with their gaps applied
    pub canvas: Coverage,
}

impl KerningRun {
    /// Gaps converted back to font units at the run's scale
    pub fn gaps_in_units(&self, scale: f64) -> Vec<f64> {
        self.gaps.iter().map(|&g| g as f64 / scale).collect()
    }
}

/// Kern a run of glyphs by name using each glyph's default layer.
///
/// Bubbles are built in parallel. Any glyph that cannot be built fails the
/// run with an error naming that glyph.
pub fn kern_sequence<S>(
    document: &Document,
    names: &[S],
    rasterizer: &(dyn Rasterizer + Sync),
    options: &KerningOptions,
) -> BubbleKernResult<KerningRun>
where
    S: AsRef<str> + Sync,
{
    info!("Kerning {} glyphs at scale {}", names.len(), options.scale);
    let overlays = names
        .par_iter()
        .map(|name| {
            let name = name.as_ref();
            let layer = document
                .glyph(name)
                .and_then(|g| g.default_layer())
                .ok_or_else(|| GeometryError::UnknownGlyph(name.to_string()))
                .map_err(|e| BubbleKernError::from(e).for_glyph(name))?;
            Bubble::build(document, layer, rasterizer, options)
                .map(|bubble| bubble.overlay())
                .map_err(|e| BubbleKernError::from(e).for_glyph(name))
        })
        .collect::<BubbleKernResult<Vec<_>>>()?;

    let mut gaps = Vec::with_capacity(overlays.len().saturating_sub(1));
    for (pair, window) in names.windows(2).zip(overlays.windows(2)) {
        let gap = min_horizontal_distance(&window[0], &window[1], options.policy)
            .map_err(|e| BubbleKernError::from(e).for_glyph(pair[1].as_ref()))?;
        debug!("Gap between '{}' and '{}': {}", pair[0].as_ref(), pair[1].as_ref(), gap);
        gaps.push(gap);
    }

    let canvas = assemble_canvas(&overlays, &gaps)?;
    Ok(KerningRun {
        glyphs: names.iter().map(|n| n.as_ref().to_string()).collect(),
        gaps,
        canvas,
    })
}
