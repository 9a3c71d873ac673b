//! Turning layers into drawable outlines
//!
//! A layer's paths are converted node by node into `kurbo` contours and its
//! components are expanded in place. Component expansion uses an explicit
//! worklist instead of recursion so that arbitrarily deep (or cyclic)
//! reference chains fail with an error rather than overflowing the stack.

use kurbo::{BezPath, PathEl, Point, Vec2};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::core::errors::GeometryError;
use crate::font_source::metrics::{DEFAULT_ASCENDER, DEFAULT_DESCENDER};
use crate::font_source::{ComponentRef, Document, Layer, NodeKind, Path, Shape};

/// How many levels of components may nest below the layer being resolved
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Flattening tolerance for polygons in font units
const POLYGON_TOLERANCE: f64 = 0.25;

/// Maps font coordinates (y up) to device coordinates (y down)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub ascender: f64,
    pub scale: f64,
    pub offset: Vec2,
}

impl Frame {
    pub fn new(ascender: f64) -> Self {
        Self {
            ascender,
            scale: 1.0,
            offset: Vec2::ZERO,
        }
    }

    /// Frame anchored at the ascender of the layer's master
    pub fn for_layer(document: &Document, layer: &Layer) -> Self {
        let ascender = layer
            .master(document)
            .map(|m| m.ascender)
            .unwrap_or(DEFAULT_ASCENDER);
        Self::new(ascender)
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    /// Device position of a node drawn with an extra component offset
    pub fn map(&self, point: Point, offset: Vec2) -> Point {
        let x = point.x + self.offset.x + offset.x;
        let y = point.y + self.offset.y + offset.y;
        Point::new(x * self.scale, (self.ascender - y) * self.scale)
    }
}

/// Resolved geometry of one layer in device coordinates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outline {
    pub contours: Vec<BezPath>,
}

impl Outline {
    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    pub fn len(&self) -> usize {
        self.contours.len()
    }

    /// All contours as SVG path data, one subpath per contour
    pub fn to_svg_path(&self) -> String {
        self.contours
            .iter()
            .map(BezPath::to_svg)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Pending work while expanding a layer
enum Work<'d> {
    Path {
        path: &'d Path,
        offset: Vec2,
        glyph: &'d str,
    },
    Component {
        component: &'d ComponentRef,
        offset: Vec2,
        chain: Vec<&'d str>,
    },
}

/// Resolves layers of one document into outlines
#[derive(Debug, Clone, Copy)]
pub struct OutlineResolver<'d> {
    document: &'d Document,
    max_depth: usize,
}

impl<'d> OutlineResolver<'d> {
    pub fn new(document: &'d Document) -> Self {
        Self {
            document,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn document(&self) -> &'d Document {
        self.document
    }

    /// Build the outline of a layer with every component expanded.
    ///
    /// Contours come out in document order: a layer's shapes in the order
    /// they are stored, with a component's contours spliced in where the
    /// component appears.
    pub fn resolve(&self, layer: &'d Layer, frame: Frame) -> Result<Outline, GeometryError> {
        let mut contours = Vec::new();
        self.walk(layer, false, |path, offset, glyph| {
            let contour = contour_from_path(path, glyph, |p| frame.map(p, offset))?;
            contours.push(contour);
            Ok(())
        })?;
        debug!(
            "Resolved glyph '{}' layer '{}' into {} contours",
            layer.glyph_name,
            layer.id,
            contours.len()
        );
        Ok(Outline { contours })
    }

    /// Flattened contours in font coordinates.
    ///
    /// Components that cannot be resolved are skipped with a warning;
    /// cycles and malformed paths are still errors.
    pub fn collect_polygons(&self, layer: &'d Layer) -> Result<Vec<Vec<Point>>, GeometryError> {
        let mut polygons = Vec::new();
        self.walk(layer, true, |path, offset, glyph| {
            let contour = contour_from_path(path, glyph, |p| p + offset)?;
            polygons.push(flatten_contour(&contour, POLYGON_TOLERANCE));
            Ok(())
        })?;
        Ok(polygons)
    }

    fn walk<F>(&self, layer: &'d Layer, lenient: bool, mut visit: F) -> Result<(), GeometryError>
    where
        F: FnMut(&'d Path, Vec2, &'d str) -> Result<(), GeometryError>,
    {
        let master = layer.master_id.as_deref();
        let root = layer.glyph_name.as_str();
        let mut stack = Vec::new();
        push_shapes(&mut stack, layer, Vec2::ZERO, vec![root]);

        while let Some(work) = stack.pop() {
            match work {
                Work::Path {
                    path,
                    offset,
                    glyph,
                } => visit(path, offset, glyph)?,
                Work::Component {
                    component,
                    offset,
                    mut chain,
                } => {
                    let target = component.glyph_name.as_str();
                    if chain.contains(&target) {
                        let mut chain: Vec<String> =
                            chain.iter().map(|name| name.to_string()).collect();
                        chain.push(target.to_string());
                        return Err(GeometryError::ComponentCycle { chain });
                    }
                    // The root glyph is not a nesting level
                    if chain.len() > self.max_depth {
                        return Err(GeometryError::DepthExceeded {
                            glyph: root.to_string(),
                            limit: self.max_depth,
                        });
                    }

                    let referenced = self
                        .document
                        .glyph(target)
                        .and_then(|g| g.default_layer_for(master));
                    let Some(referenced) = referenced else {
                        let glyph = chain.last().copied().unwrap_or(root);
                        if lenient {
                            warn!(
                                "Skipping component '{}' in glyph '{}': no default layer",
                                target, glyph
                            );
                            continue;
                        }
                        return Err(GeometryError::UnresolvedComponent {
                            glyph: glyph.to_string(),
                            target: target.to_string(),
                        });
                    };

                    chain.push(target);
                    push_shapes(&mut stack, referenced, offset + component.offset, chain);
                }
            }
        }
        Ok(())
    }
}

/// Queue a layer's shapes so they pop off the stack in document order
fn push_shapes<'d>(stack: &mut Vec<Work<'d>>, layer: &'d Layer, offset: Vec2, chain: Vec<&'d str>) {
    let glyph = chain.last().copied().unwrap_or(layer.glyph_name.as_str());
    for shape in layer.shapes.iter().rev() {
        match shape {
            Shape::Path(path) => stack.push(Work::Path {
                path,
                offset,
                glyph,
            }),
            Shape::Component(component) => stack.push(Work::Component {
                component,
                offset,
                chain: chain.clone(),
            }),
        }
    }
}

/// Convert one stored path into a closed contour.
///
/// Drawing starts at the last node. The remaining nodes are walked in
/// order; an off-curve node must be followed by a second off-curve node
/// and an on-curve curve node, which together form one cubic segment. The
/// third node of a triplet may be the starting node itself.
fn contour_from_path<M>(path: &Path, glyph: &str, map: M) -> Result<BezPath, GeometryError>
where
    M: Fn(Point) -> Point,
{
    let nodes = &path.nodes;
    let Some(last) = nodes.last() else {
        return Err(GeometryError::EmptyPath {
            glyph: glyph.to_string(),
        });
    };
    let n = nodes.len();
    if last.kind == NodeKind::OffCurve {
        return Err(GeometryError::BrokenCurveTriplet {
            glyph: glyph.to_string(),
            index: n - 1,
        });
    }

    let mut bez = BezPath::new();
    bez.move_to(map(last.position));

    let mut i = 0;
    while i < n - 1 {
        let node = &nodes[i];
        match node.kind {
            NodeKind::Line => {
                bez.line_to(map(node.position));
                i += 1;
            }
            NodeKind::OffCurve => match (nodes.get(i + 1), nodes.get(i + 2)) {
                (Some(c2), Some(end))
                    if c2.kind == NodeKind::OffCurve && end.kind == NodeKind::Curve =>
                {
                    bez.curve_to(map(node.position), map(c2.position), map(end.position));
                    i += 3;
                }
                _ => {
                    return Err(GeometryError::BrokenCurveTriplet {
                        glyph: glyph.to_string(),
                        index: i,
                    })
                }
            },
            NodeKind::Curve => {
                return Err(GeometryError::StrayCurveNode {
                    glyph: glyph.to_string(),
                    index: i,
                })
            }
        }
    }

    bez.close_path();
    Ok(bez)
}

/// Flatten a single contour into a polygon
fn flatten_contour(contour: &BezPath, tolerance: f64) -> Vec<Point> {
    let mut points = Vec::new();
    kurbo::flatten(contour, tolerance, |el| match el {
        PathEl::MoveTo(p) | PathEl::LineTo(p) => points.push(p),
        _ => {}
    });
    points
}

/// A complete SVG document for a layer: white background, black fill
pub fn layer_to_svg<'d>(
    resolver: &OutlineResolver<'d>,
    layer: &'d Layer,
    scale: f64,
) -> Result<String, GeometryError> {
    let document = resolver.document();
    let frame = Frame::for_layer(document, layer).with_scale(scale);
    let outline = resolver.resolve(layer, frame)?;
    let (ascender, descender) = layer
        .master(document)
        .map(|m| (m.ascender, m.descender))
        .unwrap_or((DEFAULT_ASCENDER, DEFAULT_DESCENDER));
    let width = layer.width * scale;
    let height = (ascender - descender) * scale;

    Ok(format!(
        concat!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" ",
            "viewBox=\"0 0 {w} {h}\">\n",
            "  <rect width=\"{w}\" height=\"{h}\" fill=\"white\"/>\n",
            "  <path d=\"{d}\" fill=\"black\"/>\n",
            "</svg>\n"
        ),
        w = width,
        h = height,
        d = outline.to_svg_path(),
    ))
}

/// Resolve the default layers of many glyphs in parallel.
///
/// Every glyph succeeds or fails on its own; results keep the order of
/// `names`.
pub fn resolve_glyphs<S>(
    resolver: &OutlineResolver<'_>,
    names: &[S],
    scale: f64,
) -> Vec<(String, Result<Outline, GeometryError>)>
where
    S: AsRef<str> + Sync,
{
    let document = resolver.document();
    names
        .par_iter()
        .map(|name| {
            let name = name.as_ref();
            let result = document
                .glyph(name)
                .and_then(|g| g.default_layer())
                .ok_or_else(|| GeometryError::UnknownGlyph(name.to_string()))
                .and_then(|layer| {
                    let frame = Frame::for_layer(document, layer).with_scale(scale);
                    resolver.resolve(layer, frame)
                });
            (name.to_string(), result)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font_source::tests::fixtures::glyphs3_document;
    use crate::font_source::{Glyph, Master};

    fn default_layer<'d>(doc: &'d Document, name: &str) -> &'d Layer {
        doc.glyph(name).unwrap().default_layer().unwrap()
    }

    fn single_layer_doc(shapes: Vec<Shape>) -> Document {
        let mut doc = Document::new(3);
        doc.insert_master(Master::new("m", "Regular").with_vertical_metrics(800.0, -200.0));
        let mut glyph = Glyph::new("g", None);
        glyph.layers.push(Layer {
            glyph_name: "g".into(),
            id: "m".into(),
            name: None,
            master_id: Some("m".into()),
            is_default: true,
            width: 500.0,
            shapes,
        });
        doc.insert_glyph(glyph).unwrap();
        doc
    }

    fn path_of(nodes: &[(f64, f64, NodeKind)]) -> Shape {
        let mut path = Path::new(true);
        for &(x, y, kind) in nodes {
            path.add((x, y), kind);
        }
        Shape::Path(path)
    }

    #[test]
    fn rectangle_is_flipped_around_the_ascender() {
        let doc = single_layer_doc(vec![path_of(&[
            (0.0, 0.0, NodeKind::Line),
            (0.0, 100.0, NodeKind::Line),
            (100.0, 100.0, NodeKind::Line),
            (100.0, 0.0, NodeKind::Line),
        ])]);
        let layer = default_layer(&doc, "g");
        let outline = OutlineResolver::new(&doc)
            .resolve(layer, Frame::new(800.0))
            .unwrap();

        assert_eq!(outline.len(), 1);
        let els = outline.contours[0].elements();
        assert_eq!(els[0], PathEl::MoveTo(Point::new(100.0, 800.0)));
        assert_eq!(els[1], PathEl::LineTo(Point::new(0.0, 800.0)));
        assert_eq!(els[2], PathEl::LineTo(Point::new(0.0, 700.0)));
        assert_eq!(els[3], PathEl::LineTo(Point::new(100.0, 700.0)));
        assert_eq!(els[4], PathEl::ClosePath);
        assert_eq!(els.len(), 5);
    }

    #[test]
    fn frame_scales_and_offsets() {
        let frame = Frame::new(800.0)
            .with_scale(0.5)
            .with_offset(Vec2::new(10.0, 0.0));
        assert_eq!(frame.map(Point::new(0.0, 0.0), Vec2::new(0.0, 100.0)), Point::new(5.0, 350.0));
    }

    #[test]
    fn curve_triplet_may_end_on_the_start_node() {
        let doc = glyphs3_document();
        let layer = default_layer(&doc, "bump");
        let outline = OutlineResolver::new(&doc)
            .resolve(layer, Frame::new(880.0))
            .unwrap();
        let els = outline.contours[0].elements();
        // Starts at the last node (200,0)
        assert_eq!(els[0], PathEl::MoveTo(Point::new(200.0, 880.0)));
        assert_eq!(els[1], PathEl::LineTo(Point::new(0.0, 880.0)));
        assert_eq!(
            els[2],
            PathEl::CurveTo(
                Point::new(0.0, 780.0),
                Point::new(100.0, 680.0),
                Point::new(200.0, 680.0)
            )
        );
        assert_eq!(els[3], PathEl::ClosePath);
    }

    #[test]
    fn stray_curve_node_is_an_error() {
        let doc = single_layer_doc(vec![path_of(&[
            (0.0, 0.0, NodeKind::Curve),
            (0.0, 100.0, NodeKind::Line),
        ])]);
        let err = OutlineResolver::new(&doc)
            .resolve(default_layer(&doc, "g"), Frame::new(800.0))
            .unwrap_err();
        assert_eq!(
            err,
            GeometryError::StrayCurveNode {
                glyph: "g".into(),
                index: 0
            }
        );
    }

    #[test]
    fn broken_triplets_are_errors() {
        let doc = single_layer_doc(vec![path_of(&[
            (0.0, 0.0, NodeKind::OffCurve),
            (0.0, 100.0, NodeKind::Line),
            (50.0, 100.0, NodeKind::Line),
        ])]);
        let err = OutlineResolver::new(&doc)
            .resolve(default_layer(&doc, "g"), Frame::new(800.0))
            .unwrap_err();
        assert!(matches!(err, GeometryError::BrokenCurveTriplet { index: 0, .. }));

        let doc = single_layer_doc(vec![path_of(&[
            (0.0, 0.0, NodeKind::Line),
            (0.0, 100.0, NodeKind::OffCurve),
        ])]);
        let err = OutlineResolver::new(&doc)
            .resolve(default_layer(&doc, "g"), Frame::new(800.0))
            .unwrap_err();
        assert!(matches!(err, GeometryError::BrokenCurveTriplet { index: 1, .. }));
    }

    #[test]
    fn empty_path_is_an_error() {
        let doc = single_layer_doc(vec![Shape::Path(Path::new(true))]);
        let err = OutlineResolver::new(&doc)
            .resolve(default_layer(&doc, "g"), Frame::new(800.0))
            .unwrap_err();
        assert_eq!(err, GeometryError::EmptyPath { glyph: "g".into() });
    }

    #[test]
    fn components_are_spliced_in_order_with_offsets() {
        let doc = glyphs3_document();
        let resolver = OutlineResolver::new(&doc);
        let outline = resolver
            .resolve(default_layer(&doc, "nested"), Frame::new(880.0))
            .unwrap();
        assert_eq!(outline.len(), 2);
        // square starts at (500,0); nested adds (100,50), squares adds (600,0)
        assert_eq!(
            outline.contours[0].elements()[0],
            PathEl::MoveTo(Point::new(600.0, 830.0))
        );
        assert_eq!(
            outline.contours[1].elements()[0],
            PathEl::MoveTo(Point::new(1200.0, 830.0))
        );
    }

    #[test]
    fn self_reference_fails_instead_of_recursing() {
        let doc = glyphs3_document();
        let err = OutlineResolver::new(&doc)
            .resolve(default_layer(&doc, "loop"), Frame::new(880.0))
            .unwrap_err();
        assert_eq!(
            err,
            GeometryError::ComponentCycle {
                chain: vec!["loop".into(), "loop".into()]
            }
        );
    }

    #[test]
    fn mutual_references_are_cycles() {
        let doc = glyphs3_document();
        let err = OutlineResolver::new(&doc)
            .resolve(default_layer(&doc, "pingA"), Frame::new(880.0))
            .unwrap_err();
        assert_eq!(
            err,
            GeometryError::ComponentCycle {
                chain: vec!["pingA".into(), "pingB".into(), "pingA".into()]
            }
        );
    }

    #[test]
    fn depth_limit_applies_to_nesting() {
        let doc = glyphs3_document();
        let layer = default_layer(&doc, "nested");
        let resolver = OutlineResolver::new(&doc).with_max_depth(1);
        let err = resolver.resolve(layer, Frame::new(880.0)).unwrap_err();
        assert_eq!(
            err,
            GeometryError::DepthExceeded {
                glyph: "nested".into(),
                limit: 1
            }
        );
        assert!(OutlineResolver::new(&doc)
            .with_max_depth(2)
            .resolve(layer, Frame::new(880.0))
            .is_ok());
    }

    #[test]
    fn missing_component_glyph() {
        let doc = glyphs3_document();
        let layer = default_layer(&doc, "orphan");
        let err = OutlineResolver::new(&doc)
            .resolve(layer, Frame::new(880.0))
            .unwrap_err();
        assert_eq!(
            err,
            GeometryError::UnresolvedComponent {
                glyph: "orphan".into(),
                target: "missing".into()
            }
        );
        // Polygon collection skips it instead
        let polygons = OutlineResolver::new(&doc).collect_polygons(layer).unwrap();
        assert!(polygons.is_empty());
    }

    #[test]
    fn resolution_is_idempotent() {
        let doc = glyphs3_document();
        let resolver = OutlineResolver::new(&doc);
        let layer = default_layer(&doc, "squares");
        let frame = Frame::new(880.0).with_scale(0.25);
        assert_eq!(resolver.resolve(layer, frame), resolver.resolve(layer, frame));
    }

    #[test]
    fn curves_flatten_into_many_points() {
        let doc = glyphs3_document();
        let polygons = OutlineResolver::new(&doc)
            .collect_polygons(default_layer(&doc, "bump"))
            .unwrap();
        assert_eq!(polygons.len(), 1);
        // Five nodes, one of them a cubic spanning 100 units
        assert!(polygons[0].len() > 5);
        assert!(polygons[0].contains(&Point::new(200.0, 0.0)));
    }

    #[test]
    fn polygons_stay_in_font_coordinates() {
        let doc = glyphs3_document();
        let polygons = OutlineResolver::new(&doc)
            .collect_polygons(default_layer(&doc, "square"))
            .unwrap();
        assert_eq!(polygons.len(), 1);
        assert!(polygons[0].contains(&Point::new(100.0, 500.0)));
        assert!(polygons[0]
            .iter()
            .all(|p| (100.0..=500.0).contains(&p.x) && (0.0..=500.0).contains(&p.y)));
    }

    #[test]
    fn svg_document_has_background_and_path() {
        let doc = glyphs3_document();
        let layer = default_layer(&doc, "square");
        let svg = layer_to_svg(&OutlineResolver::new(&doc), layer, 1.0).unwrap();
        let outline = OutlineResolver::new(&doc)
            .resolve(layer, Frame::new(880.0))
            .unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("width=\"600\" height=\"1000\""));
        assert!(svg.contains("fill=\"white\""));
        assert!(svg.contains(&format!("d=\"{}\"", outline.to_svg_path())));
    }

    #[test]
    fn batch_resolution_isolates_failures() {
        let doc = glyphs3_document();
        let results = resolve_glyphs(
            &OutlineResolver::new(&doc),
            &["square", "loop", "nope", "squares"],
            1.0,
        );
        let names: Vec<_> = results.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["square", "loop", "nope", "squares"]);
        assert!(results[0].1.is_ok());
        assert!(matches!(results[1].1, Err(GeometryError::ComponentCycle { .. })));
        assert_eq!(results[2].1, Err(GeometryError::UnknownGlyph("nope".into())));
        assert_eq!(results[3].1.as_ref().map(Outline::len), Ok(2));
    }
}
