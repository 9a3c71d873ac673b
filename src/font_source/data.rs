//! Typed font model
//!
//! The document owns masters and glyphs; glyphs own their layers; layers
//! own their shapes. Layers point back at their glyph by name only. Nothing
//! here is mutated once the builder hands the document out.

use std::collections::{BTreeMap, HashMap};

use kurbo::{Point, Vec2};

use super::metrics::Master;
use crate::core::errors::SchemaError;

/// A parsed font source
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub format_version: u32,
    pub family_name: Option<String>,
    pub units_per_em: Option<f64>,
    masters: BTreeMap<String, Master>,
    master_order: Vec<String>,
    glyphs: Vec<Glyph>,
    glyph_index: HashMap<String, usize>,
}

impl Document {
    pub fn new(format_version: u32) -> Self {
        Self {
            format_version,
            ..Default::default()
        }
    }

    /// Add a master. A repeated id replaces the earlier master but keeps
    /// its position in the master order.
    pub fn insert_master(&mut self, master: Master) {
        if !self.masters.contains_key(&master.id) {
            self.master_order.push(master.id.clone());
        }
        self.masters.insert(master.id.clone(), master);
    }

    /// Add a glyph. Glyph names are unique within a document.
    pub fn insert_glyph(&mut self, glyph: Glyph) -> Result<(), SchemaError> {
        if self.glyph_index.contains_key(&glyph.name) {
            return Err(SchemaError::DuplicateGlyph { name: glyph.name });
        }
        self.glyph_index.insert(glyph.name.clone(), self.glyphs.len());
        self.glyphs.push(glyph);
        Ok(())
    }

    pub fn master(&self, id: &str) -> Option<&Master> {
        self.masters.get(id)
    }

    /// Masters in document order
    pub fn masters(&self) -> impl Iterator<Item = &Master> {
        self.master_order.iter().filter_map(|id| self.masters.get(id))
    }

    /// The first master in the document
    pub fn default_master(&self) -> Option<&Master> {
        self.master_order.first().and_then(|id| self.masters.get(id))
    }

    pub fn master_count(&self) -> usize {
        self.masters.len()
    }

    pub fn glyph(&self, name: &str) -> Option<&Glyph> {
        self.glyph_index.get(name).map(|&idx| &self.glyphs[idx])
    }

    /// Glyphs in document order
    pub fn glyphs(&self) -> &[Glyph] {
        &self.glyphs
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    /// First glyph mapped to this character
    pub fn glyph_for_char(&self, c: char) -> Option<&Glyph> {
        self.glyphs.iter().find(|g| g.unicode == Some(c))
    }

    /// Check that every layer refers to a master that exists
    pub fn validate(&self) -> Result<(), SchemaError> {
        for glyph in &self.glyphs {
            glyph.validate_masters(self)?;
        }
        Ok(())
    }
}

/// A glyph and all of its layers, in document order
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub name: String,
    pub unicode: Option<char>,
    pub layers: Vec<Layer>,
}

impl Glyph {
    pub fn new(name: impl Into<String>, unicode: Option<char>) -> Self {
        Self {
            name: name.into(),
            unicode,
            layers: Vec::new(),
        }
    }

    /// The first default layer
    pub fn default_layer(&self) -> Option<&Layer> {
        self.layers.iter().find(|l| l.is_default)
    }

    /// The default layer of a given master, falling back to the first
    /// default layer when that master has none
    pub fn default_layer_for(&self, master_id: Option<&str>) -> Option<&Layer> {
        master_id
            .and_then(|id| {
                self.layers
                    .iter()
                    .find(|l| l.is_default && l.master_id.as_deref() == Some(id))
            })
            .or_else(|| self.default_layer())
    }

    pub fn layer(&self, id: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub(crate) fn validate_masters(&self, document: &Document) -> Result<(), SchemaError> {
        for layer in &self.layers {
            if let Some(master_id) = &layer.master_id {
                if document.master(master_id).is_none() {
                    return Err(SchemaError::UnknownMaster {
                        entity: format!("glyph '{}'", self.name),
                        layer: layer.id.clone(),
                        master: master_id.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// One drawing of a glyph
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    /// Name of the glyph this layer belongs to
    pub glyph_name: String,
    pub id: String,
    pub name: Option<String>,
    /// `None` for empty layers whose master was never resolved
    pub master_id: Option<String>,
    pub is_default: bool,
    /// Advance width in font units
    pub width: f64,
    pub shapes: Vec<Shape>,
}

impl Layer {
    /// The layer's master, or the document's first master when the layer
    /// has none
    pub fn master<'d>(&self, document: &'d Document) -> Option<&'d Master> {
        self.master_id
            .as_deref()
            .and_then(|id| document.master(id))
            .or_else(|| document.default_master())
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.shapes.iter().filter_map(|s| match s {
            Shape::Path(path) => Some(path),
            Shape::Component(_) => None,
        })
    }

    pub fn components(&self) -> impl Iterator<Item = &ComponentRef> {
        self.shapes.iter().filter_map(|s| match s {
            Shape::Component(component) => Some(component),
            Shape::Path(_) => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

/// Something drawn on a layer
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Path(Path),
    Component(ComponentRef),
}

/// An outline made of nodes. The last node is where drawing starts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    pub closed: bool,
    pub nodes: Vec<Node>,
}

impl Path {
    pub fn new(closed: bool) -> Self {
        Self {
            closed,
            nodes: Vec::new(),
        }
    }

    pub fn add(&mut self, position: impl Into<Point>, kind: NodeKind) {
        self.nodes.push(Node {
            position: position.into(),
            kind,
            smooth: false,
        });
    }
}

/// Reference to another glyph's default layer, shifted by `offset`
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentRef {
    pub glyph_name: String,
    pub offset: Vec2,
}

impl ComponentRef {
    pub fn new(glyph_name: impl Into<String>, offset: Vec2) -> Self {
        Self {
            glyph_name: glyph_name.into(),
            offset,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub position: Point,
    pub kind: NodeKind,
    pub smooth: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// On-curve point reached by a straight line
    Line,
    /// On-curve point ending a cubic segment
    Curve,
    /// Control point
    OffCurve,
}

impl NodeKind {
    pub fn is_on_curve(&self) -> bool {
        !matches!(self, NodeKind::OffCurve)
    }

    /// Decode a node type as written in either format revision. Returns the
    /// kind and whether the node is smooth.
    pub fn parse(tag: &str) -> Option<(NodeKind, bool)> {
        match tag {
            "l" | "LINE" => Some((NodeKind::Line, false)),
            "ls" | "LINE SMOOTH" => Some((NodeKind::Line, true)),
            "c" | "CURVE" => Some((NodeKind::Curve, false)),
            "cs" | "CURVE SMOOTH" => Some((NodeKind::Curve, true)),
            "o" | "OFFCURVE" => Some((NodeKind::OffCurve, false)),
            _ => None,
        }
    }
}
