//! Error types for every stage of the pipeline
//!
//! Each stage has its own error enum so callers can tell a malformed
//! document apart from a malformed outline. [`BubbleKernError`] wraps all
//! of them for callers that just want to propagate with `?`.

use thiserror::Error;

/// Where in the source text something went wrong (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourcePos {
    pub line: usize,
    pub column: usize,
}

impl std::fmt::Display for SourcePos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Malformed document text. Always aborts the whole parse.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyntaxError {
    #[error("unexpected {found} at {pos}, expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: &'static str,
        pos: SourcePos,
    },
    #[error("unexpected end of document, expected {expected}")]
    UnexpectedEnd { expected: &'static str },
    #[error("unterminated quoted string starting at {pos}")]
    UnterminatedString { pos: SourcePos },
    #[error("malformed number '{text}' at {pos}")]
    MalformedNumber { text: String, pos: SourcePos },
    #[error("invalid escape sequence '\\{sequence}' at {pos}")]
    InvalidEscape { sequence: String, pos: SourcePos },
    #[error("trailing input after the top-level value at {pos}")]
    TrailingInput { pos: SourcePos },
}

/// The document parsed but does not describe a font the way we expect
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("{entity}: missing required key '{key}'")]
    MissingKey { entity: String, key: &'static str },
    #[error("{entity}: key '{key}' should be {expected}")]
    WrongType {
        entity: String,
        key: &'static str,
        expected: &'static str,
    },
    #[error("{entity}: layer '{layer}' refers to unknown master '{master}'")]
    UnknownMaster {
        entity: String,
        layer: String,
        master: String,
    },
    #[error("glyph '{name}' is defined more than once")]
    DuplicateGlyph { name: String },
    #[error("{entity}: invalid node {detail}")]
    InvalidNode { entity: String, detail: String },
    #[error("{entity}: invalid unicode value '{value}'")]
    InvalidUnicode { entity: String, value: String },
}

/// Invalid geometry or unsupported parameters for a geometry algorithm
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("glyph '{glyph}': curve node at index {index} is not preceded by two off-curve nodes")]
    StrayCurveNode { glyph: String, index: usize },
    #[error("glyph '{glyph}': off-curve node at index {index} does not start an off-curve, off-curve, curve triplet")]
    BrokenCurveTriplet { glyph: String, index: usize },
    #[error("glyph '{glyph}': path has no nodes")]
    EmptyPath { glyph: String },
    #[error("component cycle: {}", chain.join(" -> "))]
    ComponentCycle { chain: Vec<String> },
    #[error("component nesting deeper than {limit} levels below glyph '{glyph}'")]
    DepthExceeded { glyph: String, limit: usize },
    #[error("glyph '{glyph}': component refers to '{target}' which has no usable default layer")]
    UnresolvedComponent { glyph: String, target: String },
    #[error("unsupported {kind} style code {code} (expected 1, 2 or 3)")]
    UnsupportedStyle { kind: &'static str, code: u8 },
    #[error("expansion distance must be a finite, non-negative number (got {0})")]
    InvalidDistance(f64),
    #[error("{0} requires at least one shape")]
    EmptyInput(&'static str),
    #[error("unknown glyph '{0}'")]
    UnknownGlyph(String),
}

/// Caller broke a documented precondition of a raster operation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PreconditionError {
    #[error("canvas heights differ: {expected} vs {found}")]
    HeightMismatch { expected: usize, found: usize },
    #[error("expected {expected} kerning gaps for the shapes given, got {found}")]
    GapCountMismatch { expected: usize, found: usize },
    #[error("at least one shape is required")]
    NoShapes,
    #[error("shape {index} would be placed outside the composite canvas")]
    OutOfCanvas { index: usize },
}

/// Umbrella error for the whole pipeline
#[derive(Debug, Error)]
pub enum BubbleKernError {
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
    #[error("geometry error: {0}")]
    Geometry(#[from] GeometryError),
    #[error("precondition violated: {0}")]
    Precondition(#[from] PreconditionError),
    #[error("glyph '{glyph}': {source}")]
    Glyph {
        glyph: String,
        #[source]
        source: Box<BubbleKernError>,
    },
}

impl BubbleKernError {
    /// Attach the name of the glyph being processed
    pub fn for_glyph(self, glyph: impl Into<String>) -> Self {
        BubbleKernError::Glyph {
            glyph: glyph.into(),
            source: Box::new(self),
        }
    }
}

pub type BubbleKernResult<T> = Result<T, BubbleKernError>;
