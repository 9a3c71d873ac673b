//! Font source data structures
//!
//! This module contains everything related to reading a font source
//! document: the grammar, the generic values it produces, and the typed
//! model of masters, glyphs, layers and shapes built from them.

pub mod builder;
pub mod data;
pub mod metrics;
pub mod parser;
pub mod raw;

#[cfg(test)]
pub(crate) mod tests;

// Explicit re-exports for public API
// Grammar
pub use parser::{parse, parse_with, BareCharset, Parser, ParserOptions};
pub use raw::RawValue;
// Model
pub use builder::{build, build_lenient};
pub use data::{ComponentRef, Document, Glyph, Layer, Node, NodeKind, Path, Shape};
pub use metrics::{Master, MetricFilter, MetricValue};
