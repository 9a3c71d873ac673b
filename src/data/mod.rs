//! Font source file I/O

pub mod glyphs;

pub use glyphs::{load_document, load_document_from_str, LoadOptions};
