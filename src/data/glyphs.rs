//! Loading `.glyphs` sources from disk

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::font_source::{build, parse_with, Document, ParserOptions};

/// How a source file is read
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub parser: ParserOptions,
}

/// Load and build a font source from disk
pub fn load_document(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Document> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read font source {}", path.display()))?;
    let document = load_document_from_str(&text, options)
        .with_context(|| format!("Failed to load font source {}", path.display()))?;
    info!(
        "Loaded {} with {} masters and {} glyphs",
        path.display(),
        document.master_count(),
        document.glyph_count()
    );
    Ok(document)
}

/// Parse and build a font source held in memory
pub fn load_document_from_str(text: &str, options: &LoadOptions) -> Result<Document> {
    let raw = parse_with(text, options.parser.clone())
        .context("Source is not a valid property list")?;
    let document = build(&raw).context("Source does not describe a font")?;
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::SyntaxError;
    use crate::font_source::tests::fixtures::GLYPHS3_SOURCE;
    use std::io::Write;

    #[test]
    fn loads_from_a_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(GLYPHS3_SOURCE.as_bytes()).unwrap();
        let doc = load_document(file.path(), &LoadOptions::default()).unwrap();
        assert!(doc.glyph("square").is_some());
    }

    #[test]
    fn missing_file_mentions_the_path() {
        let err = load_document("/definitely/not/here.glyphs", &LoadOptions::default())
            .unwrap_err();
        assert!(format!("{err:#}").contains("/definitely/not/here.glyphs"));
    }

    #[test]
    fn syntax_errors_are_kept_in_the_chain() {
        let err = load_document_from_str("{ a = (1, 2; }", &LoadOptions::default()).unwrap_err();
        assert!(err.chain().any(|cause| cause.downcast_ref::<SyntaxError>().is_some()));
    }
}
