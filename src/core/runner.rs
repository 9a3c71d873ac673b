//! Application runner logic
//!
//! Handles the different commands bubblekern can run

use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::core::cli::{CliArgs, Command};
use crate::core::config_file::ConfigFile;
use crate::core::settings::Settings;
use crate::data::{load_document, LoadOptions};
use crate::font_source::{Document, Glyph};
use crate::geometry::{kern_sequence, layer_to_svg, OutlineResolver, ScanlineRasterizer};
use crate::logging;

/// Summary printed by `info`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfoReport {
    pub family_name: Option<String>,
    pub format_version: u32,
    pub units_per_em: Option<f64>,
    pub masters: Vec<MasterSummary>,
    pub glyph_count: usize,
    pub encoded_glyph_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MasterSummary {
    pub id: String,
    pub name: String,
    pub ascender: f64,
    pub descender: f64,
}

/// Result printed by `kern`, as JSON
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KernReport {
    pub glyphs: Vec<String>,
    pub scale: f64,
    /// Gaps in pixels at `scale`
    pub gaps: Vec<i64>,
    /// Gaps converted back to font units
    pub gaps_in_units: Vec<f64>,
    pub canvas_width: usize,
    pub canvas_height: usize,
}

/// Create and run the application with the given CLI arguments.
/// Handles special CLI flags and delegates to the chosen command.
pub fn run_app(cli_args: CliArgs) -> Result<()> {
    // Handle --new-config flag specially
    if cli_args.new_config {
        return ConfigFile::initialize_config_directory()
            .context("Failed to initialize config directory");
    }

    let config = ConfigFile::load();
    let settings = Settings::resolve(&cli_args, config.as_ref())?;
    let _log_guard = logging::init(settings.log_target())?;

    cli_args.validate().map_err(|e| anyhow!(e))?;
    let Some(command) = cli_args.command else {
        bail!("No command given. Use one of: info, svg, kern");
    };

    match command {
        Command::Info { source } => {
            let document = load(&source, &settings)?;
            print_info(&info_report(&document));
        }
        Command::Svg {
            source,
            glyph,
            output,
        } => {
            let document = load(&source, &settings)?;
            let svg = glyph_svg(
                &document,
                &glyph,
                settings.kerning.scale,
                settings.kerning.max_component_depth,
            )?;
            match output {
                Some(path) => {
                    fs::write(&path, svg)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    info!("Wrote {}", path.display());
                }
                None => print!("{svg}"),
            }
        }
        Command::Kern { source, glyphs } => {
            let document = load(&source, &settings)?;
            let report = kern_report(&document, &glyphs, &settings)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

fn load(source: &Path, settings: &Settings) -> Result<Document> {
    let options = LoadOptions {
        parser: settings.parser.clone(),
    };
    load_document(source, &options)
}

/// Look a glyph up by name, falling back to a single character's glyph
pub fn find_glyph<'d>(document: &'d Document, query: &str) -> Result<&'d Glyph> {
    if let Some(glyph) = document.glyph(query) {
        return Ok(glyph);
    }
    let mut chars = query.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if let Some(glyph) = document.glyph_for_char(c) {
            return Ok(glyph);
        }
    }
    bail!("No glyph named or mapped to '{}'", query)
}

pub fn info_report(document: &Document) -> InfoReport {
    InfoReport {
        family_name: document.family_name.clone(),
        format_version: document.format_version,
        units_per_em: document.units_per_em,
        masters: document
            .masters()
            .map(|m| MasterSummary {
                id: m.id.clone(),
                name: m.name.clone(),
                ascender: m.ascender,
                descender: m.descender,
            })
            .collect(),
        glyph_count: document.glyph_count(),
        encoded_glyph_count: document
            .glyphs()
            .iter()
            .filter(|g| g.unicode.is_some())
            .count(),
    }
}

fn print_info(report: &InfoReport) {
    println!(
        "Family: {}",
        report.family_name.as_deref().unwrap_or("(unnamed)")
    );
    println!("Format version: {}", report.format_version);
    if let Some(upm) = report.units_per_em {
        println!("Units per em: {upm}");
    }
    println!("Masters: {}", report.masters.len());
    for master in &report.masters {
        println!(
            "  - {} ({}): ascender {}, descender {}",
            master.name, master.id, master.ascender, master.descender
        );
    }
    println!(
        "Glyphs: {} ({} encoded)",
        report.glyph_count, report.encoded_glyph_count
    );
}

/// SVG document of a glyph's default layer
pub fn glyph_svg(document: &Document, query: &str, scale: f64, max_depth: usize) -> Result<String> {
    let glyph = find_glyph(document, query)?;
    let layer = glyph
        .default_layer()
        .ok_or_else(|| anyhow!("Glyph '{}' has no default layer", glyph.name))?;
    let resolver = OutlineResolver::new(document).with_max_depth(max_depth);
    let svg = layer_to_svg(&resolver, layer, scale)
        .with_context(|| format!("Failed to draw glyph '{}'", glyph.name))?;
    Ok(svg)
}

/// Kern a run of glyphs given by name or character
pub fn kern_report(document: &Document, queries: &[String], settings: &Settings) -> Result<KernReport> {
    let names = queries
        .iter()
        .map(|q| find_glyph(document, q).map(|g| g.name.as_str()))
        .collect::<Result<Vec<_>>>()?;
    let run = kern_sequence(
        document,
        &names,
        &ScanlineRasterizer::default(),
        &settings.kerning,
    )?;
    Ok(KernReport {
        gaps_in_units: run.gaps_in_units(settings.kerning.scale),
        glyphs: run.glyphs,
        scale: settings.kerning.scale,
        gaps: run.gaps,
        canvas_width: run.canvas.width(),
        canvas_height: run.canvas.height(),
    })
}
