//! Command line interface for bubblekern
//!
//! Handles parsing command line arguments and provides
//! validation for user inputs. Options that also exist in the config file
//! are optional here so that an unset flag falls through to the file.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// bubblekern CLI arguments
///
/// Examples:
///   bubblekern info MyFont.glyphs                 # Masters and glyph counts
///   bubblekern svg MyFont.glyphs A -o A.svg       # Outline of A as SVG
///   bubblekern kern MyFont.glyphs 中 㒰 㒱        # Gaps between neighbours
///   bubblekern kern MyFont.glyphs A V --scale 0.2 # Finer raster
///   bubblekern --new-config                       # Write default settings
#[derive(Parser, Debug, Clone, Default)]
#[clap(
    name = "bubblekern",
    version,
    about = "Shape-based spacing analysis for Glyphs font sources",
    long_about = "bubblekern reads .glyphs font sources, resolves glyph outlines, wraps each glyph in a convex-hull bubble and measures how closely neighbouring bubbles can be set. Settings can also be stored in ~/.config/bubblekern/settings.json."
)]
pub struct CliArgs {
    #[clap(subcommand)]
    pub command: Option<Command>,

    /// Initialize user configuration directory with a default settings file
    #[clap(
        long = "new-config",
        help = "Initialize user config directory with default settings",
        long_help = "Initialize the ~/.config/bubblekern directory with a settings.json file holding every default value, plus a logs/ directory."
    )]
    pub new_config: bool,

    /// Pixels per font unit for rasterization
    #[clap(long = "scale", short = 's', global = true)]
    pub scale: Option<f64>,

    /// How far the vector hull is grown, in font units
    #[clap(long = "expand", global = true)]
    pub expansion_distance: Option<f64>,

    /// Cap style code for hull expansion: 1 round, 2 flat, 3 square
    #[clap(long = "cap-style", global = true)]
    pub cap_style: Option<u8>,

    /// Join style code for hull expansion: 1 round, 2 mitre, 3 bevel
    #[clap(long = "join-style", global = true)]
    pub join_style: Option<u8>,

    /// Report gaps one pixel smaller so bubbles just touch
    #[clap(long = "subtract-one", global = true)]
    pub subtract_one: bool,

    /// Maximum component nesting depth
    #[clap(long = "max-depth", global = true)]
    pub max_component_depth: Option<usize>,

    /// Whether '-' may appear in unquoted strings (true or false)
    #[clap(long = "hyphen-in-bare", global = true)]
    pub allow_hyphen_in_bare: Option<bool>,

    /// Also write logs to ~/.config/bubblekern/logs/
    #[clap(long = "log-file", global = true)]
    pub log_to_file: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Print family, masters and glyph counts of a font source
    Info {
        /// Path to a .glyphs file
        source: PathBuf,
    },
    /// Write the default layer of one glyph as an SVG document
    Svg {
        /// Path to a .glyphs file
        source: PathBuf,
        /// Glyph name, or a single character
        glyph: String,
        /// Output file (stdout when omitted)
        #[clap(long, short = 'o')]
        output: Option<PathBuf>,
    },
    /// Measure the bubble gap between each pair of neighbouring glyphs
    Kern {
        /// Path to a .glyphs file
        source: PathBuf,
        /// Glyph names or single characters, in setting order
        #[clap(required = true)]
        glyphs: Vec<String>,
    },
}

impl Command {
    pub fn source(&self) -> &Path {
        match self {
            Command::Info { source } | Command::Svg { source, .. } | Command::Kern { source, .. } => {
                source
            }
        }
    }
}

impl CliArgs {
    /// Validate the CLI arguments after parsing
    ///
    /// This ensures that the source exists and looks like a font source
    /// before anything is loaded, giving clearer messages for common mistakes.
    pub fn validate(&self) -> Result<(), String> {
        let Some(command) = &self.command else {
            return Ok(());
        };
        let path = command.source();
        if !path.exists() {
            return Err(format!(
                "Font source does not exist: {}\nMake sure the path is correct and the file exists.",
                path.display()
            ));
        }
        if !path.is_file() {
            return Err(format!(
                "Font source is not a file: {}\nExpected a .glyphs file.",
                path.display()
            ));
        }
        match path.extension() {
            Some(ext) if ext == "glyphs" => Ok(()),
            Some(_) => Err(format!(
                "Unsupported file type: {}\nOnly .glyphs files are supported.",
                path.display()
            )),
            None => Err(format!(
                "File has no extension: {}\nExpected a .glyphs file.",
                path.display()
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kern_takes_many_glyphs_and_global_flags() {
        let args = CliArgs::try_parse_from([
            "bubblekern",
            "kern",
            "font.glyphs",
            "A",
            "V",
            "--scale",
            "0.5",
            "--subtract-one",
        ])
        .unwrap();
        assert_eq!(
            args.command,
            Some(Command::Kern {
                source: "font.glyphs".into(),
                glyphs: vec!["A".into(), "V".into()],
            })
        );
        assert_eq!(args.scale, Some(0.5));
        assert!(args.subtract_one);
    }

    #[test]
    fn kern_needs_at_least_one_glyph() {
        assert!(CliArgs::try_parse_from(["bubblekern", "kern", "font.glyphs"]).is_err());
    }

    #[test]
    fn new_config_needs_no_command() {
        let args = CliArgs::try_parse_from(["bubblekern", "--new-config"]).unwrap();
        assert!(args.new_config);
        assert!(args.command.is_none());
        assert_eq!(args.validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_missing_and_foreign_files() {
        let args = CliArgs::try_parse_from(["bubblekern", "info", "/no/such/font.glyphs"]).unwrap();
        assert!(args.validate().unwrap_err().contains("does not exist"));

        let file = tempfile::Builder::new().suffix(".ufo").tempfile().unwrap();
        let args = CliArgs {
            command: Some(Command::Info {
                source: file.path().to_path_buf(),
            }),
            ..Default::default()
        };
        assert!(args.validate().unwrap_err().contains("Unsupported file type"));
    }
}
