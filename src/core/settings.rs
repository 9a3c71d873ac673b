//! Effective settings for a run
//!
//! Each value comes from, in priority order:
//! 1. CLI argument
//! 2. Config file setting (~/.config/bubblekern/settings.json)
//! 3. Built-in default

use anyhow::{bail, Context, Result};
use std::fmt::Debug;
use tracing::debug;

use crate::core::cli::CliArgs;
use crate::core::config_file::ConfigFile;
use crate::font_source::{BareCharset, ParserOptions};
use crate::geometry::{CapStyle, DistancePolicy, JoinStyle, KerningOptions};
use crate::logging::LogTarget;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    pub parser: ParserOptions,
    pub kerning: KerningOptions,
    pub log_to_file: bool,
}

fn pick<T: Debug>(name: &str, cli: Option<T>, config: Option<T>, default: T) -> T {
    if let Some(value) = cli {
        debug!("Using {} from CLI: {:?}", name, value);
        value
    } else if let Some(value) = config {
        debug!("Using {} from config file: {:?}", name, value);
        value
    } else {
        default
    }
}

/// `Some(true)` for a flag that was passed, `None` to fall through
fn flag(set: bool) -> Option<bool> {
    set.then_some(true)
}

impl Settings {
    /// Merge CLI arguments over an optional config file
    pub fn resolve(cli: &CliArgs, config: Option<&ConfigFile>) -> Result<Self> {
        let empty = ConfigFile::default();
        let config = config.unwrap_or(&empty);
        let defaults = KerningOptions::default();

        let allow_hyphen = pick(
            "allow_hyphen_in_bare",
            cli.allow_hyphen_in_bare,
            config.allow_hyphen_in_bare,
            true,
        );
        let cap_code = pick(
            "cap_style",
            cli.cap_style,
            config.cap_style,
            defaults.cap_style.code(),
        );
        let join_code = pick(
            "join_style",
            cli.join_style,
            config.join_style,
            defaults.join_style.code(),
        );
        let subtract_one = pick(
            "subtract_one",
            flag(cli.subtract_one),
            config.subtract_one,
            false,
        );

        let kerning = KerningOptions {
            scale: pick("scale", cli.scale, config.scale, defaults.scale),
            expansion_distance: pick(
                "expansion_distance",
                cli.expansion_distance,
                config.expansion_distance,
                defaults.expansion_distance,
            ),
            cap_style: CapStyle::from_code(cap_code).context("Invalid cap style")?,
            join_style: JoinStyle::from_code(join_code).context("Invalid join style")?,
            policy: DistancePolicy::from_subtract_one(subtract_one),
            max_component_depth: pick(
                "max_component_depth",
                cli.max_component_depth,
                config.max_component_depth,
                defaults.max_component_depth,
            ),
        };

        let settings = Self {
            parser: ParserOptions::with_charset(if allow_hyphen {
                BareCharset::glyphs3()
            } else {
                BareCharset::without_hyphen()
            }),
            kerning,
            log_to_file: pick("log_to_file", flag(cli.log_to_file), config.log_to_file, false),
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        let k = &self.kerning;
        if !(k.scale.is_finite() && k.scale > 0.0) {
            bail!("Scale must be a positive number, got {}", k.scale);
        }
        if !(k.expansion_distance.is_finite() && k.expansion_distance >= 0.0) {
            bail!(
                "Expansion distance must be zero or more, got {}",
                k.expansion_distance
            );
        }
        if k.max_component_depth == 0 {
            bail!("Maximum component depth must be at least 1");
        }
        Ok(())
    }

    pub fn log_target(&self) -> LogTarget {
        if self.log_to_file {
            LogTarget::StderrAndFile
        } else {
            LogTarget::Stderr
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::GeometryError;

    #[test]
    fn defaults_without_config() {
        let settings = Settings::resolve(&CliArgs::default(), None).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.log_target(), LogTarget::Stderr);
    }

    #[test]
    fn cli_beats_config_beats_default() {
        let config = ConfigFile {
            scale: Some(0.5),
            expansion_distance: Some(40.0),
            subtract_one: Some(true),
            allow_hyphen_in_bare: Some(false),
            ..Default::default()
        };
        let cli = CliArgs {
            scale: Some(0.25),
            ..Default::default()
        };
        let settings = Settings::resolve(&cli, Some(&config)).unwrap();
        assert_eq!(settings.kerning.scale, 0.25);
        assert_eq!(settings.kerning.expansion_distance, 40.0);
        assert_eq!(settings.kerning.policy, DistancePolicy::SubtractOne);
        assert!(!settings.parser.charset.allows_hyphen());
        assert_eq!(settings.kerning.cap_style, CapStyle::Square);
    }

    #[test]
    fn bad_style_codes_fail_resolution() {
        let cli = CliArgs {
            join_style: Some(7),
            ..Default::default()
        };
        let err = Settings::resolve(&cli, None).unwrap_err();
        assert_eq!(
            err.downcast_ref::<GeometryError>(),
            Some(&GeometryError::UnsupportedStyle {
                kind: "join",
                code: 7
            })
        );
    }

    #[test]
    fn out_of_range_numbers_fail_validation() {
        let cli = CliArgs {
            scale: Some(0.0),
            ..Default::default()
        };
        assert!(Settings::resolve(&cli, None).is_err());
        let config = ConfigFile {
            max_component_depth: Some(0),
            ..Default::default()
        };
        assert!(Settings::resolve(&CliArgs::default(), Some(&config)).is_err());
    }
}
