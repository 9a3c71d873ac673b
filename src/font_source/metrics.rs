//! Master identity and vertical metrics
//!
//! Masters carry the ascender/descender used to anchor every raster canvas,
//! plus any named metric values the source defines. Metric values may be
//! restricted by a filter (e.g. only for one script); the filter is kept as
//! data and never evaluated here.

use serde::{Deserialize, Serialize};

pub const DEFAULT_ASCENDER: f64 = 800.0;
pub const DEFAULT_DESCENDER: f64 = -200.0;

/// A font master. Built once, immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Master {
    pub id: String,
    pub name: String,
    pub ascender: f64,
    pub descender: f64,
    pub x_height: Option<f64>,
    pub cap_height: Option<f64>,
    /// Every metric value in source order, filtered ones included
    pub metrics: Vec<MetricValue>,
}

/// One named vertical metric of a master
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricValue {
    pub name: String,
    pub position: f64,
    pub overshoot: f64,
    pub filter: Option<MetricFilter>,
}

/// Predicate restricting where a metric override applies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricFilter {
    /// `key == value`
    Equals { key: String, value: String },
    /// Pattern we could not split into a key/value pair
    Raw(String),
}

impl MetricFilter {
    /// Parse the embedded filter pattern, e.g. `script == "han"`
    pub fn parse(pattern: &str) -> Self {
        match pattern.split_once("==") {
            Some((key, value)) => {
                let key = key.trim();
                let value = value.trim().trim_matches('"').trim();
                if key.is_empty() || value.is_empty() {
                    MetricFilter::Raw(pattern.to_string())
                } else {
                    MetricFilter::Equals {
                        key: key.to_string(),
                        value: value.to_string(),
                    }
                }
            }
            None => MetricFilter::Raw(pattern.to_string()),
        }
    }
}

impl Master {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ascender: DEFAULT_ASCENDER,
            descender: DEFAULT_DESCENDER,
            x_height: None,
            cap_height: None,
            metrics: Vec::new(),
        }
    }

    pub fn with_vertical_metrics(mut self, ascender: f64, descender: f64) -> Self {
        self.ascender = ascender;
        self.descender = descender;
        self
    }

    /// Height of the canvas a glyph of this master is drawn on
    pub fn line_height(&self) -> f64 {
        self.ascender - self.descender
    }

    /// The unfiltered metric with this name
    pub fn metric(&self, name: &str) -> Option<&MetricValue> {
        self.metrics
            .iter()
            .find(|m| m.name == name && m.filter.is_none())
    }

    /// Metric overrides that carry a filter
    pub fn filtered_metrics(&self) -> impl Iterator<Item = &MetricValue> {
        self.metrics.iter().filter(|m| m.filter.is_some())
    }

    /// Fill ascender/descender/x-height/cap-height from the unfiltered
    /// metric list
    pub(crate) fn apply_standard_metrics(&mut self) {
        if let Some(m) = self.metric("ascender") {
            self.ascender = m.position;
        }
        if let Some(m) = self.metric("descender") {
            self.descender = m.position;
        }
        self.x_height = self.metric("x-height").map(|m| m.position).or(self.x_height);
        self.cap_height = self
            .metric("cap height")
            .map(|m| m.position)
            .or(self.cap_height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_pattern_splits_into_key_and_value() {
        assert_eq!(
            MetricFilter::parse("script == \"han\""),
            MetricFilter::Equals {
                key: "script".into(),
                value: "han".into()
            }
        );
        assert_eq!(
            MetricFilter::parse("category IN {\"Letter\"}"),
            MetricFilter::Raw("category IN {\"Letter\"}".into())
        );
    }

    #[test]
    fn unfiltered_metrics_drive_the_standard_fields() {
        let mut master = Master::new("m01", "Regular");
        master.metrics = vec![
            MetricValue {
                name: "ascender".into(),
                position: 880.0,
                overshoot: 12.0,
                filter: None,
            },
            MetricValue {
                name: "ascender".into(),
                position: 920.0,
                overshoot: 0.0,
                filter: Some(MetricFilter::parse("script == han")),
            },
            MetricValue {
                name: "descender".into(),
                position: -120.0,
                overshoot: -12.0,
                filter: None,
            },
        ];
        master.apply_standard_metrics();
        assert_eq!(master.ascender, 880.0);
        assert_eq!(master.descender, -120.0);
        assert_eq!(master.line_height(), 1000.0);
        assert_eq!(master.filtered_metrics().count(), 1);
    }
}
