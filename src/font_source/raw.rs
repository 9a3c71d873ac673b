//! Generic parse result of a source document
//!
//! A [`RawValue`] tree is what the grammar produces before anything knows
//! about masters or glyphs. It is consumed by the builder and dropped.

use std::collections::BTreeMap;
use std::fmt;

use super::parser::BareCharset;

/// A value in the source document grammar
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Dict(BTreeMap<String, RawValue>),
    Array(Vec<RawValue>),
    /// Unquoted token
    String(String),
    /// Token that was written between double quotes
    Quoted(String),
    Integer(i64),
    /// Integer written with leading zeros, such as `0041`. The spelling is
    /// kept so that names made of digits survive the trip through a number.
    Padded { value: i64, text: String },
    Float(f64),
}

impl RawValue {
    pub fn get(&self, key: &str) -> Option<&RawValue> {
        match self {
            RawValue::Dict(dict) => dict.get(key),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&BTreeMap<String, RawValue>> {
        match self {
            RawValue::Dict(dict) => Some(dict),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[RawValue]> {
        match self {
            RawValue::Array(items) => Some(items),
            _ => None,
        }
    }

    /// String content, whether it was quoted or not
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RawValue::String(s) | RawValue::Quoted(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric value. Strings holding a plain number also count, since older
    /// documents quote numbers inconsistently.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RawValue::Integer(i) | RawValue::Padded { value: i, .. } => Some(*i as f64),
            RawValue::Float(f) => Some(*f),
            RawValue::String(s) | RawValue::Quoted(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            RawValue::Integer(i) | RawValue::Padded { value: i, .. } => Some(*i),
            RawValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            RawValue::String(s) | RawValue::Quoted(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Scalar rendered as text. Numbers are rendered the way they would be
    /// written in the document.
    pub fn to_text(&self) -> Option<String> {
        match self {
            RawValue::String(s) | RawValue::Quoted(s) | RawValue::Padded { text: s, .. } => {
                Some(s.clone())
            }
            RawValue::Integer(i) => Some(i.to_string()),
            RawValue::Float(f) => Some(f.to_string()),
            _ => None,
        }
    }

    /// Human readable name of the variant, used in schema errors
    pub fn kind(&self) -> &'static str {
        match self {
            RawValue::Dict(_) => "mapping",
            RawValue::Array(_) => "sequence",
            RawValue::String(_) => "string",
            RawValue::Quoted(_) => "quoted string",
            RawValue::Integer(_) | RawValue::Padded { .. } => "integer",
            RawValue::Float(_) => "float",
        }
    }

    /// Serialize back into the document grammar using the default charset
    pub fn to_document_string(&self) -> String {
        self.to_document_string_with(&BareCharset::default())
    }

    /// Serialize back into the document grammar. Bare strings that no longer
    /// fit `charset`, or that would read back as numbers, are quoted.
    pub fn to_document_string_with(&self, charset: &BareCharset) -> String {
        let mut out = String::new();
        self.write_document(&mut out, charset, 0);
        out
    }

    fn write_document(&self, out: &mut String, charset: &BareCharset, indent: usize) {
        match self {
            RawValue::Dict(dict) => {
                if dict.is_empty() {
                    out.push_str("{\n");
                    push_indent(out, indent);
                    out.push('}');
                    return;
                }
                out.push_str("{\n");
                for (key, value) in dict {
                    push_indent(out, indent + 1);
                    write_string(out, key, charset, false);
                    out.push_str(" = ");
                    value.write_document(out, charset, indent + 1);
                    out.push_str(";\n");
                }
                push_indent(out, indent);
                out.push('}');
            }
            RawValue::Array(items) => {
                out.push('(');
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        out.push(',');
                    }
                    item.write_document(out, charset, indent);
                }
                out.push(')');
            }
            RawValue::String(s) => write_string(out, s, charset, false),
            RawValue::Quoted(s) => write_string(out, s, charset, true),
            RawValue::Integer(i) => out.push_str(&i.to_string()),
            RawValue::Padded { text, .. } => out.push_str(text),
            RawValue::Float(f) => out.push_str(&f.to_string()),
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_document_string())
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::String(value.to_string())
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Integer(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Float(value)
    }
}

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push('\t');
    }
}

fn write_string(out: &mut String, s: &str, charset: &BareCharset, force_quotes: bool) {
    let can_be_bare = !force_quotes
        && !s.is_empty()
        && s.chars().all(|c| charset.contains(c))
        && !super::parser::looks_numeric(s);
    if can_be_bare {
        out.push_str(s);
        return;
    }
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('"');
}
