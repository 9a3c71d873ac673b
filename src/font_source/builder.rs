//! Object model builder
//!
//! Walks a [`RawValue`] tree and instantiates the typed model. Both format
//! revisions are understood: version 3 (`shapes`, node tuples, `ref`/`pos`
//! components, `metrics` + `metricValues`) and version 2 (`paths` plus
//! `components`, node strings, `transform` strings, hex unicodes).

use kurbo::{Point, Vec2};
use tracing::{debug, info, warn};

use super::data::{ComponentRef, Document, Glyph, Layer, Node, NodeKind, Path, Shape};
use super::metrics::{Master, MetricFilter, MetricValue};
use super::raw::RawValue;
use crate::core::errors::SchemaError;

/// Build a document, failing on the first schema error
pub fn build(raw: &RawValue) -> Result<Document, SchemaError> {
    let mut document = build_header(raw)?;
    for glyph in glyph_entries(raw)? {
        let glyph = build_glyph(glyph, &document)?;
        document.insert_glyph(glyph)?;
    }
    info!(
        "Built document with {} masters and {} glyphs",
        document.master_count(),
        document.glyph_count()
    );
    Ok(document)
}

/// Build a document, skipping glyphs that fail. Masters and the top-level
/// structure must still be valid.
pub fn build_lenient(raw: &RawValue) -> Result<(Document, Vec<SchemaError>), SchemaError> {
    let mut document = build_header(raw)?;
    let mut skipped = Vec::new();
    for glyph in glyph_entries(raw)? {
        let result = build_glyph(glyph, &document).and_then(|g| document.insert_glyph(g));
        if let Err(error) = result {
            warn!("Skipping glyph: {}", error);
            skipped.push(error);
        }
    }
    info!(
        "Built document with {} masters and {} glyphs ({} skipped)",
        document.master_count(),
        document.glyph_count(),
        skipped.len()
    );
    Ok((document, skipped))
}

fn build_header(raw: &RawValue) -> Result<Document, SchemaError> {
    let root = "document";
    if raw.as_dict().is_none() {
        return Err(SchemaError::WrongType {
            entity: root.into(),
            key: "<root>",
            expected: "a mapping",
        });
    }
    let format_version = raw
        .get(".formatVersion")
        .and_then(RawValue::as_i64)
        .map(|v| v as u32)
        .unwrap_or(2);
    let mut document = Document::new(format_version);
    document.family_name = raw.get("familyName").and_then(RawValue::to_text);
    document.units_per_em = raw.get("unitsPerEm").and_then(RawValue::as_f64);

    let metric_defs = metric_definitions(raw);
    for entry in require_array(raw, "fontMaster", root)? {
        document.insert_master(build_master(entry, &metric_defs)?);
    }
    Ok(document)
}

fn glyph_entries(raw: &RawValue) -> Result<&[RawValue], SchemaError> {
    match raw.get("glyphs") {
        None => Ok(&[]),
        Some(value) => value.as_array().ok_or(SchemaError::WrongType {
            entity: "document".into(),
            key: "glyphs",
            expected: "a sequence",
        }),
    }
}

/// Root-level `metrics` list of a version 3 document: name and filter of
/// each entry of the masters' parallel `metricValues`
fn metric_definitions(raw: &RawValue) -> Vec<(String, Option<MetricFilter>)> {
    let Some(defs) = raw.get("metrics").and_then(RawValue::as_array) else {
        return Vec::new();
    };
    defs.iter()
        .map(|def| {
            let name = def
                .get("type")
                .or_else(|| def.get("name"))
                .and_then(RawValue::to_text)
                .unwrap_or_default();
            let filter = def
                .get("filter")
                .and_then(RawValue::as_str)
                .map(MetricFilter::parse);
            (name, filter)
        })
        .collect()
}

fn build_master(
    raw: &RawValue,
    metric_defs: &[(String, Option<MetricFilter>)],
) -> Result<Master, SchemaError> {
    let id = require_text(raw, "id", "master")?;
    let entity = format!("master '{id}'");
    let name = match raw.get("name").and_then(RawValue::to_text) {
        Some(name) => name,
        None => legacy_master_name(raw),
    };
    let mut master = Master::new(id, name);

    // Version 2 keeps the standard metrics as plain keys
    for (key, metric_name) in [
        ("ascender", "ascender"),
        ("descender", "descender"),
        ("xHeight", "x-height"),
        ("capHeight", "cap height"),
    ] {
        if let Some(position) = raw.get(key).and_then(RawValue::as_f64) {
            master.metrics.push(MetricValue {
                name: metric_name.to_string(),
                position,
                overshoot: 0.0,
                filter: None,
            });
        }
    }

    if let Some(values) = raw.get("metricValues") {
        let values = values.as_array().ok_or_else(|| SchemaError::WrongType {
            entity: entity.clone(),
            key: "metricValues",
            expected: "a sequence",
        })?;
        for ((name, filter), value) in metric_defs.iter().zip(values) {
            master.metrics.push(MetricValue {
                name: name.clone(),
                position: value.get("pos").and_then(RawValue::as_f64).unwrap_or(0.0),
                overshoot: value.get("over").and_then(RawValue::as_f64).unwrap_or(0.0),
                filter: filter.clone(),
            });
        }
    }

    master.apply_standard_metrics();
    debug!(
        "Master '{}' ({}): ascender {}, descender {}",
        master.name, master.id, master.ascender, master.descender
    );
    Ok(master)
}

/// Version 2 masters have no name; it is made of weight, width and custom
fn legacy_master_name(raw: &RawValue) -> String {
    let parts: Vec<String> = ["weight", "width", "custom"]
        .iter()
        .filter_map(|key| raw.get(key).and_then(RawValue::to_text))
        .filter(|part| !part.is_empty() && part != "Regular")
        .collect();
    if parts.is_empty() {
        "Regular".to_string()
    } else {
        parts.join(" ")
    }
}

fn build_glyph(raw: &RawValue, document: &Document) -> Result<Glyph, SchemaError> {
    // Names that look like numbers come back from the parser as numbers
    let name = require_text(raw, "glyphname", "glyph")?;
    let entity = format!("glyph '{name}'");
    let unicode = match raw.get("unicode") {
        Some(value) => parse_unicode(value, document.format_version, &entity)?,
        None => None,
    };
    let mut glyph = Glyph::new(name, unicode);

    if let Some(layers) = raw.get("layers") {
        let layers = layers.as_array().ok_or_else(|| SchemaError::WrongType {
            entity: entity.clone(),
            key: "layers",
            expected: "a sequence",
        })?;
        for layer in layers {
            let layer = build_layer(layer, &glyph.name, document)?;
            glyph.layers.push(layer);
        }
    }
    Ok(glyph)
}

fn parse_unicode(
    value: &RawValue,
    format_version: u32,
    entity: &str,
) -> Result<Option<char>, SchemaError> {
    let invalid = || SchemaError::InvalidUnicode {
        entity: entity.to_string(),
        value: value.to_text().unwrap_or_else(|| value.kind().to_string()),
    };
    // Several code points: only the first is kept
    let first = match value {
        RawValue::Array(items) => match items.first() {
            Some(item) => item,
            None => return Ok(None),
        },
        other => other,
    };
    let code = if format_version >= 3 {
        match first {
            RawValue::Integer(i) | RawValue::Padded { value: i, .. } => {
                u32::try_from(*i).map_err(|_| invalid())?
            }
            other => {
                let text = other.to_text().ok_or_else(invalid)?;
                u32::from_str_radix(text.trim(), 16).map_err(|_| invalid())?
            }
        }
    } else {
        let text = first.to_text().ok_or_else(invalid)?;
        let text = text.split(',').next().unwrap_or_default().trim().to_string();
        if text.is_empty() {
            return Ok(None);
        }
        u32::from_str_radix(&text, 16).map_err(|_| invalid())?
    };
    char::from_u32(code).map(Some).ok_or_else(invalid)
}

fn build_layer(raw: &RawValue, glyph_name: &str, document: &Document) -> Result<Layer, SchemaError> {
    let entity = format!("glyph '{glyph_name}'");
    let id = require_text(raw, "layerId", &entity)?;
    let width = raw.get("width").and_then(RawValue::as_f64).unwrap_or(0.0);
    let explicit_name = raw.get("name").and_then(RawValue::to_text);

    let has_shapes = ["shapes", "paths", "components"]
        .iter()
        .any(|key| raw.get(key).is_some());
    if !has_shapes {
        return Ok(Layer {
            glyph_name: glyph_name.to_string(),
            id,
            name: explicit_name,
            master_id: None,
            is_default: true,
            width,
            shapes: Vec::new(),
        });
    }

    let associated = raw.get("associatedMasterId").and_then(RawValue::to_text);
    let is_default = associated.is_none();
    let master_id = associated.unwrap_or_else(|| id.clone());
    let Some(master) = document.master(&master_id) else {
        return Err(SchemaError::UnknownMaster {
            entity,
            layer: id,
            master: master_id,
        });
    };
    let name = explicit_name.unwrap_or_else(|| master.name.clone());

    let mut shapes = Vec::new();
    if let Some(list) = raw.get("shapes") {
        for shape in shape_list(list, "shapes", &entity)? {
            shapes.push(build_shape(shape, &entity)?);
        }
    }
    if let Some(list) = raw.get("paths") {
        for path in shape_list(list, "paths", &entity)? {
            shapes.push(Shape::Path(build_path(path, &entity)?));
        }
    }
    if let Some(list) = raw.get("components") {
        for component in shape_list(list, "components", &entity)? {
            shapes.push(Shape::Component(build_component(component, &entity)?));
        }
    }

    Ok(Layer {
        glyph_name: glyph_name.to_string(),
        id,
        name: Some(name),
        master_id: Some(master_id),
        is_default,
        width,
        shapes,
    })
}

fn shape_list<'a>(
    value: &'a RawValue,
    key: &'static str,
    entity: &str,
) -> Result<&'a [RawValue], SchemaError> {
    value.as_array().ok_or_else(|| SchemaError::WrongType {
        entity: entity.to_string(),
        key,
        expected: "a sequence",
    })
}

fn build_shape(raw: &RawValue, entity: &str) -> Result<Shape, SchemaError> {
    if raw.get("ref").is_some() {
        Ok(Shape::Component(build_component(raw, entity)?))
    } else {
        Ok(Shape::Path(build_path(raw, entity)?))
    }
}

fn build_path(raw: &RawValue, entity: &str) -> Result<Path, SchemaError> {
    let closed = raw
        .get("closed")
        .and_then(RawValue::as_i64)
        .map(|v| v != 0)
        .unwrap_or(true);
    let mut path = Path::new(closed);
    for node in require_array(raw, "nodes", entity)? {
        path.nodes.push(build_node(node, entity)?);
    }
    Ok(path)
}

fn build_node(raw: &RawValue, entity: &str) -> Result<Node, SchemaError> {
    let invalid = |detail: String| SchemaError::InvalidNode {
        entity: entity.to_string(),
        detail,
    };
    let (x, y, tag) = match raw {
        // Version 3: (x, y, tag) with optional trailing user data
        RawValue::Array(items) if items.len() >= 3 => {
            let x = items[0].as_f64();
            let y = items[1].as_f64();
            let tag = items[2].to_text();
            match (x, y, tag) {
                (Some(x), Some(y), Some(tag)) => (x, y, tag),
                _ => return Err(invalid(raw.to_document_string())),
            }
        }
        // Version 2: "x y TYPE [SMOOTH] [{user data}]"
        RawValue::String(text) | RawValue::Quoted(text) => {
            let body = text.split_once('{').map_or(text.as_str(), |(head, _)| head);
            let mut parts = body.trim().splitn(3, ' ');
            let x = parts.next().and_then(|p| p.parse::<f64>().ok());
            let y = parts.next().and_then(|p| p.parse::<f64>().ok());
            let tag = parts.next().map(|t| t.trim().to_string());
            match (x, y, tag) {
                (Some(x), Some(y), Some(tag)) => (x, y, tag),
                _ => return Err(invalid(format!("\"{text}\""))),
            }
        }
        other => return Err(invalid(other.to_document_string())),
    };
    let (kind, smooth) =
        NodeKind::parse(&tag).ok_or_else(|| invalid(format!("type '{tag}'")))?;
    Ok(Node {
        position: Point::new(x, y),
        kind,
        smooth,
    })
}

fn build_component(raw: &RawValue, entity: &str) -> Result<ComponentRef, SchemaError> {
    let glyph_name = match raw.get("ref").or_else(|| raw.get("name")) {
        Some(value) => value.to_text().ok_or_else(|| SchemaError::WrongType {
            entity: entity.to_string(),
            key: "ref",
            expected: "a glyph name",
        })?,
        None => {
            return Err(SchemaError::MissingKey {
                entity: entity.to_string(),
                key: "ref",
            })
        }
    };

    let offset = if let Some(pos) = raw.get("pos") {
        let coords = pos.as_array().unwrap_or_default();
        match (coords.first().and_then(RawValue::as_f64), coords.get(1).and_then(RawValue::as_f64)) {
            (Some(x), Some(y)) => Vec2::new(x, y),
            _ => {
                return Err(SchemaError::WrongType {
                    entity: entity.to_string(),
                    key: "pos",
                    expected: "an (x, y) pair",
                })
            }
        }
    } else if let Some(transform) = raw.get("transform") {
        legacy_transform_offset(transform).ok_or_else(|| SchemaError::WrongType {
            entity: entity.to_string(),
            key: "transform",
            expected: "a \"{a, b, c, d, tx, ty}\" string",
        })?
    } else {
        Vec2::ZERO
    };

    Ok(ComponentRef { glyph_name, offset })
}

/// Translation part of a version 2 `"{1, 0, 0, 1, tx, ty}"` transform
fn legacy_transform_offset(value: &RawValue) -> Option<Vec2> {
    let text = value.as_str()?;
    let inner = text.trim().strip_prefix('{')?.strip_suffix('}')?;
    let coords: Vec<f64> = inner
        .split(',')
        .map(|c| c.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .ok()?;
    if coords.len() != 6 {
        return None;
    }
    Some(Vec2::new(coords[4], coords[5]))
}

fn require<'a>(raw: &'a RawValue, key: &'static str, entity: &str) -> Result<&'a RawValue, SchemaError> {
    raw.get(key).ok_or_else(|| SchemaError::MissingKey {
        entity: entity.to_string(),
        key,
    })
}

fn require_text(raw: &RawValue, key: &'static str, entity: &str) -> Result<String, SchemaError> {
    require(raw, key, entity)?
        .to_text()
        .ok_or_else(|| SchemaError::WrongType {
            entity: entity.to_string(),
            key,
            expected: "a string",
        })
}

fn require_array<'a>(
    raw: &'a RawValue,
    key: &'static str,
    entity: &str,
) -> Result<&'a [RawValue], SchemaError> {
    require(raw, key, entity)?
        .as_array()
        .ok_or_else(|| SchemaError::WrongType {
            entity: entity.to_string(),
            key,
            expected: "a sequence",
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font_source::parser::parse;

    #[test]
    fn legacy_transform_yields_translation() {
        let value = RawValue::Quoted("{1, 0, 0, 1, 120, -30}".into());
        assert_eq!(legacy_transform_offset(&value), Some(Vec2::new(120.0, -30.0)));
        assert_eq!(legacy_transform_offset(&RawValue::Quoted("{1, 0}".into())), None);
    }

    #[test]
    fn legacy_master_name_skips_regular() {
        let raw = parse("{ weight = Bold; width = Regular; custom = Display; }").unwrap();
        assert_eq!(legacy_master_name(&raw), "Bold Display");
        let raw = parse("{ id = m; }").unwrap();
        assert_eq!(legacy_master_name(&raw), "Regular");
    }

    #[test]
    fn unicode_is_decimal_in_v3_and_hex_in_v2() {
        assert_eq!(parse_unicode(&RawValue::Integer(20013), 3, "g").unwrap(), Some('中'));
        assert_eq!(parse_unicode(&RawValue::String("4E2D".into()), 2, "g").unwrap(), Some('中'));
        // "0041" reads as the integer 41; its digits are still hex
        assert_eq!(parse_unicode(&RawValue::Integer(41), 2, "g").unwrap(), Some('A'));
        assert_eq!(
            parse_unicode(&RawValue::Quoted("0041,0061".into()), 2, "g").unwrap(),
            Some('A')
        );
        let padded = RawValue::Padded {
            value: 41,
            text: "0041".into(),
        };
        assert_eq!(parse_unicode(&padded, 2, "g").unwrap(), Some('A'));
        assert_eq!(parse_unicode(&padded, 3, "g").unwrap(), Some(')'));
        assert!(parse_unicode(&RawValue::Integer(-1), 3, "g").is_err());
    }

    #[test]
    fn node_strings_and_tuples_decode_alike() {
        let tuple = parse("(354,183,ls)").unwrap();
        let string = RawValue::Quoted("354 183 LINE SMOOTH".into());
        let a = build_node(&tuple, "g").unwrap();
        let b = build_node(&string, "g").unwrap();
        assert_eq!(a, b);
        assert!(a.smooth);
        assert!(build_node(&parse("(1,2,q)").unwrap(), "g").is_err());
    }

    #[test]
    fn legacy_node_user_data_is_ignored() {
        let plain = build_node(&RawValue::Quoted("10 20 CURVE SMOOTH".into()), "g").unwrap();
        let with_data = RawValue::Quoted("10 20 CURVE SMOOTH {name = hr00;}".into());
        assert_eq!(build_node(&with_data, "g").unwrap(), plain);
        let line = RawValue::Quoted("5 -3 LINE {\nname = \"corner\";\n}".into());
        let node = build_node(&line, "g").unwrap();
        assert_eq!(node.kind, NodeKind::Line);
        assert_eq!(node.position, Point::new(5.0, -3.0));
    }
}
