//! Cascade compiler: validates a generic parsed tree and converts it into a
//! [`CascadeModel`].
//!
//! The input is the OpenCV JSON storage layout, already parsed into a
//! `serde_json::Value` by whatever loaded it:
//!
//! ```text
//! {"opencv_storage": {<name>: {
//!     "size": "<w> <h>",
//!     "stages": {"_": [
//!         {"stage_threshold": f, "trees": {"_": [
//!             {"_": {"threshold": f, "left_val": f, "right_val": f,
//!                    "feature": {"rects": {"_": ["x y w h weight", ...]}}}}
//!         ]}}
//!     ]}
//! }}}
//! ```
//!
//! Validation is all-or-nothing: the first problem aborts compilation and no
//! partial cascade is ever returned.

use super::model::{CascadeModel, Classifier, FeatureRect, Stage};
use crate::error::ParseError;
use log::debug;
use serde_json::{Map, Value};

const MIN_RECTS: usize = 2;
const MAX_RECTS: usize = 3;

type Node = Map<String, Value>;

/// Compiles a parsed cascade tree into a [`CascadeModel`].
pub fn compile_model(tree: &Value) -> Result<CascadeModel, ParseError> {
    let root = cascade_root(tree)?;
    let (window_width, window_height) = window_size(root)?;

    let stage_nodes = list_field(root, "stages", "cascade")?;
    let mut stages = Vec::with_capacity(stage_nodes.len());
    for (stage_idx, node) in stage_nodes.iter().enumerate() {
        stages.push(parse_stage(node, stage_idx, window_width, window_height)?);
    }
    if stages.is_empty() {
        return Err(ParseError::InvalidSyntax("cascade has no stages".into()));
    }

    let model = CascadeModel::new(stages, window_width, window_height);
    debug!(
        "compile_model window={}x{} stages={} classifiers={} rects={}",
        window_width,
        window_height,
        model.stages().len(),
        model.classifier_count(),
        model.rect_count()
    );
    Ok(model)
}

fn cascade_root(tree: &Value) -> Result<&Node, ParseError> {
    let storage = tree
        .get("opencv_storage")
        .and_then(Value::as_object)
        .ok_or_else(|| ParseError::InvalidSyntax("missing `opencv_storage` object".into()))?;
    if storage.len() != 1 {
        return Err(ParseError::InvalidSyntax(format!(
            "`opencv_storage` must hold exactly one cascade, found {}",
            storage.len()
        )));
    }
    storage
        .values()
        .next()
        .and_then(Value::as_object)
        .ok_or_else(|| ParseError::InvalidSyntax("cascade entry is not an object".into()))
}

fn window_size(root: &Node) -> Result<(u32, u32), ParseError> {
    let malformed = || ParseError::InvalidSyntax("missing or malformed `size`".into());
    let text = root.get("size").and_then(Value::as_str).ok_or_else(malformed)?;
    let dims = text
        .split_whitespace()
        .map(|tok| tok.parse::<u32>().map_err(|_| malformed()))
        .collect::<Result<Vec<_>, _>>()?;
    match dims.as_slice() {
        [w, h] if *w > 0 && *h > 0 => Ok((*w, *h)),
        _ => Err(malformed()),
    }
}

/// Resolves `node[key]["_"]` as a list. A single object is accepted as a
/// one-element list.
fn list_field<'a>(node: &'a Node, key: &str, owner: &str) -> Result<Vec<&'a Value>, ParseError> {
    let inner = node
        .get(key)
        .and_then(Value::as_object)
        .and_then(|m| m.get("_"))
        .ok_or_else(|| ParseError::InvalidSyntax(format!("{owner}: missing `{key}._` list")))?;
    match inner {
        Value::Array(items) => Ok(items.iter().collect()),
        Value::Object(_) => Ok(vec![inner]),
        _ => Err(ParseError::InvalidSyntax(format!(
            "{owner}: `{key}._` is neither a list nor an object"
        ))),
    }
}

fn parse_stage(
    node: &Value,
    stage_idx: usize,
    window_width: u32,
    window_height: u32,
) -> Result<Stage, ParseError> {
    let owner = format!("stage {stage_idx}");
    let stage = node
        .as_object()
        .ok_or_else(|| ParseError::InvalidSyntax(format!("{owner} is not an object")))?;
    let threshold = number_field(stage, "stage_threshold", &owner)?;

    let trees = list_field(stage, "trees", &owner)?;
    let mut classifiers = Vec::with_capacity(trees.len());
    for (classifier_idx, tree) in trees.iter().enumerate() {
        // Converter output wraps each classifier in `{"_": {...}}`; a bare
        // classifier object is accepted as well.
        let node = match (tree.get("_"), tree.as_object()) {
            (Some(Value::Object(node)), _) => node,
            (Some(Value::Array(_)), _) => {
                return Err(ParseError::ClassifierMoreThanOneHaarFeature {
                    stage: stage_idx,
                    classifier: classifier_idx,
                })
            }
            (None, Some(node))
                if node.contains_key("threshold") || node.contains_key("feature") =>
            {
                node
            }
            _ => {
                return Err(ParseError::InvalidSyntax(format!(
                    "{owner} tree {classifier_idx}: missing `_` node"
                )))
            }
        };
        let owner = format!("{owner} classifier {classifier_idx}");
        classifiers.push(parse_classifier(node, &owner, window_width, window_height)?);
    }
    if classifiers.is_empty() {
        return Err(ParseError::InvalidSyntax(format!("{owner} has no classifiers")));
    }
    Ok(Stage {
        classifiers,
        threshold,
    })
}

fn parse_classifier(
    node: &Node,
    owner: &str,
    window_width: u32,
    window_height: u32,
) -> Result<Classifier, ParseError> {
    let threshold = number_field(node, "threshold", owner)?;
    let left = number_field(node, "left_val", owner)?;
    let right = number_field(node, "right_val", owner)?;

    let rect_nodes = node
        .get("feature")
        .and_then(Value::as_object)
        .map(|feature| list_field(feature, "rects", owner))
        .transpose()?
        .ok_or_else(|| ParseError::InvalidSyntax(format!("{owner}: missing `feature`")))?;

    if rect_nodes.len() < MIN_RECTS || rect_nodes.len() > MAX_RECTS {
        return Err(ParseError::InvalidSyntax(format!(
            "{owner}: expected {MIN_RECTS} or {MAX_RECTS} feature rects, found {}",
            rect_nodes.len()
        )));
    }
    let rects = rect_nodes
        .iter()
        .map(|v| parse_rect(v, owner, window_width, window_height))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Classifier {
        rects,
        threshold,
        left,
        right,
    })
}

fn parse_rect(
    node: &Value,
    owner: &str,
    window_width: u32,
    window_height: u32,
) -> Result<FeatureRect, ParseError> {
    let text = node
        .as_str()
        .ok_or_else(|| ParseError::InvalidSyntax(format!("{owner}: rect is not a string")))?;
    let values = text
        .split_whitespace()
        .map(|tok| {
            tok.parse::<f32>().map_err(|_| {
                ParseError::ParsingError(format!("{owner}: rect token `{tok}` is not a number"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let [x, y, w, h, weight] = values.as_slice() else {
        return Err(ParseError::InvalidSyntax(format!(
            "{owner}: rect `{text}` must hold 5 values"
        )));
    };
    if !weight.is_finite() {
        return Err(ParseError::ParsingError(format!(
            "{owner}: rect weight `{weight}` is not finite"
        )));
    }

    let coord = |v: f32, name: &str| -> Result<u8, ParseError> {
        if v.fract() != 0.0 || !(0.0..=u8::MAX as f32).contains(&v) {
            return Err(ParseError::InvalidSyntax(format!(
                "{owner}: rect {name} `{v}` is not an integer in 0..=255"
            )));
        }
        Ok(v as u8)
    };
    let rect = FeatureRect::new(
        coord(*x, "x")?,
        coord(*y, "y")?,
        coord(*w, "width")?,
        coord(*h, "height")?,
        *weight,
    );
    if rect.x as u32 + rect.width as u32 > window_width
        || rect.y as u32 + rect.height as u32 > window_height
    {
        return Err(ParseError::InvalidSyntax(format!(
            "{owner}: rect `{text}` exceeds the {window_width}x{window_height} window"
        )));
    }
    Ok(rect)
}

/// Reads a numeric field given either as a JSON number or a numeric string.
fn number_field(node: &Node, key: &str, owner: &str) -> Result<f32, ParseError> {
    let value = match node.get(key) {
        Some(Value::Number(n)) => n.as_f64().map(|v| v as f32),
        Some(Value::String(s)) => Some(s.trim().parse::<f32>().map_err(|_| {
            ParseError::ParsingError(format!("{owner}: `{key}` = `{s}` is not a number"))
        })?),
        _ => None,
    };
    match value {
        Some(v) if v.is_finite() => Ok(v),
        Some(v) => Err(ParseError::ParsingError(format!(
            "{owner}: `{key}` = `{v}` is not finite"
        ))),
        None => Err(ParseError::InvalidSyntax(format!(
            "{owner}: missing numeric `{key}`"
        ))),
    }
}
