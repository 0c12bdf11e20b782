//! Read-only access to YAML values through `serde_yaml`.
//!
//! Used for validation and for pre-filling views. Nothing here writes text;
//! writes go through [`super::patch`].

use serde_yaml::Value;

use super::patch::ListItem;
use super::scalar::ScalarValue;

#[derive(Debug, thiserror::Error)]
pub enum YamlError {
    #[error("invalid YAML: {0}")]
    Invalid(#[from] serde_yaml::Error),
}

pub fn parse_yaml(text: &str) -> Result<Value, YamlError> {
    Ok(serde_yaml::from_str(text)?)
}

/// The value at `module.dotted`, if every segment names a mapping key.
pub fn lookup<'v>(root: &'v Value, module: &str, dotted: &str) -> Option<&'v Value> {
    dotted
        .split('.')
        .filter(|s| !s.is_empty())
        .try_fold(root.get(module)?, |node, segment| node.get(segment))
}

/// Top-level keys in document order.
pub fn module_keys(root: &Value) -> Vec<String> {
    root.as_mapping()
        .map(|m| {
            m.keys()
                .filter_map(|k| k.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Reads a sequence back as patchable list items.
///
/// Mappings of scalars become records; anything else nested is skipped.
pub fn list_items(root: &Value, module: &str, dotted: &str) -> Vec<ListItem> {
    let Some(Value::Sequence(seq)) = lookup(root, module, dotted) else {
        return Vec::new();
    };
    seq.iter()
        .filter_map(|item| match item {
            Value::Mapping(map) => Some(ListItem::Record(
                map.iter()
                    .filter_map(|(k, v)| {
                        Some((k.as_str()?.to_string(), ScalarValue::from_yaml(v)?))
                    })
                    .collect(),
            )),
            other => ScalarValue::from_yaml(other).map(ListItem::Scalar),
        })
        .collect()
}

/// Pairs an order list with its flag map. Keys missing from the map count as
/// enabled.
pub fn ordered_enum(
    root: &Value,
    module: &str,
    order_path: &str,
    map_path: &str,
) -> Vec<(String, bool)> {
    let flags = lookup(root, module, map_path);
    lookup(root, module, order_path)
        .and_then(Value::as_sequence)
        .map(|order| {
            order
                .iter()
                .filter_map(Value::as_str)
                .map(|key| {
                    let enabled = flags
                        .and_then(|f| f.get(key))
                        .and_then(Value::as_bool)
                        .unwrap_or(true);
                    (key.to_string(), enabled)
                })
                .collect()
        })
        .unwrap_or_default()
}
