use std::collections::HashMap;

use crate::text::{TextEdit, apply_all};

use super::scalar::{Quote, ScalarValue, double_quoted, split_comment};
use super::scan::{Body, BodyKind, LineKind, YamlLine, block_body, locate, scan};

/// Why a patch left the text untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchMiss {
    #[error("module `{module}` not found")]
    ModuleNotFound { module: String },
    #[error("`{path}` not found under `{module}`")]
    PathNotFound { module: String, path: String },
    #[error("`{path}` under `{module}` holds a scalar where a block was expected")]
    NotAList { module: String, path: String },
}

/// One entry of a block sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum ListItem {
    /// `- value`
    Scalar(ScalarValue),
    /// `- key: value` followed by `  key: value` lines.
    Record(Vec<(String, ScalarValue)>),
}

impl ListItem {
    /// Lines for this item, relative to the item indent.
    ///
    /// Strings inside records are always double-quoted; bare scalars are only
    /// quoted when they need it.
    pub fn render(&self) -> Vec<String> {
        match self {
            Self::Scalar(value) => vec![format!("- {}", value.render(Quote::Plain))],
            Self::Record(fields) if fields.is_empty() => vec!["- {}".to_string()],
            Self::Record(fields) => fields
                .iter()
                .enumerate()
                .map(|(i, (key, value))| {
                    let lead = if i == 0 { "- " } else { "  " };
                    let value = match value {
                        ScalarValue::Str(s) => double_quoted(s),
                        other => other.render(Quote::Plain),
                    };
                    format!("{lead}{key}: {value}")
                })
                .collect(),
        }
    }
}

/// A `key: value  # comment` line cut at its seams.
struct KeyLine<'a> {
    /// Indent, key and colon.
    head: &'a str,
    /// Whitespace between the colon and the value.
    sep: &'a str,
    value: &'a str,
    /// Trailing comment with its leading whitespace, or empty.
    comment: &'a str,
}

impl<'a> KeyLine<'a> {
    fn of(line: &YamlLine<'a>) -> Option<Self> {
        let LineKind::Key { colon, .. } = line.kind else {
            return None;
        };
        let text = line.line.text;
        let (raw, comment) = split_comment(&text[colon + 1..]);
        let value = raw.trim_start();
        Some(Self {
            head: &text[..=colon],
            sep: &raw[..raw.len() - value.len()],
            value,
            comment,
        })
    }

    fn rewrite(&self, value: &str) -> String {
        let sep = if self.sep.is_empty() { " " } else { self.sep };
        format!("{}{sep}{value}{}", self.head, self.comment)
    }
}

fn key_line<'a>(
    lines: &[YamlLine<'a>],
    index: usize,
    module: &str,
    path: &str,
) -> Result<KeyLine<'a>, PatchMiss> {
    KeyLine::of(&lines[index]).ok_or_else(|| PatchMiss::PathNotFound {
        module: module.to_string(),
        path: path.to_string(),
    })
}

/// The edit that would set `module.dotted` to `value`.
pub fn scalar_field_edit(
    text: &str,
    module: &str,
    dotted: &str,
    value: &ScalarValue,
) -> Result<TextEdit, PatchMiss> {
    let lines = scan(text);
    let (_, index) = locate(&lines, module, dotted)?;
    let key = key_line(&lines, index, module, dotted)?;
    let rendered = value.render(Quote::of(key.value));
    Ok(TextEdit::replace(
        lines[index].line.content_span().range(),
        key.rewrite(&rendered),
    ))
}

pub fn try_set_scalar_field(
    text: &str,
    module: &str,
    dotted: &str,
    value: &ScalarValue,
) -> Result<String, PatchMiss> {
    Ok(scalar_field_edit(text, module, dotted, value)?.apply(text))
}

/// Rewrites the value of `module.dotted` in place, keeping indentation, the
/// trailing comment and the line ending. A missing module or path leaves the
/// text unchanged.
pub fn set_scalar_field(text: &str, module: &str, dotted: &str, value: &ScalarValue) -> String {
    try_set_scalar_field(text, module, dotted, value).unwrap_or_else(|miss| {
        log::debug!("scalar patch skipped: {miss}");
        text.to_string()
    })
}

/// Edits that replace the body of the block under `lines[key]` with
/// `rendered` (lines relative to the body indent).
///
/// An empty `rendered` leaves `head: <empty>` on the key line; a non-empty one
/// turns a flow value on the key line into a block.
fn block_edits(
    lines: &[YamlLine<'_>],
    key: usize,
    key_parts: &KeyLine<'_>,
    body: &Body,
    rendered: &[String],
    empty: &str,
) -> Vec<TextEdit> {
    let key_ref = &lines[key].line;
    let newline = if key_ref.terminator.is_empty() {
        "\n"
    } else {
        key_ref.terminator
    };
    let pad = " ".repeat(body.indent);
    let mut edits = Vec::new();

    let head = if rendered.is_empty() {
        key_parts.rewrite(empty)
    } else {
        format!("{}{}", key_parts.head, key_parts.comment)
    };
    if head != key_ref.text {
        edits.push(TextEdit::replace(key_ref.content_span().range(), head));
    }

    let block: String = rendered
        .iter()
        .map(|l| format!("{pad}{l}{newline}"))
        .collect();

    if body.lines.is_empty() {
        if !block.is_empty() {
            let at = key_ref.span.end;
            let insert = if key_ref.terminator.is_empty() {
                format!("{newline}{}", block.trim_end_matches(newline))
            } else {
                block
            };
            edits.push(TextEdit::replace(at..at, insert));
        }
    } else {
        let first = &lines[body.lines.start].line;
        let last = &lines[body.lines.end - 1].line;
        let insert = if last.terminator.is_empty() {
            block.trim_end_matches(newline).to_string()
        } else {
            block
        };
        edits.push(TextEdit::replace(first.span.start..last.span.end, insert));
    }
    edits
}

/// The edits that would replace the sequence at `module.list_key` with
/// `items`, each rendered by `render`.
pub fn list_region_edits<T>(
    text: &str,
    module: &str,
    list_key: &str,
    items: &[T],
    render: impl Fn(&T) -> Vec<String>,
) -> Result<Vec<TextEdit>, PatchMiss> {
    let lines = scan(text);
    let (span, index) = locate(&lines, module, list_key)?;
    let key = key_line(&lines, index, module, list_key)?;
    if !key.value.is_empty() && !key.value.starts_with('[') {
        return Err(PatchMiss::NotAList {
            module: module.to_string(),
            path: list_key.to_string(),
        });
    }

    let body = block_body(&lines, index, span.end, BodyKind::Sequence);
    let rendered: Vec<String> = items.iter().flat_map(render).collect();
    Ok(block_edits(&lines, index, &key, &body, &rendered, "[]"))
}

pub fn try_replace_list_region<T>(
    text: &str,
    module: &str,
    list_key: &str,
    items: &[T],
    render: impl Fn(&T) -> Vec<String>,
) -> Result<String, PatchMiss> {
    let edits = list_region_edits(text, module, list_key, items, render)?;
    Ok(apply_all(text, &edits))
}

/// Replaces the items of the sequence at `module.list_key`.
///
/// Comment lines directly under the key and after the last item survive, the
/// indent of the existing items is reused, and nothing outside the region
/// moves. An empty `items` writes `key: []`.
pub fn replace_list_region<T>(
    text: &str,
    module: &str,
    list_key: &str,
    items: &[T],
    render: impl Fn(&T) -> Vec<String>,
) -> String {
    try_replace_list_region(text, module, list_key, items, render).unwrap_or_else(|miss| {
        log::debug!("list patch skipped: {miss}");
        text.to_string()
    })
}

/// Trailing comments keyed by entry, read from an order list body.
fn order_comments<'a>(lines: &[YamlLine<'a>], body: &Body) -> HashMap<String, &'a str> {
    lines[body.lines.clone()]
        .iter()
        .filter(|l| l.indent == body.indent && l.is_seq_item())
        .filter_map(|l| {
            let item = l.line.text.trim_start().strip_prefix('-')?;
            let (value, comment) = split_comment(item);
            Some((unquote(value.trim()).to_string(), comment))
        })
        .collect()
}

/// Trailing comments keyed by entry, read from a flag map body.
fn map_comments<'a>(lines: &[YamlLine<'a>], body: &Body) -> HashMap<String, &'a str> {
    lines[body.lines.clone()]
        .iter()
        .filter(|l| l.indent == body.indent)
        .filter_map(|l| {
            let parts = KeyLine::of(l)?;
            let key = l.key()?;
            Some((key.to_string(), parts.comment))
        })
        .collect()
}

fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| s.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(s)
}

/// The edits that would rewrite an order list and its companion flag map.
pub fn ordered_enum_edits(
    text: &str,
    module: &str,
    order_path: &str,
    map_path: &str,
    entries: &[(String, bool)],
) -> Result<Vec<TextEdit>, PatchMiss> {
    let lines = scan(text);
    let (span, order_index) = locate(&lines, module, order_path)?;
    let (_, map_index) = locate(&lines, module, map_path)?;
    let order_key = key_line(&lines, order_index, module, order_path)?;
    let map_key = key_line(&lines, map_index, module, map_path)?;
    for (key, path, flow) in [(&order_key, order_path, '['), (&map_key, map_path, '{')] {
        if !key.value.is_empty() && !key.value.starts_with(flow) {
            return Err(PatchMiss::NotAList {
                module: module.to_string(),
                path: path.to_string(),
            });
        }
    }

    let order_body = block_body(&lines, order_index, span.end, BodyKind::Sequence);
    let map_body = block_body(&lines, map_index, span.end, BodyKind::Mapping);
    let order_notes = order_comments(&lines, &order_body);
    let map_notes = map_comments(&lines, &map_body);

    let as_key = |name: &str| ScalarValue::from(name).render(Quote::Plain);
    let order: Vec<String> = entries
        .iter()
        .map(|(name, _)| {
            let note = order_notes.get(name).copied().unwrap_or_default();
            format!("- {}{note}", as_key(name.as_str()))
        })
        .collect();
    let flags: Vec<String> = entries
        .iter()
        .map(|(name, enabled)| {
            let note = map_notes.get(name).copied().unwrap_or_default();
            format!("{}: {enabled}{note}", as_key(name.as_str()))
        })
        .collect();

    let mut edits = block_edits(&lines, order_index, &order_key, &order_body, &order, "[]");
    edits.extend(block_edits(&lines, map_index, &map_key, &map_body, &flags, "{}"));
    Ok(edits)
}

pub fn try_replace_ordered_enum_region(
    text: &str,
    module: &str,
    order_path: &str,
    map_path: &str,
    entries: &[(String, bool)],
) -> Result<String, PatchMiss> {
    let edits = ordered_enum_edits(text, module, order_path, map_path, entries)?;
    Ok(apply_all(text, &edits))
}

/// Rewrites an order list (`- key` lines) and the flag map next to it
/// (`key: bool` lines) so both follow `entries`. Trailing comments stay with
/// their key in both blocks.
pub fn replace_ordered_enum_region(
    text: &str,
    module: &str,
    order_path: &str,
    map_path: &str,
    entries: &[(String, bool)],
) -> String {
    try_replace_ordered_enum_region(text, module, order_path, map_path, entries).unwrap_or_else(
        |miss| {
            log::debug!("ordered enum patch skipped: {miss}");
            text.to_string()
        },
    )
}
