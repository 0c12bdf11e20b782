use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::text::{LineRef, lines};

use super::PatchMiss;

static KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(-\s+)?("[^"]*"|'[^']*'|[^\s#'"\-][^:#]*?|-[^\s:#][^:#]*?)\s*:(?:\s|$)"#).unwrap()
});

/// What a YAML line looks like, judged on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    Blank,
    Comment,
    /// `key: ...`; `colon` is the byte offset of the `:` in the line text.
    Key { key: &'a str, colon: usize },
    /// `- ...`; a `- key: value` entry also reports its first key.
    SeqItem { key: Option<(&'a str, usize)> },
    Other,
}

#[derive(Debug, Clone, Copy)]
pub struct YamlLine<'a> {
    pub line: LineRef<'a>,
    /// Leading spaces.
    pub indent: usize,
    pub kind: LineKind<'a>,
}

impl YamlLine<'_> {
    pub fn is_content(&self) -> bool {
        !matches!(self.kind, LineKind::Blank | LineKind::Comment)
    }

    pub fn is_seq_item(&self) -> bool {
        matches!(self.kind, LineKind::SeqItem { .. })
    }

    pub fn key(&self) -> Option<&str> {
        match self.kind {
            LineKind::Key { key, .. } => Some(key),
            _ => None,
        }
    }
}

fn classify(line: LineRef<'_>) -> YamlLine<'_> {
    let indent = line.text.len() - line.text.trim_start_matches(' ').len();
    let body = &line.text[indent..];

    let kind = if body.trim().is_empty() {
        LineKind::Blank
    } else if body.starts_with('#') {
        LineKind::Comment
    } else if let Some(caps) = KEY.captures(body)
        && let Some(key) = caps.get(2)
    {
        let colon = indent + caps[0].trim_end().len() - 1;
        let name = unquote_key(key.as_str());
        if caps.get(1).is_some() {
            LineKind::SeqItem {
                key: Some((name, colon)),
            }
        } else {
            LineKind::Key { key: name, colon }
        }
    } else if body == "-" || body.starts_with("- ") {
        LineKind::SeqItem { key: None }
    } else {
        LineKind::Other
    };

    YamlLine { line, indent, kind }
}

fn unquote_key(key: &str) -> &str {
    key.strip_prefix('"')
        .and_then(|k| k.strip_suffix('"'))
        .or_else(|| key.strip_prefix('\'').and_then(|k| k.strip_suffix('\'')))
        .unwrap_or(key)
        .trim_end()
}

/// Classifies every line of `text`.
pub fn scan(text: &str) -> Vec<YamlLine<'_>> {
    lines(text).map(classify).collect()
}

/// Line range `[start, next top-level key)` of the module `module`.
///
/// Only zero-indent `key:` lines open or close a module; column-0 comments
/// and sequence entries stay inside the module above them.
pub fn module_span(lines: &[YamlLine<'_>], module: &str) -> Result<Range<usize>, PatchMiss> {
    let is_top_key = |l: &YamlLine<'_>| l.indent == 0 && l.key().is_some();

    let start = lines
        .iter()
        .position(|l| is_top_key(l) && l.key() == Some(module))
        .ok_or_else(|| PatchMiss::ModuleNotFound {
            module: module.to_string(),
        })?;
    let end = lines[start + 1..]
        .iter()
        .position(is_top_key)
        .map_or(lines.len(), |offset| start + 1 + offset);
    Ok(start..end)
}

/// Every module with its line span, in document order.
pub fn modules<'a>(lines: &[YamlLine<'a>]) -> Vec<(&'a str, Range<usize>)> {
    let starts: Vec<(usize, &'a str)> = lines
        .iter()
        .enumerate()
        .filter_map(|(i, l)| match l.kind {
            LineKind::Key { key, .. } if l.indent == 0 => Some((i, key)),
            _ => None,
        })
        .collect();
    starts
        .iter()
        .enumerate()
        .map(|(n, &(start, key))| {
            let end = starts.get(n + 1).map_or(lines.len(), |&(next, _)| next);
            (key, start..end)
        })
        .collect()
}

/// Location progress while walking a module for a dotted path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Seek {
    /// Looking for `path[depth]` among the children of a key at
    /// `parent_indent`; children sit at `child_indent` once seen.
    Field {
        depth: usize,
        parent_indent: usize,
        child_indent: Option<usize>,
    },
    Done(usize),
}

/// Finds the line holding the last segment of `path` inside `module`.
///
/// Each segment must be a direct child of the previous one: a leaf that only
/// exists under some other parent is not a match.
pub fn find_path(
    lines: &[YamlLine<'_>],
    module: Range<usize>,
    path: &[&str],
) -> Result<usize, PatchMiss> {
    let miss = || PatchMiss::PathNotFound {
        module: lines
            .get(module.start)
            .and_then(YamlLine::key)
            .unwrap_or_default()
            .to_string(),
        path: path.join("."),
    };
    if path.is_empty() {
        return Ok(module.start);
    }

    let mut seek = Seek::Field {
        depth: 0,
        parent_indent: lines[module.start].indent,
        child_indent: None,
    };

    for i in module.start + 1..module.end {
        let l = &lines[i];
        let Seek::Field {
            depth,
            parent_indent,
            child_indent,
        } = &mut seek
        else {
            break;
        };
        if !l.is_content() {
            continue;
        }
        if l.indent <= *parent_indent {
            if *depth == 0 {
                // column-0 sequence entries or stray scalars
                continue;
            }
            // Left the matched ancestor's block without finding the child.
            return Err(miss());
        }
        let ci = *child_indent.get_or_insert(l.indent);
        if l.indent != ci || l.key() != Some(path[*depth]) {
            continue;
        }
        if *depth + 1 == path.len() {
            seek = Seek::Done(i);
        } else {
            *depth += 1;
            *parent_indent = l.indent;
            *child_indent = None;
        }
    }

    match seek {
        Seek::Done(i) => Ok(i),
        Seek::Field { .. } => Err(miss()),
    }
}

/// Locates `dotted` under `module`, returning the module span and the line.
pub fn locate(
    lines: &[YamlLine<'_>],
    module: &str,
    dotted: &str,
) -> Result<(Range<usize>, usize), PatchMiss> {
    let span = module_span(lines, module)?;
    let path: Vec<&str> = dotted.split('.').filter(|s| !s.is_empty()).collect();
    let line = find_path(lines, span.clone(), &path)?;
    Ok((span, line))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Sequence,
    Mapping,
}

/// The nested block under a key line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Body {
    /// Item lines, from the first item through the last item or attribute
    /// line. Empty (positioned right after the key line) when there are none.
    pub lines: Range<usize>,
    /// Indent of the item lines.
    pub indent: usize,
}

/// Finds the body of the block opened by `key_line`, scanning no further
/// than `end`.
///
/// Comment and blank lines directly under the key are not part of the body,
/// nor are those trailing after its last item.
pub fn block_body(lines: &[YamlLine<'_>], key_line: usize, end: usize, kind: BodyKind) -> Body {
    let k = lines[key_line].indent;
    let empty = Body {
        lines: key_line + 1..key_line + 1,
        indent: k + 2,
    };

    let Some(first) = (key_line + 1..end).find(|&i| lines[i].is_content()) else {
        return empty;
    };
    let head = &lines[first];
    let opens = match kind {
        BodyKind::Sequence => head.is_seq_item() && head.indent >= k,
        BodyKind::Mapping => head.indent > k,
    };
    if !opens {
        return empty;
    }

    let indent = head.indent;
    let mut last = first;
    for (i, l) in lines.iter().enumerate().take(end).skip(first + 1) {
        if !l.is_content() {
            continue;
        }
        let inside = match kind {
            BodyKind::Sequence => l.indent > indent || (l.indent == indent && l.is_seq_item()),
            BodyKind::Mapping => l.indent >= indent,
        };
        if !inside {
            break;
        }
        last = i;
    }
    Body {
        lines: first..last + 1,
        indent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const DOC: &str = "\
app:
  name: demo
rss:
  enabled: true
  feeds:
    - id: a
      url: https://a.example/rss
# between modules
  nested:
    enabled: false
platforms:
  enabled: true  # on
";

    #[rstest]
    #[case("  key: value", 2, LineKind::Key { key: "key", colon: 5 })]
    #[case("\"quoted key\": 1", 0, LineKind::Key { key: "quoted key", colon: 12 })]
    #[case("url: https://x.example", 0, LineKind::Key { key: "url", colon: 3 })]
    #[case("    - id: a", 4, LineKind::SeqItem { key: Some(("id", 8)) })]
    #[case("  - plain", 2, LineKind::SeqItem { key: None })]
    #[case("  # note", 2, LineKind::Comment)]
    #[case("   ", 3, LineKind::Blank)]
    #[case("just text", 0, LineKind::Other)]
    fn classifies_lines(#[case] text: &str, #[case] indent: usize, #[case] kind: LineKind<'_>) {
        let l = scan(text)[0];
        assert_eq!(l.indent, indent);
        assert_eq!(l.kind, kind);
    }

    #[test]
    fn module_span_stops_at_next_top_level_key() {
        let lines = scan(DOC);
        assert_eq!(module_span(&lines, "rss").unwrap(), 2..10);
        assert_eq!(module_span(&lines, "platforms").unwrap(), 10..12);
        assert!(matches!(
            module_span(&lines, "missing"),
            Err(PatchMiss::ModuleNotFound { .. })
        ));
    }

    #[test]
    fn lists_modules_in_order() {
        let lines = scan(DOC);
        assert_eq!(
            modules(&lines),
            vec![("app", 0..2), ("rss", 2..10), ("platforms", 10..12)]
        );
    }

    #[test]
    fn finds_nested_path_through_parents() {
        let lines = scan(DOC);
        assert_eq!(locate(&lines, "rss", "nested.enabled").unwrap().1, 9);
        assert_eq!(locate(&lines, "rss", "enabled").unwrap().1, 3);
    }

    #[test]
    fn rejects_leaf_under_wrong_parent() {
        let lines = scan(DOC);
        // `url` exists, but inside a sequence entry rather than under `feeds`.
        assert!(locate(&lines, "rss", "feeds.url").is_err());
        // `name` lives in `app`, not `rss`.
        assert!(locate(&lines, "rss", "name").is_err());
    }

    #[test]
    fn sequence_body_spans_items_and_attributes() {
        let lines = scan(DOC);
        let (span, feeds) = locate(&lines, "rss", "feeds").unwrap();
        let body = block_body(&lines, feeds, span.end, BodyKind::Sequence);
        assert_eq!(body, Body { lines: 5..7, indent: 4 });
    }

    #[test]
    fn empty_body_sits_after_key_line() {
        let lines = scan("rss:\n  feeds: []\n  enabled: true\n");
        let body = block_body(&lines, 1, lines.len(), BodyKind::Sequence);
        assert_eq!(body, Body { lines: 2..2, indent: 4 });
    }
}
