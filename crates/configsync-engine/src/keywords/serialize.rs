use crate::text::lines;

use super::{
    classify::{GLOBAL_FILTER, Section, WORD_GROUPS},
    types::{GroupKind, GroupRecord, KeywordList},
};

/// Banner written when there is no earlier text to take a header from.
pub const TEMPLATE_BANNER: &str = "\
# Keyword list
#
# [GLOBAL_FILTER] words drop any matching title everywhere.
# [WORD_GROUPS] groups are separated by one blank line.
#   +word   must include       !word   exclude
#   @N      show at most N     /re/    regular expression
#   [Name]  named group        a => b  display alias
#

";

/// The parts of an earlier text that survive re-serialization verbatim.
#[derive(Debug, Default, PartialEq, Eq)]
struct SourceLayout<'a> {
    header: Vec<&'a str>,
    global_comments: Vec<&'a str>,
    groups_comments: Vec<&'a str>,
}

impl<'a> SourceLayout<'a> {
    /// Walks `original` once, collecting the header (everything before the
    /// first sentinel or content line) and the comment block directly under
    /// each sentinel.
    fn scan(original: &'a str) -> Self {
        let mut layout = Self::default();
        let mut in_header = true;
        let mut under: Option<Section> = None;

        for line in lines(original) {
            let trimmed = line.text.trim();
            let is_comment = trimmed.starts_with('#');

            if trimmed == GLOBAL_FILTER || trimmed == WORD_GROUPS {
                in_header = false;
                under = Some(if trimmed == GLOBAL_FILTER {
                    Section::Global
                } else {
                    Section::Groups
                });
                continue;
            }
            if in_header {
                if is_comment || trimmed.is_empty() {
                    layout.header.push(line.text);
                    continue;
                }
                in_header = false;
            }
            match under {
                Some(Section::Global) if is_comment => {
                    layout.global_comments.push(line.text.trim_end())
                }
                Some(Section::Groups) if is_comment => {
                    layout.groups_comments.push(line.text.trim_end())
                }
                _ => under = None,
            }
        }
        layout
    }
}

/// Renders a keyword list back to text.
///
/// With `original` the header and the comments under each sentinel are copied
/// from it; without, a fixed banner is used. Record comments always come from
/// the records themselves.
pub fn serialize(list: &KeywordList, original: Option<&str>) -> String {
    let mut out = String::new();

    let layout = match original {
        Some(text) => {
            let layout = SourceLayout::scan(text);
            for line in &layout.header {
                push_line(&mut out, line);
            }
            layout
        }
        None => {
            out.push_str(TEMPLATE_BANNER);
            SourceLayout::default()
        }
    };

    push_line(&mut out, GLOBAL_FILTER);
    for comment in &layout.global_comments {
        push_line(&mut out, comment);
    }
    for word in &list.global_filter {
        push_line(&mut out, word);
    }
    out.push('\n');

    push_line(&mut out, WORD_GROUPS);
    for comment in &layout.groups_comments {
        push_line(&mut out, comment);
    }
    if !list.groups.is_empty() || !list.trailing_comments.is_empty() {
        out.push('\n');
    }

    for (i, rec) in list.groups.iter().enumerate() {
        // The section's own blank line already separates the first record.
        let skip = match i {
            0 => rec
                .preceding_comments
                .iter()
                .take_while(|c| c.is_empty())
                .count(),
            _ => 0,
        };
        for comment in &rec.preceding_comments[skip..] {
            push_line(&mut out, comment);
        }
        push_record(&mut out, rec);
        if needs_blank_after(rec, list.groups.get(i + 1)) {
            out.push('\n');
        }
    }

    for comment in &list.trailing_comments {
        push_line(&mut out, comment);
    }
    out
}

/// Blank-line policy between records: none inside a related run, none when
/// the next record's own comments already encode spacing, otherwise one. The
/// last record is always followed by one.
fn needs_blank_after(rec: &GroupRecord, next: Option<&GroupRecord>) -> bool {
    match next {
        None => true,
        Some(next) if !next.preceding_comments.is_empty() => false,
        Some(_) => !rec.related.is_some_and(|r| r.continues()),
    }
}

fn push_record(out: &mut String, rec: &GroupRecord) {
    match &rec.kind {
        GroupKind::Plain { keywords } => {
            for kw in keywords {
                push_line(out, kw);
            }
        }
        GroupKind::GroupAlias { name, keywords } => {
            push_line(out, &format!("[{name}]"));
            for kw in keywords {
                push_line(out, kw);
            }
        }
        GroupKind::SingleAlias(item) => {
            push_line(out, &format!("{} => {}", item.pattern, item.alias));
        }
        GroupKind::AliasCluster(items) => {
            for item in items {
                push_line(out, &format!("{} => {}", item.pattern, item.alias));
            }
        }
    }
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keywords::{AliasItem, parse};
    use pretty_assertions::assert_eq;

    #[test]
    fn layout_collects_header_and_sentinel_comments() {
        let text = "# title\n# Version: 1.2.3\n\n[GLOBAL_FILTER]\n# filters\nads\n# dropped\n\n[WORD_GROUPS]\n# groups\n# more\n\nAI\n";
        let layout = SourceLayout::scan(text);
        assert_eq!(layout.header, vec!["# title", "# Version: 1.2.3", ""]);
        assert_eq!(layout.global_comments, vec!["# filters"]);
        assert_eq!(layout.groups_comments, vec!["# groups", "# more"]);
    }

    #[test]
    fn template_mode_writes_banner_and_sections() {
        let list = KeywordList {
            global_filter: vec!["ads".into()],
            groups: vec![GroupRecord::new(GroupKind::SingleAlias(AliasItem::new(
                "huawei", "Huawei",
            )))],
            trailing_comments: vec![],
        };
        let out = serialize(&list, None);
        assert!(out.starts_with(TEMPLATE_BANNER));
        assert!(out.ends_with("[GLOBAL_FILTER]\nads\n\n[WORD_GROUPS]\n\nhuawei => Huawei\n\n"));
    }

    #[test]
    fn empty_list_serializes_to_bare_sections() {
        let out = serialize(&KeywordList::default(), Some(""));
        assert_eq!(out, "[GLOBAL_FILTER]\n\n[WORD_GROUPS]\n");
        assert_eq!(parse(&out), KeywordList::default());
    }

    #[test]
    fn related_records_share_no_blank_line() {
        let text = "[GLOBAL_FILTER]\n\n[WORD_GROUPS]\n\nA\n[B]\nb\n\nC\n\n";
        let list = parse(text);
        assert!(list.groups[0].is_related_group());
        assert!(list.groups[1].is_related_group());
        assert!(!list.groups[2].is_related_group());
        assert_eq!(serialize(&list, Some(text)), text);
    }

    #[test]
    fn first_record_never_gets_a_second_leading_blank() {
        let mut rec = GroupRecord::new(GroupKind::Plain {
            keywords: vec!["B".into()],
        });
        rec.preceding_comments = vec!["".into(), "# about B".into()];
        let list = KeywordList {
            groups: vec![rec],
            ..KeywordList::default()
        };
        let out = serialize(&list, Some(""));
        assert_eq!(out, "[GLOBAL_FILTER]\n\n[WORD_GROUPS]\n\n# about B\nB\n\n");
        assert_eq!(serialize(&parse(&out), Some(&out)), out);
    }

    #[test]
    fn comment_spacing_is_carried_by_the_record() {
        let text = "[GLOBAL_FILTER]\n\n[WORD_GROUPS]\n\nA\n\n# about B\n\nB\n\n";
        let list = parse(text);
        assert_eq!(list.groups[1].preceding_comments, vec!["", "# about B", ""]);
        assert_eq!(serialize(&list, Some(text)), text);
    }
}
