use crate::text::LineRef;

use super::{
    classify::{LineClass, Section},
    types::{AliasItem, GroupKind, GroupRecord, KeywordList, Related},
};

/// The record currently being accumulated.
#[derive(Debug)]
enum Leaf {
    None,
    Plain {
        start_line: usize,
        keywords: Vec<String>,
    },
    Named {
        start_line: usize,
        name: String,
        keywords: Vec<String>,
    },
    Aliases {
        start_line: usize,
        items: Vec<AliasItem>,
    },
}

/// Forward-only state machine turning classified lines into a
/// [`KeywordList`].
///
/// Records that follow each other without a blank line are held in a related
/// buffer until a blank line, sentinel or end of input flushes them.
pub struct GroupBuilder {
    section: Section,
    leaf: Leaf,
    leaf_comments: Vec<String>,
    pending_comments: Vec<String>,
    /// Blank lines seen while no comment was pending.
    gap: usize,
    /// Still inside the comment block that directly follows a sentinel.
    after_sentinel: bool,
    related: Vec<GroupRecord>,
    next_cluster: usize,
    out: KeywordList,
}

impl GroupBuilder {
    pub fn new() -> Self {
        Self {
            section: Section::None,
            leaf: Leaf::None,
            leaf_comments: vec![],
            pending_comments: vec![],
            gap: 0,
            after_sentinel: false,
            related: vec![],
            next_cluster: 0,
            out: KeywordList::default(),
        }
    }

    pub fn push(&mut self, line: &LineRef<'_>, class: &LineClass<'_>) {
        match *class {
            LineClass::Sentinel(section) => {
                self.close_leaf();
                self.flush_related();
                self.pending_comments.clear();
                self.gap = 0;
                self.section = section;
                self.after_sentinel = true;
            }
            LineClass::Comment(comment) => self.push_comment(comment),
            LineClass::Blank => {
                self.after_sentinel = false;
                self.push_blank();
            }
            _ if self.section == Section::Global => {
                self.after_sentinel = false;
                self.out.global_filter.push(line.text.trim().to_string());
            }
            LineClass::GroupName(name) => {
                self.enter_content();
                self.open_leaf(Leaf::Named {
                    start_line: line.index,
                    name: name.to_string(),
                    keywords: vec![],
                });
            }
            LineClass::Alias { pattern, alias } => {
                self.enter_content();
                let item = AliasItem::new(pattern, alias);
                if let Leaf::Aliases { items, .. } = &mut self.leaf {
                    items.push(item);
                } else {
                    self.open_leaf(Leaf::Aliases {
                        start_line: line.index,
                        items: vec![item],
                    });
                }
            }
            LineClass::Keyword(keyword) => {
                self.enter_content();
                match &mut self.leaf {
                    Leaf::Plain { keywords, .. } | Leaf::Named { keywords, .. } => {
                        keywords.push(keyword.to_string());
                    }
                    _ => self.open_leaf(Leaf::Plain {
                        start_line: line.index,
                        keywords: vec![keyword.to_string()],
                    }),
                }
            }
        }
    }

    pub fn finish(mut self) -> KeywordList {
        // EOF flush
        self.close_leaf();
        self.flush_related();

        let mut trailing = std::mem::take(&mut self.pending_comments);
        // The serializer always leaves one blank line after the last record.
        if !self.out.groups.is_empty() && trailing.first().is_some_and(String::is_empty) {
            trailing.remove(0);
        }
        self.out.trailing_comments = trailing;
        self.out
    }

    /// Content before any sentinel is treated as word groups.
    fn enter_content(&mut self) {
        self.after_sentinel = false;
        if self.section == Section::None {
            self.section = Section::Groups;
        }
    }

    fn push_comment(&mut self, comment: &str) {
        if self.after_sentinel || self.section != Section::Groups {
            return;
        }
        // A comment ends the record above it but keeps it in the related run.
        self.close_leaf();
        if self.has_records() {
            self.pending_comments
                .extend(std::iter::repeat_n(String::new(), self.gap));
        }
        self.gap = 0;
        self.pending_comments.push(comment.to_string());
    }

    fn push_blank(&mut self) {
        if self.section != Section::Groups {
            return;
        }
        self.close_leaf();
        self.flush_related();
        if self.pending_comments.is_empty() {
            self.gap += 1;
        } else {
            self.pending_comments.push(String::new());
        }
    }

    fn has_records(&self) -> bool {
        !self.out.groups.is_empty() || !self.related.is_empty()
    }

    /// Starts a new record; it claims every comment collected so far.
    fn open_leaf(&mut self, leaf: Leaf) {
        self.close_leaf();
        self.leaf_comments = std::mem::take(&mut self.pending_comments);
        self.gap = 0;
        self.leaf = leaf;
    }

    /// Moves the in-progress record, if any, into the related buffer and
    /// hands it the comments collected above it.
    fn close_leaf(&mut self) {
        let prev = std::mem::replace(&mut self.leaf, Leaf::None);
        let (start_line, kind) = match prev {
            Leaf::None => return,
            Leaf::Plain {
                start_line,
                keywords,
            } => (start_line, GroupKind::Plain { keywords }),
            Leaf::Named {
                start_line,
                name,
                keywords,
            } => (start_line, GroupKind::GroupAlias { name, keywords }),
            Leaf::Aliases {
                start_line,
                mut items,
            } => {
                let kind = if items.len() == 1 {
                    GroupKind::SingleAlias(items.remove(0))
                } else {
                    GroupKind::AliasCluster(items)
                };
                (start_line, kind)
            }
        };
        self.related.push(GroupRecord {
            kind,
            start_line,
            preceding_comments: std::mem::take(&mut self.leaf_comments),
            related: None,
        });
    }

    fn flush_related(&mut self) {
        let run = std::mem::take(&mut self.related);
        let total = run.len();
        if total > 1 {
            let cluster = self.next_cluster;
            self.next_cluster += 1;
            for (i, mut rec) in run.into_iter().enumerate() {
                rec.related = Some(Related {
                    cluster,
                    index: i + 1,
                    total,
                });
                self.out.groups.push(rec);
            }
        } else {
            self.out.groups.extend(run);
        }
    }
}

impl Default for GroupBuilder {
    fn default() -> Self {
        Self::new()
    }
}
