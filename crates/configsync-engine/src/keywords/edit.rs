//! Structural edits on a parsed [`KeywordList`].
//!
//! Every edit returns `false` and leaves the list alone when an index is out
//! of range or when the new content would not read back as the same record
//! (an empty plain group, a keyword that looks like an alias, a name with a
//! line break). Edits that add, drop or reorder records renumber the
//! related-run annotations so the serializer's blank-line policy stays
//! consistent.

use crate::text::lines;

use super::classify::{KeywordLineClassifier, LineClass};
use super::types::{AliasItem, GroupKind, GroupRecord, KeywordList, Related};

/// True when `line`, written on its own, classifies as `expected`.
fn reads_back(line: &str, expected: LineClass<'_>) -> bool {
    !line.contains(['\n', '\r'])
        && lines(line)
            .next()
            .is_some_and(|l| KeywordLineClassifier.classify(&l) == expected)
}

fn is_keyword(keyword: &str) -> bool {
    reads_back(keyword, LineClass::Keyword(keyword))
}

fn is_group_name(name: &str) -> bool {
    reads_back(&format!("[{name}]"), LineClass::GroupName(name))
}

fn is_alias(item: &AliasItem) -> bool {
    reads_back(
        &format!("{} => {}", item.pattern, item.alias),
        LineClass::Alias {
            pattern: &item.pattern,
            alias: &item.alias,
        },
    )
}

/// Whether the serializer's lines for `kind` parse back into the same kind.
pub fn is_writable(kind: &GroupKind) -> bool {
    match kind {
        GroupKind::Plain { keywords } => {
            !keywords.is_empty() && keywords.iter().all(|k| is_keyword(k))
        }
        GroupKind::GroupAlias { name, keywords } => {
            is_group_name(name) && keywords.iter().all(|k| is_keyword(k))
        }
        GroupKind::SingleAlias(item) => is_alias(item),
        GroupKind::AliasCluster(items) => items.len() > 1 && items.iter().all(is_alias),
    }
}

impl KeywordList {
    pub fn set_global_filter(&mut self, words: Vec<String>) {
        self.global_filter = words;
    }

    /// Inserts a standalone record at `index` (clamped to the end) and
    /// returns where it landed.
    pub fn insert_group(&mut self, index: usize, kind: GroupKind) -> Option<usize> {
        if !is_writable(&kind) {
            return None;
        }
        let index = index.min(self.groups.len());
        self.groups.insert(index, GroupRecord::new(kind));
        self.renumber_related();
        Some(index)
    }

    pub fn remove_group(&mut self, index: usize) -> bool {
        if index >= self.groups.len() {
            return false;
        }
        let removed = self.groups.remove(index);
        // Keep the blank line the removed record's comments were carrying.
        if let Some(next) = self.groups.get_mut(index)
            && next.preceding_comments.is_empty()
            && removed.preceding_comments.first().is_some_and(String::is_empty)
        {
            next.preceding_comments.push(String::new());
        }
        self.renumber_related();
        true
    }

    /// Moves a record; it leaves any related run it belonged to.
    pub fn move_group(&mut self, from: usize, to: usize) -> bool {
        if from >= self.groups.len() || to >= self.groups.len() {
            return false;
        }
        if from == to {
            return true;
        }
        let mut rec = self.groups.remove(from);
        rec.related = None;
        self.groups.insert(to, rec);
        self.renumber_related();
        true
    }

    /// Replaces the keywords of a plain or named group. A plain group needs at
    /// least one keyword; a named group may be left with just its name.
    pub fn set_keywords(&mut self, index: usize, new_keywords: Vec<String>) -> bool {
        if !new_keywords.iter().all(|k| is_keyword(k)) {
            return false;
        }
        match self.groups.get_mut(index).map(|g| &mut g.kind) {
            Some(GroupKind::Plain { keywords }) if !new_keywords.is_empty() => {
                *keywords = new_keywords;
                true
            }
            Some(GroupKind::GroupAlias { keywords, .. }) => {
                *keywords = new_keywords;
                true
            }
            _ => false,
        }
    }

    /// Renames a named group; a plain group becomes a named one.
    pub fn rename_group(&mut self, index: usize, new_name: impl Into<String>) -> bool {
        let Some(rec) = self.groups.get_mut(index) else {
            return false;
        };
        let new_name = new_name.into();
        if !is_group_name(&new_name) {
            return false;
        }
        match &mut rec.kind {
            GroupKind::GroupAlias { name, .. } => {
                *name = new_name;
                true
            }
            GroupKind::Plain { keywords } => {
                rec.kind = GroupKind::GroupAlias {
                    name: new_name,
                    keywords: std::mem::take(keywords),
                };
                true
            }
            _ => false,
        }
    }

    /// Appends an alias to an alias record, promoting a single alias to a
    /// cluster.
    pub fn add_alias_item(&mut self, index: usize, item: AliasItem) -> bool {
        if !is_alias(&item) {
            return false;
        }
        let Some(rec) = self.groups.get_mut(index) else {
            return false;
        };
        match &mut rec.kind {
            GroupKind::SingleAlias(existing) => {
                let first = existing.clone();
                rec.kind = GroupKind::AliasCluster(vec![first, item]);
                true
            }
            GroupKind::AliasCluster(items) => {
                items.push(item);
                true
            }
            _ => false,
        }
    }

    /// Removes one alias. A cluster left with one item is demoted to a single
    /// alias; removing the only item of a single alias removes the record.
    pub fn remove_alias_item(&mut self, index: usize, item: usize) -> bool {
        match self.groups.get(index).map(|g| &g.kind) {
            Some(GroupKind::SingleAlias(_)) if item == 0 => return self.remove_group(index),
            Some(GroupKind::AliasCluster(items)) if item < items.len() => {}
            _ => return false,
        }
        let kind = &mut self.groups[index].kind;
        if let GroupKind::AliasCluster(items) = kind {
            items.remove(item);
            if items.len() == 1 {
                *kind = GroupKind::SingleAlias(items.remove(0));
            }
        }
        true
    }

    /// Recomputes related-run positions after records were added, dropped or
    /// moved. Runs that shrink to one record stop being related.
    fn renumber_related(&mut self) {
        let mut start = 0;
        while start < self.groups.len() {
            let Some(cluster) = self.groups[start].related.map(|r| r.cluster) else {
                start += 1;
                continue;
            };
            let len = self.groups[start..]
                .iter()
                .take_while(|g| g.related.is_some_and(|r| r.cluster == cluster))
                .count();
            for (i, rec) in self.groups[start..start + len].iter_mut().enumerate() {
                rec.related = (len > 1).then_some(Related {
                    cluster,
                    index: i + 1,
                    total: len,
                });
            }
            start += len;
        }
    }
}
