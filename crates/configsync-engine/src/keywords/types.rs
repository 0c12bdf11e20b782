use serde::Serialize;

/// Display class of a keyword, taken from its leading sigil.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum KeywordClass {
    /// `+word`: the title must contain this word.
    MustInclude,
    /// `!word`: titles containing this word are excluded.
    Exclude,
    /// `@N`: caps how many matches the group shows.
    Restrict,
    /// `/pattern/`: regular expression match.
    Regex,
    Normal,
}

impl KeywordClass {
    /// Classifies a raw keyword. The keyword itself is never modified.
    pub fn of(keyword: &str) -> Self {
        match keyword.chars().next() {
            Some('+') => Self::MustInclude,
            Some('!') => Self::Exclude,
            Some('@') => Self::Restrict,
            Some('/') => Self::Regex,
            _ => Self::Normal,
        }
    }
}

/// One `pattern => alias` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AliasItem {
    pub pattern: String,
    pub alias: String,
}

impl AliasItem {
    pub fn new(pattern: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            alias: alias.into(),
        }
    }
}

/// The four record shapes of the `[WORD_GROUPS]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum GroupKind {
    /// Keywords one per line.
    Plain { keywords: Vec<String> },
    /// `[Name]` followed by its keywords.
    GroupAlias { name: String, keywords: Vec<String> },
    /// A lone `pattern => alias` line.
    SingleAlias(AliasItem),
    /// Two or more adjacent `pattern => alias` lines.
    AliasCluster(Vec<AliasItem>),
}

/// Position of a record inside a run of records with no blank line between
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Related {
    /// Identifies the run; adjacent runs never share an id.
    pub cluster: usize,
    /// 1-based position inside the run.
    pub index: usize,
    pub total: usize,
}

impl Related {
    /// True unless this is the last record of its run.
    pub fn continues(&self) -> bool {
        self.index < self.total
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupRecord {
    pub kind: GroupKind,
    /// 0-based source line of the first content line. Only valid for the text
    /// it was parsed from.
    pub start_line: usize,
    /// Comment lines above the record, verbatim. Empty strings stand for blank
    /// lines and encode spacing for re-serialization.
    pub preceding_comments: Vec<String>,
    /// Derived on every parse; never authoritative.
    pub related: Option<Related>,
}

impl GroupRecord {
    pub fn new(kind: GroupKind) -> Self {
        Self {
            kind,
            start_line: 0,
            preceding_comments: Vec::new(),
            related: None,
        }
    }

    pub fn is_related_group(&self) -> bool {
        self.related.is_some()
    }

    /// Number of source lines the record's content occupies.
    pub fn line_count(&self) -> usize {
        match &self.kind {
            GroupKind::Plain { keywords } => keywords.len(),
            GroupKind::GroupAlias { keywords, .. } => keywords.len() + 1,
            GroupKind::SingleAlias(_) => 1,
            GroupKind::AliasCluster(items) => items.len(),
        }
    }

    /// Short human-readable label used by list views.
    pub fn summary(&self) -> String {
        match &self.kind {
            GroupKind::Plain { keywords } => keywords.join(" "),
            GroupKind::GroupAlias { name, keywords } => {
                format!("[{name}] {}", keywords.join(" "))
            }
            GroupKind::SingleAlias(item) => format!("{} => {}", item.pattern, item.alias),
            GroupKind::AliasCluster(items) => items
                .iter()
                .map(|i| format!("{} => {}", i.pattern, i.alias))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// A parsed keyword-list document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KeywordList {
    pub global_filter: Vec<String>,
    pub groups: Vec<GroupRecord>,
    /// Comments after the last record that no record claimed.
    pub trailing_comments: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("+AI", KeywordClass::MustInclude)]
    #[case("!ads", KeywordClass::Exclude)]
    #[case("@5", KeywordClass::Restrict)]
    #[case("/gpt-\\d/", KeywordClass::Regex)]
    #[case("plain", KeywordClass::Normal)]
    #[case("", KeywordClass::Normal)]
    fn classifies_by_sigil(#[case] keyword: &str, #[case] expected: KeywordClass) {
        assert_eq!(KeywordClass::of(keyword), expected);
    }

    #[test]
    fn line_count_includes_group_name() {
        let rec = GroupRecord::new(GroupKind::GroupAlias {
            name: "AI".into(),
            keywords: vec!["GPT".into(), "LLM".into()],
        });
        assert_eq!(rec.line_count(), 3);
        assert_eq!(rec.summary(), "[AI] GPT LLM");
    }

    #[test]
    fn last_in_run_does_not_continue() {
        let r = Related {
            cluster: 0,
            index: 2,
            total: 2,
        };
        assert!(!r.continues());
    }
}
