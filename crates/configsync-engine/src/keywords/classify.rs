use std::sync::LazyLock;

use regex::Regex;

use crate::text::LineRef;

pub const GLOBAL_FILTER: &str = "[GLOBAL_FILTER]";
pub const WORD_GROUPS: &str = "[WORD_GROUPS]";

static GROUP_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\[(.+)\]$").unwrap());
static ALIAS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(.+?)\s*=>\s*(.+)$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    None,
    Global,
    Groups,
}

/// Local facts about one line, decided without looking at its neighbours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass<'a> {
    Blank,
    /// A `#` line; carries the line with trailing whitespace removed.
    Comment(&'a str),
    Sentinel(Section),
    /// `[Name]` opening a named group.
    GroupName(&'a str),
    /// `pattern => alias`.
    Alias { pattern: &'a str, alias: &'a str },
    Keyword(&'a str),
}

/// Classifies keyword-list lines in priority order: sentinel, comment,
/// bracketed name, alias, plain keyword.
pub struct KeywordLineClassifier;

impl KeywordLineClassifier {
    pub fn classify<'a>(&self, line: &LineRef<'a>) -> LineClass<'a> {
        let trimmed = line.text.trim();
        if trimmed.is_empty() {
            return LineClass::Blank;
        }
        if trimmed == GLOBAL_FILTER {
            return LineClass::Sentinel(Section::Global);
        }
        if trimmed == WORD_GROUPS {
            return LineClass::Sentinel(Section::Groups);
        }
        if trimmed.starts_with('#') {
            return LineClass::Comment(line.text.trim_end());
        }
        if let Some(caps) = GROUP_NAME.captures(trimmed)
            && let Some(name) = caps.get(1)
        {
            return LineClass::GroupName(name.as_str().trim());
        }
        if let Some(caps) = ALIAS.captures(trimmed)
            && let (Some(pattern), Some(alias)) = (caps.get(1), caps.get(2))
        {
            return LineClass::Alias {
                pattern: pattern.as_str(),
                alias: alias.as_str().trim(),
            };
        }
        LineClass::Keyword(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::lines;
    use rstest::rstest;

    fn classify(s: &str) -> LineClass<'_> {
        let line = lines(s).next().unwrap();
        KeywordLineClassifier.classify(&line)
    }

    #[rstest]
    #[case("  [GLOBAL_FILTER]  ", LineClass::Sentinel(Section::Global))]
    #[case("[WORD_GROUPS]", LineClass::Sentinel(Section::Groups))]
    #[case("   ", LineClass::Blank)]
    #[case("# note  ", LineClass::Comment("# note"))]
    #[case("[AI Models]", LineClass::GroupName("AI Models"))]
    #[case("/gpt-?\\d/ => GPT", LineClass::Alias { pattern: "/gpt-?\\d/", alias: "GPT" })]
    #[case("huawei=>Huawei", LineClass::Alias { pattern: "huawei", alias: "Huawei" })]
    #[case("+chip", LineClass::Keyword("+chip"))]
    #[case("=> orphan", LineClass::Keyword("=> orphan"))]
    fn classifies(#[case] input: &str, #[case] expected: LineClass<'_>) {
        assert_eq!(classify(input), expected);
    }
}
