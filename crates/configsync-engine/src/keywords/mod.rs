//! # Keyword Lists
//!
//! Parser and serializer for the keyword-list format:
//!
//! ```text
//! # header comments
//! [GLOBAL_FILTER]
//! advertisement
//!
//! [WORD_GROUPS]
//! [AI]
//! ChatGPT
//! +model
//!
//! huawei => Huawei
//! xiaomi => Xiaomi
//! ```
//!
//! ## Parsing Phases
//!
//! 1. **Line Classification** (`classify`): each line is classified on its
//!    own into a `LineClass` (sentinel, comment, group name, alias, keyword).
//! 2. **Record Construction** (`builder`): a `GroupBuilder` walks the classes
//!    once, opening and closing records and tagging related runs.
//!
//! The regex-driven classification stays behind [`parse`]; callers never see
//! it.
//!
//! ## Key Invariants
//!
//! - `parse` never fails; unknown shapes become plain keywords.
//! - Keyword sigils are kept verbatim.
//! - `serialize(&parse(t), Some(t)) == t` for any `t` produced by `serialize`.
//! - Related-run annotations and `start_line` are derived per parse.

pub mod builder;
pub mod classify;
pub mod edit;
pub mod serialize;
pub mod types;


pub use builder::GroupBuilder;
pub use classify::{GLOBAL_FILTER, KeywordLineClassifier, LineClass, Section, WORD_GROUPS};
pub use serialize::{TEMPLATE_BANNER, serialize};
pub use types::{AliasItem, GroupKind, GroupRecord, KeywordClass, KeywordList, Related};

use crate::text::lines;

pub fn parse(text: &str) -> KeywordList {
    let classifier = KeywordLineClassifier;
    let mut builder = GroupBuilder::new();

    for line in lines(text) {
        let class = classifier.classify(&line);
        builder.push(&line, &class);
    }

    builder.finish()
}
