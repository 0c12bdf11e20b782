use std::ops::Range;

/// A single byte-range splice: replace `range` of the old text with `insert`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub range: Range<usize>,
    pub insert: String,
}

impl TextEdit {
    pub fn replace(range: Range<usize>, insert: impl Into<String>) -> Self {
        Self {
            range,
            insert: insert.into(),
        }
    }

    /// The smallest single edit turning `old` into `new`, or `None` if equal.
    ///
    /// Trims the common prefix and suffix; both cut points land on char
    /// boundaries.
    pub fn diff(old: &str, new: &str) -> Option<Self> {
        if old == new {
            return None;
        }
        let (ob, nb) = (old.as_bytes(), new.as_bytes());

        let mut prefix = ob.iter().zip(nb).take_while(|(a, b)| a == b).count();
        while !(old.is_char_boundary(prefix) && new.is_char_boundary(prefix)) {
            prefix -= 1;
        }

        let max_suffix = ob.len().min(nb.len()) - prefix;
        let mut suffix = ob
            .iter()
            .rev()
            .zip(nb.iter().rev())
            .take(max_suffix)
            .take_while(|(a, b)| a == b)
            .count();
        while !(old.is_char_boundary(ob.len() - suffix) && new.is_char_boundary(nb.len() - suffix))
        {
            suffix -= 1;
        }

        Some(Self::replace(
            prefix..ob.len() - suffix,
            &new[prefix..nb.len() - suffix],
        ))
    }

    pub fn apply(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len() + self.insert.len());
        out.push_str(&text[..self.range.start]);
        out.push_str(&self.insert);
        out.push_str(&text[self.range.end..]);
        out
    }
}

/// Applies non-overlapping edits, all expressed against the same `text`.
pub fn apply_all(text: &str, edits: &[TextEdit]) -> String {
    let mut ordered: Vec<&TextEdit> = edits.iter().collect();
    ordered.sort_by_key(|e| e.range.start);

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for edit in ordered {
        out.push_str(&text[cursor..edit.range.start]);
        out.push_str(&edit.insert);
        cursor = edit.range.end;
    }
    out.push_str(&text[cursor..]);
    out
}
