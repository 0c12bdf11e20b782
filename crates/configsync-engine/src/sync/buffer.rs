use std::ops::Range;

use xi_rope::{DeltaBuilder, Rope};

use crate::text::{RopeLine, Span, TextEdit, lines_with_spans};

/// Result of applying edits to a [`TextBuffer`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Patch {
    /// Byte ranges of inserted text, in post-edit coordinates.
    pub changed: Vec<Range<usize>>,
    pub version: u64,
}

impl Patch {
    pub fn is_noop(&self) -> bool {
        self.changed.is_empty()
    }
}

/// The authoritative text of one document.
///
/// Every structured view is derived from this buffer; it is never written
/// back from a view. `version` moves on every effective mutation so derived
/// views can be keyed on it.
#[derive(Debug, Clone)]
pub struct TextBuffer {
    rope: Rope,
    version: u64,
    saved_version: u64,
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new("")
    }
}

impl TextBuffer {
    pub fn new(text: &str) -> Self {
        Self {
            rope: Rope::from(text),
            version: 0,
            saved_version: 0,
        }
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    pub fn len(&self) -> usize {
        self.rope.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len() == 0
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Applies non-overlapping edits expressed against the current text.
    ///
    /// Identity edits are dropped; if nothing is left the version stays put.
    pub fn apply(&mut self, edits: &[TextEdit]) -> Patch {
        let mut ordered: Vec<&TextEdit> = edits
            .iter()
            .filter(|e| !(e.range.is_empty() && e.insert.is_empty()))
            .filter(|e| self.rope.slice_to_cow(e.range.clone()) != e.insert)
            .collect();
        if ordered.is_empty() {
            return Patch {
                changed: Vec::new(),
                version: self.version,
            };
        }
        ordered.sort_by_key(|e| e.range.start);

        let mut builder = DeltaBuilder::new(self.rope.len());
        let mut changed = Vec::with_capacity(ordered.len());
        let mut shift: isize = 0;
        for edit in ordered {
            builder.replace(edit.range.clone(), Rope::from(edit.insert.as_str()));
            let start = edit.range.start.saturating_add_signed(shift);
            changed.push(start..start + edit.insert.len());
            shift += edit.insert.len() as isize - edit.range.len() as isize;
        }
        let delta = builder.build();
        self.rope = delta.apply(&self.rope);
        self.version += 1;

        Patch {
            changed,
            version: self.version,
        }
    }

    /// Swaps in `text`, recording the change as one minimal splice.
    pub fn set_text(&mut self, text: &str) -> Patch {
        let old = self.text();
        match TextEdit::diff(&old, text) {
            Some(edit) => self.apply(&[edit]),
            None => Patch {
                changed: Vec::new(),
                version: self.version,
            },
        }
    }

    /// Replaces the whole text and bumps the version even when it is equal,
    /// so a reload always refreshes derived views.
    pub fn replace_all(&mut self, text: &str) -> Patch {
        self.rope = Rope::from(text);
        self.version += 1;
        Patch {
            changed: vec![0..text.len()],
            version: self.version,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.version != self.saved_version
    }

    pub fn mark_saved(&mut self) {
        self.saved_version = self.version;
    }

    pub fn lines(&self) -> impl Iterator<Item = RopeLine> + '_ {
        lines_with_spans(&self.rope)
    }

    /// Byte span of line `index`, terminator included.
    pub fn line_span(&self, index: usize) -> Option<Span> {
        self.lines().nth(index).map(|l| l.span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn apply_reports_ranges_in_new_coordinates() {
        let mut buf = TextBuffer::new("a: 1\nb: 2\n");
        let patch = buf.apply(&[
            TextEdit::replace(3..4, "100"),
            TextEdit::replace(8..9, "20"),
        ]);
        assert_eq!(buf.text(), "a: 100\nb: 20\n");
        assert_eq!(patch.changed, vec![3..6, 10..12]);
        assert_eq!(patch.version, 1);
        assert!(buf.is_dirty());
    }

    #[test]
    fn identity_edits_keep_the_version() {
        let mut buf = TextBuffer::new("same\n");
        let patch = buf.apply(&[TextEdit::replace(0..4, "same")]);
        assert!(patch.is_noop());
        assert_eq!(buf.version(), 0);
        assert!(buf.set_text("same\n").is_noop());
    }

    #[test]
    fn set_text_splices_only_the_difference() {
        let mut buf = TextBuffer::new("enabled: true\n");
        let patch = buf.set_text("enabled: false\n");
        assert_eq!(patch.changed, vec![9..13]);
        assert_eq!(buf.text(), "enabled: false\n");
    }

    #[test]
    fn saving_clears_dirty_state() {
        let mut buf = TextBuffer::new("x");
        buf.replace_all("x");
        assert!(buf.is_dirty());
        buf.mark_saved();
        assert!(!buf.is_dirty());
    }

    #[test]
    fn line_span_covers_terminator() {
        let buf = TextBuffer::new("one\ntwo\n");
        assert_eq!(buf.line_span(1), Some(Span::new(4, 8)));
        assert_eq!(buf.line_span(5), None);
    }
}
