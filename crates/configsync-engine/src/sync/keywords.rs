use std::time::{Duration, Instant};

use crate::io::{BufferKind, StateStore};
use crate::keywords::{AliasItem, GroupKind, KeywordList, parse, serialize};
use crate::remote::{Fetch, FetchError};
use crate::text::Span;

use super::{Debouncer, LoadReport, LoadSource, Patch, Render, TextBuffer, ViewSlot, flush_buffer};

/// A form-control change on the keyword side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeywordEdit {
    SetGlobalFilter(Vec<String>),
    InsertGroup { index: usize, kind: GroupKind },
    RemoveGroup(usize),
    MoveGroup { from: usize, to: usize },
    SetKeywords { index: usize, keywords: Vec<String> },
    RenameGroup { index: usize, name: String },
    AddAliasItem { index: usize, item: AliasItem },
    RemoveAliasItem { index: usize, item: usize },
}

impl KeywordEdit {
    /// Applies the edit to `list`; `false` when it did not apply.
    pub fn apply_to(&self, list: &mut KeywordList) -> bool {
        match self.clone() {
            Self::SetGlobalFilter(words) => {
                list.set_global_filter(words);
                true
            }
            Self::InsertGroup { index, kind } => list.insert_group(index, kind).is_some(),
            Self::RemoveGroup(index) => list.remove_group(index),
            Self::MoveGroup { from, to } => list.move_group(from, to),
            Self::SetKeywords { index, keywords } => list.set_keywords(index, keywords),
            Self::RenameGroup { index, name } => list.rename_group(index, name),
            Self::AddAliasItem { index, item } => list.add_alias_item(index, item),
            Self::RemoveAliasItem { index, item } => list.remove_alias_item(index, item),
        }
    }
}

/// Coordinator for the keyword-list buffer.
///
/// Edits go text → list → edited list → serialized text, and the new text is
/// spliced into the buffer as one minimal change.
pub struct KeywordSession<R> {
    buffer: TextBuffer,
    view: ViewSlot<KeywordList>,
    debounce: Debouncer,
    renderer: R,
}

impl<R: Render<KeywordList>> KeywordSession<R> {
    pub fn new(text: &str, renderer: R) -> Self {
        Self {
            buffer: TextBuffer::new(text),
            view: ViewSlot::default(),
            debounce: Debouncer::default(),
            renderer,
        }
    }

    pub fn with_debounce(mut self, quiet: Duration) -> Self {
        self.debounce = Debouncer::new(quiet);
        self
    }

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    pub fn text(&self) -> String {
        self.buffer.text()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn save_pending(&self) -> bool {
        self.debounce.is_pending()
    }

    pub fn view(&mut self) -> &KeywordList {
        let buffer = &self.buffer;
        self.view
            .get_or_build(buffer.version(), || parse(&buffer.text()))
    }

    /// Byte span of the first content line of group `index`.
    pub fn group_span(&mut self, index: usize) -> Option<Span> {
        let line = self.view().groups.get(index)?.start_line;
        self.buffer.line_span(line)
    }

    fn refresh(&mut self) {
        let Self {
            buffer,
            view,
            renderer,
            ..
        } = self;
        let view = view.get_or_build(buffer.version(), || parse(&buffer.text()));
        renderer.render(view);
    }

    pub fn on_user_edit(&mut self, edit: &KeywordEdit, now: Instant) -> Patch {
        let old = self.buffer.text();
        let mut list = self.view().clone();

        let patch = if edit.apply_to(&mut list) {
            self.buffer.set_text(&serialize(&list, Some(&old)))
        } else {
            log::debug!("keyword edit out of range: {edit:?}");
            Patch {
                changed: Vec::new(),
                version: self.buffer.version(),
            }
        };
        if !patch.is_noop() {
            self.debounce.touch(now);
        }
        self.refresh();
        patch
    }

    /// Replaces the whole text. Keyword lists always load; the report never
    /// carries an error.
    pub fn on_external_load(&mut self, text: &str, source: LoadSource, now: Instant) -> LoadReport {
        log::info!("keywords loaded from {source:?} ({} bytes)", text.len());
        let patch = self.buffer.replace_all(text);
        if source == LoadSource::Storage {
            self.buffer.mark_saved();
            self.debounce.clear();
        } else {
            self.debounce.touch(now);
        }
        self.refresh();

        LoadReport {
            source,
            patch,
            error: None,
        }
    }

    pub fn load_remote(
        &mut self,
        fetcher: &impl Fetch,
        url: &str,
        now: Instant,
    ) -> Result<LoadReport, FetchError> {
        let text = fetcher.fetch(url).inspect_err(|e| log::warn!("{e}"))?;
        Ok(self.on_external_load(&text, LoadSource::Remote, now))
    }

    pub fn flush_if_due(&mut self, now: Instant, store: &StateStore) -> bool {
        self.debounce.due(now) && self.flush(store)
    }

    pub fn flush(&mut self, store: &StateStore) -> bool {
        flush_buffer(&mut self.buffer, &mut self.debounce, store, BufferKind::Keywords)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::NoRender;
    use pretty_assertions::assert_eq;

    const WORDS: &str = "\
# Version: 1.0.0

[GLOBAL_FILTER]
ads

[WORD_GROUPS]

huawei => Huawei
honor => Honor

[Chips]
nvidia
amd

";

    #[test]
    fn removing_alias_item_rewrites_only_that_line() {
        let mut session = KeywordSession::new(WORDS, NoRender);
        let patch = session.on_user_edit(
            &KeywordEdit::RemoveAliasItem { index: 0, item: 1 },
            Instant::now(),
        );
        assert!(!patch.is_noop());
        assert_eq!(session.text(), WORDS.replace("honor => Honor\n", ""));
        assert_eq!(
            session.view().groups[0].kind,
            GroupKind::SingleAlias(AliasItem::new("huawei", "Huawei"))
        );
    }

    #[test]
    fn out_of_range_edit_keeps_text_and_version() {
        let mut session = KeywordSession::new(WORDS, NoRender);
        let patch = session.on_user_edit(&KeywordEdit::RemoveGroup(9), Instant::now());
        assert!(patch.is_noop());
        assert_eq!(session.buffer().version(), 0);
        assert!(!session.save_pending());
    }

    #[test]
    fn every_mutation_renders() {
        let mut counts = Vec::new();
        let mut session =
            KeywordSession::new(WORDS, |list: &KeywordList| counts.push(list.groups.len()));
        let now = Instant::now();
        session.on_user_edit(&KeywordEdit::RemoveGroup(1), now);
        session.on_external_load(WORDS, LoadSource::Template, now);
        drop(session);
        assert_eq!(counts, vec![1, 2]);
    }

    #[test]
    fn group_span_points_at_start_line() {
        let mut session = KeywordSession::new(WORDS, NoRender);
        let span = session.group_span(1).unwrap();
        assert_eq!(&WORDS[span.range()], "[Chips]\n");
        assert_eq!(session.group_span(7), None);
    }
}
