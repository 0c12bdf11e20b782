/*!
 * # Sync Coordinators
 *
 * One coordinator per document drives the loop
 *
 * ```text
 * user edit ──► patcher / serializer ──► TextBuffer ──► view ──► Render
 *                      ▲                                  │
 *                      └────────── current text ◄─────────┘
 * ```
 *
 * - The [`TextBuffer`] is the only source of truth. Views are re-derived
 *   from its text, never written back.
 * - A coordinator keeps one derived view, keyed by buffer version, so a
 *   handler that reads the view several times parses once.
 * - Every call that may change the text ends by rendering the fresh view.
 * - Saving is debounced per buffer; a failed save is logged, the edit
 *   stays in memory and the save is retried after another quiet period.
 */

pub mod buffer;
pub mod config;
pub mod debounce;
pub mod keywords;

pub use buffer::{Patch, TextBuffer};
pub use config::{ConfigEdit, ConfigSession, ConfigView, ModuleSummary};
pub use debounce::{DEFAULT_QUIET, Debouncer};
pub use keywords::{KeywordEdit, KeywordSession};

use std::time::Instant;

use chrono::Utc;

use crate::io::{BufferKind, StateStore};
use crate::yaml::YamlError;

/// The UI side of a coordinator: receives every freshly derived view.
pub trait Render<V> {
    fn render(&mut self, view: &V);
}

impl<V, F> Render<V> for F
where
    F: FnMut(&V),
{
    fn render(&mut self, view: &V) {
        self(view)
    }
}

/// A renderer for headless use.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRender;

impl<V> Render<V> for NoRender {
    fn render(&mut self, _view: &V) {}
}

/// Where externally loaded text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// The store; the buffer starts out clean.
    Storage,
    /// A dropped file.
    Drop,
    Remote,
    Template,
}

/// Outcome of loading a whole text into a buffer. The text is stored even
/// when `error` is set, so it can be fixed in place.
#[derive(Debug)]
pub struct LoadReport {
    pub source: LoadSource,
    pub patch: Patch,
    pub error: Option<YamlError>,
}

impl LoadReport {
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }
}

/// Single-slot cache of a view derived from one buffer version.
#[derive(Debug)]
pub(crate) struct ViewSlot<V> {
    slot: Option<(u64, V)>,
    builds: u64,
}

impl<V> Default for ViewSlot<V> {
    fn default() -> Self {
        Self {
            slot: None,
            builds: 0,
        }
    }
}

impl<V> ViewSlot<V> {
    pub(crate) fn get_or_build(&mut self, version: u64, build: impl FnOnce() -> V) -> &V {
        if self.slot.as_ref().is_some_and(|(v, _)| *v != version) {
            self.slot = None;
        }
        let (_, view) = self.slot.get_or_insert_with(|| {
            log::debug!("deriving view for version {version}");
            self.builds += 1;
            (version, build())
        });
        view
    }

    #[cfg(test)]
    pub(crate) fn builds(&self) -> u64 {
        self.builds
    }
}

/// Writes `buffer` to `store` if it has unsaved changes. A failed write
/// re-arms `debounce` so the save is tried again after another quiet period.
pub(crate) fn flush_buffer(
    buffer: &mut TextBuffer,
    debounce: &mut Debouncer,
    store: &StateStore,
    kind: BufferKind,
) -> bool {
    if !buffer.is_dirty() {
        debounce.clear();
        return false;
    }
    match store.save(kind, &buffer.text(), Utc::now()) {
        Ok(()) => {
            debounce.clear();
            buffer.mark_saved();
            true
        }
        Err(e) => {
            log::warn!("could not save {}: {e}", kind.file_name());
            debounce.touch(Instant::now());
            false
        }
    }
}
