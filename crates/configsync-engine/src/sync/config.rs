use std::ops::Range;
use std::time::{Duration, Instant};

use serde_yaml::Value;

use crate::io::{BufferKind, StateStore};
use crate::remote::{Fetch, FetchError};
use crate::text::TextEdit;
use crate::yaml::{
    ListItem, PatchMiss, ScalarValue, list_region_edits, ordered_enum_edits, parse_yaml,
    scalar_field_edit, scan, values,
};

use super::{Debouncer, LoadReport, LoadSource, Patch, Render, TextBuffer, ViewSlot, flush_buffer};

/// A top-level key as seen in the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSummary {
    pub key: String,
    /// Line span, `[key line, next top-level key)`.
    pub lines: Range<usize>,
    /// The module's `enabled` flag when it has one.
    pub enabled: Option<bool>,
}

/// Everything the config UI shows, derived from one buffer version.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigView {
    pub modules: Vec<ModuleSummary>,
    /// Parsed document; `None` when the text is not valid YAML.
    pub value: Option<Value>,
    pub error: Option<String>,
}

impl ConfigView {
    pub fn build(text: &str) -> Self {
        let (value, error) = match parse_yaml(text) {
            Ok(value) => (Some(value), None),
            Err(e) => (None, Some(e.to_string())),
        };
        let lines = scan::scan(text);
        let modules = scan::modules(&lines)
            .into_iter()
            .map(|(key, span)| ModuleSummary {
                enabled: value
                    .as_ref()
                    .and_then(|v| values::lookup(v, key, "enabled"))
                    .and_then(Value::as_bool),
                key: key.to_string(),
                lines: span,
            })
            .collect();
        Self {
            modules,
            value,
            error,
        }
    }

    pub fn module(&self, key: &str) -> Option<&ModuleSummary> {
        self.modules.iter().find(|m| m.key == key)
    }

    pub fn field(&self, module: &str, dotted: &str) -> Option<ScalarValue> {
        values::lookup(self.value.as_ref()?, module, dotted).and_then(ScalarValue::from_yaml)
    }

    pub fn list(&self, module: &str, dotted: &str) -> Vec<ListItem> {
        self.value
            .as_ref()
            .map(|v| values::list_items(v, module, dotted))
            .unwrap_or_default()
    }

    pub fn ordered_enum(
        &self,
        module: &str,
        order_path: &str,
        map_path: &str,
    ) -> Vec<(String, bool)> {
        self.value
            .as_ref()
            .map(|v| values::ordered_enum(v, module, order_path, map_path))
            .unwrap_or_default()
    }
}

/// A form-control change on the config side.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigEdit {
    SetField {
        module: String,
        path: String,
        value: ScalarValue,
    },
    ReplaceList {
        module: String,
        path: String,
        items: Vec<ListItem>,
    },
    ReorderRegions {
        module: String,
        order_path: String,
        map_path: String,
        entries: Vec<(String, bool)>,
    },
}

impl ConfigEdit {
    pub fn set(module: &str, path: &str, value: impl Into<ScalarValue>) -> Self {
        Self::SetField {
            module: module.to_string(),
            path: path.to_string(),
            value: value.into(),
        }
    }

    fn edits(&self, text: &str) -> Result<Vec<TextEdit>, PatchMiss> {
        match self {
            Self::SetField {
                module,
                path,
                value,
            } => Ok(vec![scalar_field_edit(text, module, path, value)?]),
            Self::ReplaceList {
                module,
                path,
                items,
            } => list_region_edits(text, module, path, items, ListItem::render),
            Self::ReorderRegions {
                module,
                order_path,
                map_path,
                entries,
            } => ordered_enum_edits(text, module, order_path, map_path, entries),
        }
    }
}

/// Coordinator for the YAML config buffer.
pub struct ConfigSession<R> {
    buffer: TextBuffer,
    view: ViewSlot<ConfigView>,
    debounce: Debouncer,
    renderer: R,
}

impl<R: Render<ConfigView>> ConfigSession<R> {
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

    pub fn view(&mut self) -> &ConfigView {
        let buffer = &self.buffer;
        self.view
            .get_or_build(buffer.version(), || ConfigView::build(&buffer.text()))
    }

    fn refresh(&mut self) {
        let Self {
            buffer,
            view,
            renderer,
            ..
        } = self;
        let view = view.get_or_build(buffer.version(), || ConfigView::build(&buffer.text()));
        renderer.render(view);
    }

    /// Applies one form change to the text. A field or region that is not in
    /// the text is a no-op.
    pub fn on_user_edit(&mut self, edit: &ConfigEdit, now: Instant) -> Patch {
        let edits = edit.edits(&self.buffer.text()).unwrap_or_else(|miss| {
            log::debug!("config edit skipped: {miss}");
            Vec::new()
        });
        let patch = self.buffer.apply(&edits);
        if !patch.is_noop() {
            self.debounce.touch(now);
        }
        self.refresh();
        patch
    }

    /// Replaces the whole text. Invalid YAML is still loaded and reported.
    pub fn on_external_load(&mut self, text: &str, source: LoadSource, now: Instant) -> LoadReport {
        let error = parse_yaml(text).err();
        match &error {
            Some(e) => log::warn!("config loaded from {source:?} does not parse: {e}"),
            None => log::info!("config loaded from {source:?} ({} bytes)", text.len()),
        }

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
            error,
        }
    }

    /// Fetches `url` and loads it. On failure the buffer is left alone.
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
        flush_buffer(&mut self.buffer, &mut self.debounce, store, BufferKind::Config)
    }
}
