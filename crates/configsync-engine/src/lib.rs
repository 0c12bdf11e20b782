pub mod io;
pub mod keywords;
pub mod remote;
pub mod sync;
pub mod text;
pub mod versions;
pub mod yaml;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use io::{BufferKind, IoError, SavedState, StateStore};
pub use keywords::{GroupKind, GroupRecord, KeywordList, parse, serialize};
pub use remote::{Fetch, FetchError, HttpFetcher};
pub use sync::{
    ConfigEdit, ConfigSession, ConfigView, KeywordEdit, KeywordSession, LoadReport, LoadSource,
    Patch, Render, TextBuffer,
};
pub use text::TextEdit;
pub use versions::{Version, VersionManifest, VersionReport, VersionStatus, check_buffers};
pub use yaml::{ListItem, PatchMiss, ScalarValue, YamlError};
