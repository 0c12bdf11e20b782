//! # YAML Line-Patcher
//!
//! Rewrites single fields and whole list regions of a YAML document without
//! parsing it into a tree, so comments, blank lines and quoting outside the
//! touched lines survive byte for byte.
//!
//! Location works on indentation and key tokens only:
//!
//! 1. A **module** is a zero-indent `key:` line plus every line up to the next
//!    zero-indent key.
//! 2. A dotted **path** is walked segment by segment inside the module; each
//!    segment must be a direct child of the previous one.
//! 3. A **region** is the block of items or entries under the located key.
//!
//! Every operation has a plain form that returns the input unchanged on a miss
//! and a `try_*` form that reports the [`PatchMiss`]. The `*_edits` forms
//! return the byte splices instead of the new text.
//!
//! Reading values for display goes through [`values`], a thin wrapper over
//! `serde_yaml`; it never writes.

pub mod patch;
pub mod scalar;
pub mod scan;
pub mod values;

pub use patch::{
    ListItem, PatchMiss, list_region_edits, ordered_enum_edits, replace_list_region,
    replace_ordered_enum_region, scalar_field_edit, set_scalar_field, try_replace_list_region,
    try_replace_ordered_enum_region, try_set_scalar_field,
};
pub use scalar::{Quote, ScalarValue};
pub use values::{YamlError, parse_yaml};
