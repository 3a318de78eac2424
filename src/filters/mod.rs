// src/filters/mod.rs
// =============================================================================
// File list filtering and grouping.
//
// Submodules:
// - pattern: include/exclude filters by regular expression
// - group: directory grouping and the built-in filter presets
// =============================================================================

mod group;
mod pattern;

pub use group::{
    directory_of, file_name, find_preset, group_by_directory, FilterPreset, FILTER_PRESETS,
    ROOT_GROUP,
};
pub use pattern::{
    apply_exclude_filter, apply_filters, apply_include_filter, validate_pattern, FilterOptions,
    FilterResult,
};
