//! Codec options
//!
//! [`Options`] is the resolved set of six flags persisted in every encoded
//! file. [`PartialOptions`] is what callers hand in: any subset of the flags,
//! with unknown keys ignored, merged against the defaults at encode time.

use serde::{Deserialize, Serialize};

/// Resolved codec flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Options {
    /// Keep blank lines
    pub preserve_new_lines: bool,
    /// Keep runs of two or more spaces
    pub preserve_multiple_spaces: bool,
    /// Keep spaces in front of `:`
    pub preserve_spaces_before_colons: bool,
    /// On decode, drop the spacing of a colon the compiler removed
    pub collapse_spaces_before_removed_colons: bool,
    /// Keep `} else` on one line
    pub preserve_same_line_else: bool,
    /// Report tag collisions while allocating
    pub show_debug_output: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            preserve_new_lines: true,
            preserve_multiple_spaces: true,
            preserve_spaces_before_colons: true,
            collapse_spaces_before_removed_colons: true,
            preserve_same_line_else: true,
            show_debug_output: false,
        }
    }
}

impl Options {
    /// Resolve caller input against the defaults.
    ///
    /// An unspecified `preserveSpacesBeforeColons` follows
    /// `preserveMultipleSpaces` when that one is given.
    pub fn merge(partial: &PartialOptions) -> Self {
        let defaults = Self::default();
        Self {
            preserve_new_lines: partial
                .preserve_new_lines
                .unwrap_or(defaults.preserve_new_lines),
            preserve_multiple_spaces: partial
                .preserve_multiple_spaces
                .unwrap_or(defaults.preserve_multiple_spaces),
            preserve_spaces_before_colons: partial
                .preserve_spaces_before_colons
                .or(partial.preserve_multiple_spaces)
                .unwrap_or(defaults.preserve_spaces_before_colons),
            collapse_spaces_before_removed_colons: partial
                .collapse_spaces_before_removed_colons
                .unwrap_or(defaults.collapse_spaces_before_removed_colons),
            preserve_same_line_else: partial
                .preserve_same_line_else
                .unwrap_or(defaults.preserve_same_line_else),
            show_debug_output: partial
                .show_debug_output
                .unwrap_or(defaults.show_debug_output),
        }
    }

    /// True when at least one whitespace feature is active
    pub fn any_feature_enabled(&self) -> bool {
        self.preserve_new_lines
            || self.preserve_multiple_spaces
            || self.preserve_spaces_before_colons
            || self.preserve_same_line_else
    }
}

/// Caller-supplied options; absent fields fall back to defaults
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preserve_new_lines: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preserve_multiple_spaces: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preserve_spaces_before_colons: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collapse_spaces_before_removed_colons: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preserve_same_line_else: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_debug_output: Option<bool>,
}

impl PartialOptions {
    /// Parse caller options from JSON; unknown keys are dropped
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Fields set in `other` win over fields set in `self`
    pub fn overlay(self, other: PartialOptions) -> Self {
        Self {
            preserve_new_lines: other.preserve_new_lines.or(self.preserve_new_lines),
            preserve_multiple_spaces: other
                .preserve_multiple_spaces
                .or(self.preserve_multiple_spaces),
            preserve_spaces_before_colons: other
                .preserve_spaces_before_colons
                .or(self.preserve_spaces_before_colons),
            collapse_spaces_before_removed_colons: other
                .collapse_spaces_before_removed_colons
                .or(self.collapse_spaces_before_removed_colons),
            preserve_same_line_else: other
                .preserve_same_line_else
                .or(self.preserve_same_line_else),
            show_debug_output: other.show_debug_output.or(self.show_debug_output),
        }
    }
}

impl From<PartialOptions> for Options {
    fn from(partial: PartialOptions) -> Self {
        Options::merge(&partial)
    }
}
