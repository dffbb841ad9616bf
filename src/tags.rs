//! Marker tags and their per-file allocation
//!
//! A tag is a short run of ASCII letters embedded in an inserted comment:
//! `/*N*/` for a simple marker, `/*S3*/` for a counted marker carrying a
//! run length. Tags are letters only, so the payload digits always delimit
//! the tag and a marker can never be read as part of a number.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Alphabet tags are drawn from
pub const TAG_CHARS: &[u8; 52] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Whether a tag carries a decimal payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Simple,
    Counted,
}

/// Whitespace category a tag stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    NewLine,
    Spaces,
    SpacesBeforeColon,
    SameLineElse,
}

impl Category {
    pub fn kind(self) -> TagKind {
        match self {
            Category::NewLine => TagKind::Simple,
            _ => TagKind::Counted,
        }
    }

    /// Candidates tried before falling back to the generator
    pub fn preferred(self) -> &'static [&'static str] {
        match self {
            Category::NewLine => &["N", "n"],
            Category::Spaces => &["S", "s"],
            Category::SpacesBeforeColon => &["C", "c"],
            Category::SameLineElse => &["E", "e"],
        }
    }
}

/// Tags assigned to the four categories of one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSet {
    #[serde(rename = "NEW_LINE_TAG")]
    pub new_line: String,
    #[serde(rename = "SPACES_TAG")]
    pub spaces: String,
    #[serde(rename = "SPACES_BEFORE_COLON_TAG")]
    pub spaces_before_colon: String,
    #[serde(rename = "SAME_LINE_ELSE_TAG")]
    pub same_line_else: String,
}

/// `/*TAG*/`
pub fn simple_marker(tag: &str) -> String {
    format!("/*{tag}*/")
}

/// `/*TAG<count>*/`
pub fn counted_marker(tag: &str, count: usize) -> String {
    format!("/*{tag}{count}*/")
}

/// A counted marker found in text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountedMatch {
    /// Byte offset of the opening `/*`
    pub start: usize,
    /// Byte offset just past the closing `*/`
    pub end: usize,
    pub count: usize,
}

/// Find the first `/*TAG<digits>*/` at or after `from`
pub fn find_counted(text: &str, tag: &str, from: usize) -> Option<CountedMatch> {
    let open = format!("/*{tag}");
    let mut search = from;

    while let Some(offset) = text[search..].find(&open) {
        let start = search + offset;
        let digits_start = start + open.len();
        let digits_len = text[digits_start..]
            .bytes()
            .take_while(u8::is_ascii_digit)
            .count();
        let digits_end = digits_start + digits_len;

        if digits_len > 0 && text[digits_end..].starts_with("*/") {
            // Absurd payloads that overflow are not ours; skip them.
            if let Ok(count) = text[digits_start..digits_end].parse() {
                return Some(CountedMatch {
                    start,
                    end: digits_end + 2,
                    count,
                });
            }
        }
        search = start + 1;
    }
    None
}

pub fn is_simple_tag_present(text: &str, tag: &str) -> bool {
    text.contains(&simple_marker(tag))
}

pub fn is_counted_tag_present(text: &str, tag: &str) -> bool {
    find_counted(text, tag, 0).is_some()
}

/// Tag for a generator ordinal, in bijective base 52:
/// `A`..`z`, then `AA`, `AB`, ...
pub fn tag_for_ordinal(ordinal: usize) -> String {
    let mut chars = Vec::new();
    let mut n = ordinal + 1;
    while n > 0 {
        n -= 1;
        chars.push(TAG_CHARS[n % TAG_CHARS.len()]);
        n /= TAG_CHARS.len();
    }
    chars.reverse();
    chars.into_iter().map(char::from).collect()
}

/// Finds tags absent from one file's text.
///
/// Every candidate tried is remembered per tag kind, so no two categories of
/// the same file share a tag and no candidate is tested twice.
pub struct TagAllocator<'a> {
    text: &'a str,
    report_collisions: bool,
    tried_simple: HashSet<String>,
    tried_counted: HashSet<String>,
}

impl<'a> TagAllocator<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            report_collisions: false,
            tried_simple: HashSet::new(),
            tried_counted: HashSet::new(),
        }
    }

    /// Log every candidate that is already present in the text
    pub fn with_collision_reports(mut self, enabled: bool) -> Self {
        self.report_collisions = enabled;
        self
    }

    /// Allocate a tag for one category
    pub fn allocate(&mut self, category: Category) -> String {
        let kind = category.kind();

        for tag in category.preferred() {
            if self.try_candidate(kind, tag) {
                return tag.to_string();
            }
        }

        (0..)
            .map(tag_for_ordinal)
            .find(|tag| self.try_candidate(kind, tag))
            .unwrap_or_default()
    }

    /// Allocate all four categories in order
    pub fn allocate_all(&mut self) -> TagSet {
        let tags = TagSet {
            new_line: self.allocate(Category::NewLine),
            spaces: self.allocate(Category::Spaces),
            spaces_before_colon: self.allocate(Category::SpacesBeforeColon),
            same_line_else: self.allocate(Category::SameLineElse),
        };
        debug!(?tags, "allocated tags");
        tags
    }

    /// Record `tag` as tried; true when it was untried and is absent
    fn try_candidate(&mut self, kind: TagKind, tag: &str) -> bool {
        let tried = match kind {
            TagKind::Simple => &mut self.tried_simple,
            TagKind::Counted => &mut self.tried_counted,
        };
        if !tried.insert(tag.to_string()) {
            return false;
        }

        let present = match kind {
            TagKind::Simple => is_simple_tag_present(self.text, tag),
            TagKind::Counted => is_counted_tag_present(self.text, tag),
        };
        if present && self.report_collisions {
            debug!(tag, "tag already present");
        }
        !present
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_for_ordinal() {
        assert_eq!(tag_for_ordinal(0), "A");
        assert_eq!(tag_for_ordinal(25), "Z");
        assert_eq!(tag_for_ordinal(26), "a");
        assert_eq!(tag_for_ordinal(51), "z");
        assert_eq!(tag_for_ordinal(52), "AA");
        assert_eq!(tag_for_ordinal(53), "AB");
        assert_eq!(tag_for_ordinal(52 + 52 * 52), "AAA");
    }

    #[test]
    fn test_presence_requires_marker_syntax() {
        let text = "N; /*N */ /* N*/ /*S*/ /*C12*/ /*E1x*/";
        assert!(!is_simple_tag_present(text, "N"));
        assert!(is_simple_tag_present(text, "S"));
        assert!(!is_counted_tag_present(text, "S"));
        assert!(is_counted_tag_present(text, "C"));
        assert!(!is_counted_tag_present(text, "E"));
    }

    #[test]
    fn test_counted_tag_is_not_prefix_of_longer_tag() {
        assert!(!is_counted_tag_present("/*SA3*/", "S"));
        assert!(is_counted_tag_present("/*SA3*/", "SA"));
    }

    #[test]
    fn test_find_counted_skips_partial_matches() {
        let text = "/*C*/ /*Cx1*/ /*C42*/";
        let found = find_counted(text, "C", 0).unwrap();
        assert_eq!(found.count, 42);
        assert_eq!(&text[found.start..found.end], "/*C42*/");
        assert!(find_counted(text, "C", found.end).is_none());
    }

    #[test]
    fn test_preferred_tags_when_text_is_clean() {
        let tags = TagAllocator::new("let x = 1;").allocate_all();
        assert_eq!(tags.new_line, "N");
        assert_eq!(tags.spaces, "S");
        assert_eq!(tags.spaces_before_colon, "C");
        assert_eq!(tags.same_line_else, "E");
    }

    #[test]
    fn test_collision_picks_alternative() {
        let tags = TagAllocator::new("a /*N*/ b /*S2*/").allocate_all();
        assert_eq!(tags.new_line, "n");
        assert_eq!(tags.spaces, "s");
    }

    #[test]
    fn test_fallback_generator_skips_tried_tags() {
        let text = "/*C1*/ /*c1*/ /*A1*/";
        let mut allocator = TagAllocator::new(text);
        assert_eq!(allocator.allocate(Category::SpacesBeforeColon), "B");

        // "C" was already tried as a preferred tag, so the generator skips it.
        let text = "/*E1*/ /*e1*/ /*A1*/ /*B1*/";
        let mut allocator = TagAllocator::new(text);
        assert_eq!(allocator.allocate(Category::SpacesBeforeColon), "C");
        assert_eq!(allocator.allocate(Category::SameLineElse), "D");
        assert_eq!(allocator.allocate(Category::Spaces), "S");
    }

    #[test]
    fn test_categories_never_share_a_tag() {
        let text = "/*S1*/ /*s1*/ /*C1*/ /*c1*/ /*E1*/ /*e1*/";
        let tags = TagAllocator::new(text).allocate_all();
        assert_eq!(
            (
                tags.spaces.as_str(),
                tags.spaces_before_colon.as_str(),
                tags.same_line_else.as_str()
            ),
            ("A", "B", "D")
        );
    }

    #[test]
    fn test_simple_and_counted_memos_are_separate() {
        let mut allocator = TagAllocator::new("/*N*/ /*n*/ /*S1*/ /*s1*/");
        assert_eq!(allocator.allocate(Category::NewLine), "A");
        assert_eq!(allocator.allocate(Category::Spaces), "A");
    }
}
