//! Whitespace decoder
//!
//! Runs on compiler output. Options and tags come from the metadata block
//! only; nothing is re-derived from the caller. Inserted markers never occur
//! inside original strings or comments, so the whole text is processed
//! without re-tokenizing.

use crate::metadata::FileMetadata;
use crate::options::Options;
use crate::tags::{find_counted, simple_marker, CountedMatch, TagSet};
use tracing::debug;

/// Fatal, file-scoped decode failures
#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error("whitespace metadata block not found")]
    MissingMetadata,

    #[error("whitespace metadata block is malformed: {0}")]
    InvalidMetadata(#[from] serde_json::Error),
}

/// Decodes text produced by [`crate::Encoder`] (and then compiled)
pub struct Decoder {
    // Stateless: everything needed travels in the metadata block
}

impl Decoder {
    /// Create a new decoder
    pub fn new() -> Self {
        Self {}
    }

    /// Strip the metadata block and restore the recorded whitespace
    pub fn decode(&self, input: &str) -> Result<String, DecodeError> {
        let located = FileMetadata::locate(input)?;
        debug!(
            options = ?located.metadata.options,
            tags = ?located.metadata.tags,
            "found metadata block"
        );

        let contents = located.remove_from(input);
        Ok(restore(contents, &located.metadata.options, &located.metadata.tags))
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Reverse each enabled encoding, in a fixed order
fn restore(mut contents: String, options: &Options, tags: &TagSet) -> String {
    if options.preserve_new_lines {
        contents = contents.replace(&simple_marker(&tags.new_line), "");
    }

    if options.preserve_spaces_before_colons {
        let tag = &tags.spaces_before_colon;
        contents = rewrite_colon_markers(&contents, tag, |count, rest| {
            rest.starts_with(':').then(|| " ".repeat(count))
        });

        if options.collapse_spaces_before_removed_colons {
            contents = rewrite_colon_markers(&contents, tag, |_, rest| {
                matches!(
                    rest.bytes().next(),
                    Some(b',' | b';' | b')' | b'}' | b' ' | b'\t' | b'\r' | b'\n')
                )
                .then(String::new)
            });
            // Ambiguous context: keep a single space.
            contents = rewrite_colon_markers(&contents, tag, |_, _| Some(" ".to_string()));
        } else {
            contents = rewrite_colon_markers(&contents, tag, |count, _| Some(" ".repeat(count)));
        }
    }

    if options.preserve_multiple_spaces {
        contents = restore_multiple_spaces(&contents, &tags.spaces);
    }

    if options.preserve_same_line_else {
        contents = restore_same_line_else(&contents, &tags.same_line_else);
    }

    contents
}

/// Rewrite colon-spacing markers together with the single space the encoder
/// put in front of them.
///
/// `rewrite` gets the recorded count and the text after the marker, and
/// returns the replacement, or `None` to leave the marker alone.
fn rewrite_colon_markers<F>(text: &str, tag: &str, mut rewrite: F) -> String
where
    F: FnMut(usize, &str) -> Option<String>,
{
    let mut output = String::with_capacity(text.len());
    let mut copied = 0;
    let mut search = 0;

    while let Some(CountedMatch { start, end, count }) = find_counted(text, tag, search) {
        search = end;
        let Some(replacement) = rewrite(count, &text[end..]) else {
            continue;
        };

        let span_start = if start > copied && text.as_bytes()[start - 1] == b' ' {
            start - 1
        } else {
            start
        };
        output.push_str(&text[copied..span_start]);
        output.push_str(&replacement);
        copied = end;
    }

    output.push_str(&text[copied..]);
    output
}

/// `/*S<n>*/` sits between two real spaces, so it stands for `n - 2` more
fn restore_multiple_spaces(text: &str, tag: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut copied = 0;

    while let Some(found) = find_counted(text, tag, copied) {
        output.push_str(&text[copied..found.start]);
        output.push_str(&" ".repeat(found.count.saturating_sub(2)));
        copied = found.end;
    }

    output.push_str(&text[copied..]);
    output
}

/// Rejoin `} /*E<n>*/` with the `else` the compiler moved to the next line.
///
/// An `else` still directly after the marker is rejoined as well. Any other
/// context leaves the marker in place.
fn restore_same_line_else(text: &str, tag: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut copied = 0;
    let mut search = 0;

    while let Some(found) = find_counted(text, tag, search) {
        search = found.end;

        let joined = found.start >= copied + 2 && text[..found.start].ends_with("} ");
        let else_end = if joined {
            else_after_marker(&text[found.end..]).map(|len| found.end + len)
        } else {
            None
        };

        match else_end {
            Some(else_end) => {
                output.push_str(&text[copied..found.start - 1]);
                output.push_str(&" ".repeat(found.count));
                output.push_str("else");
                copied = else_end;
                search = else_end;
            }
            None => debug!(at = found.start, "same-line-else marker left in place"),
        }
    }

    output.push_str(&text[copied..]);
    output
}

/// Length of `else`, `\n[ \t]*else` or `\r\n[ \t]*else` at the start of `rest`
fn else_after_marker(rest: &str) -> Option<usize> {
    if rest.starts_with("else") {
        return Some(4);
    }

    let after_break = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))?;
    let indent = after_break
        .bytes()
        .take_while(|b| matches!(b, b' ' | b'\t'))
        .count();
    after_break[indent..]
        .starts_with("else")
        .then(|| rest.len() - after_break.len() + indent + 4)
}
