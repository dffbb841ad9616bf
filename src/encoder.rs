//! Whitespace encoder
//!
//! Runs before compilation. Only the code part of each [`Segment`] is
//! rewritten, so string literals and comments come out untouched. Per
//! segment the rewrites run in a fixed order, each on the output of the
//! previous one:
//!
//! 1. `}` + spaces + `else` becomes `} /*E<n>*/else`
//! 2. spaces before `:` become ` /*C<n>*/:`
//! 3. other runs of two or more spaces become ` /*S<n>*/ `
//! 4. a blank line gets `/*N*/` in front of its line break

use crate::metadata::FileMetadata;
use crate::options::Options;
use crate::scanner::{self, Segment};
use crate::tags::{counted_marker, simple_marker, TagAllocator, TagSet};
use std::borrow::Cow;
use tracing::debug;

/// Where the metadata block goes in the encoded text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MetadataPlacement {
    /// Very start of the file
    #[default]
    FileStart,
    /// Right after the first `;` in code, for compilers that want a leading
    /// statement; falls back to the file start when there is none
    AfterFirstStatement,
}

/// Encodes whitespace into marker comments
pub struct Encoder {
    options: Options,
    placement: MetadataPlacement,
}

impl Encoder {
    /// Create an encoder with resolved options
    pub fn new(options: Options) -> Self {
        Self {
            options,
            placement: MetadataPlacement::default(),
        }
    }

    /// Set where the metadata block is inserted
    pub fn with_placement(mut self, placement: MetadataPlacement) -> Self {
        self.placement = placement;
        self
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Encode one file
    pub fn encode(&self, input: &str) -> String {
        let tags = TagAllocator::new(input)
            .with_collision_reports(self.options.show_debug_output)
            .allocate_all();

        let mut segments = scanner::scan(input);
        for (index, segment) in segments.iter_mut().enumerate() {
            let code = self.encode_code(&segment.code, &tags, index == 0);
            segment.code = Cow::Owned(code);
        }

        let block = FileMetadata::new(self.options, tags).serialize();
        let anchor = match self.placement {
            MetadataPlacement::FileStart => 0,
            MetadataPlacement::AfterFirstStatement => first_statement_end(&segments).unwrap_or(0),
        };

        let body = scanner::reassemble(&segments);
        debug!(
            input_len = input.len(),
            output_len = body.len() + block.len(),
            anchor,
            "encoded file"
        );

        let mut output = String::with_capacity(body.len() + block.len());
        output.push_str(&body[..anchor]);
        output.push_str(&block);
        output.push_str(&body[anchor..]);
        output
    }

    /// Apply the enabled rewrites to one code part
    fn encode_code(&self, code: &str, tags: &TagSet, at_file_start: bool) -> String {
        let mut code = code.to_string();

        if self.options.preserve_same_line_else {
            code = encode_same_line_else(&code, &tags.same_line_else);
        }
        if self.options.preserve_spaces_before_colons {
            code = encode_spaces_before_colons(&code, &tags.spaces_before_colon, at_file_start);
        }
        if self.options.preserve_multiple_spaces {
            code = encode_multiple_spaces(&code, &tags.spaces, at_file_start);
        }
        if self.options.preserve_new_lines {
            code = encode_blank_lines(&code, &tags.new_line, at_file_start);
        }

        code
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new(Options::default())
    }
}

/// Offset just past the first `;` found in a code part
fn first_statement_end(segments: &[Segment<'_>]) -> Option<usize> {
    let mut offset = 0;
    for segment in segments {
        if let Some(i) = segment.code.find(';') {
            return Some(offset + i + 1);
        }
        offset += segment.code.len() + segment.trailer.len();
    }
    None
}

/// A space run starting at `start` may be tagged unless it follows a line
/// break, or opens the file.
fn run_is_anchored(bytes: &[u8], start: usize, at_file_start: bool) -> bool {
    match start.checked_sub(1) {
        Some(previous) => !matches!(bytes[previous], b' ' | b'\n'),
        None => !at_file_start,
    }
}

/// Maximal runs of `' '` in `code`, as `(start, end)`
fn space_runs(code: &str) -> impl Iterator<Item = (usize, usize)> + '_ {
    let bytes = code.as_bytes();
    let mut i = 0;
    std::iter::from_fn(move || {
        while i < bytes.len() && bytes[i] != b' ' {
            i += 1;
        }
        if i >= bytes.len() {
            return None;
        }
        let start = i;
        while i < bytes.len() && bytes[i] == b' ' {
            i += 1;
        }
        Some((start, i))
    })
}

fn encode_same_line_else(code: &str, tag: &str) -> String {
    let bytes = code.as_bytes();
    let mut output = String::with_capacity(code.len());
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'}' {
            i += 1;
            continue;
        }

        let spaces = bytes[i + 1..].iter().take_while(|&&b| b == b' ').count();
        let keyword = i + 1 + spaces;
        if code[keyword..].starts_with("else") {
            output.push_str(&code[copied..i]);
            output.push_str("} ");
            output.push_str(&counted_marker(tag, spaces));
            output.push_str("else");
            i = keyword + 4;
            copied = i;
        } else {
            i += 1;
        }
    }

    output.push_str(&code[copied..]);
    output
}

fn encode_spaces_before_colons(code: &str, tag: &str, at_file_start: bool) -> String {
    let bytes = code.as_bytes();
    let mut output = String::with_capacity(code.len());
    let mut copied = 0;

    for (start, end) in space_runs(code) {
        if bytes.get(end) == Some(&b':') && run_is_anchored(bytes, start, at_file_start) {
            output.push_str(&code[copied..start]);
            output.push(' ');
            output.push_str(&counted_marker(tag, end - start));
            copied = end;
        }
    }

    output.push_str(&code[copied..]);
    output
}

fn encode_multiple_spaces(code: &str, tag: &str, at_file_start: bool) -> String {
    let bytes = code.as_bytes();
    let mut output = String::with_capacity(code.len());
    let mut copied = 0;

    for (start, end) in space_runs(code) {
        // Runs ending at a colon belong to the colon encoding.
        if end - start >= 2
            && bytes.get(end) != Some(&b':')
            && run_is_anchored(bytes, start, at_file_start)
        {
            output.push_str(&code[copied..start]);
            output.push(' ');
            output.push_str(&counted_marker(tag, end - start));
            output.push(' ');
            copied = end;
        }
    }

    output.push_str(&code[copied..]);
    output
}

fn encode_blank_lines(code: &str, tag: &str, at_file_start: bool) -> String {
    let bytes = code.as_bytes();
    let marker = simple_marker(tag);
    let mut output = String::with_capacity(code.len());
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        let line_break = match bytes[i] {
            b'\n' => 1,
            b'\r' if bytes.get(i + 1) == Some(&b'\n') => 2,
            _ => {
                i += 1;
                continue;
            }
        };

        let line_start = bytes[..i]
            .iter()
            .rposition(|&b| !matches!(b, b' ' | b'\t'))
            .map_or(0, |p| p + 1);
        let blank = match line_start.checked_sub(1) {
            Some(previous) => bytes[previous] == b'\n',
            None => at_file_start,
        };

        if blank {
            output.push_str(&code[copied..i]);
            output.push_str(&marker);
            copied = i;
        }
        i += line_break;
    }

    output.push_str(&code[copied..]);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_line_else() {
        assert_eq!(encode_same_line_else("}else{", "E"), "} /*E0*/else{");
        assert_eq!(encode_same_line_else("}   else", "E"), "} /*E3*/else");
        assert_eq!(encode_same_line_else("}\nelse", "E"), "}\nelse");
        assert_eq!(encode_same_line_else("} }else", "E"), "} } /*E0*/else");
        assert_eq!(encode_same_line_else("}", "E"), "}");
    }

    #[test]
    fn test_spaces_before_colons() {
        assert_eq!(encode_spaces_before_colons("a  : b", "C", true), "a /*C2*/: b");
        assert_eq!(encode_spaces_before_colons("a: b", "C", true), "a: b");
        assert_eq!(encode_spaces_before_colons("x\n  : y", "C", false), "x\n  : y");
        assert_eq!(encode_spaces_before_colons("\t :", "C", true), "\t /*C1*/:");
    }

    #[test]
    fn test_colon_run_at_segment_start() {
        assert_eq!(encode_spaces_before_colons(" : x", "C", true), " : x");
        assert_eq!(encode_spaces_before_colons(" : x", "C", false), " /*C1*/: x");
    }

    #[test]
    fn test_multiple_spaces() {
        assert_eq!(encode_multiple_spaces("a   b", "S", true), "a /*S3*/ b");
        assert_eq!(encode_multiple_spaces("a b", "S", true), "a b");
        assert_eq!(encode_multiple_spaces("a  :", "S", true), "a  :");
        assert_eq!(encode_multiple_spaces("a  ", "S", true), "a /*S2*/ ");
        assert_eq!(encode_multiple_spaces("\n    indent", "S", true), "\n    indent");
        assert_eq!(encode_multiple_spaces("  x", "S", true), "  x");
        assert_eq!(encode_multiple_spaces("  x", "S", false), " /*S2*/ x");
    }

    #[test]
    fn test_blank_lines() {
        assert_eq!(encode_blank_lines("a\n\nb", "N", true), "a\n/*N*/\nb");
        assert_eq!(encode_blank_lines("a\n  \t\nb", "N", true), "a\n  \t/*N*/\nb");
        assert_eq!(encode_blank_lines("a\r\n\r\nb", "N", true), "a\r\n/*N*/\r\nb");
        assert_eq!(encode_blank_lines("a\nb\n", "N", true), "a\nb\n");
    }

    #[test]
    fn test_blank_line_at_file_start() {
        assert_eq!(encode_blank_lines("\nx", "N", true), "/*N*/\nx");
        assert_eq!(encode_blank_lines("  \nx", "N", true), "  /*N*/\nx");
        assert_eq!(encode_blank_lines("\nx", "N", false), "\nx");
    }

    #[test]
    fn test_encode_leaves_strings_and_comments() {
        let input = "a = 'x  :  y';  // a  :  b\n\n/* }  else */\n";
        let encoded = Encoder::default().encode(input);
        assert!(encoded.contains("'x  :  y'"));
        assert!(encoded.contains("// a  :  b\n/*N*/\n"));
        assert!(encoded.contains("/* }  else */"));
        assert!(encoded.contains("a = 'x  :  y'; /*S2*/ //"));
    }

    #[test]
    fn test_encode_prepends_metadata() {
        let encoded = Encoder::default().encode("a;\n");
        let metadata = FileMetadata::new(
            Options::default(),
            TagAllocator::new("a;\n").allocate_all(),
        );
        assert_eq!(encoded, format!("{}a;\n", metadata.serialize()));
    }

    #[test]
    fn test_metadata_after_first_statement() {
        let input = "'a;b'; x; y";
        let encoded = Encoder::default()
            .with_placement(MetadataPlacement::AfterFirstStatement)
            .encode(input);
        assert!(encoded.starts_with("'a;b';/*PRESERVE_TYPESCRIPT_WHITESPACE_METADATA"));
        assert!(encoded.ends_with("*/\n x; y"));
    }

    #[test]
    fn test_metadata_after_statement_falls_back_to_start() {
        let encoded = Encoder::default()
            .with_placement(MetadataPlacement::AfterFirstStatement)
            .encode("x = 1");
        assert!(encoded.starts_with("/*PRESERVE_TYPESCRIPT_WHITESPACE_METADATA"));
    }

    #[test]
    fn test_disabled_features_leave_whitespace() {
        let options = Options {
            preserve_new_lines: false,
            preserve_multiple_spaces: false,
            preserve_spaces_before_colons: false,
            preserve_same_line_else: false,
            ..Options::default()
        };
        let input = "a  : b\n\n}  else {   }";
        let encoded = Encoder::new(options).encode(input);
        assert!(encoded.ends_with(&format!("*/\n{input}")));
    }

    #[test]
    fn test_encoder_uses_free_tags() {
        let input = "x  y // /*S2*/\n";
        let encoded = Encoder::default().encode(input);
        assert!(encoded.contains("x /*s2*/ y"));
        assert!(encoded.contains("\"SPACES_TAG\":\"s\""));
    }
}
