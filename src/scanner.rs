//! Lexical scanner splitting source text into code and string/comment parts
//!
//! The scanner only knows enough about JavaScript-like syntax to keep the
//! encoder away from literal content: quoted strings (`'`, `"`, `` ` ``),
//! line comments and block comments. Everything else is code.

use std::borrow::Cow;
use std::ops::Range;

/// One piece of the input: a run of code followed by a verbatim string
/// literal or comment (the trailer, possibly empty).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment<'a> {
    /// Code text, the only part the encoder rewrites
    pub code: Cow<'a, str>,
    /// String literal or comment, never rewritten
    pub trailer: &'a str,
}

impl<'a> Segment<'a> {
    fn borrowed(code: &'a str, trailer: &'a str) -> Self {
        Self {
            code: Cow::Borrowed(code),
            trailer,
        }
    }
}

/// What started a trailer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Opener {
    Quote(u8),
    LineComment,
    BlockComment,
}

impl Opener {
    fn len(self) -> usize {
        match self {
            Opener::Quote(_) => 1,
            Opener::LineComment | Opener::BlockComment => 2,
        }
    }
}

/// Iterator over raw `(code, trailer)` byte ranges, before coalescing
pub struct Scanner<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    /// Create a scanner over the whole text
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    /// Find the next string or comment opener at or after `from`
    fn next_opener(&self, from: usize) -> Option<(usize, Opener)> {
        let bytes = self.text.as_bytes();
        let mut i = from;
        while i < bytes.len() {
            match bytes[i] {
                q @ (b'\'' | b'"' | b'`') => return Some((i, Opener::Quote(q))),
                b'/' => match bytes.get(i + 1) {
                    Some(b'/') => return Some((i, Opener::LineComment)),
                    Some(b'*') => return Some((i, Opener::BlockComment)),
                    _ => {}
                },
                _ => {}
            }
            i += 1;
        }
        None
    }

    /// End (exclusive) of the trailer whose body starts at `body`,
    /// or `None` when it runs to the end of input
    fn terminator(&self, opener: Opener, body: usize) -> Option<usize> {
        let bytes = self.text.as_bytes();
        match opener {
            Opener::Quote(quote) => {
                // A quote closes only after an even run of backslashes.
                let mut escaped = false;
                for (offset, &b) in bytes[body..].iter().enumerate() {
                    if b == b'\\' {
                        escaped = !escaped;
                    } else if b == quote && !escaped {
                        return Some(body + offset + 1);
                    } else {
                        escaped = false;
                    }
                }
                None
            }
            Opener::LineComment => {
                let newline = body + self.text[body..].find('\n')?;
                if newline > body && bytes[newline - 1] == b'\r' {
                    Some(newline - 1)
                } else {
                    Some(newline)
                }
            }
            Opener::BlockComment => self.text[body..].find("*/").map(|i| body + i + 2),
        }
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = (Range<usize>, Range<usize>);

    fn next(&mut self) -> Option<Self::Item> {
        let len = self.text.len();
        if self.pos >= len {
            return None;
        }

        let start = self.pos;
        let item = match self.next_opener(start) {
            None => (start..len, len..len),
            Some((at, opener)) => {
                let end = self.terminator(opener, at + opener.len()).unwrap_or(len);
                (start..at, at..end)
            }
        };
        self.pos = item.1.end;
        Some(item)
    }
}

/// Split text into segments.
///
/// A trailer preceded by empty code is folded into the previous segment's
/// trailer, so only the first segment can have empty code next to a trailer.
pub fn scan(text: &str) -> Vec<Segment<'_>> {
    let mut ranges: Vec<(Range<usize>, Range<usize>)> = Vec::new();

    for (code, trailer) in Scanner::new(text) {
        if code.is_empty() {
            if let Some((_, previous)) = ranges.last_mut() {
                previous.end = trailer.end;
                continue;
            }
        }
        ranges.push((code, trailer));
    }

    ranges
        .into_iter()
        .map(|(code, trailer)| Segment::borrowed(&text[code], &text[trailer]))
        .collect()
}

/// Concatenate segments back into text
pub fn reassemble(segments: &[Segment<'_>]) -> String {
    let capacity = segments.iter().map(|s| s.code.len() + s.trailer.len()).sum();
    let mut output = String::with_capacity(capacity);
    for segment in segments {
        output.push_str(&segment.code);
        output.push_str(segment.trailer);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(text: &str) -> Vec<(String, String)> {
        scan(text)
            .into_iter()
            .map(|s| (s.code.into_owned(), s.trailer.to_string()))
            .collect()
    }

    #[test]
    fn test_plain_code_is_one_segment() {
        assert_eq!(pairs("let a = 1;\n"), vec![("let a = 1;\n".into(), "".into())]);
    }

    #[test]
    fn test_empty_input() {
        assert!(scan("").is_empty());
        assert_eq!(reassemble(&scan("")), "");
    }

    #[test]
    fn test_strings_and_comments() {
        let text = "a = 'x  y'; // two  spaces\nb = /* c:  d */ 1;";
        assert_eq!(
            pairs(text),
            vec![
                ("a = ".into(), "'x  y'".into()),
                ("; ".into(), "// two  spaces".into()),
                ("\nb = ".into(), "/* c:  d */".into()),
                (" 1;".into(), "".into()),
            ]
        );
    }

    #[test]
    fn test_escaped_quote_does_not_terminate() {
        let text = r"s = 'it\'s'; t";
        let segments = scan(text);
        assert_eq!(segments[0].trailer, r"'it\'s'");
        assert_eq!(segments[1].code, "; t");
    }

    #[test]
    fn test_escaped_backslash_terminates() {
        let text = r"s = 'a\\'; t";
        let segments = scan(text);
        assert_eq!(segments[0].trailer, r"'a\\'");
        assert_eq!(segments[1].code, "; t");
    }

    #[test]
    fn test_line_comment_keeps_crlf_in_code() {
        let segments = scan("x // note\r\ny");
        assert_eq!(segments[0].trailer, "// note");
        assert_eq!(segments[1].code, "\r\ny");
    }

    #[test]
    fn test_unterminated_trailers_run_to_end() {
        assert_eq!(scan("a = \"open")[0].trailer, "\"open");
        assert_eq!(scan("a /* open")[0].trailer, "/* open");
        assert_eq!(scan("a // eof")[0].trailer, "// eof");
    }

    #[test]
    fn test_block_opener_is_not_its_own_closer() {
        assert_eq!(scan("/*/ x */y")[0].trailer, "/*/ x */");
    }

    #[test]
    fn test_adjacent_trailers_coalesce() {
        let segments = scan("f('a'\"b\"/*c*/) ");
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].code, "f(");
        assert_eq!(segments[0].trailer, "'a'\"b\"/*c*/");
        assert_eq!(segments[1].code, ") ");
    }

    #[test]
    fn test_leading_trailer_keeps_empty_code() {
        let segments = scan("// head\ncode");
        assert_eq!(segments[0].code, "");
        assert_eq!(segments[0].trailer, "// head");
    }

    #[test]
    fn test_reassemble_is_exact() {
        let text = "const t = `a ${b}`; // x\n/* y */ 'z\\'' + \"\\\\\"\n\n  end";
        assert_eq!(reassemble(&scan(text)), text);
    }

    #[test]
    fn test_non_ascii_text() {
        let text = "const é = 'ü  ö'; // ñ\n";
        assert_eq!(reassemble(&scan(text)), text);
        assert_eq!(scan(text)[0].trailer, "'ü  ö'");
    }
}
