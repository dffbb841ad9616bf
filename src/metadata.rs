//! Per-file metadata block
//!
//! The encoder records the options it ran with and the tags it allocated in
//! a single block comment:
//!
//! ```text
//! /*PRESERVE_TYPESCRIPT_WHITESPACE_METADATA{"options":{...},"NEW_LINE_TAG":"N",...}PRESERVE_TYPESCRIPT_WHITESPACE_METADATA*/
//! ```
//!
//! followed by a newline. The decoder finds it by the sentinel, reads it and
//! cuts exactly that span out of the text.

use crate::decoder::DecodeError;
use crate::options::Options;
use crate::tags::TagSet;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Sentinel delimiting the JSON payload on both sides
pub const METADATA_SENTINEL: &str = "PRESERVE_TYPESCRIPT_WHITESPACE_METADATA";

/// Options and tags of one encoded file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    #[serde(default)]
    pub options: Options,
    #[serde(flatten)]
    pub tags: TagSet,
}

/// Metadata block located in a text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedMetadata {
    pub metadata: FileMetadata,
    /// Byte span of the whole block, trailing newline included
    pub span: Range<usize>,
}

impl FileMetadata {
    pub fn new(options: Options, tags: TagSet) -> Self {
        Self { options, tags }
    }

    /// Render the block, trailing newline included
    pub fn serialize(&self) -> String {
        // Plain strings and booleans always serialize.
        let json = serde_json::to_string(self).unwrap_or_default();
        format!("/*{METADATA_SENTINEL}{json}{METADATA_SENTINEL}*/\n")
    }

    /// Find and parse the block: first start sentinel, last end sentinel
    pub fn locate(text: &str) -> Result<LocatedMetadata, DecodeError> {
        let start_tag = format!("/*{METADATA_SENTINEL}");
        let end_tag = format!("{METADATA_SENTINEL}*/\n");

        let start = text.find(&start_tag).ok_or(DecodeError::MissingMetadata)?;
        let end = text.rfind(&end_tag).ok_or(DecodeError::MissingMetadata)?;

        let payload_start = start + start_tag.len();
        if end < payload_start {
            return Err(DecodeError::MissingMetadata);
        }

        let metadata: FileMetadata = serde_json::from_str(&text[payload_start..end])?;
        Ok(LocatedMetadata {
            metadata,
            span: start..end + end_tag.len(),
        })
    }
}

impl LocatedMetadata {
    /// Text with the block cut out
    pub fn remove_from(&self, text: &str) -> String {
        let mut output = String::with_capacity(text.len() - self.span.len());
        output.push_str(&text[..self.span.start]);
        output.push_str(&text[self.span.end..]);
        output
    }
}
