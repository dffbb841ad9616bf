//! # emx-whitespace
//!
//! Whitespace-preserving codec for source-to-source compilers.
//!
//! Compilers such as `tsc` throw away stylistic whitespace: blank lines,
//! aligned runs of spaces, spaces before `:` and a `} else` kept on one line.
//! This crate encodes that whitespace into small block comments before
//! compilation and restores it from the compiled output afterwards.
//!
//! ## Pipeline
//!
//! ```text
//! source --encode--> marked source --compiler--> marked output --decode--> output
//! ```
//!
//! ## Markers
//!
//! Markers are block comments holding a letters-only tag, optionally
//! followed by a run length:
//!
//! ```text
//! a   = 1;     ->  a /*S3*/ = 1;
//! key  : T     ->  key /*C2*/: T
//! }else {      ->  } /*E0*/else {
//! (blank line) ->  /*N*/
//! ```
//!
//! Tags are chosen per file so that no marker syntax already present in the
//! text is ever mistaken for an inserted one. Strings and comments are never
//! rewritten.
//!
//! ## Metadata
//!
//! The tags and the options used are stored in one comment block at the top
//! of the encoded file (see [`metadata`]). Decoding requires it and removes it.

pub mod scanner;
pub mod tags;
pub mod options;
pub mod metadata;
pub mod encoder;
pub mod decoder;

pub use decoder::{DecodeError, Decoder};
pub use encoder::{Encoder, MetadataPlacement};
pub use metadata::{FileMetadata, METADATA_SENTINEL};
pub use options::{Options, PartialOptions};
pub use scanner::Segment;
pub use tags::{Category, TagAllocator, TagSet};

/// Encode `text` with caller options merged against the defaults
pub fn encode(text: &str, options: &PartialOptions) -> String {
    Encoder::new(Options::merge(options)).encode(text)
}

/// Decode text produced by [`encode`] and a compiler
pub fn decode(text: &str) -> Result<String, DecodeError> {
    Decoder::new().decode(text)
}
