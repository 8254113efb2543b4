//! Error types surfaced by the reassembly engine.
//!
//! Every error is scoped to a single story. None of them stop the stream;
//! callers log or count them and carry on with the next update.

use std::{num::NonZeroUsize, string::FromUtf8Error};

use thiserror::Error;

use crate::assembly::StoryIdentity;

/// Errors raised while turning a completed payload into text or JSON.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The payload is not a valid gzip stream.
    #[error("failed to decompress payload: {0}")]
    Decompress(#[from] std::io::Error),
    /// The decompressed payload is not UTF-8.
    #[error("decompressed payload is not UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),
    /// The decompressed text is not the expected JSON document.
    #[error("failed to parse payload JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors produced by [`ReassemblyEngine::on_update`](crate::ReassemblyEngine::on_update).
#[derive(Debug, Error)]
pub enum ReassemblyError {
    /// A fragment would push the story past its declared total size. The
    /// assembly is discarded.
    #[error("story {story} overflows declared size: {attempted} bytes > {total} bytes")]
    OversizeFragment {
        /// Story that overflowed.
        story: StoryIdentity,
        /// Size the fragment would have produced.
        attempted: usize,
        /// Declared total size.
        total: usize,
    },
    /// A continuation fragment arrived with no live assembly for its story.
    /// The fragment is dropped.
    #[error("no matching assembly for continuation of story {story}")]
    NoMatchingAssembly {
        /// Story named by the orphaned fragment.
        story: StoryIdentity,
    },
    /// A complete payload could not be decompressed or parsed. The assembly
    /// is discarded.
    #[error("failed to decode story {story}: {error}")]
    DecodeFailure {
        /// Story whose payload failed to decode.
        story: StoryIdentity,
        /// Underlying decode error.
        #[source]
        error: DecodeError,
    },
    /// A first fragment declared a total size above the configured cap.
    #[error("story {story} declares {declared} bytes, limit is {limit} bytes")]
    StoryTooLarge {
        /// Story that was rejected.
        story: StoryIdentity,
        /// Declared total size.
        declared: usize,
        /// Configured cap.
        limit: NonZeroUsize,
    },
}

impl ReassemblyError {
    /// Story the error is scoped to.
    #[must_use]
    pub fn story(&self) -> &StoryIdentity {
        match self {
            Self::OversizeFragment { story, .. }
            | Self::NoMatchingAssembly { story }
            | Self::DecodeFailure { story, .. }
            | Self::StoryTooLarge { story, .. } => story,
        }
    }

    /// Short machine-readable name of the error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::OversizeFragment { .. } => "oversize_fragment",
            Self::NoMatchingAssembly { .. } => "no_matching_assembly",
            Self::DecodeFailure { .. } => "decode_failure",
            Self::StoryTooLarge { .. } => "story_too_large",
        }
    }
}
