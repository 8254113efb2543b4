//! Error type emitted by [`FragmentBuffer`](super::FragmentBuffer).

use thiserror::Error;

/// Errors produced while writing into a fragment buffer.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum FragmentError {
    /// The write would end past the declared total size.
    #[error("fragment overflows buffer: {attempted} bytes > {total} bytes declared")]
    Oversize {
        /// End offset the write would have reached.
        attempted: usize,
        /// Declared total payload size.
        total: usize,
    },
}
