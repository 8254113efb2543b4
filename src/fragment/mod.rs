//! Byte-level storage for partially received story payloads.
//!
//! Each in-flight story owns one [`FragmentBuffer`], sized from the total
//! length declared by its first fragment. The buffer is the only place that
//! enforces the `filled <= total` invariant.

pub mod buffer;
pub mod error;

pub use buffer::FragmentBuffer;
pub use error::FragmentError;
