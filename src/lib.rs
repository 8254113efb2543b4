#![doc(html_root_url = "https://docs.rs/storyframe/latest")]
//! Public API for the `storyframe` library.
//!
//! This crate reassembles fragmented news-story updates from a streaming
//! feed into complete, parsed stories. Updates arrive either as one complete
//! compressed payload or as an ordered run of fragments; the
//! [`ReassemblyEngine`] buffers fragments per story, detects completion,
//! inflates the payload and parses it into a [`StoryDocument`].
//!
//! The engine is transport-agnostic and synchronous. [`feed`] turns the
//! feed's JSON update messages into [`UpdateRecord`]s, and [`session`] runs
//! an engine inside a tokio task for callers that want an actor.

pub mod assembly;
pub mod config;
pub mod decoder;
pub mod engine;
pub mod error;
pub mod feed;
pub mod fragment;
pub mod metrics;
pub mod record;
pub mod session;
pub mod story;

#[cfg(test)]
extern crate self as storyframe;

#[cfg(test)]
#[path = "../storyframe_testing/src/builders.rs"]
mod test_helpers;

pub use assembly::{Assembly, AssemblyKey, AssemblyRegistry, AssemblyStatus, StoryIdentity};
pub use config::{KeyPolicy, ReassemblyConfig};
pub use engine::ReassemblyEngine;
pub use error::{DecodeError, ReassemblyError};
pub use feed::{FeedError, parse_messages, parse_update};
pub use fragment::{FragmentBuffer, FragmentError};
pub use record::{FragmentKind, MessageType, UpdateRecord};
pub use session::{FeedSession, SessionConfig, SessionError, SessionOutput, SessionStats};
pub use story::{EmittedItem, StoryDocument};
