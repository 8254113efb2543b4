//! Utilities for exercising `storyframe` in integration tests.
//!
//! The crate offers builders for compressed stories, fragment runs and raw
//! feed messages, plus a [`logger`] fixture that serialises access to the
//! global [`logtest::Logger`].
//!
//! ```rust
//! use storyframe::{ReassemblyConfig, ReassemblyEngine};
//! use storyframe_testing::{fragment, story, story_payload};
//!
//! let payload = story_payload(&story("1", "Headline", "Body"));
//! let mut engine = ReassemblyEngine::new(ReassemblyConfig::default());
//! let mut emitted = None;
//! for record in fragment("G1", "S1", &payload, 16) {
//!     emitted = engine.on_update(&record).unwrap();
//! }
//! assert!(emitted.is_some());
//! ```

pub mod builders;
pub mod logging;

pub use builders::{feed_update_json, fragment, story, story_payload};
pub use logging::{LoggerHandle, logger};
