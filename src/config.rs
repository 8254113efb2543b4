//! Configuration for the reassembly engine.
//!
//! [`ReassemblyConfig`] selects how assemblies are keyed and bounds the
//! resources a single stream may hold.

use std::{num::NonZeroUsize, time::Duration};

/// How in-flight assemblies are keyed in the registry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KeyPolicy {
    /// Key by `(guid, source)`; interleaved stories assemble independently.
    #[default]
    StoryIdentity,
    /// Key by a monotonic slot counter; one story may be in flight at a time
    /// and the slot advances after each emitted or discarded story.
    Sequential,
}

/// Settings that govern a [`ReassemblyEngine`](crate::ReassemblyEngine).
///
/// # Examples
///
/// ```
/// use std::{num::NonZeroUsize, time::Duration};
///
/// use storyframe::{KeyPolicy, ReassemblyConfig};
///
/// let config = ReassemblyConfig::default()
///     .with_key_policy(KeyPolicy::Sequential)
///     .with_stale_after(Duration::from_secs(120));
/// assert_eq!(config.key_policy, KeyPolicy::Sequential);
/// assert_eq!(config.stale_after, Some(Duration::from_secs(120)));
/// assert_eq!(config.max_story_size, ReassemblyConfig::DEFAULT_MAX_STORY_SIZE);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReassemblyConfig {
    /// Registry keying strategy.
    pub key_policy: KeyPolicy,
    /// Hard cap on the declared total size of a single story payload.
    pub max_story_size: NonZeroUsize,
    /// Age after which an incomplete assembly is evicted. `None` keeps
    /// incomplete assemblies until they complete or fail.
    pub stale_after: Option<Duration>,
}

impl ReassemblyConfig {
    /// Default cap on a compressed story payload (16 MiB).
    pub const DEFAULT_MAX_STORY_SIZE: NonZeroUsize = match NonZeroUsize::new(16 * 1024 * 1024) {
        Some(size) => size,
        None => NonZeroUsize::MIN,
    };

    /// Select the registry keying strategy.
    #[must_use]
    pub const fn with_key_policy(mut self, key_policy: KeyPolicy) -> Self {
        self.key_policy = key_policy;
        self
    }

    /// Cap the declared total size of a single story payload.
    #[must_use]
    pub const fn with_max_story_size(mut self, max_story_size: NonZeroUsize) -> Self {
        self.max_story_size = max_story_size;
        self
    }

    /// Evict incomplete assemblies older than `stale_after`.
    #[must_use]
    pub const fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = Some(stale_after);
        self
    }
}

impl Default for ReassemblyConfig {
    fn default() -> Self {
        Self {
            key_policy: KeyPolicy::default(),
            max_story_size: Self::DEFAULT_MAX_STORY_SIZE,
            stale_after: None,
        }
    }
}
