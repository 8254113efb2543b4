//! Reassembly state machine driving the registry and decoder.
//!
//! [`ReassemblyEngine::on_update`] classifies each [`UpdateRecord`] as a
//! first fragment, a continuation, or a standalone payload, feeds it to the
//! [`AssemblyRegistry`], and decodes the story once every declared byte has
//! arrived. Per key the lifecycle is `Empty -> Accumulating -> Emitted` or
//! `-> Discarded`; both terminal states remove the assembly.
//!
//! Fragments are appended at the current fill offset in arrival order. The
//! engine does not reorder, so an out-of-order fragment corrupts its story
//! rather than being detected.

use std::time::Instant;

use log::{debug, info, warn};

use crate::{
    assembly::{AssemblyKey, AssemblyRegistry, AssemblyStatus, StoryIdentity},
    config::{KeyPolicy, ReassemblyConfig},
    decoder,
    error::ReassemblyError,
    metrics,
    record::{FragmentKind, UpdateRecord},
    story::EmittedItem,
};

/// Single-stream reassembly engine.
///
/// The engine owns its [`AssemblyRegistry`] and is driven synchronously by
/// the caller. It is not safe to share between threads without external
/// serialisation; [`FeedSession`](crate::session::FeedSession) wraps it in an
/// actor for that purpose.
///
/// # Examples
///
/// ```
/// use storyframe::{ReassemblyConfig, ReassemblyEngine, UpdateRecord, decoder};
///
/// let payload = decoder::encode(
///     r#"{"id":"1","altId":"a1","headline":"Rates unchanged","body":"..."}"#,
/// )
/// .expect("compress");
/// let (head, tail) = payload.split_at(payload.len() / 2);
///
/// let mut engine = ReassemblyEngine::new(ReassemblyConfig::default());
/// let first = UpdateRecord::new("G1", "S1", head.to_vec())
///     .with_fragment_seq(1)
///     .with_total_size(payload.len());
/// assert!(engine.on_update(&first).expect("first fragment").is_none());
///
/// let last = UpdateRecord::new("G1", "S1", tail.to_vec()).with_fragment_seq(2);
/// let item = engine
///     .on_update(&last)
///     .expect("final fragment")
///     .expect("story complete");
/// assert_eq!(item.as_story().map(|s| s.headline.as_str()), Some("Rates unchanged"));
/// assert_eq!(engine.in_flight(), 0);
/// ```
#[derive(Debug)]
pub struct ReassemblyEngine {
    config: ReassemblyConfig,
    registry: AssemblyRegistry,
    slot: u64,
}

impl ReassemblyEngine {
    /// Create an engine with an empty registry.
    #[must_use]
    pub fn new(config: ReassemblyConfig) -> Self {
        Self {
            config,
            registry: AssemblyRegistry::new(config.stale_after),
            slot: 0,
        }
    }

    /// Process one update using the current time.
    ///
    /// Returns `Ok(Some(_))` when the update completes a story, `Ok(None)`
    /// while more fragments are expected, or the error that ended this
    /// update's story.
    ///
    /// # Errors
    ///
    /// Returns [`ReassemblyError::NoMatchingAssembly`] for a continuation
    /// with no live assembly, [`ReassemblyError::OversizeFragment`] when a
    /// fragment overflows the declared size,
    /// [`ReassemblyError::StoryTooLarge`] when the declared size exceeds the
    /// configured cap, and [`ReassemblyError::DecodeFailure`] when a complete
    /// payload cannot be decoded.
    pub fn on_update(
        &mut self,
        record: &UpdateRecord,
    ) -> Result<Option<EmittedItem>, ReassemblyError> {
        self.on_update_at(record, Instant::now())
    }

    /// Process one update using an explicit clock reading.
    ///
    /// Stale assemblies are purged against `now` before the update is
    /// applied.
    ///
    /// # Errors
    ///
    /// See [`on_update`](Self::on_update).
    pub fn on_update_at(
        &mut self,
        record: &UpdateRecord,
        now: Instant,
    ) -> Result<Option<EmittedItem>, ReassemblyError> {
        self.purge_expired_at(now);

        let kind = record.fragment_kind();
        metrics::inc_fragments(kind);
        debug!(
            "update received: guid={}, source={}, kind={}, seq={:?}, len={}",
            record.guid,
            record.source,
            kind.as_str(),
            record.fragment_seq,
            record.fragment.len()
        );

        let result = match kind {
            FragmentKind::Standalone => Self::decode_standalone(record).map(Some),
            FragmentKind::First => self.accept_first(record, now),
            FragmentKind::Continuation => self.accept_continuation(record),
        };

        match &result {
            Ok(Some(item)) => metrics::inc_emitted(item.as_story().is_some()),
            Ok(None) => {}
            Err(err) => {
                warn!(
                    "story discarded: guid={}, source={}, reason={}, error={err}",
                    err.story().guid,
                    err.story().source,
                    err.kind()
                );
                metrics::inc_discarded(err.kind(), 1);
            }
        }
        metrics::set_in_flight(self.registry.len());
        result
    }

    /// Evict stale assemblies using the current time.
    ///
    /// Returns the keys of evicted assemblies.
    pub fn purge_expired(&mut self) -> Vec<AssemblyKey> { self.purge_expired_at(Instant::now()) }

    /// Evict stale assemblies using an explicit clock reading.
    ///
    /// Returns the keys of evicted assemblies.
    pub fn purge_expired_at(&mut self, now: Instant) -> Vec<AssemblyKey> {
        let evicted = self.registry.purge_expired_at(now);
        if evicted.is_empty() {
            return evicted;
        }

        info!(
            "purged stale assemblies: count={}, keys={evicted:?}",
            evicted.len()
        );
        metrics::inc_discarded(metrics::REASON_STALE, evicted.len() as u64);
        metrics::set_in_flight(self.registry.len());
        if self.config.key_policy == KeyPolicy::Sequential
            && evicted.contains(&AssemblyKey::Slot(self.slot))
        {
            self.slot = self.slot.wrapping_add(1);
        }
        evicted
    }

    /// Borrow the registry, for inspection.
    #[must_use]
    pub fn registry(&self) -> &AssemblyRegistry { &self.registry }

    /// Number of in-flight assemblies.
    #[must_use]
    pub fn in_flight(&self) -> usize { self.registry.len() }

    /// Configuration the engine was built with.
    #[must_use]
    pub const fn config(&self) -> &ReassemblyConfig { &self.config }

    /// Key the next update for `record`'s story is addressed to.
    #[must_use]
    pub fn key_for(&self, record: &UpdateRecord) -> AssemblyKey {
        match self.config.key_policy {
            KeyPolicy::StoryIdentity => AssemblyKey::Story(StoryIdentity::from(record)),
            KeyPolicy::Sequential => AssemblyKey::Slot(self.slot),
        }
    }

    fn decode_standalone(record: &UpdateRecord) -> Result<EmittedItem, ReassemblyError> {
        decoder::decode_item(&record.message_type, &record.fragment).map_err(|error| {
            ReassemblyError::DecodeFailure {
                story: StoryIdentity::from(record),
                error,
            }
        })
    }

    fn accept_first(
        &mut self,
        record: &UpdateRecord,
        now: Instant,
    ) -> Result<Option<EmittedItem>, ReassemblyError> {
        let key = self.key_for(record);
        let limit = self.config.max_story_size;
        if record.total_size > limit.get() {
            // The rejected first fragment still supersedes whatever was at its key.
            self.registry.discard(&key, metrics::REASON_REPLACED);
            self.advance_slot();
            return Err(ReassemblyError::StoryTooLarge {
                story: StoryIdentity::from(record),
                declared: record.total_size,
                limit,
            });
        }

        match self.registry.begin_at(key.clone(), record, now) {
            Ok(AssemblyStatus::Complete) => self.emit(&key),
            Ok(AssemblyStatus::Incomplete) => Ok(None),
            Err(err) => {
                self.retire(&key);
                Err(err)
            }
        }
    }

    fn accept_continuation(
        &mut self,
        record: &UpdateRecord,
    ) -> Result<Option<EmittedItem>, ReassemblyError> {
        let key = self.key_for(record);
        match self.registry.continue_assembly(&key, record) {
            Ok(AssemblyStatus::Complete) => self.emit(&key),
            Ok(AssemblyStatus::Incomplete) => Ok(None),
            Err(err) => {
                self.retire(&key);
                Err(err)
            }
        }
    }

    /// Remove the completed assembly at `key` and decode it.
    fn emit(&mut self, key: &AssemblyKey) -> Result<Option<EmittedItem>, ReassemblyError> {
        let Some(assembly) = self.registry.remove(key) else {
            return Ok(None);
        };
        self.advance_slot();

        let (story, message_type, payload) = assembly.into_parts();
        match decoder::decode_item(&message_type, &payload) {
            Ok(item) => {
                info!(
                    "story emitted: guid={}, source={}, type={message_type}, bytes={}",
                    story.guid,
                    story.source,
                    payload.len()
                );
                Ok(Some(item))
            }
            Err(error) => Err(ReassemblyError::DecodeFailure { story, error }),
        }
    }

    /// Finish a discarded story's slot.
    ///
    /// Under sequential keying the slot advances so later stories start
    /// clean; any assembly left behind is unreachable and is dropped. Story
    /// keys need no bookkeeping because the registry already dropped the
    /// failed assembly or never had one.
    fn retire(&mut self, key: &AssemblyKey) {
        if self.config.key_policy != KeyPolicy::Sequential {
            return;
        }
        self.registry.discard(key, metrics::REASON_ABANDONED);
        self.advance_slot();
    }

    fn advance_slot(&mut self) {
        if self.config.key_policy == KeyPolicy::Sequential {
            self.slot = self.slot.wrapping_add(1);
        }
    }
}
