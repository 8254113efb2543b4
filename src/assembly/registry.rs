//! Stateful store of partially received stories.
//!
//! `AssemblyRegistry` maps an [`AssemblyKey`] to the [`Assembly`] collecting
//! that story's bytes. It validates that continuation fragments belong to the
//! stored story, appends them in arrival order, and evicts assemblies that
//! stop receiving fragments when a staleness timeout is configured.

use std::{
    collections::{HashMap, hash_map::Entry},
    time::{Duration, Instant},
};

use log::warn;

use super::{AssemblyKey, StoryIdentity};
use crate::{
    error::ReassemblyError,
    fragment::{FragmentBuffer, FragmentError},
    metrics,
    record::{MessageType, UpdateRecord},
};

/// Result of feeding a fragment into the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssemblyStatus {
    /// The story still expects more bytes.
    Incomplete,
    /// The fragment filled the declared total size.
    Complete,
}

/// In-progress reconstruction of one story.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Assembly {
    identity: StoryIdentity,
    message_type: MessageType,
    buffer: FragmentBuffer,
    started_at: Instant,
}

impl Assembly {
    /// Identity copied from the first fragment.
    #[must_use]
    pub fn identity(&self) -> &StoryIdentity { &self.identity }

    /// Story GUID.
    #[must_use]
    pub fn guid(&self) -> &str { &self.identity.guid }

    /// Source identifier.
    #[must_use]
    pub fn source(&self) -> &str { &self.identity.source }

    /// Content type carried by the most recent accepted fragment.
    #[must_use]
    pub fn message_type(&self) -> &MessageType { &self.message_type }

    /// Declared final payload length.
    #[must_use]
    pub fn total_size(&self) -> usize { self.buffer.total_size() }

    /// Bytes received so far.
    #[must_use]
    pub fn filled_size(&self) -> usize { self.buffer.filled_size() }

    /// Whether the declared payload has been fully received.
    #[must_use]
    pub fn is_complete(&self) -> bool { self.buffer.is_complete() }

    /// When the first fragment was accepted.
    #[must_use]
    pub const fn started_at(&self) -> Instant { self.started_at }

    /// Borrow the received bytes.
    #[must_use]
    pub fn payload(&self) -> &[u8] { self.buffer.as_slice() }

    /// Consume the assembly, returning its identity, content type and bytes.
    #[must_use]
    pub fn into_parts(self) -> (StoryIdentity, MessageType, Vec<u8>) {
        (self.identity, self.message_type, self.buffer.into_bytes())
    }

    fn append(&mut self, record: &UpdateRecord) -> Result<AssemblyStatus, FragmentError> {
        let offset = self.buffer.filled_size();
        self.buffer.append(offset, &record.fragment)?;
        self.message_type = record.message_type.clone();
        Ok(self.status())
    }

    fn status(&self) -> AssemblyStatus {
        if self.buffer.is_complete() {
            AssemblyStatus::Complete
        } else {
            AssemblyStatus::Incomplete
        }
    }
}

/// Store of in-flight assemblies with optional staleness eviction.
///
/// # Examples
///
/// ```
/// use storyframe::{
///     UpdateRecord,
///     assembly::{AssemblyKey, AssemblyRegistry, AssemblyStatus},
/// };
///
/// let mut registry = AssemblyRegistry::new(None);
/// let key = AssemblyKey::Slot(0);
///
/// let first = UpdateRecord::new("G1", "S1", &b"hello"[..])
///     .with_fragment_seq(1)
///     .with_total_size(10);
/// assert_eq!(
///     registry.begin(key.clone(), &first).expect("first fragment accepted"),
///     AssemblyStatus::Incomplete
/// );
///
/// let next = UpdateRecord::new("G1", "S1", &b"world"[..]).with_fragment_seq(2);
/// assert_eq!(
///     registry
///         .continue_assembly(&key, &next)
///         .expect("continuation accepted"),
///     AssemblyStatus::Complete
/// );
///
/// let assembly = registry.remove(&key).expect("assembly present");
/// assert_eq!(assembly.payload(), b"helloworld");
/// assert!(registry.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct AssemblyRegistry {
    assemblies: HashMap<AssemblyKey, Assembly>,
    stale_after: Option<Duration>,
}

impl AssemblyRegistry {
    /// Create an empty registry.
    ///
    /// When `stale_after` is `Some`, assemblies older than that duration are
    /// evicted by [`purge_expired`](Self::purge_expired).
    #[must_use]
    pub fn new(stale_after: Option<Duration>) -> Self {
        Self {
            assemblies: HashMap::new(),
            stale_after,
        }
    }

    /// Start a new assembly at `key` from a first fragment.
    ///
    /// Any incomplete assembly already stored at `key` is replaced and
    /// counted as discarded.
    ///
    /// # Errors
    ///
    /// Returns [`ReassemblyError::OversizeFragment`] when the first fragment is
    /// longer than its declared total size. Nothing is stored at `key` in that
    /// case.
    pub fn begin(
        &mut self,
        key: AssemblyKey,
        record: &UpdateRecord,
    ) -> Result<AssemblyStatus, ReassemblyError> {
        self.begin_at(key, record, Instant::now())
    }

    /// Start a new assembly with an explicit clock reading.
    ///
    /// See [`begin`](Self::begin) for details.
    ///
    /// # Errors
    ///
    /// Returns [`ReassemblyError::OversizeFragment`] when the first fragment is
    /// longer than its declared total size.
    pub fn begin_at(
        &mut self,
        key: AssemblyKey,
        record: &UpdateRecord,
        now: Instant,
    ) -> Result<AssemblyStatus, ReassemblyError> {
        self.discard(&key, metrics::REASON_REPLACED);

        let identity = StoryIdentity::from(record);
        let mut buffer = FragmentBuffer::new(record.total_size);
        if let Err(FragmentError::Oversize { attempted, total }) = buffer.append(0, &record.fragment)
        {
            return Err(ReassemblyError::OversizeFragment {
                story: identity,
                attempted,
                total,
            });
        }

        let assembly = Assembly {
            identity,
            message_type: record.message_type.clone(),
            buffer,
            started_at: now,
        };
        let status = assembly.status();
        self.assemblies.insert(key, assembly);
        Ok(status)
    }

    /// Append a continuation fragment to the assembly at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ReassemblyError::NoMatchingAssembly`] when no assembly lives
    /// at `key` or its identity differs from the record's; nothing is mutated.
    /// Returns [`ReassemblyError::OversizeFragment`] when the fragment would
    /// overflow the declared total size; the assembly is removed.
    pub fn continue_assembly(
        &mut self,
        key: &AssemblyKey,
        record: &UpdateRecord,
    ) -> Result<AssemblyStatus, ReassemblyError> {
        let Entry::Occupied(mut entry) = self.assemblies.entry(key.clone()) else {
            return Err(ReassemblyError::NoMatchingAssembly {
                story: StoryIdentity::from(record),
            });
        };

        if !entry.get().identity.matches(record) {
            return Err(ReassemblyError::NoMatchingAssembly {
                story: StoryIdentity::from(record),
            });
        }

        match entry.get_mut().append(record) {
            Ok(status) => Ok(status),
            Err(FragmentError::Oversize { attempted, total }) => {
                let discarded = entry.remove();
                Err(ReassemblyError::OversizeFragment {
                    story: discarded.identity,
                    attempted,
                    total,
                })
            }
        }
    }

    /// Remove and return the assembly at `key`.
    pub fn remove(&mut self, key: &AssemblyKey) -> Option<Assembly> { self.assemblies.remove(key) }

    /// Drop the incomplete assembly at `key`, logging and counting it under
    /// `reason`.
    ///
    /// Returns the dropped assembly, or `None` when `key` is empty.
    pub fn discard(&mut self, key: &AssemblyKey, reason: &'static str) -> Option<Assembly> {
        let dropped = self.assemblies.remove(key)?;
        warn!(
            "incomplete assembly dropped: key={key}, reason={reason}, guid={}, source={}, \
             filled={}, total={}",
            dropped.guid(),
            dropped.source(),
            dropped.filled_size(),
            dropped.total_size()
        );
        metrics::inc_discarded(reason, 1);
        Some(dropped)
    }

    /// Look up the assembly at `key`.
    #[must_use]
    pub fn get(&self, key: &AssemblyKey) -> Option<&Assembly> { self.assemblies.get(key) }

    /// Remove assemblies older than the staleness timeout.
    ///
    /// Returns the keys of evicted assemblies.
    pub fn purge_expired(&mut self) -> Vec<AssemblyKey> { self.purge_expired_at(Instant::now()) }

    /// Remove stale assemblies using an explicit clock reading.
    ///
    /// Returns the keys of evicted assemblies. Without a configured timeout
    /// nothing is evicted.
    pub fn purge_expired_at(&mut self, now: Instant) -> Vec<AssemblyKey> {
        let Some(stale_after) = self.stale_after else {
            return Vec::new();
        };

        let mut evicted = Vec::new();
        self.assemblies.retain(|key, assembly| {
            let expired = now.saturating_duration_since(assembly.started_at) >= stale_after;
            if expired {
                evicted.push(key.clone());
            }
            !expired
        });
        evicted
    }

    /// Number of in-flight assemblies.
    #[must_use]
    pub fn len(&self) -> usize { self.assemblies.len() }

    /// Whether no assembly is in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.assemblies.is_empty() }

    /// Bytes reserved across all in-flight assemblies.
    #[must_use]
    pub fn reserved_bytes(&self) -> usize {
        self.assemblies.values().map(Assembly::total_size).sum()
    }
}
