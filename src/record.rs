//! Inbound update records and their classification.
//!
//! An [`UpdateRecord`] is one decoded feed update. The feed layer produces it
//! (see [`crate::feed`]); the [`ReassemblyEngine`](crate::ReassemblyEngine)
//! consumes it without knowing how it was transported.

use std::fmt;

use bytes::Bytes;

/// Content type carried by an update (`MRN_TYPE`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// A news story; completed payloads decode into a
    /// [`StoryDocument`](crate::StoryDocument).
    #[default]
    Story,
    /// Any other content type; completed payloads pass through as JSON.
    Other(String),
}

impl MessageType {
    /// Wire name of the story content type.
    pub const STORY: &'static str = "STORY";

    /// Map a wire name onto a [`MessageType`].
    ///
    /// # Examples
    ///
    /// ```
    /// use storyframe::MessageType;
    ///
    /// assert_eq!(MessageType::from_name("STORY"), MessageType::Story);
    /// assert_eq!(
    ///     MessageType::from_name("FILING"),
    ///     MessageType::Other("FILING".into())
    /// );
    /// ```
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        if name == Self::STORY {
            Self::Story
        } else {
            Self::Other(name.to_owned())
        }
    }

    /// Wire name of this content type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Story => Self::STORY,
            Self::Other(name) => name,
        }
    }

    /// Whether this is the story content type.
    #[must_use]
    pub const fn is_story(&self) -> bool { matches!(self, Self::Story) }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Role an update plays in the reassembly of its story.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FragmentKind {
    /// Sequence number 1 with a declared total size: opens an assembly.
    First,
    /// Sequence number above 1: extends the open assembly.
    Continuation,
    /// No sequence number (or 0), or a first fragment without a declared
    /// size: the fragment already holds the whole payload.
    Standalone,
}

impl FragmentKind {
    /// Label used for logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Continuation => "continuation",
            Self::Standalone => "standalone",
        }
    }
}

/// One decoded feed update.
///
/// # Examples
///
/// ```
/// use storyframe::{FragmentKind, UpdateRecord};
///
/// let first = UpdateRecord::new("G1", "S1", vec![0_u8; 4])
///     .with_fragment_seq(1)
///     .with_total_size(10);
/// assert_eq!(first.fragment_kind(), FragmentKind::First);
///
/// let next = UpdateRecord::new("G1", "S1", vec![0_u8; 6]).with_fragment_seq(2);
/// assert_eq!(next.fragment_kind(), FragmentKind::Continuation);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateRecord {
    /// Story identifier, stable across all fragments of one story.
    pub guid: String,
    /// Source identifier (`MRN_SRC`).
    pub source: String,
    /// 1-based fragment position; `None` or `Some(0)` for standalone updates.
    pub fragment_seq: Option<u32>,
    /// Declared total payload size in bytes; meaningful on the first fragment.
    pub total_size: usize,
    /// Raw fragment bytes.
    pub fragment: Bytes,
    /// Content type discriminator.
    pub message_type: MessageType,
    /// Major version of the feed item (`MRN_V_MAJ`).
    pub version_major: Option<String>,
    /// Minor version of the feed item (`MRN_V_MIN`).
    pub version_minor: Option<String>,
    /// Activation date reported by the feed (`ACTIV_DATE`).
    pub activation_date: Option<String>,
    /// Feed context identifier (`CONTEXT_ID`).
    pub context_id: Option<u64>,
}

impl UpdateRecord {
    /// Create a standalone story record carrying `fragment`.
    #[must_use]
    pub fn new(guid: impl Into<String>, source: impl Into<String>, fragment: impl Into<Bytes>) -> Self {
        Self {
            guid: guid.into(),
            source: source.into(),
            fragment_seq: None,
            total_size: 0,
            fragment: fragment.into(),
            message_type: MessageType::Story,
            version_major: None,
            version_minor: None,
            activation_date: None,
            context_id: None,
        }
    }

    /// Set the fragment sequence number.
    #[must_use]
    pub fn with_fragment_seq(mut self, seq: u32) -> Self {
        self.fragment_seq = Some(seq);
        self
    }

    /// Set the declared total payload size.
    #[must_use]
    pub fn with_total_size(mut self, total_size: usize) -> Self {
        self.total_size = total_size;
        self
    }

    /// Set the content type.
    #[must_use]
    pub fn with_message_type(mut self, message_type: MessageType) -> Self {
        self.message_type = message_type;
        self
    }

    /// Classify this update.
    #[must_use]
    pub fn fragment_kind(&self) -> FragmentKind {
        match self.fragment_seq {
            Some(1) if self.total_size > 0 => FragmentKind::First,
            Some(seq) if seq > 1 => FragmentKind::Continuation,
            _ => FragmentKind::Standalone,
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{FragmentKind, MessageType, UpdateRecord};

    #[rstest]
    #[case::absent(None, 0, FragmentKind::Standalone)]
    #[case::zero(Some(0), 42, FragmentKind::Standalone)]
    #[case::first_without_total(Some(1), 0, FragmentKind::Standalone)]
    #[case::first(Some(1), 10, FragmentKind::First)]
    #[case::second(Some(2), 0, FragmentKind::Continuation)]
    #[case::later(Some(17), 10, FragmentKind::Continuation)]
    fn classifies_records(
        #[case] seq: Option<u32>,
        #[case] total_size: usize,
        #[case] expected: FragmentKind,
    ) {
        let mut record = UpdateRecord::new("G", "S", vec![1_u8]).with_total_size(total_size);
        record.fragment_seq = seq;
        assert_eq!(record.fragment_kind(), expected);
    }

    #[test]
    fn message_type_round_trips_wire_names() {
        assert_eq!(MessageType::from_name("STORY").as_str(), "STORY");
        assert_eq!(MessageType::from_name("TRNA").to_string(), "TRNA");
        assert!(!MessageType::from_name("story").is_story());
    }
}
