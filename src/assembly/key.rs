//! Keys and identities used to address assemblies.

use std::fmt;

use crate::record::UpdateRecord;

/// Identity shared by every fragment of one logical story.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StoryIdentity {
    /// Story GUID.
    pub guid: String,
    /// Source identifier.
    pub source: String,
}

impl StoryIdentity {
    /// Construct an identity from its parts.
    #[must_use]
    pub fn new(guid: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            guid: guid.into(),
            source: source.into(),
        }
    }

    /// Whether `record` carries this identity.
    #[must_use]
    pub fn matches(&self, record: &UpdateRecord) -> bool {
        self.guid == record.guid && self.source == record.source
    }
}

impl From<&UpdateRecord> for StoryIdentity {
    fn from(record: &UpdateRecord) -> Self { Self::new(record.guid.clone(), record.source.clone()) }
}

impl fmt::Display for StoryIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from {}", self.guid, self.source)
    }
}

/// Registry slot addressed by an update.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AssemblyKey {
    /// Sequential slot number; see [`KeyPolicy::Sequential`](crate::KeyPolicy::Sequential).
    Slot(u64),
    /// Story identity; see [`KeyPolicy::StoryIdentity`](crate::KeyPolicy::StoryIdentity).
    Story(StoryIdentity),
}

impl fmt::Display for AssemblyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Slot(slot) => write!(f, "slot {slot}"),
            Self::Story(identity) => write!(f, "story {identity}"),
        }
    }
}
