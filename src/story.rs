//! Completed documents handed to downstream consumers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::MessageType;

/// Parsed news story.
///
/// Field names follow the camel-cased keys of the decompressed story JSON.
/// Optional metadata defaults when absent; unknown keys are ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryDocument {
    /// Story identifier.
    pub id: String,
    /// Alternate identifier shared by every version of the story.
    pub alt_id: String,
    /// Headline text.
    pub headline: String,
    /// Body text.
    pub body: String,
    /// Language code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Urgency level (1 is the most urgent).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency: Option<u8>,
    /// Time the first version of the story was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_created: Option<String>,
    /// Time this version was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_created: Option<String>,
    /// Content provider code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// MIME type of the body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Take number for stories delivered in takes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub take_sequence: Option<u32>,
    /// Subject codes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subjects: Vec<String>,
    /// Audience codes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub audiences: Vec<String>,
}

/// Output of a completed assembly.
#[derive(Clone, Debug, PartialEq)]
pub enum EmittedItem {
    /// A parsed story.
    Story(StoryDocument),
    /// A non-story payload, passed through as parsed JSON.
    Document {
        /// Content type of the payload.
        message_type: MessageType,
        /// Parsed JSON value.
        json: Value,
    },
}

impl EmittedItem {
    /// Borrow the story, if this item is one.
    #[must_use]
    pub fn as_story(&self) -> Option<&StoryDocument> {
        match self {
            Self::Story(story) => Some(story),
            Self::Document { .. } => None,
        }
    }

    /// Content type the item was decoded as.
    #[must_use]
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::Story(_) => MessageType::Story,
            Self::Document { message_type, .. } => message_type.clone(),
        }
    }
}
