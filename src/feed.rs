//! Decoding of streaming feed update messages into [`UpdateRecord`]s.
//!
//! A streaming session delivers JSON messages shaped like
//! `{"Type":"Update","Domain":"NewsTextAnalytics","Fields":{...}}`, either
//! one object at a time or batched in an array. Only news-analytics updates
//! that carry fields become records; refreshes, status messages and other
//! domains are skipped. The `FRAGMENT` field travels base64-encoded.

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::Deserialize;
use thiserror::Error;

use crate::record::{MessageType, UpdateRecord};

/// Domain name of the machine-readable news feed.
pub const NEWS_DOMAIN: &str = "NewsTextAnalytics";

/// Message type of incremental updates.
pub const UPDATE_TYPE: &str = "Update";

/// Errors raised while decoding feed messages.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The message is not valid JSON or lacks required fields.
    #[error("malformed feed message: {0}")]
    Json(#[from] serde_json::Error),
    /// An update arrived without a `FRAGMENT` field.
    #[error("update for story {guid} carries no fragment")]
    MissingFragment {
        /// GUID of the offending update.
        guid: String,
    },
    /// The `FRAGMENT` field is not valid base64.
    #[error("update for story {guid} carries an invalid fragment: {source}")]
    Base64 {
        /// GUID of the offending update.
        guid: String,
        /// Underlying base64 error.
        source: base64::DecodeError,
    },
}

/// Envelope of one streaming message.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateMessage {
    /// Message type, for example `Update` or `Refresh`.
    #[serde(rename = "Type", default)]
    pub kind: Option<String>,
    /// Data domain of the stream.
    #[serde(default)]
    pub domain: Option<String>,
    /// Feed fields, present on updates and refreshes.
    #[serde(default)]
    pub fields: Option<UpdateFields>,
}

/// Fields carried by a news-analytics update.
#[derive(Clone, Debug, Deserialize)]
pub struct UpdateFields {
    /// Story GUID.
    #[serde(rename = "GUID")]
    pub guid: String,
    /// Source identifier.
    #[serde(rename = "MRN_SRC")]
    pub source: String,
    /// Fragment sequence number.
    #[serde(rename = "FRAG_NUM", default)]
    pub fragment_seq: Option<u32>,
    /// Declared total payload size.
    #[serde(rename = "TOT_SIZE", default)]
    pub total_size: Option<usize>,
    /// Base64-encoded fragment bytes.
    #[serde(rename = "FRAGMENT", default)]
    pub fragment: Option<String>,
    /// Content type.
    #[serde(rename = "MRN_TYPE", default)]
    pub message_type: Option<String>,
    /// Major version.
    #[serde(rename = "MRN_V_MAJ", default)]
    pub version_major: Option<String>,
    /// Minor version.
    #[serde(rename = "MRN_V_MIN", default)]
    pub version_minor: Option<String>,
    /// Activation date.
    #[serde(rename = "ACTIV_DATE", default)]
    pub activation_date: Option<String>,
    /// Context identifier.
    #[serde(rename = "CONTEXT_ID", default)]
    pub context_id: Option<u64>,
}

impl UpdateMessage {
    /// Whether this message is a news-analytics update carrying fields.
    #[must_use]
    pub fn is_news_update(&self) -> bool {
        self.kind.as_deref().is_none_or(|kind| kind == UPDATE_TYPE)
            && self.domain.as_deref() == Some(NEWS_DOMAIN)
            && self.fields.is_some()
    }

    /// Convert the message into a record, or `None` when it is not a
    /// news-analytics update.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] when the fragment is missing or not base64.
    pub fn into_record(self) -> Result<Option<UpdateRecord>, FeedError> {
        if !self.is_news_update() {
            return Ok(None);
        }
        self.fields.map(UpdateRecord::try_from).transpose()
    }
}

impl TryFrom<UpdateFields> for UpdateRecord {
    type Error = FeedError;

    fn try_from(fields: UpdateFields) -> Result<Self, Self::Error> {
        let Some(encoded) = fields.fragment else {
            return Err(FeedError::MissingFragment { guid: fields.guid });
        };
        let fragment = match STANDARD.decode(encoded.as_bytes()) {
            Ok(bytes) => bytes,
            Err(source) => {
                return Err(FeedError::Base64 {
                    guid: fields.guid,
                    source,
                });
            }
        };

        Ok(Self {
            guid: fields.guid,
            source: fields.source,
            fragment_seq: fields.fragment_seq,
            total_size: fields.total_size.unwrap_or(0),
            fragment: fragment.into(),
            message_type: fields
                .message_type
                .as_deref()
                .map_or(MessageType::Story, MessageType::from_name),
            version_major: fields.version_major,
            version_minor: fields.version_minor,
            activation_date: fields.activation_date,
            context_id: fields.context_id,
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Batch {
    Many(Vec<UpdateMessage>),
    One(Box<UpdateMessage>),
}

/// Parse one streaming message into a record.
///
/// Returns `Ok(None)` for messages that are not news-analytics updates.
///
/// # Errors
///
/// Returns [`FeedError`] for malformed JSON or an unusable fragment.
///
/// # Examples
///
/// ```
/// use storyframe::feed::parse_update;
///
/// let text = r#"{"Type":"Update","Domain":"NewsTextAnalytics","Fields":{
///     "GUID":"G1","MRN_SRC":"S1","FRAG_NUM":1,"TOT_SIZE":3,
///     "FRAGMENT":"AQID","MRN_TYPE":"STORY"}}"#;
/// let record = parse_update(text).expect("valid").expect("news update");
/// assert_eq!(record.guid, "G1");
/// assert_eq!(&record.fragment[..], &[1, 2, 3]);
/// ```
pub fn parse_update(text: &str) -> Result<Option<UpdateRecord>, FeedError> {
    serde_json::from_str::<UpdateMessage>(text)?.into_record()
}

/// Parse a streaming payload holding one message or an array of messages.
///
/// Non-update messages are skipped.
///
/// # Errors
///
/// Returns [`FeedError`] for malformed JSON or the first unusable fragment.
pub fn parse_messages(text: &str) -> Result<Vec<UpdateRecord>, FeedError> {
    let messages = match serde_json::from_str::<Batch>(text)? {
        Batch::Many(messages) => messages,
        Batch::One(message) => vec![*message],
    };
    messages
        .into_iter()
        .filter_map(|message| message.into_record().transpose())
        .collect()
}
