//! Payload decompression and parsing.
//!
//! Story payloads travel gzip-compressed. Once an assembly completes, its
//! bytes are inflated into UTF-8 JSON and parsed according to the content
//! type carried by the update. All functions here are pure.

use std::io::{self, Read, Write};

use flate2::{Compression, read::GzDecoder, write::GzEncoder};

use crate::{
    error::DecodeError,
    record::MessageType,
    story::{EmittedItem, StoryDocument},
};

/// Inflate a gzip payload into UTF-8 text.
///
/// # Errors
///
/// Returns [`DecodeError::Decompress`] for a malformed gzip stream and
/// [`DecodeError::Utf8`] when the inflated bytes are not UTF-8.
///
/// # Examples
///
/// ```
/// use storyframe::decoder::{decode, encode};
///
/// let packed = encode(r#"{"id":"1"}"#).expect("compress");
/// assert_eq!(decode(&packed).expect("decompress"), r#"{"id":"1"}"#);
/// ```
pub fn decode(payload: &[u8]) -> Result<String, DecodeError> {
    let mut decoder = GzDecoder::new(payload);
    let mut inflated = Vec::new();
    decoder.read_to_end(&mut inflated)?;
    Ok(String::from_utf8(inflated)?)
}

/// Compress `text` into a gzip payload.
///
/// # Errors
///
/// Returns any I/O error raised by the encoder.
pub fn encode(text: &str) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes())?;
    encoder.finish()
}

/// Decode a complete payload into the item handed to consumers.
///
/// Story payloads parse into [`StoryDocument`]; anything else parses into a
/// generic JSON value and passes through unchanged.
///
/// # Errors
///
/// Returns a [`DecodeError`] when decompression or JSON parsing fails.
pub fn decode_item(message_type: &MessageType, payload: &[u8]) -> Result<EmittedItem, DecodeError> {
    let text = decode(payload)?;
    if message_type.is_story() {
        let story: StoryDocument = serde_json::from_str(&text)?;
        Ok(EmittedItem::Story(story))
    } else {
        Ok(EmittedItem::Document {
            message_type: message_type.clone(),
            json: serde_json::from_str(&text)?,
        })
    }
}
