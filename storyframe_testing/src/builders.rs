//! Builders for stories, fragment runs and feed messages.

use base64::{Engine, engine::general_purpose::STANDARD};
use serde_json::json;
use storyframe::{StoryDocument, UpdateRecord, decoder, feed::NEWS_DOMAIN};

/// Build a story with the four required fields populated.
///
/// The alternate id is derived from `id` as `alt-{id}`.
#[must_use]
pub fn story(id: &str, headline: &str, body: &str) -> StoryDocument {
    StoryDocument {
        id: id.to_owned(),
        alt_id: format!("alt-{id}"),
        headline: headline.to_owned(),
        body: body.to_owned(),
        ..StoryDocument::default()
    }
}

/// Serialise and gzip `story` the way the feed delivers it.
///
/// # Panics
///
/// Panics if the story cannot be serialised or compressed.
#[must_use]
pub fn story_payload(story: &StoryDocument) -> Vec<u8> {
    let text = serde_json::to_string(story).expect("story serialises");
    decoder::encode(&text).expect("story compresses")
}

/// Split `payload` into records of at most `chunk` bytes.
///
/// Sequence numbers start at 1 and only the first record declares the total
/// size, matching what the feed sends.
#[must_use]
pub fn fragment(guid: &str, source: &str, payload: &[u8], chunk: usize) -> Vec<UpdateRecord> {
    payload
        .chunks(chunk.max(1))
        .zip(1_u32..)
        .map(|(bytes, seq)| {
            let record = UpdateRecord::new(guid, source, bytes.to_vec()).with_fragment_seq(seq);
            if seq == 1 {
                record.with_total_size(payload.len())
            } else {
                record
            }
        })
        .collect()
}

/// Render `record` as a streaming `Update` message.
#[must_use]
pub fn feed_update_json(record: &UpdateRecord) -> String {
    let mut fields = json!({
        "GUID": record.guid,
        "MRN_SRC": record.source,
        "FRAGMENT": STANDARD.encode(&record.fragment),
        "MRN_TYPE": record.message_type.as_str(),
    });
    if let Some(seq) = record.fragment_seq {
        fields["FRAG_NUM"] = json!(seq);
    }
    if record.total_size > 0 {
        fields["TOT_SIZE"] = json!(record.total_size);
    }
    json!({
        "Type": "Update",
        "Domain": NEWS_DOMAIN,
        "Fields": fields,
    })
    .to_string()
}
