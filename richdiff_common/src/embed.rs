//! Embed values: atomic, non-text content carried by an insert.
//!
//! On the wire an embed is a single-key object whose key names the embed
//! kind, e.g. `{"block-embed": {"uuid": "..."}}`. Each known kind has its own
//! payload type; fields a payload does not model are kept in `extra` so that
//! an embed survives a deserialize/serialize cycle unchanged.

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

pub const BLOCK_EMBED_TAG: &str = "block-embed";
pub const EMOJI_EMBED_TAG: &str = "emoji-embed";
pub const MENTION_TAG: &str = "mention";
pub const DOCUMENT_MENTION_TAG: &str = "document-mention";

/// Discriminant of an [`Embed`], handed to embed id resolvers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmbedKind {
    BlockEmbed,
    EmojiEmbed,
    Mention,
    DocumentMention,
    /// A kind this crate carries opaquely
    Other,
}

impl fmt::Display for EmbedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EmbedKind::BlockEmbed => BLOCK_EMBED_TAG,
            EmbedKind::EmojiEmbed => EMOJI_EMBED_TAG,
            EmbedKind::Mention => MENTION_TAG,
            EmbedKind::DocumentMention => DOCUMENT_MENTION_TAG,
            EmbedKind::Other => "other",
        };
        f.write_str(name)
    }
}

/// Data attached to a block embed by the embedding service
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedData {
    /// Service-side id, a string or a number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// Discussion threads anchored on this embed, in display order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_ids: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A block-level embed (link preview, image, cross-reference card)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockEmbed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// Stable logical identity of the embed across edits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_link: Option<String>,
    /// Display size; services use either a keyword or a dimensions object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embed_data: Option<EmbedData>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BlockEmbed {
    pub fn with_uuid(uuid: impl Into<String>) -> Self {
        Self {
            uuid: Some(uuid.into()),
            ..Default::default()
        }
    }

    /// Thread ids attached through `embedData`, if the field is present
    pub fn thread_ids(&self) -> Option<&[String]> {
        self.embed_data
            .as_ref()
            .and_then(|data| data.thread_ids.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmojiEmbed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Inline mention of a user
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Mention {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Inline mention of another document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DocumentMention {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An embed value: one variant per known kind, plus an opaque fallback
#[derive(Debug, Clone, PartialEq)]
pub enum Embed {
    BlockEmbed(BlockEmbed),
    EmojiEmbed(EmojiEmbed),
    Mention(Mention),
    DocumentMention(DocumentMention),
    Other { tag: String, value: Value },
}

impl Embed {
    pub fn kind(&self) -> EmbedKind {
        match self {
            Embed::BlockEmbed(_) => EmbedKind::BlockEmbed,
            Embed::EmojiEmbed(_) => EmbedKind::EmojiEmbed,
            Embed::Mention(_) => EmbedKind::Mention,
            Embed::DocumentMention(_) => EmbedKind::DocumentMention,
            Embed::Other { .. } => EmbedKind::Other,
        }
    }

    /// The wire key of this embed
    pub fn tag(&self) -> &str {
        match self {
            Embed::BlockEmbed(_) => BLOCK_EMBED_TAG,
            Embed::EmojiEmbed(_) => EMOJI_EMBED_TAG,
            Embed::Mention(_) => MENTION_TAG,
            Embed::DocumentMention(_) => DOCUMENT_MENTION_TAG,
            Embed::Other { tag, .. } => tag,
        }
    }

    pub fn as_block_embed(&self) -> Option<&BlockEmbed> {
        match self {
            Embed::BlockEmbed(block) => Some(block),
            _ => None,
        }
    }

    /// The payload as a JSON value, i.e. the value under the tag key
    pub fn payload(&self) -> Value {
        // Payload types only hold strings and JSON values, so conversion
        // cannot fail
        let converted = match self {
            Embed::BlockEmbed(p) => serde_json::to_value(p),
            Embed::EmojiEmbed(p) => serde_json::to_value(p),
            Embed::Mention(p) => serde_json::to_value(p),
            Embed::DocumentMention(p) => serde_json::to_value(p),
            Embed::Other { value, .. } => return value.clone(),
        };
        converted.unwrap_or(Value::Null)
    }

    /// The full tagged JSON value, `{tag: payload}`
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert(self.tag().to_string(), self.payload());
        Value::Object(map)
    }

    /// Build an embed from its tag and payload
    ///
    /// Known fields given as an explicit `null` are kept in `extra`, so the
    /// embed serializes back to the same JSON.
    pub fn from_parts(tag: &str, payload: Value) -> Result<Self, serde_json::Error> {
        let nulls = null_keys(&payload);
        let embed = match tag {
            BLOCK_EMBED_TAG => {
                let data_nulls = null_keys(payload.get("embedData").unwrap_or(&Value::Null));
                let mut block: BlockEmbed = serde_json::from_value(payload)?;
                keep_nulls(&mut block.extra, nulls);
                if let Some(data) = block.embed_data.as_mut() {
                    keep_nulls(&mut data.extra, data_nulls);
                }
                Embed::BlockEmbed(block)
            }
            EMOJI_EMBED_TAG => {
                let mut emoji: EmojiEmbed = serde_json::from_value(payload)?;
                keep_nulls(&mut emoji.extra, nulls);
                Embed::EmojiEmbed(emoji)
            }
            MENTION_TAG => {
                let mut mention: Mention = serde_json::from_value(payload)?;
                keep_nulls(&mut mention.extra, nulls);
                Embed::Mention(mention)
            }
            DOCUMENT_MENTION_TAG => {
                let mut mention: DocumentMention = serde_json::from_value(payload)?;
                keep_nulls(&mut mention.extra, nulls);
                Embed::DocumentMention(mention)
            }
            other => Embed::Other {
                tag: other.to_string(),
                value: payload,
            },
        };
        Ok(embed)
    }
}

/// Textual form of an id field: strings as-is, numbers in decimal
pub fn id_text(id: &Value) -> Option<String> {
    match id {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn null_keys(payload: &Value) -> Vec<String> {
    match payload {
        Value::Object(fields) => fields
            .iter()
            .filter(|(_, value)| value.is_null())
            .map(|(key, _)| key.clone())
            .collect(),
        _ => Vec::new(),
    }
}

// A null typed field deserializes to `None`; park it in `extra` instead.
fn keep_nulls(extra: &mut Map<String, Value>, keys: Vec<String>) {
    for key in keys {
        extra.entry(key).or_insert(Value::Null);
    }
}

impl From<BlockEmbed> for Embed {
    fn from(block: BlockEmbed) -> Self {
        Embed::BlockEmbed(block)
    }
}

impl Serialize for Embed {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            Embed::BlockEmbed(p) => map.serialize_entry(BLOCK_EMBED_TAG, p)?,
            Embed::EmojiEmbed(p) => map.serialize_entry(EMOJI_EMBED_TAG, p)?,
            Embed::Mention(p) => map.serialize_entry(MENTION_TAG, p)?,
            Embed::DocumentMention(p) => map.serialize_entry(DOCUMENT_MENTION_TAG, p)?,
            Embed::Other { tag, value } => map.serialize_entry(tag, value)?,
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Embed {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        if map.len() != 1 {
            return Err(D::Error::custom(format!(
                "embed must have exactly one type key, found {}",
                map.len()
            )));
        }
        let Some((tag, payload)) = map.into_iter().next() else {
            return Err(D::Error::custom("embed must have exactly one type key"));
        };
        Embed::from_parts(&tag, payload).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_block_embed_round_trip_keeps_unknown_fields() {
        let raw = json!({
            "block-embed": {
                "id": "e1",
                "uuid": "022",
                "service": "youtube",
                "originalLink": "https://example.com/v",
                "size": "large",
                "embedData": {"id": "d1", "threadIds": ["t1"], "title": "Video"},
                "caption": "hello"
            }
        });

        let embed: Embed = serde_json::from_value(raw.clone()).unwrap();
        let block = embed.as_block_embed().unwrap();
        assert_eq!(block.uuid.as_deref(), Some("022"));
        assert_eq!(block.original_link.as_deref(), Some("https://example.com/v"));
        assert_eq!(block.thread_ids(), Some(&["t1".to_string()][..]));
        assert_eq!(block.extra.get("caption"), Some(&json!("hello")));

        assert_eq!(serde_json::to_value(&embed).unwrap(), raw);
    }

    #[test]
    fn test_numeric_ids_are_accepted() {
        let raw = json!({"block-embed": {"uuid": "u", "id": 7, "embedData": {"id": 9}}});
        let embed: Embed = serde_json::from_value(raw.clone()).unwrap();
        let block = embed.as_block_embed().unwrap();
        assert_eq!(block.id, Some(json!(7)));
        assert_eq!(block.embed_data.as_ref().unwrap().id, Some(json!(9)));
        assert_eq!(embed.to_value(), raw);

        let mention: Embed =
            serde_json::from_value(json!({"mention": {"id": 42, "value": "Bob"}})).unwrap();
        assert_eq!(mention.payload(), json!({"id": 42, "value": "Bob"}));
    }

    #[test]
    fn test_id_text() {
        assert_eq!(id_text(&json!("m1")), Some("m1".to_string()));
        assert_eq!(id_text(&json!(42)), Some("42".to_string()));
        assert_eq!(id_text(&json!(true)), None);
        assert_eq!(id_text(&Value::Null), None);
    }

    #[test]
    fn test_explicit_nulls_survive_round_trip() {
        let raw = json!({"block-embed": {"uuid": "u", "size": null, "embedData": null}});
        let embed: Embed = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(embed.as_block_embed().unwrap().size, None);
        assert_eq!(serde_json::to_value(&embed).unwrap(), raw);

        let nested = json!({
            "block-embed": {"uuid": "u", "embedData": {"id": null, "threadIds": ["t"]}}
        });
        let embed: Embed = serde_json::from_value(nested.clone()).unwrap();
        assert_eq!(embed.to_value(), nested);

        let mention = json!({"mention": {"id": null}});
        let embed: Embed = serde_json::from_value(mention.clone()).unwrap();
        assert_eq!(embed.to_value(), mention);

        // Absent and null are different embeds
        let absent: Embed =
            serde_json::from_value(json!({"block-embed": {"uuid": "u"}})).unwrap();
        let null_size: Embed =
            serde_json::from_value(json!({"block-embed": {"uuid": "u", "size": null}})).unwrap();
        assert_ne!(absent, null_size);
    }

    #[test]
    fn test_unknown_kind_is_opaque() {
        let raw = json!({"formula": "e=mc^2"});
        let embed: Embed = serde_json::from_value(raw.clone()).unwrap();

        assert_eq!(embed.kind(), EmbedKind::Other);
        assert_eq!(embed.tag(), "formula");
        assert_eq!(embed.to_value(), raw);
    }

    #[test]
    fn test_embed_requires_single_key() {
        let err = serde_json::from_value::<Embed>(json!({"mention": {}, "emoji-embed": {}}));
        assert!(err.is_err());
        assert!(serde_json::from_value::<Embed>(json!({})).is_err());
    }

    #[test]
    fn test_kinds() {
        let mention: Embed = serde_json::from_value(json!({"mention": {"id": "u1"}})).unwrap();
        assert_eq!(mention.kind(), EmbedKind::Mention);
        assert_eq!(mention.kind().to_string(), "mention");

        let doc: Embed =
            serde_json::from_value(json!({"document-mention": {"id": "d9"}})).unwrap();
        assert_eq!(doc.kind(), EmbedKind::DocumentMention);
        assert_eq!(doc.payload(), json!({"id": "d9"}));
    }
}
