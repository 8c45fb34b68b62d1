//! Flattening of documents into a single diffable string.
//!
//! Text runs are copied verbatim. Each embed becomes exactly one atomic token:
//! either `START_TOKEN id END_TOKEN` when its id can be resolved, or the lone
//! [`UNRESOLVED_EMBED`] character otherwise.

use regex::Regex;
use richdiff_common::{EmbedKind, InsertContent, Op, RichDiffError};
use std::collections::BTreeSet;
use std::sync::LazyLock;
use tracing::trace;

/// Opens a resolved embed token
pub const START_TOKEN: char = '\u{2}';
/// Closes a resolved embed token
pub const END_TOKEN: char = '\u{3}';
/// Stands in for an embed whose id could not be resolved
pub const UNRESOLVED_EMBED: char = '\u{1A}';

static NON_ID_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_]").unwrap());

/// Supplies a stable identifier for an embed, used to match embeds between
/// two documents. Returning `None` leaves the embed unresolved.
pub trait EmbedIdResolver {
    fn resolve(&self, kind: EmbedKind, op: &Op) -> Option<String>;
}

impl<F> EmbedIdResolver for F
where
    F: Fn(EmbedKind, &Op) -> Option<String>,
{
    fn resolve(&self, kind: EmbedKind, op: &Op) -> Option<String> {
        self(kind, op)
    }
}

/// Resolves block embeds by `uuid` and the other typed kinds by `id`, which
/// may be a string or a number. Opaque embed kinds stay unresolved.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidResolver;

impl EmbedIdResolver for UuidResolver {
    fn resolve(&self, kind: EmbedKind, op: &Op) -> Option<String> {
        use richdiff_common::{id_text, Embed};

        match op.embed()? {
            Embed::BlockEmbed(block) => block.uuid.clone(),
            Embed::EmojiEmbed(emoji) => emoji.id.as_ref().and_then(id_text),
            Embed::Mention(mention) => mention.id.as_ref().and_then(id_text),
            Embed::DocumentMention(mention) => mention.id.as_ref().and_then(id_text),
            Embed::Other { .. } => {
                trace!("No id for embed kind {}", kind);
                None
            }
        }
    }
}

/// A document flattened to text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flattened {
    pub text: String,
    /// Sanitized ids of every resolved embed
    pub embed_ids: BTreeSet<String>,
}

/// Strip everything outside `[A-Za-z0-9_]` from an embed id
pub fn sanitize_id(id: &str) -> String {
    NON_ID_CHARS.replace_all(id, "").into_owned()
}

/// Flatten `document` into text plus the set of embed ids seen.
///
/// Fails with `InvalidInput` if any op is not an insert, or if text contains
/// one of the embed marker characters.
pub fn flatten(
    document: &[Op],
    resolver: Option<&dyn EmbedIdResolver>,
) -> Result<Flattened, RichDiffError> {
    let mut flattened = Flattened::default();

    for (index, op) in document.iter().enumerate() {
        let Op::Insert { content, .. } = op else {
            return Err(RichDiffError::InvalidInput(format!(
                "expected a document of inserts, found {} at op {}",
                op.kind_name(),
                index
            )));
        };

        match content {
            InsertContent::Text(text) => {
                if text.contains([START_TOKEN, END_TOKEN]) {
                    return Err(RichDiffError::InvalidInput(format!(
                        "text at op {} contains a reserved embed marker character",
                        index
                    )));
                }
                flattened.text.push_str(text);
            }
            InsertContent::Embed(embed) => {
                let id = resolver
                    .and_then(|resolver| resolver.resolve(embed.kind(), op))
                    .map(|id| sanitize_id(&id))
                    .filter(|id| !id.is_empty());

                match id {
                    Some(id) => {
                        flattened.text.push(START_TOKEN);
                        flattened.text.push_str(&id);
                        flattened.text.push(END_TOKEN);
                        flattened.embed_ids.insert(id);
                    }
                    None => flattened.text.push(UNRESOLVED_EMBED),
                }
            }
        }
    }

    trace!(
        "Flattened {} ops into {} bytes with {} embed ids",
        document.len(),
        flattened.text.len(),
        flattened.embed_ids.len()
    );
    Ok(flattened)
}

#[cfg(test)]
mod tests {
    use super::*;
    use richdiff_common::{BlockEmbed, Embed};
    use serde_json::json;

    fn block(uuid: &str) -> Op {
        Op::insert(Embed::BlockEmbed(BlockEmbed::with_uuid(uuid)))
    }

    #[test]
    fn test_text_is_copied_verbatim() {
        let doc = vec![Op::insert("Hello "), Op::insert("world\n")];
        let flat = flatten(&doc, None).unwrap();
        assert_eq!(flat.text, "Hello world\n");
        assert!(flat.embed_ids.is_empty());
    }

    #[test]
    fn test_embeds_without_resolver_are_placeholders() {
        let doc = vec![Op::insert("a"), block("u-1"), Op::insert("b")];
        let flat = flatten(&doc, None).unwrap();
        assert_eq!(flat.text, format!("a{UNRESOLVED_EMBED}b"));
    }

    #[test]
    fn test_resolved_embeds_are_sanitized_tokens() {
        let doc = vec![block("abc-123 x!"), Op::insert("t")];
        let flat = flatten(&doc, Some(&UuidResolver)).unwrap();

        assert_eq!(flat.text, format!("{START_TOKEN}abc123x{END_TOKEN}t"));
        assert!(flat.embed_ids.contains("abc123x"));
    }

    #[test]
    fn test_resolver_closure_can_decline() {
        let resolver = |kind: EmbedKind, _op: &Op| match kind {
            EmbedKind::Mention => Some("m".to_string()),
            _ => None,
        };
        let mention: Embed = serde_json::from_value(json!({"mention": {"id": "x"}})).unwrap();
        let doc = vec![block("u"), Op::insert(mention)];

        let flat = flatten(&doc, Some(&resolver)).unwrap();
        assert_eq!(flat.text, format!("{UNRESOLVED_EMBED}{START_TOKEN}m{END_TOKEN}"));
    }

    #[test]
    fn test_numeric_mention_id_resolves() {
        let mention: Embed =
            serde_json::from_value(json!({"mention": {"id": 42, "value": "Bob"}})).unwrap();
        let doc = vec![Op::insert("hi "), Op::insert(mention)];

        let flat = flatten(&doc, Some(&UuidResolver)).unwrap();
        assert_eq!(flat.text, format!("hi {START_TOKEN}42{END_TOKEN}"));
    }

    #[test]
    fn test_id_that_sanitizes_to_nothing_is_unresolved() {
        let doc = vec![block("---")];
        let flat = flatten(&doc, Some(&UuidResolver)).unwrap();
        assert_eq!(flat.text, UNRESOLVED_EMBED.to_string());
        assert!(flat.embed_ids.is_empty());
    }

    #[test]
    fn test_non_insert_is_invalid_input() {
        let script = vec![Op::insert("a"), Op::retain(3)];
        let err = flatten(&script, None).unwrap_err();
        assert!(matches!(err, RichDiffError::InvalidInput(_)));
        assert!(err.to_string().contains("retain at op 1"));
    }

    #[test]
    fn test_reserved_marker_in_text_is_invalid_input() {
        let doc = vec![Op::insert(format!("a{START_TOKEN}b"))];
        assert!(matches!(
            flatten(&doc, None),
            Err(RichDiffError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_sanitize_id() {
        assert_eq!(sanitize_id("0a1b-2c3d_ef"), "0a1b2c3d_ef");
        assert_eq!(sanitize_id("é!"), "");
    }
}
