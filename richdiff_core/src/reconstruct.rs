//! Turning a word diff back into an edit script over the original ops.

use crate::cursor::OpCursor;
use crate::tokenizer::{END_TOKEN, START_TOKEN, UNRESOLVED_EMBED};
use crate::word_diff::{DiffChangeType, DiffSpan};
use richdiff_common::attributes;
use richdiff_common::{EditScript, Op, RichDiffError};
use std::collections::BTreeSet;
use tracing::trace;

/// Replay `spans` against the two documents they were computed from.
///
/// Kept runs become retains carrying the attribute changes between the two
/// sides. A kept run whose contents differ anyway (embeds that flattened to
/// the same token) is replaced by an insert of the new content followed by a
/// delete of the old. A trailing plain retain is dropped.
pub fn reconstruct(
    old: &[Op],
    new: &[Op],
    spans: &[DiffSpan],
    embed_ids: &BTreeSet<String>,
) -> Result<EditScript, RichDiffError> {
    let mut old_cursor = OpCursor::new(old);
    let mut new_cursor = OpCursor::new(new);
    let mut script = EditScript::new();

    for span in spans {
        let mut remaining = encoded_len(&span.value, embed_ids)?;

        match span.change_type {
            DiffChangeType::Insert => {
                while remaining > 0 {
                    let op = new_cursor
                        .take(remaining)
                        .ok_or_else(|| exhausted("new", remaining))?;
                    remaining = remaining.saturating_sub(op.len());
                    script.push(op);
                }
            }
            DiffChangeType::Delete => {
                while remaining > 0 {
                    let op = old_cursor
                        .take(remaining)
                        .ok_or_else(|| exhausted("old", remaining))?;
                    remaining = remaining.saturating_sub(op.len());
                    script.delete(op.len());
                }
            }
            DiffChangeType::Equal => {
                while remaining > 0 {
                    let len = remaining
                        .min(old_cursor.peek_len())
                        .min(new_cursor.peek_len());
                    let old_op = old_cursor
                        .take(len)
                        .ok_or_else(|| exhausted("old", remaining))?;
                    let new_op = new_cursor
                        .take(len)
                        .ok_or_else(|| exhausted("new", remaining))?;
                    if old_op.len() != new_op.len() {
                        return Err(RichDiffError::InvalidInput(format!(
                            "kept run split unevenly: {} old units against {} new units",
                            old_op.len(),
                            new_op.len()
                        )));
                    }
                    remaining = remaining.saturating_sub(len);

                    if old_op.content() == new_op.content() {
                        script.push(Op::Retain {
                            length: len,
                            attributes: attributes::diff(old_op.attributes(), new_op.attributes()),
                        });
                    } else {
                        trace!("Kept run of {} units differs in content, replacing", len);
                        script.push(new_op);
                        script.delete(len);
                    }
                }
            }
        }
    }

    script.chop();
    Ok(script)
}

/// Document length of a span value: one unit per embed token or placeholder,
/// UTF-16 units for everything else
fn encoded_len(value: &str, embed_ids: &BTreeSet<String>) -> Result<usize, RichDiffError> {
    let mut units = 0;
    let mut chars = value.chars();

    while let Some(ch) = chars.next() {
        if ch == START_TOKEN {
            let id: String = chars.by_ref().take_while(|c| *c != END_TOKEN).collect();
            if !embed_ids.contains(&id) {
                return Err(RichDiffError::InvalidInput(format!(
                    "diff refers to unknown embed id '{}'",
                    id
                )));
            }
            units += 1;
        } else if ch == UNRESOLVED_EMBED {
            units += 1;
        } else {
            units += ch.len_utf16();
        }
    }

    Ok(units)
}

fn exhausted(side: &str, remaining: usize) -> RichDiffError {
    RichDiffError::InvalidInput(format!(
        "diff does not match the {} document: {} units past its end",
        side, remaining
    ))
}
