use crate::cursor::OpCursor;
use richdiff_common::attributes;
use richdiff_common::{Document, EditScript, Op, RichDiffError};

/// Apply `script` to `document`.
///
/// Inserts add content, retains copy content forward while layering their
/// attributes on top (a `null` attribute clears the key), deletes drop
/// content. Whatever the script does not reach is copied unchanged.
pub fn apply(document: &Document, script: &EditScript) -> Result<Document, RichDiffError> {
    if let Some((index, op)) = document.iter().enumerate().find(|(_, op)| !op.is_insert()) {
        return Err(RichDiffError::InvalidInput(format!(
            "cannot apply to a non-document: found {} at op {}",
            op.kind_name(),
            index
        )));
    }

    let mut cursor = OpCursor::new(document.ops());
    let mut result = Document::new();

    for op in script {
        match op {
            Op::Insert { .. } => {
                result.push(op.clone());
            }
            Op::Retain { length, attributes } => {
                let mut remaining = *length;
                while remaining > 0 {
                    let piece = cursor
                        .take(remaining)
                        .ok_or_else(|| past_end("retain", remaining))?;
                    remaining = remaining.saturating_sub(piece.len());

                    if let Op::Insert {
                        content,
                        attributes: existing,
                    } = piece
                    {
                        result.push(Op::Insert {
                            content,
                            attributes: attributes::compose(existing.as_ref(), attributes.as_ref()),
                        });
                    }
                }
            }
            Op::Delete { length } => {
                let mut remaining = *length;
                while remaining > 0 {
                    let piece = cursor
                        .take(remaining)
                        .ok_or_else(|| past_end("delete", remaining))?;
                    remaining = remaining.saturating_sub(piece.len());
                }
            }
        }
    }

    while let Some(rest) = cursor.take(usize::MAX) {
        result.push(rest);
    }

    Ok(result)
}

fn past_end(kind: &str, remaining: usize) -> RichDiffError {
    RichDiffError::InvalidInput(format!(
        "{} runs {} units past the end of the document",
        kind, remaining
    ))
}
