//! Classification of single edit scripts.

use crate::structural_diff::{embed_diff, FieldChange};
use richdiff_common::{Document, EditScript, Embed, Op};
use tracing::trace;

/// True when the script inserts or deletes anything.
///
/// Scripts made only of retains, formatting retains included, change no
/// content.
pub fn contains_changes(script: &EditScript) -> bool {
    script.iter().any(|op| op.is_insert() || op.is_delete())
}

/// True when the script does nothing but attach discussion threads to a
/// block embed already present in `baseline`.
///
/// The script must be exactly `retain n`, an insert of a block embed carrying
/// `embedData.threadIds`, and `delete 1`. The inserted embed must share its
/// `uuid` with a block embed of the baseline, and comparing the two may show
/// no change other than `embedData.threadIds`. Any other shape is not a
/// comment-only change.
pub fn is_comment_only_change(baseline: &Document, script: &EditScript) -> bool {
    let [Op::Retain {
        attributes: None, ..
    }, insert @ Op::Insert { .. }, Op::Delete { length: 1 }] = script.ops()
    else {
        return false;
    };

    let Some(new_embed) = insert.embed() else {
        return false;
    };
    let Some(new_block) = new_embed.as_block_embed() else {
        return false;
    };
    if new_block.thread_ids().is_none() {
        return false;
    }
    let Some(uuid) = new_block.uuid.as_deref() else {
        return false;
    };

    let Some(baseline_op) = find_block_embed(baseline, uuid) else {
        trace!("No baseline embed with uuid {}", uuid);
        return false;
    };
    if baseline_op.attributes() != insert.attributes() {
        return false;
    }
    let Some(old_embed) = baseline_op.embed() else {
        return false;
    };

    only_thread_ids_changed(old_embed, new_embed)
}

/// First op of `document` inserting a block embed with the given uuid
fn find_block_embed<'a>(document: &'a Document, uuid: &str) -> Option<&'a Op> {
    document.iter().find(|op| {
        op.embed()
            .and_then(Embed::as_block_embed)
            .and_then(|block| block.uuid.as_deref())
            == Some(uuid)
    })
}

fn only_thread_ids_changed(old: &Embed, new: &Embed) -> bool {
    let diff = embed_diff(old, new);
    let Some(("embedData", FieldChange::Nested(embed_data))) = diff.single_field() else {
        return false;
    };
    matches!(embed_data.single_field(), Some(("threadIds", _)))
}
