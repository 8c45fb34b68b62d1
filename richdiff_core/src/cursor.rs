use richdiff_common::text::{split_at_utf16, utf16_len};
use richdiff_common::{InsertContent, Op};

/// Walks a list of ops, handing out pieces of at most a requested length.
///
/// Text inserts are split on demand; the piece keeps the attributes of the
/// op it was cut from. Embeds are never split.
#[derive(Debug, Clone)]
pub struct OpCursor<'a> {
    ops: &'a [Op],
    index: usize,
    /// Units of the current op already handed out
    offset: usize,
    /// Byte position matching `offset` when the current op is text
    byte_offset: usize,
}

impl<'a> OpCursor<'a> {
    pub fn new(ops: &'a [Op]) -> Self {
        let mut cursor = Self {
            ops,
            index: 0,
            offset: 0,
            byte_offset: 0,
        };
        cursor.skip_empty();
        cursor
    }

    pub fn has_next(&self) -> bool {
        self.index < self.ops.len()
    }

    /// Units left in the current op, 0 once the cursor is exhausted
    pub fn peek_len(&self) -> usize {
        self.ops
            .get(self.index)
            .map(|op| op.len() - self.offset)
            .unwrap_or(0)
    }

    /// Take up to `max` units from the current op; `None` when exhausted or
    /// when `max` is 0
    pub fn take(&mut self, max: usize) -> Option<Op> {
        if max == 0 {
            return None;
        }
        let op = self.ops.get(self.index)?;
        let wanted = max.min(op.len() - self.offset);

        let (piece, units, bytes) = match op {
            Op::Insert {
                content: InsertContent::Text(text),
                attributes,
            } => {
                let (head, _) = split_at_utf16(&text[self.byte_offset..], wanted);
                let piece = Op::Insert {
                    content: InsertContent::Text(head.to_string()),
                    attributes: attributes.clone(),
                };
                (piece, utf16_len(head), head.len())
            }
            Op::Insert { .. } => (op.clone(), 1, 0),
            Op::Retain { attributes, .. } => (
                Op::Retain {
                    length: wanted,
                    attributes: attributes.clone(),
                },
                wanted,
                0,
            ),
            Op::Delete { .. } => (Op::Delete { length: wanted }, wanted, 0),
        };

        self.offset += units;
        self.byte_offset += bytes;
        if self.offset >= op.len() {
            self.index += 1;
            self.offset = 0;
            self.byte_offset = 0;
            self.skip_empty();
        }
        Some(piece)
    }

    fn skip_empty(&mut self) {
        while self.ops.get(self.index).is_some_and(Op::is_empty) {
            self.index += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use richdiff_common::{AttributeMap, BlockEmbed, Embed};
    use serde_json::json;

    #[test]
    fn test_splits_text_and_keeps_attributes() {
        let mut bold = AttributeMap::new();
        bold.insert("bold".into(), json!(true));
        let ops = vec![Op::insert_with("Hello world", bold.clone())];

        let mut cursor = OpCursor::new(&ops);
        assert_eq!(cursor.peek_len(), 11);
        assert_eq!(cursor.take(5), Some(Op::insert_with("Hello", bold.clone())));
        assert_eq!(cursor.peek_len(), 6);
        assert_eq!(cursor.take(100), Some(Op::insert_with(" world", bold)));
        assert!(!cursor.has_next());
        assert_eq!(cursor.take(1), None);
        assert_eq!(cursor.peek_len(), 0);
    }

    #[test]
    fn test_walks_across_ops() {
        let embed = Embed::BlockEmbed(BlockEmbed::with_uuid("u"));
        let ops = vec![Op::insert("ab"), Op::insert(embed.clone()), Op::insert("c")];

        let mut cursor = OpCursor::new(&ops);
        assert_eq!(cursor.take(3), Some(Op::insert("ab")));
        assert_eq!(cursor.peek_len(), 1);
        assert_eq!(cursor.take(3), Some(Op::insert(embed)));
        assert_eq!(cursor.take(3), Some(Op::insert("c")));
        assert!(!cursor.has_next());
    }

    #[test]
    fn test_counts_utf16_units() {
        let ops = vec![Op::insert("😀ab")];
        let mut cursor = OpCursor::new(&ops);

        assert_eq!(cursor.peek_len(), 4);
        assert_eq!(cursor.take(2), Some(Op::insert("😀")));
        assert_eq!(cursor.take(1), Some(Op::insert("a")));
        assert_eq!(cursor.take(1), Some(Op::insert("b")));
    }

    #[test]
    fn test_skips_empty_inserts() {
        let ops = vec![Op::insert(""), Op::insert("x"), Op::insert("")];
        let mut cursor = OpCursor::new(&ops);

        assert_eq!(cursor.take(5), Some(Op::insert("x")));
        assert!(!cursor.has_next());
    }

    #[test]
    fn test_retain_and_delete_pieces() {
        let ops = vec![Op::retain(4), Op::delete(3)];
        let mut cursor = OpCursor::new(&ops);

        assert_eq!(cursor.take(3), Some(Op::retain(3)));
        assert_eq!(cursor.take(3), Some(Op::retain(1)));
        assert_eq!(cursor.take(2), Some(Op::delete(2)));
        assert_eq!(cursor.take(2), Some(Op::delete(1)));
    }
}
