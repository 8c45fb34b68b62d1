//! Word-level diff over flattened document text.

use crate::myers::{self, EditTag};
use crate::tokenizer::{END_TOKEN, START_TOKEN, UNRESOLVED_EMBED};
use serde::Serialize;
use tracing::debug;

/// Kind of a diff span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffChangeType {
    Equal,
    Insert,
    Delete,
}

/// A run of text that is kept, inserted or deleted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffSpan {
    pub change_type: DiffChangeType,
    pub value: String,
}

impl DiffSpan {
    pub fn new(change_type: DiffChangeType, value: impl Into<String>) -> Self {
        Self {
            change_type,
            value: value.into(),
        }
    }
}

/// Characters that always stand alone as one token
fn is_single_char_token(ch: char) -> bool {
    matches!(
        ch,
        '(' | ')' | '[' | ']' | '{' | '}' | '\'' | '"' | '\r' | '\n'
    ) || ch == UNRESOLVED_EMBED
        || ch == END_TOKEN
}

fn is_horizontal_space(ch: char) -> bool {
    ch.is_whitespace() && ch != '\r' && ch != '\n'
}

fn is_ascii_word(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Latin letters, including the accented and extended ranges, minus the
/// spacing modifiers that behave like punctuation
fn is_extended_word_char(ch: char) -> bool {
    matches!(ch,
        'A'..='Z'
        | 'a'..='z'
        | '\u{C0}'..='\u{2C6}'
        | '\u{2C8}'..='\u{2D7}'
        | '\u{2DE}'..='\u{2FF}'
        | '\u{1E00}'..='\u{1EFF}')
}

fn is_extended_word(token: &str) -> bool {
    !token.is_empty() && token.chars().all(is_extended_word_char)
}

/// Split text into diff tokens.
///
/// Embed tokens, whitespace runs and brackets/quotes/line breaks stand alone.
/// Remaining text is split at ASCII word boundaries, after which neighbouring
/// pieces made only of Latin letters are joined again so that accented words
/// stay whole.
pub fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut rest = text;

    while let Some(first) = rest.chars().next() {
        let len = if first == START_TOKEN {
            // Whole embed token, or the lone marker if it is never closed
            rest.find(END_TOKEN)
                .map(|end| end + END_TOKEN.len_utf8())
                .unwrap_or(first.len_utf8())
        } else if is_single_char_token(first) {
            first.len_utf8()
        } else if is_horizontal_space(first) {
            rest.find(|c: char| !is_horizontal_space(c))
                .unwrap_or(rest.len())
        } else {
            let end = rest
                .find(|c: char| {
                    c == START_TOKEN || is_single_char_token(c) || is_horizontal_space(c)
                })
                .unwrap_or(rest.len());
            split_words(&rest[..end], &mut tokens);
            rest = &rest[end..];
            continue;
        };

        let (token, tail) = rest.split_at(len);
        tokens.push(token);
        rest = tail;
    }

    tokens
}

/// Split a run of word/punctuation text at ASCII word boundaries, merging
/// extended-Latin neighbours
fn split_words<'a>(segment: &'a str, tokens: &mut Vec<&'a str>) {
    let mut pending: Option<(usize, usize)> = None;
    let mut start = 0;

    let mut flush = |piece: (usize, usize), pending: &mut Option<(usize, usize)>| {
        match *pending {
            Some((p_start, p_end))
                if is_extended_word(&segment[p_start..p_end])
                    && is_extended_word(&segment[piece.0..piece.1]) =>
            {
                *pending = Some((p_start, piece.1));
            }
            Some((p_start, p_end)) => {
                tokens.push(&segment[p_start..p_end]);
                *pending = Some(piece);
            }
            None => *pending = Some(piece),
        }
    };

    let mut chars = segment.char_indices().peekable();
    while let Some((_, ch)) = chars.next() {
        let boundary = match chars.peek() {
            Some(&(next_idx, next)) if is_ascii_word(next) != is_ascii_word(ch) => Some(next_idx),
            Some(_) => None,
            None => Some(segment.len()),
        };
        if let Some(end) = boundary {
            flush((start, end), &mut pending);
            start = end;
        }
    }

    if let Some((p_start, p_end)) = pending {
        tokens.push(&segment[p_start..p_end]);
    }
}

/// Diff two flattened texts word by word.
///
/// Within each changed region the inserted text is reported before the
/// deleted text; adjacent spans of one kind are merged.
pub fn word_diff(old_text: &str, new_text: &str) -> Vec<DiffSpan> {
    let old_tokens = tokenize(old_text);
    let new_tokens = tokenize(new_text);
    let tags = myers::diff_by(&old_tokens, &new_tokens, |a, b| a == b);

    let mut spans: Vec<DiffSpan> = Vec::new();
    let mut inserted = String::new();
    let mut deleted = String::new();
    let (mut old_idx, mut new_idx) = (0, 0);

    for tag in tags {
        match tag {
            EditTag::Insert => {
                inserted.push_str(new_tokens[new_idx]);
                new_idx += 1;
            }
            EditTag::Delete => {
                deleted.push_str(old_tokens[old_idx]);
                old_idx += 1;
            }
            EditTag::Equal => {
                flush_hunk(&mut spans, &mut inserted, &mut deleted);
                push_span(&mut spans, DiffChangeType::Equal, old_tokens[old_idx]);
                old_idx += 1;
                new_idx += 1;
            }
        }
    }
    flush_hunk(&mut spans, &mut inserted, &mut deleted);

    debug!(
        "Word diff: {} old tokens, {} new tokens, {} spans",
        old_tokens.len(),
        new_tokens.len(),
        spans.len()
    );
    spans
}

fn flush_hunk(spans: &mut Vec<DiffSpan>, inserted: &mut String, deleted: &mut String) {
    if !inserted.is_empty() {
        push_span(spans, DiffChangeType::Insert, inserted);
        inserted.clear();
    }
    if !deleted.is_empty() {
        push_span(spans, DiffChangeType::Delete, deleted);
        deleted.clear();
    }
}

fn push_span(spans: &mut Vec<DiffSpan>, change_type: DiffChangeType, value: &str) {
    match spans.last_mut() {
        Some(last) if last.change_type == change_type => last.value.push_str(value),
        _ => spans.push(DiffSpan::new(change_type, value)),
    }
}
