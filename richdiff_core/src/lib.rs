pub mod apply;
pub mod classifier;
pub mod cursor;
pub mod delta_diff;
pub mod myers;
pub mod reconstruct;
pub mod structural_diff;
pub mod tokenizer;
pub mod word_diff;

pub use apply::apply;
pub use classifier::{contains_changes, is_comment_only_change};
pub use delta_diff::{diff, DeltaDiffEngine};
pub use structural_diff::{embed_diff, structural_diff, FieldChange, FieldDiff};
pub use tokenizer::{EmbedIdResolver, UuidResolver};
pub use word_diff::{word_diff, DiffChangeType, DiffSpan};
