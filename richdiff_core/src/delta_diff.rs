use crate::reconstruct::reconstruct;
use crate::tokenizer::{flatten, EmbedIdResolver, UuidResolver};
use crate::word_diff::word_diff;
use richdiff_common::{AppConfig, Document, EditScript, RichDiffError};
use tracing::debug;

/// Compute the edit script that turns `old` into `new`.
///
/// Both arguments must be documents (inserts only); anything else is
/// `InvalidInput`. When a resolver is given, embeds are matched by the id it
/// returns; otherwise every embed is compared by content only.
pub fn diff(
    old: &Document,
    new: &Document,
    resolver: Option<&dyn EmbedIdResolver>,
) -> Result<EditScript, RichDiffError> {
    let old_flat = flatten(old.ops(), resolver)?;
    let new_flat = flatten(new.ops(), resolver)?;

    let spans = word_diff(&old_flat.text, &new_flat.text);

    let mut embed_ids = old_flat.embed_ids;
    embed_ids.extend(new_flat.embed_ids);

    let script = reconstruct(old.ops(), new.ops(), &spans, &embed_ids)?;
    debug!(
        "Diffed {} old ops against {} new ops into {} edit ops",
        old.len(),
        new.len(),
        script.len()
    );
    Ok(script)
}

/// Rich-text diff engine with an optional embed id resolver
pub struct DeltaDiffEngine {
    resolver: Option<Box<dyn EmbedIdResolver + Send + Sync>>,
}

impl DeltaDiffEngine {
    /// Engine that leaves every embed unresolved
    pub fn new() -> Self {
        Self { resolver: None }
    }

    pub fn with_resolver<R>(resolver: R) -> Self
    where
        R: EmbedIdResolver + Send + Sync + 'static,
    {
        Self {
            resolver: Some(Box::new(resolver)),
        }
    }

    /// Engine configured from application settings
    pub fn from_config(config: &AppConfig) -> Self {
        if config.resolve_embed_ids {
            Self::with_resolver(UuidResolver)
        } else {
            Self::new()
        }
    }

    pub fn resolves_embeds(&self) -> bool {
        self.resolver.is_some()
    }

    pub fn diff(&self, old: &Document, new: &Document) -> Result<EditScript, RichDiffError> {
        let resolver = self
            .resolver
            .as_deref()
            .map(|resolver| resolver as &dyn EmbedIdResolver);
        diff(old, new, resolver)
    }
}

impl Default for DeltaDiffEngine {
    fn default() -> Self {
        Self::new()
    }
}
