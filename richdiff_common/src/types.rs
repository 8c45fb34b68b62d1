use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Resolve embed ids (block embed uuids, mention ids) before diffing so
    /// that embeds are matched by identity instead of position
    #[serde(default = "default_true")]
    pub resolve_embed_ids: bool,

    /// Pretty-print JSON output
    #[serde(default)]
    pub pretty_output: bool,

    /// Enable portable mode (config alongside binary)
    #[serde(default)]
    pub portable_mode: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            resolve_embed_ids: true,
            pretty_output: false,
            portable_mode: false,
        }
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: AppConfig = toml::from_str("pretty_output = true").unwrap();
        assert!(config.resolve_embed_ids);
        assert!(config.pretty_output);
        assert!(!config.portable_mode);
    }
}
