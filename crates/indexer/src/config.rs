//! Indexer configuration.

/// Default bound on nested trigger cascades.
pub const DEFAULT_MAX_TRIGGER_DEPTH: usize = 32;

/// Tunables for an [`Indexer`](crate::Indexer).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexerConfig {
    /// Deepest allowed chain of triggers firing triggers.
    pub max_trigger_depth: usize,
    /// Whether projected trigger output is written into the view table.
    pub materialize_views: bool,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            max_trigger_depth: DEFAULT_MAX_TRIGGER_DEPTH,
            materialize_views: true,
        }
    }
}

impl IndexerConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the cascade depth bound.
    pub fn with_max_trigger_depth(mut self, depth: usize) -> Self {
        self.max_trigger_depth = depth;
        self
    }

    /// Enables or disables view materialization.
    pub fn with_materialize_views(mut self, enabled: bool) -> Self {
        self.materialize_views = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_setters() {
        let config = IndexerConfig::default();
        assert_eq!(config.max_trigger_depth, 32);
        assert!(config.materialize_views);

        let config = IndexerConfig::new()
            .with_max_trigger_depth(4)
            .with_materialize_views(false);
        assert_eq!(config.max_trigger_depth, 4);
        assert!(!config.materialize_views);
    }
}
