//! Top-level pipeline configuration.

use dendrite_core::ChunkingConfig;
use dendrite_parsers::ParserRegistry;

/// Configuration for a [`Pipeline`](crate::Pipeline): the chunking settings
/// plus the ordered parser list.
///
/// Parsers are consulted in order, so registering a custom parser ahead of
/// the defaults overrides them for the types it claims.
pub struct DendriteConfig {
    pub chunking: ChunkingConfig,
    pub parsers: ParserRegistry,
}

impl DendriteConfig {
    #[must_use]
    pub fn new(chunking: ChunkingConfig, parsers: ParserRegistry) -> Self {
        Self { chunking, parsers }
    }
}

impl Default for DendriteConfig {
    fn default() -> Self {
        Self {
            chunking: ChunkingConfig::default(),
            parsers: ParserRegistry::with_defaults(),
        }
    }
}
