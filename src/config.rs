//! Parser configuration.

use serde::{Deserialize, Serialize};

/// Default cap on the output of a single node decompression (64 MiB).
pub const DEFAULT_MAX_DECODED_SIZE: usize = 64 * 1024 * 1024;

/// Default maximum folder nesting.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Limits and optional behaviors for a parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Largest number of bytes one packed node may unpack to.
    pub max_decoded_size: usize,
    /// Deepest folder nesting accepted before the parse fails.
    pub max_depth: usize,
    /// Classify file nodes without a resource format by their content signature.
    pub sniff_unlabelled: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_decoded_size: DEFAULT_MAX_DECODED_SIZE,
            max_depth: DEFAULT_MAX_DEPTH,
            sniff_unlabelled: false,
        }
    }
}

impl ParserConfig {
    /// Enable or disable content sniffing for unlabelled file nodes.
    pub fn with_sniffing(mut self, enabled: bool) -> Self {
        self.sniff_unlabelled = enabled;
        self
    }
}
