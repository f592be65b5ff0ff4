//! Engine runtime options.

/// Runtime knobs, separate from the economic parameters in `MarketParams`.
#[derive(Debug, Clone)]
pub struct MarketOptions {
    /// Maximum number of events to retain in memory.
    pub max_events: usize,
    /// Enable verbose logging.
    pub verbose: bool,
}

impl Default for MarketOptions {
    fn default() -> Self {
        Self {
            max_events: 100_000,
            verbose: false,
        }
    }
}
