//! Ledger store configuration

/// Configuration for the vote ledger store
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Maximum number of ledgers returned by a votes query
    pub max_query_results: usize,

    /// Location names longer than this are cut before being stored in a ledger
    pub max_location_name_len: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_query_results: 100,
            max_location_name_len: 32,
        }
    }
}

impl LedgerConfig {
    /// Set the maximum number of ledgers returned by a votes query
    pub fn max_query_results(mut self, max: usize) -> Self {
        self.max_query_results = max;
        self
    }

    /// Set the maximum stored location name length (in characters)
    pub fn max_location_name_len(mut self, len: usize) -> Self {
        self.max_location_name_len = len;
        self
    }
}
