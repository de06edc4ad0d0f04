//! Scan/filter tuning the CLI exposes as flags; the core only consumes a
//! `ScanConfig` value and persists nothing (spec.md §6: "Persisted state:
//! None").

#[derive(Debug, Clone, Copy)]
pub struct ScanConfig {
    /// Bytes read from the target per block during a region sweep.
    pub block_size: usize,
    /// Candidate addresses are only considered every `alignment` bytes.
    pub alignment: u64,
    /// When false (the default), scanning skips addresses that aren't a
    /// multiple of the scanned type's own width, in addition to `alignment`.
    pub byte_granular: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            block_size: 64 * 1024,
            alignment: 1,
            byte_granular: false,
        }
    }
}
