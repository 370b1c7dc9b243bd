use std::sync::OnceLock;

use confidential_balances::{DecompositionParams, KangarooTableCache};

pub mod balance_range {
    pub const MIN_BALANCE_ORDER: u32 = 10;
    pub const MAX_BALANCE_ORDER: u32 = 20;
}

/// Table builds dominate the first decryption, so the benchmarks share
/// one cache and warm it up before timing anything.
pub fn cache() -> &'static KangarooTableCache {
    static CACHE: OnceLock<KangarooTableCache> = OnceLock::new();
    CACHE.get_or_init(KangarooTableCache::new)
}

/// The default production decomposition: eight 32-bit chunks.
pub fn default_params() -> DecompositionParams {
    DecompositionParams::default()
}
