pub mod address;

pub use address::AddressCache;

use crate::config::Config;

pub fn init_cache(config: &Config) -> AddressCache {
    AddressCache::new(config.cache_max_capacity, config.cache_ttl)
}
