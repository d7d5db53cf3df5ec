//! URL normalization, domain TTLs, and the cache-through page fetcher.

mod fetcher;
mod url;

pub use self::fetcher::CachingFetcher;
pub use self::url::{domain_of, normalize_url, ttl_for_domain};
