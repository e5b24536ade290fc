//! Read-through cache plumbing.
//!
//! - **Keys**: SHA-256 digests of a normalized catalog request
//! - **Store**: the `CacheStore` trait plus an in-process implementation; the
//!   Redis implementation lives in `infra::redis`
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! backend = "redis"          # or "memory"
//! redis_url = "redis://127.0.0.1:6379"
//! ttl_seconds = 300
//! ```

mod config;
mod keys;
mod store;

pub use config::{CacheBackend, CacheConfig};
pub use keys::{CacheKey, derive_key};
pub use store::{CacheError, CacheStore, MemoryCacheStore};
