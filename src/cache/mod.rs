//! Redis-backed HTTP response cache.
//!
//! Handlers opt in by wrapping their body in [`ResponseCache::run`] with a
//! [`CachePolicy`]. The policy names a key template such as
//! `{username}_posts_cache:page_{page}` whose placeholders are filled from the
//! request arguments, plus the argument that identifies the resource. The final
//! key is `<formatted prefix>:<resource id>`.
//!
//! - `GET` requests are read-through: a stored JSON body is returned as-is,
//!   otherwise the handler runs and its output is stored with the policy TTL.
//! - Any other method runs the handler and then deletes the resource key, every
//!   extra key in `to_invalidate_extra` and every key matching the patterns in
//!   `pattern_to_invalidate_extra`.
//!
//! ## Configuration
//!
//! ```toml
//! [redis]
//! backend = "redis"             # or "memory"
//! cache_url = "redis://127.0.0.1:6379/0"
//!
//! [cache]
//! client_max_age_seconds = 60
//! ```

mod config;
mod error;
mod keys;
mod middleware;
mod policy;
mod response;
mod store;

pub use config::CacheConfig;
pub use error::CacheError;
pub use keys::{CacheArg, CacheArgs, extract_placeholders, format_template, infer_resource_id};
pub use middleware::{ClientCacheState, client_cache_control};
pub use policy::{CachePolicy, ResourceIdType};
pub use response::ResponseCache;
pub use store::{CacheStore, MemoryCacheStore, RedisCacheStore, glob_match};
