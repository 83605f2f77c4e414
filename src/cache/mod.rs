//! Cache module - registry-based caching on top of Moka.
//!
//! Repositories and trackers create named caches through a central
//! registry, so each domain (user settings, pending prompts) owns its
//! cache without sharing keyspaces.
//!
//! ```ignore
//! let settings = registry.get_or_create::<u64, UserSettings>("user_settings", CacheConfig::default());
//! settings.insert(user_id, doc);
//! let doc = settings.get(&user_id);
//! ```

mod config;
mod registry;
mod typed;

pub use config::CacheConfig;
pub use registry::CacheRegistry;
pub use typed::TypedCache;
