//! Services layer for the media gateway.
//!
//! The grant cache is the single source of truth for transient
//! authorization state; pairing and share links are stateless logic wrapped
//! around it, and the grant manager defers entirely to the object-storage
//! service for grant state.

pub mod cache;
pub mod catalog;
pub mod error;
pub mod grants;
pub mod pairing;
pub mod redis;
pub mod share;
pub mod storage;

pub use cache::{CacheTtls, Clock, GrantCache, LocalGrantCache, SystemClock};
pub use catalog::CatalogService;
pub use error::ServiceError;
pub use grants::{GrantManager, MockObjectStore, ObjectStore, StoreError};
pub use pairing::PairingService;
pub use redis::RedisGrantCache;
pub use share::ShareService;
pub use storage::HttpObjectStore;
