//! Cache store - versioned key → response storage for cache-first serving
//!
//! Entries are scoped by a namespace (a version tag). The lifecycle manager
//! keeps exactly one namespace current and removes the rest on activation.

mod store;
mod types;

pub use store::CacheStore;
pub use types::{FetchRequest, ResourceResponse};
