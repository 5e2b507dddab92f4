// SPDX-License-Identifier: MIT

//! Local key-value storage capability.
//!
//! The browser profile this crate models keeps its caches in a synchronous,
//! namespaced key-value store. The store is injected into every cache
//! component so tests can substitute an in-memory implementation.
//!
//! Read and write failures never propagate: they are logged and degrade to a
//! cache miss, matching the "quota exceeded / storage disabled" behavior of
//! the persistent store being modeled. Same-key races between concurrent
//! writers are last-write-wins.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Storage key layout, namespaced per deployment.
pub mod keys {
    /// Key holding the serialized credential for a namespace.
    pub fn auth(namespace: &str) -> String {
        format!("view-auth:{}", namespace)
    }

    /// Key marking that a unique hit was already registered for a page.
    pub fn hit(namespace: &str, page: &str) -> String {
        format!("view-hit:{}:{}", namespace, page)
    }

    /// Fixed key holding the image hydration cache.
    pub const IMAGE_CACHE: &str = "lightbox-cache-v1";
}

/// Injected key-value store capability.
///
/// Implementations must degrade internally: a failed read behaves as an
/// absent key, a failed write is logged and dropped.
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` on absence or read failure.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value, best-effort.
    fn set(&self, key: &str, value: &str);

    /// Remove a value, best-effort.
    fn remove(&self, key: &str);
}
