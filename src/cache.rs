//! Per-session cache of the rendered sidebar.
//!
//! Once a page has aggregated its fragments, the rendered sidebar body is written to session
//! storage together with the time of writing. Revisiting the page in the same session reuses
//! that body instead of fetching every fragment again, as long as the documentation was not
//! republished after the entry was written.
//!
//! Storage itself sits behind [SessionStore]: `window.sessionStorage` in the browser (see the
//! `wasm` feature), [MemorySessionStore] everywhere else.
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, sync::Arc};

use crate::error::NavError;

/// Key used when the current page has no link of its own.
pub const ROOT_CACHE_KEY: &str = "root";

pub trait SessionStore: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, NavError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), NavError>;
    fn remove_item(&self, key: &str) -> Result<(), NavError>;
}

/// In-process [SessionStore]. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore(Arc<RwLock<BTreeMap<String, String>>>);

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        self.0.read().keys().cloned().collect()
    }
}

impl SessionStore for MemorySessionStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, NavError> {
        Ok(self.0.read().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), NavError> {
        self.0.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), NavError> {
        self.0.write().remove(key);
        Ok(())
    }
}

/// Source of "now" in milliseconds since the unix epoch.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[cfg(all(target_arch = "wasm32", feature = "wasm"))]
    fn now_millis(&self) -> i64 {
        js_sys::Date::now() as i64
    }

    #[cfg(not(all(target_arch = "wasm32", feature = "wasm")))]
    fn now_millis(&self) -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or_default()
    }
}

/// A clock stuck at a given instant (milliseconds).
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

/// Stored form of a cached sidebar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Write time, milliseconds since the unix epoch
    pub time: i64,
    /// Sidebar body markup
    pub value: String,
}

/// The cache as seen from one page view.
pub struct SessionCache {
    store: Option<Arc<dyn SessionStore>>,
    key: String,
    bypass: bool,
    /// Publish timestamp of the documentation, seconds since the unix epoch
    publish_time: i64,
    entry: Option<CacheEntry>,
    checked: bool,
}

impl SessionCache {
    /// `page_link` is the current page's link; `root_page` is the documentation start page,
    /// which always renders its navigation fresh.
    pub fn new(
        store: Option<Arc<dyn SessionStore>>,
        page_link: Option<&str>,
        root_page: &str,
        publish_time: i64,
    ) -> SessionCache {
        let key = cache_key(page_link);
        SessionCache {
            store,
            bypass: page_link == Some(root_page),
            key,
            publish_time,
            entry: None,
            checked: false,
        }
    }

    /// A cache that never hits and never writes.
    pub fn disabled() -> SessionCache {
        SessionCache::new(None, None, "", 0)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some() && !self.bypass
    }

    fn is_fresh(&self, entry: &CacheEntry) -> bool {
        self.publish_time.saturating_mul(1000) < entry.time
    }

    /// Whether a valid entry exists for this page. The store is consulted at most once per
    /// page view unless a stale or corrupt entry was evicted, in which case the next call
    /// looks again.
    pub fn has_cache(&mut self) -> bool {
        if self.entry.is_some() {
            return true;
        }
        if !self.is_enabled() || self.checked {
            return false;
        }
        let Some(store) = self.store.clone() else {
            return false;
        };
        self.checked = true;

        let raw = match store.get_item(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return false,
            Err(e) => {
                tracing::warn!("[SessionCache] could not read {:?}: {e}", self.key);
                return false;
            }
        };

        match serde_json::from_str::<CacheEntry>(&raw) {
            Ok(entry) if self.is_fresh(&entry) => {
                tracing::debug!("[SessionCache] hit for {:?}", self.key);
                self.entry = Some(entry);
                true
            }
            Ok(entry) => {
                tracing::debug!(
                    "[SessionCache] entry for {:?} written at {} predates publish time {}, evicting",
                    self.key,
                    entry.time,
                    self.publish_time
                );
                self.evict(store.as_ref());
                false
            }
            Err(e) => {
                tracing::warn!("[SessionCache] corrupt entry for {:?}: {e}", self.key);
                self.evict(store.as_ref());
                false
            }
        }
    }

    fn evict(&mut self, store: &dyn SessionStore) {
        self.checked = false;
        if let Err(e) = store.remove_item(&self.key) {
            tracing::warn!("[SessionCache] could not evict {:?}: {e}", self.key);
        }
    }

    /// The cached sidebar body, if [SessionCache::has_cache] found a valid one.
    pub fn cached_body(&self) -> Option<&str> {
        self.entry
            .as_ref()
            .filter(|entry| self.is_fresh(entry))
            .map(|entry| entry.value.as_str())
    }

    pub fn store(&self, body: &str, now_millis: i64) -> Result<(), NavError> {
        let Some(store) = self.store.as_ref().filter(|_| !self.bypass) else {
            return Ok(());
        };
        let entry = CacheEntry {
            time: now_millis,
            value: body.to_string(),
        };
        store.set_item(&self.key, &serde_json::to_string(&entry)?)
    }
}

impl std::fmt::Debug for SessionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCache")
            .field("key", &self.key)
            .field("enabled", &self.is_enabled())
            .field("publish_time", &self.publish_time)
            .field("entry", &self.entry)
            .field("checked", &self.checked)
            .finish()
    }
}

pub fn cache_key(page_link: Option<&str>) -> String {
    match page_link {
        Some(link) if !link.is_empty() => link.to_string(),
        _ => ROOT_CACHE_KEY.to_string(),
    }
}
