//! Time-bounded cache of project contexts, keyed by workspace path.

use super::context::ProjectContext;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Source of "now" for expiry checks
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|p| p.into_inner());
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = *self.offset.lock().unwrap_or_else(|p| p.into_inner());
        self.base + offset
    }
}

struct CacheEntry {
    context: Arc<ProjectContext>,
    stored_at: Instant,
}

/// Entries are replaced wholesale; a reader holding an `Arc` keeps a
/// consistent snapshot even while a newer one is written.
pub struct ContextCache {
    entries: RwLock<HashMap<PathBuf, CacheEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl ContextCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    /// Fresh entry for `key`, if any
    pub fn get(&self, key: &Path) -> Option<Arc<ProjectContext>> {
        let entries = self.entries.read().unwrap_or_else(|p| p.into_inner());
        let entry = entries.get(key)?;
        if self.clock.now().saturating_duration_since(entry.stored_at) < self.ttl {
            Some(Arc::clone(&entry.context))
        } else {
            None
        }
    }

    pub fn insert(&self, key: PathBuf, context: Arc<ProjectContext>) {
        let entry = CacheEntry {
            context,
            stored_at: self.clock.now(),
        };
        self.entries
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .insert(key, entry);
    }

    pub fn invalidate(&self, key: &Path) {
        self.entries
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .remove(key);
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .clear();
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl Default for ContextCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}
