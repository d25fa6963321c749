//! Time-bounded memoization of choice lists

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::models::{Choice, Column};
use crate::store::EmissionStore;

/// Lifetime of a cached choice list
pub const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Source of the current time, replaceable in tests
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Clone)]
struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// Key-value store with a fixed time-to-live per entry
///
/// Get and set are individually atomic. Two concurrent misses on the same key
/// both write; the later write wins.
pub struct TtlCache<V> {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, Entry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(key) {
            Some(entry) if now < entry.expires_at => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn set(&self, key: String, value: V) {
        let expires_at = self.clock.now() + self.ttl;
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key, Entry { value, expires_at });
    }
}

/// Cached distinct-value lists for selection inputs
pub struct ChoiceCache {
    cache: TtlCache<Vec<Choice>>,
}

impl ChoiceCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            cache: TtlCache::new(ttl, clock),
        }
    }

    fn key(column: Column) -> String {
        format!("{}-CHOICES", column.name())
    }

    /// Choice list for `column`, led by the empty placeholder.
    ///
    /// Served from cache until the entry expires; a miss runs one
    /// distinct-value query and stores the result. Query errors propagate
    /// and nothing is cached.
    pub async fn get_choices<S>(&self, store: &S, column: Column) -> Result<Vec<Choice>, sqlx::Error>
    where
        S: EmissionStore + ?Sized,
    {
        let key = Self::key(column);
        if let Some(choices) = self.cache.get(&key) {
            debug!("Choice cache hit: {}", key);
            return Ok(choices);
        }

        debug!("Choice cache miss: {}", key);
        let values = store.distinct_values(column).await?;
        let mut choices = Vec::with_capacity(values.len() + 1);
        choices.push(Choice::placeholder());
        choices.extend(values.into_iter().map(|v| Choice::new(v.clone(), v)));

        self.cache.set(key, choices.clone());
        Ok(choices)
    }
}
