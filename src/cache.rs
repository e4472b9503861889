//! Per-voice engine caching.
//!
//! Engines are expensive to construct (weights are loaded into memory) and
//! cheap to invoke, so one instance per voice is kept for the life of the
//! process. There is no eviction and no capacity bound; the voice set is
//! small and static.
//!
//! Construction is single-flight: each voice has its own slot lock, held for
//! the duration of the build, so concurrent first requests for a voice
//! collapse into one construction and the losers share the winner's engine.
//! A failed build leaves the slot empty, so the next request retries instead
//! of observing a cached failure.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

/// Shared, lock-guarded engine instance handed out by the cache.
pub type EngineHandle<E> = Arc<Mutex<E>>;

type Slot<E> = Arc<Mutex<Option<EngineHandle<E>>>>;

/// Memoizing voice-name → engine map.
pub struct EngineCache<E> {
    slots: Mutex<HashMap<String, Slot<E>>>,
}

impl<E> EngineCache<E> {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached engine for `name`, constructing it if absent.
    ///
    /// `build` runs at most once per voice across the process lifetime when
    /// it succeeds. On error nothing is cached and the error is returned to
    /// the caller; a later call runs `build` again.
    pub fn get_or_create<F, Err>(&self, name: &str, build: F) -> Result<EngineHandle<E>, Err>
    where
        F: FnOnce() -> Result<E, Err>,
    {
        let slot = {
            let mut slots = self.slots.lock();
            slots.entry(name.to_string()).or_default().clone()
        };

        // The slot lock is held across the build, so concurrent first
        // requests for the same voice wait here and then take the fast path.
        let mut guard = slot.lock();
        if let Some(handle) = guard.as_ref() {
            return Ok(handle.clone());
        }

        let engine = build()?;
        let handle = Arc::new(Mutex::new(engine));
        *guard = Some(handle.clone());
        Ok(handle)
    }

    /// Whether a constructed engine is cached for `name`.
    pub fn contains(&self, name: &str) -> bool {
        let slot = match self.slots.lock().get(name) {
            Some(slot) => slot.clone(),
            None => return false,
        };
        let state = slot.lock();
        state.is_some()
    }

    /// Number of constructed engines currently cached.
    pub fn len(&self) -> usize {
        let slots: Vec<Slot<E>> = self.slots.lock().values().cloned().collect();
        slots.into_iter().filter(|slot| slot.lock().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E> Default for EngineCache<E> {
    fn default() -> Self {
        Self::new()
    }
}
