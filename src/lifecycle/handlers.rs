//! Handler lifecycle cache.
//!
//! # Responsibilities
//! - Hold exactly one shared instance per handler type
//! - Construct lazily on first dispatch to that type
//! - Surface construction failures as values, never panics
//!
//! # Design Decisions
//! - Keyed by `TypeId`; instances are stored type-erased and downcast at the
//!   call site
//! - Get-or-create runs under the map's entry lock, so concurrent first use
//!   constructs once and every caller sees the same `Arc`
//! - A failed construction leaves the slot empty; the next dispatch retries

use std::any::{type_name, Any, TypeId};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::registry::HandlerType;

/// Boxed error returned by handler constructors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A handler instance as stored by the cache.
pub type SharedHandler = Arc<dyn Any + Send + Sync>;

/// A type whose methods are exposed as operations.
pub trait Controller: Send + Sync + 'static {
    /// Build the single instance used for every call.
    fn create() -> Result<Self, BoxError>
    where
        Self: Sized;
}

/// Handler construction failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to construct handler {handler}: {reason}")]
pub struct ConstructError {
    pub handler: String,
    pub reason: String,
}

/// One-instance-per-type store.
#[derive(Debug, Default)]
pub struct HandlerCache {
    instances: DashMap<TypeId, SharedHandler>,
}

impl HandlerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the instance stored under `id`, running `factory` if there is
    /// none yet.
    ///
    /// The factory runs while the entry's shard is write-locked; it must not
    /// call back into this cache.
    pub fn get_or_create<F>(
        &self,
        id: TypeId,
        name: &str,
        factory: F,
    ) -> Result<SharedHandler, ConstructError>
    where
        F: FnOnce() -> Result<SharedHandler, ConstructError>,
    {
        if let Some(existing) = self.instances.get(&id) {
            return Ok(Arc::clone(existing.value()));
        }

        match self.instances.entry(id) {
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(slot) => {
                tracing::info!(handler = name, "Creating handler instance");
                let instance = factory().inspect_err(|e| {
                    tracing::error!(handler = name, error = %e, "Handler construction failed");
                })?;
                slot.insert(Arc::clone(&instance));
                Ok(instance)
            }
        }
    }

    /// Resolve the instance for a registered handler type.
    pub fn instance(&self, handler: &HandlerType) -> Result<SharedHandler, ConstructError> {
        self.get_or_create(handler.id(), handler.name(), || handler.construct())
    }

    /// Typed access, mostly for tests and embedding code.
    pub fn get<H: Controller>(&self) -> Result<Arc<H>, ConstructError> {
        self.instance(&HandlerType::of::<H>())?
            .downcast::<H>()
            .map_err(|_| ConstructError {
                handler: type_name::<H>().to_string(),
                reason: "cached instance has a different type".to_string(),
            })
    }

    pub fn contains(&self, id: TypeId) -> bool {
        self.instances.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;

    static CREATED: AtomicUsize = AtomicUsize::new(0);

    #[derive(Debug)]
    struct Counter;

    impl Controller for Counter {
        fn create() -> Result<Self, BoxError> {
            CREATED.fetch_add(1, Ordering::SeqCst);
            Ok(Counter)
        }
    }

    #[derive(Debug)]
    struct Broken;

    impl Controller for Broken {
        fn create() -> Result<Self, BoxError> {
            Err("no viable constructor".into())
        }
    }

    #[test]
    fn concurrent_first_use_constructs_once() {
        let cache = HandlerCache::new();
        let calls = AtomicUsize::new(0);
        let barrier = Barrier::new(16);
        let id = TypeId::of::<u32>();

        let instances: Vec<SharedHandler> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..16)
                .map(|_| {
                    scope.spawn(|| {
                        barrier.wait();
                        cache
                            .get_or_create(id, "u32", || {
                                calls.fetch_add(1, Ordering::SeqCst);
                                std::thread::sleep(std::time::Duration::from_millis(5));
                                Ok(Arc::new(7_u32) as SharedHandler)
                            })
                            .unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(instances.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn typed_access_reuses_instance() {
        let cache = HandlerCache::new();
        let first = cache.get::<Counter>().unwrap();
        let second = cache.get::<Counter>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(CREATED.load(Ordering::SeqCst), 1);
        assert!(cache.contains(TypeId::of::<Counter>()));
    }

    #[test]
    fn construction_failure_is_an_error_and_not_cached() {
        let cache = HandlerCache::new();
        let err = cache.get::<Broken>().unwrap_err();
        assert!(err.handler.ends_with("Broken"));
        assert_eq!(err.reason, "no viable constructor");
        assert!(cache.is_empty());
    }
}
