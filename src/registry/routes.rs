//! Route lookup.
//!
//! # Responsibilities
//! - Store operation descriptors by routing key
//! - Look up the descriptor for a request
//! - Return an explicit miss rather than a silent default

use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;

use crate::registry::{OperationDescriptor, RoutingKey};

/// Concurrent map from routing key to operation.
#[derive(Debug, Default)]
pub struct RouteRegistry {
    routes: DashMap<RoutingKey, Arc<OperationDescriptor>>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a descriptor under its own key, replacing any previous one.
    ///
    /// Returns the replaced descriptor.
    pub fn register(&self, descriptor: OperationDescriptor) -> Option<Arc<OperationDescriptor>> {
        let key = descriptor.key().clone();
        let previous = self.routes.insert(key.clone(), Arc::new(descriptor));
        if previous.is_some() {
            tracing::warn!(route = %key, "Route re-registered, previous operation replaced");
        } else {
            tracing::info!(route = %key, "Route registered");
        }
        previous
    }

    pub fn lookup<Q>(&self, key: &Q) -> Option<Arc<OperationDescriptor>>
    where
        RoutingKey: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.routes.get(key).map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Registered keys in sorted order.
    pub fn keys(&self) -> Vec<RoutingKey> {
        let mut keys: Vec<_> = self.routes.iter().map(|r| r.key().clone()).collect();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{Arguments, InvokeError};
    use crate::lifecycle::handlers::{BoxError, Controller};
    use crate::model::Method;
    use crate::registry::Operation;

    struct Fixed;

    impl Controller for Fixed {
        fn create() -> Result<Self, BoxError> {
            Ok(Fixed)
        }
    }

    fn returning(path: &str, text: &'static str) -> OperationDescriptor {
        Operation::route(Method::Get, path)
            .invoke(move |_: &Fixed, _: &Arguments| Ok::<_, InvokeError>(text))
            .build()
            .unwrap()
    }

    #[test]
    fn lookup_after_register() {
        let registry = RouteRegistry::new();
        assert!(registry.register(returning("/a", "first")).is_none());

        let found = registry.lookup("GET:/a").expect("registered");
        assert_eq!(found.key().as_str(), "GET:/a");
        assert!(registry.lookup(&RoutingKey::new(Method::Post, "/a")).is_none());
    }

    #[test]
    fn re_registration_overwrites() {
        let registry = RouteRegistry::new();
        registry.register(returning("/a", "first"));
        let replaced = registry.register(returning("/a", "second"));
        assert!(replaced.is_some());
        assert_eq!(registry.len(), 1);

        let op = registry.lookup("GET:/a").unwrap();
        let value = op.invoke(&Fixed, &Arguments::default()).unwrap();
        assert_eq!(value.to_string(), "second");
    }

    #[test]
    fn keys_are_sorted() {
        let registry = RouteRegistry::new();
        registry.register(returning("/b", "b"));
        registry.register(returning("/a", "a"));
        let keys: Vec<_> = registry.keys().iter().map(|k| k.to_string()).collect();
        assert_eq!(keys, ["GET:/a", "GET:/b"]);
    }

    #[test]
    fn concurrent_lookups_see_registered_routes() {
        let registry = Arc::new(RouteRegistry::new());
        registry.register(returning("/a", "a"));

        std::thread::scope(|scope| {
            for i in 0..8 {
                let registry = Arc::clone(&registry);
                scope.spawn(move || {
                    for _ in 0..200 {
                        assert!(registry.lookup("GET:/a").is_some());
                    }
                    registry.register(returning(&format!("/t{i}"), "t"));
                });
            }
        });
        assert_eq!(registry.len(), 9);
    }
}
