//! The type-indexed context
//!
//! A `Context` maps type identities to [`Provider`]s and resolves instances on
//! demand, walking up to its parent contexts when a type is not registered
//! locally.

use crate::component::{self, Component};
use crate::provider::Lifetime;
use crate::registration::{self, Registration};
use crate::storage::ServiceStorage;
use crate::{DiError, Injectable, Provider, Result, Signature};
use std::any::TypeId;
use std::sync::{Arc, Weak};

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// Type-indexed registry of providers with optional parent delegation.
///
/// Resolution looks the requested type up locally, then in each ancestor.
/// Whichever provider is found constructs against the context the request
/// *started* from, so a child's registrations shadow its ancestors' for the
/// whole dependency subtree.
///
/// Cloning a `Context` is cheap and yields a handle to the same registry.
///
/// # Examples
///
/// ```rust
/// use diy_ioc::Context;
/// use std::sync::Arc;
///
/// struct Database { url: String }
///
/// struct UserService { db: Arc<Database> }
///
/// impl UserService {
///     fn new(db: Arc<Database>) -> Self {
///         UserService { db }
///     }
/// }
///
/// let ctx = Context::new();
/// ctx.register_value(Arc::new(Database { url: "postgres://localhost".into() }));
/// ctx.register_singleton(UserService::new);
///
/// let users = ctx.resolve::<UserService>().unwrap();
/// assert_eq!(users.db.url, "postgres://localhost");
/// ```
#[derive(Clone)]
pub struct Context {
    /// Provider storage, including the parent chain
    storage: Arc<ServiceStorage>,
    /// Scope depth for debugging
    depth: u32,
}

impl Context {
    /// Create a new root context.
    #[inline]
    pub fn new() -> Self {
        #[cfg(feature = "logging")]
        debug!(
            target: "diy_ioc",
            depth = 0,
            "Creating new root context"
        );

        Self {
            storage: Arc::new(ServiceStorage::new()),
            depth: 0,
        }
    }

    /// Create a child context that delegates to this one.
    ///
    /// The child sees every provider of its ancestors and may shadow any of
    /// them with a local registration. The parent is kept alive by the child.
    ///
    /// ```rust
    /// use diy_ioc::Context;
    /// use std::sync::Arc;
    ///
    /// struct AppConfig { debug: bool }
    /// struct RequestId(String);
    ///
    /// let root = Context::new();
    /// root.register_value(Arc::new(AppConfig { debug: true }));
    ///
    /// let request = root.scope();
    /// request.register_value(Arc::new(RequestId("req-123".into())));
    ///
    /// assert!(request.contains::<AppConfig>());
    /// assert!(!root.contains::<RequestId>());
    /// ```
    #[inline]
    pub fn scope(&self) -> Self {
        let child_depth = self.depth + 1;

        #[cfg(feature = "logging")]
        debug!(
            target: "diy_ioc",
            parent_depth = self.depth,
            child_depth = child_depth,
            parent_providers = self.storage.len(),
            "Creating child context"
        );

        Self {
            storage: Arc::new(self.storage.child()),
            depth: child_depth,
        }
    }

    // =========================================================================
    // Registration Methods
    // =========================================================================

    /// Insert or replace the provider for a type identity.
    ///
    /// This is the untyped entry point; the provider must produce instances of
    /// the type `type_id` names, otherwise resolution fails with
    /// [`DiError::TypeMismatch`].
    #[inline]
    pub fn register(&self, type_id: TypeId, provider: Provider) {
        #[cfg(feature = "logging")]
        debug!(
            target: "diy_ioc",
            service = provider.type_name(),
            lifetime = ?provider.lifetime(),
            depth = self.depth,
            replaced = self.storage.contains(&type_id),
            "Registering provider"
        );

        self.storage.insert(type_id, provider);
    }

    /// Register a singleton built by `ctor` on first resolution.
    ///
    /// Every parameter of `ctor` is resolved from the context.
    #[inline]
    pub fn register_singleton<Args, F>(&self, ctor: F)
    where
        F: Signature<Args> + Send + Sync + 'static,
        F::Output: Injectable,
    {
        registration::singleton(ctor).register(self);
    }

    /// Register a factory; `ctor` runs on every resolution.
    #[inline]
    pub fn register_factory<Args, F>(&self, ctor: F)
    where
        F: Signature<Args> + Send + Sync + 'static,
        F::Output: Injectable,
    {
        registration::provider(ctor).register(self);
    }

    /// Register an externally owned instance.
    #[inline]
    pub fn register_value<T: ?Sized + Injectable>(&self, instance: Arc<T>) {
        registration::value(instance).register(self);
    }

    /// Register a [`Component`] as a singleton built from its declared dependencies.
    #[inline]
    pub fn register_component<T: Component>(&self) {
        registration::component::<T>().register(self);
    }

    // =========================================================================
    // Resolution Methods
    // =========================================================================

    /// Resolve an instance of `T`.
    ///
    /// Looks in this context, then each ancestor. Fails with
    /// [`DiError::NotFound`] if no context in the chain has a provider, or
    /// with the first error raised while building `T`'s dependencies.
    #[inline]
    pub fn resolve<T: ?Sized + Injectable>(&self) -> Result<Arc<T>> {
        match self.storage.lookup(&TypeId::of::<T>()) {
            Some((provider, distance)) => {
                #[cfg(feature = "logging")]
                trace!(
                    target: "diy_ioc",
                    service = std::any::type_name::<T>(),
                    depth = self.depth,
                    location = if distance == 0 { "local" } else { "ancestor" },
                    distance = distance,
                    "Resolving service"
                );
                #[cfg(not(feature = "logging"))]
                let _ = distance;

                provider.create::<T>(self)
            }
            None => {
                #[cfg(feature = "logging")]
                debug!(
                    target: "diy_ioc",
                    service = std::any::type_name::<T>(),
                    depth = self.depth,
                    "Service not found in context or parent chain"
                );

                Err(DiError::not_found::<T>())
            }
        }
    }

    /// Try to resolve, returning None on any failure.
    #[inline]
    pub fn try_resolve<T: ?Sized + Injectable>(&self) -> Option<Arc<T>> {
        self.resolve::<T>().ok()
    }

    /// Resolve `T`, registering a default-constructed singleton on a miss.
    ///
    /// The implicit registration goes into the root of the chain, so every
    /// context sharing that root sees the same instance afterwards.
    ///
    /// ```rust
    /// use diy_ioc::Context;
    /// use std::sync::Arc;
    ///
    /// #[derive(Default)]
    /// struct Settings { retries: u32 }
    ///
    /// let root = Context::new();
    /// let child = root.scope();
    ///
    /// let a = child.resolve_or_default::<Settings>().unwrap();
    /// let b = root.resolve::<Settings>().unwrap();
    /// assert!(Arc::ptr_eq(&a, &b));
    /// ```
    #[inline]
    pub fn resolve_or_default<T: Injectable + Default>(&self) -> Result<Arc<T>> {
        self.resolve_or_register::<T>(|| Provider::singleton(|_: &Context| Ok(Arc::new(T::default()))))
    }

    /// Resolve a [`Component`], auto-wiring it into the root context on a miss.
    #[inline]
    pub fn resolve_component<T: Component>(&self) -> Result<Arc<T>> {
        self.resolve_or_register::<T>(|| Provider::singleton(component::construct::<T>))
    }

    fn resolve_or_register<T: Injectable>(&self, make: impl FnOnce() -> Provider) -> Result<Arc<T>> {
        let type_id = TypeId::of::<T>();
        if self.storage.contains_in_chain(&type_id) {
            return self.resolve::<T>();
        }

        #[cfg(feature = "logging")]
        debug!(
            target: "diy_ioc",
            service = std::any::type_name::<T>(),
            depth = self.depth,
            "Auto-registering singleton in root context"
        );

        let provider = self.storage.root().get_or_insert_with(type_id, make);
        provider.create::<T>(self)
    }

    // =========================================================================
    // Query Methods
    // =========================================================================

    /// Check if a provider for `T` exists here or in any ancestor.
    #[inline]
    pub fn contains<T: ?Sized + Injectable>(&self) -> bool {
        self.storage.contains_in_chain(&TypeId::of::<T>())
    }

    /// Check if `T` is registered in this context itself.
    #[inline]
    pub fn contains_local<T: ?Sized + Injectable>(&self) -> bool {
        self.storage.contains(&TypeId::of::<T>())
    }

    /// Lifetime of the provider `T` would resolve through, if any.
    #[inline]
    pub fn lifetime_of<T: ?Sized + Injectable>(&self) -> Option<Lifetime> {
        self.storage
            .lookup(&TypeId::of::<T>())
            .map(|(provider, _)| provider.lifetime())
    }

    /// Get the number of providers in this context (not including parents).
    #[inline]
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Check if this context has no local providers.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Get all TypeIds registered in this context.
    pub fn registered_types(&self) -> Vec<TypeId> {
        self.storage.type_ids()
    }

    /// Get the scope depth (0 = root).
    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Remove a local registration. Returns whether one existed.
    #[inline]
    pub fn unregister<T: ?Sized + Injectable>(&self) -> bool {
        self.storage.remove(&TypeId::of::<T>())
    }

    /// Remove all local providers. Ancestors are not affected.
    ///
    /// Instances already handed out stay alive as long as their holders do.
    #[inline]
    pub fn clear(&self) {
        #[cfg(feature = "logging")]
        let count = self.storage.len();

        self.storage.clear();

        #[cfg(feature = "logging")]
        debug!(
            target: "diy_ioc",
            depth = self.depth,
            providers_removed = count,
            "Context cleared"
        );
    }

    /// Create a non-owning handle to this context.
    #[inline]
    pub fn downgrade(&self) -> ContextRef {
        ContextRef {
            storage: Arc::downgrade(&self.storage),
            depth: self.depth,
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("provider_count", &self.len())
            .field("depth", &self.depth)
            .field("has_parent", &self.storage.parent().is_some())
            .finish()
    }
}

// =============================================================================
// ContextRef
// =============================================================================

/// A non-owning handle to a [`Context`].
///
/// An [`ApplicationContext`](crate::ApplicationContext) registers one of these
/// for itself so components can depend on the context without keeping it alive.
#[derive(Clone)]
pub struct ContextRef {
    storage: Weak<ServiceStorage>,
    depth: u32,
}

impl ContextRef {
    /// Get an owning handle, if the context still exists.
    #[inline]
    pub fn upgrade(&self) -> Result<Context> {
        self.storage
            .upgrade()
            .map(|storage| Context {
                storage,
                depth: self.depth,
            })
            .ok_or(DiError::ContextDropped)
    }

    /// Resolve `T` through the referenced context.
    #[inline]
    pub fn resolve<T: ?Sized + Injectable>(&self) -> Result<Arc<T>> {
        self.upgrade()?.resolve::<T>()
    }

    /// Whether the referenced context is still alive
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.storage.strong_count() > 0
    }
}

impl std::fmt::Debug for ContextRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextRef")
            .field("depth", &self.depth)
            .field("alive", &self.is_alive())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    struct TestService {
        value: String,
    }

    struct Dependent {
        service: Arc<TestService>,
    }

    impl Dependent {
        fn new(service: Arc<TestService>) -> Self {
            Dependent { service }
        }
    }

    #[test]
    fn test_singleton() {
        let ctx = Context::new();
        ctx.register_singleton(|| TestService {
            value: "test".into(),
        });

        let s1 = ctx.resolve::<TestService>().unwrap();
        let s2 = ctx.resolve::<TestService>().unwrap();

        assert_eq!(s1.value, "test");
        assert!(Arc::ptr_eq(&s1, &s2));
    }

    #[test]
    fn test_singleton_is_lazy() {
        let created = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&created);

        let ctx = Context::new();
        ctx.register_singleton(move || {
            seen.fetch_add(1, Ordering::SeqCst);
            TestService {
                value: "lazy".into(),
            }
        });

        assert_eq!(created.load(Ordering::SeqCst), 0);
        ctx.resolve::<TestService>().unwrap();
        ctx.resolve::<TestService>().unwrap();
        assert_eq!(created.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_factory() {
        let ctx = Context::new();
        ctx.register_factory(|| TestService {
            value: "fresh".into(),
        });

        let s1 = ctx.resolve::<TestService>().unwrap();
        let s2 = ctx.resolve::<TestService>().unwrap();

        assert!(!Arc::ptr_eq(&s1, &s2));
        assert_eq!(ctx.lifetime_of::<TestService>(), Some(Lifetime::Factory));
    }

    #[test]
    fn test_register_replaces() {
        let ctx = Context::new();
        ctx.register_value(Arc::new(TestService { value: "a".into() }));
        ctx.register_value(Arc::new(TestService { value: "b".into() }));

        assert_eq!(ctx.len(), 1);
        assert_eq!(ctx.resolve::<TestService>().unwrap().value, "b");
    }

    #[test]
    fn test_not_found() {
        let ctx = Context::new();
        let err = ctx.resolve::<TestService>().unwrap_err();
        assert!(err.is_not_found());
        assert!(ctx.try_resolve::<TestService>().is_none());
    }

    #[test]
    fn test_scope_inheritance() {
        let root = Context::new();
        root.register_value(Arc::new(TestService {
            value: "root".into(),
        }));

        let child = root.scope();
        child.register_singleton(Dependent::new);

        assert!(child.contains::<TestService>());
        assert!(!child.contains_local::<TestService>());
        assert!(!root.contains::<Dependent>());
        assert_eq!(child.depth(), 1);

        let dependent = child.resolve::<Dependent>().unwrap();
        assert_eq!(dependent.service.value, "root");
    }

    #[test]
    fn test_scope_override() {
        let root = Context::new();
        root.register_value(Arc::new(TestService {
            value: "root".into(),
        }));

        let child = root.scope();
        child.register_value(Arc::new(TestService {
            value: "child".into(),
        }));

        assert_eq!(root.resolve::<TestService>().unwrap().value, "root");
        assert_eq!(child.resolve::<TestService>().unwrap().value, "child");
    }

    #[test]
    fn test_ancestor_provider_uses_descendant_dependencies() {
        let root = Context::new();
        root.register_value(Arc::new(TestService {
            value: "root".into(),
        }));
        root.register_factory(Dependent::new);

        let child = root.scope();
        child.register_value(Arc::new(TestService {
            value: "child".into(),
        }));

        assert_eq!(child.resolve::<Dependent>().unwrap().service.value, "child");
        assert_eq!(root.resolve::<Dependent>().unwrap().service.value, "root");
    }

    #[test]
    fn test_deep_parent_chain() {
        struct RootService(i32);
        struct LeafService(i32);

        let root = Context::new();
        root.register_value(Arc::new(RootService(1)));

        let middle = root.scope().scope();
        let leaf = middle.scope();
        leaf.register_value(Arc::new(LeafService(4)));

        assert_eq!(leaf.depth(), 3);
        assert_eq!(leaf.resolve::<RootService>().unwrap().0, 1);
        assert_eq!(leaf.resolve::<LeafService>().unwrap().0, 4);
        assert!(!middle.contains::<LeafService>());
    }

    #[test]
    fn test_default_auto_registration_goes_to_root() {
        #[derive(Default)]
        struct Settings {
            retries: u32,
        }

        let root = Context::new();
        let child = root.scope();

        let a = child.resolve_or_default::<Settings>().unwrap();
        assert_eq!(a.retries, 0);
        assert!(root.contains_local::<Settings>());
        assert!(!child.contains_local::<Settings>());

        let b = child.resolve_or_default::<Settings>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_default_respects_existing_registration() {
        #[derive(Default)]
        struct Settings {
            retries: u32,
        }

        let root = Context::new();
        root.register_value(Arc::new(Settings { retries: 5 }));

        assert_eq!(root.resolve_or_default::<Settings>().unwrap().retries, 5);
    }

    #[test]
    fn test_circular_dependency() {
        struct A {
            _b: Arc<B>,
        }
        struct B {
            _a: Arc<A>,
        }

        let ctx = Context::new();
        ctx.register_singleton(|b: Arc<B>| A { _b: b });
        ctx.register_singleton(|a: Arc<A>| B { _a: a });

        match ctx.resolve::<A>() {
            Err(DiError::CircularDependency { path, .. }) => {
                assert_eq!(path.len(), 3);
                assert!(path[0].ends_with("A"));
                assert!(path[1].ends_with("B"));
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("cycle should not resolve"),
        }
    }

    #[test]
    fn test_clear_and_unregister() {
        let root = Context::new();
        root.register_value(Arc::new(TestService {
            value: "root".into(),
        }));

        let child = root.scope();
        child.register_singleton(Dependent::new);
        child.register_value(Arc::new(TestService {
            value: "child".into(),
        }));

        assert!(child.unregister::<TestService>());
        assert_eq!(child.resolve::<TestService>().unwrap().value, "root");

        child.clear();
        assert!(child.is_empty());
        assert!(child.contains::<TestService>());
    }

    #[test]
    fn test_context_ref() {
        let ctx = Context::new();
        ctx.register_value(Arc::new(TestService {
            value: "held".into(),
        }));

        let weak = ctx.downgrade();
        assert!(weak.is_alive());
        assert_eq!(weak.resolve::<TestService>().unwrap().value, "held");

        drop(ctx);
        assert!(!weak.is_alive());
        assert!(matches!(weak.resolve::<TestService>(), Err(DiError::ContextDropped)));
    }
}
