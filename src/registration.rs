//! Declarative registration helpers
//!
//! Each helper describes *how* a type is produced without touching a context.
//! Binding happens later, when the helper is handed to
//! [`ApplicationContext::new`](crate::ApplicationContext::new) or
//! [`Registration::register`] is called directly. Helpers are reusable: every
//! bind installs a fresh provider, so two contexts never share a singleton
//! through the same helper.
//!
//! | helper          | provider   | instance                         |
//! |-----------------|------------|----------------------------------|
//! | [`singleton`]   | Singleton  | built once by the constructor    |
//! | [`provider()`]  | Factory    | built on every resolution        |
//! | [`value`]       | Value      | supplied by the caller           |
//! | [`component`]   | Singleton  | built by [`Component::create_instance`] |
//!
//! Every helper can be re-keyed to an interface with `as_interface`.
//!
//! # Example
//!
//! ```rust
//! use diy_ioc::{ApplicationContext, Registration, singleton, value};
//! use std::sync::Arc;
//!
//! trait Greeter: Send + Sync {
//!     fn greet(&self) -> String;
//! }
//!
//! struct English { name: Arc<String> }
//!
//! impl Greeter for English {
//!     fn greet(&self) -> String {
//!         format!("Hello, {}", self.name)
//!     }
//! }
//!
//! let ctx = ApplicationContext::new((
//!     singleton(|name: Arc<String>| English { name })
//!         .as_interface(|english| english as Arc<dyn Greeter>),
//!     value(Arc::new(String::from("world"))),
//! ));
//!
//! let greeter = ctx.resolve::<dyn Greeter>().unwrap();
//! assert_eq!(greeter.greet(), "Hello, world");
//! ```

use crate::component::{self, Component};
use crate::{Context, Injectable, Provider, Result, Signature};
use std::any::TypeId;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::debug;

/// Something that can bind providers into a context.
pub trait Registration {
    /// Install this registration's providers into `ctx`.
    fn register(&self, ctx: &Context);
}

/// Shared typed constructor
type Ctor<T> = Arc<dyn Fn(&Context) -> Result<Arc<T>> + Send + Sync>;

#[inline]
fn from_signature<Args, F>(ctor: F) -> Ctor<F::Output>
where
    F: Signature<Args> + Send + Sync + 'static,
    F::Output: Injectable,
{
    Arc::new(move |ctx: &Context| ctor.call_with(ctx).map(Arc::new))
}

#[inline]
fn cast_ctor<T, I, C>(ctor: Ctor<T>, cast: C) -> Ctor<I>
where
    T: ?Sized + Injectable,
    I: ?Sized + Injectable,
    C: Fn(Arc<T>) -> Arc<I> + Send + Sync + 'static,
{
    Arc::new(move |ctx: &Context| (ctor)(ctx).map(&cast))
}

// =============================================================================
// Singleton
// =============================================================================

/// Registers a lazily constructed, cached instance. See [`singleton`].
pub struct SingletonRegistration<T: ?Sized> {
    ctor: Ctor<T>,
}

/// Describe a singleton built by `ctor`, whose parameters are resolved from the context.
///
/// ```rust
/// use diy_ioc::{ApplicationContext, singleton};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Logger;
///
/// struct Controller { logger: Arc<Logger> }
///
/// impl Controller {
///     fn new(logger: Arc<Logger>) -> Self {
///         Controller { logger }
///     }
/// }
///
/// let ctx = ApplicationContext::new((
///     singleton(Logger::default),
///     singleton(Controller::new),
/// ));
///
/// let a = ctx.resolve::<Controller>().unwrap();
/// let b = ctx.resolve::<Controller>().unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
#[inline]
pub fn singleton<Args, F>(ctor: F) -> SingletonRegistration<F::Output>
where
    F: Signature<Args> + Send + Sync + 'static,
    F::Output: Injectable,
{
    SingletonRegistration {
        ctor: from_signature(ctor),
    }
}

impl<T: ?Sized + Injectable> SingletonRegistration<T> {
    /// Register under interface `I` instead of the concrete type.
    #[inline]
    pub fn as_interface<I, C>(self, cast: C) -> SingletonRegistration<I>
    where
        I: ?Sized + Injectable,
        C: Fn(Arc<T>) -> Arc<I> + Send + Sync + 'static,
    {
        SingletonRegistration {
            ctor: cast_ctor(self.ctor, cast),
        }
    }
}

impl<T: ?Sized + Injectable> Registration for SingletonRegistration<T> {
    fn register(&self, ctx: &Context) {
        let ctor = Arc::clone(&self.ctor);
        ctx.register(
            TypeId::of::<T>(),
            Provider::singleton(move |ctx: &Context| (ctor)(ctx)),
        );
    }
}

// =============================================================================
// Provider (factory)
// =============================================================================

/// Registers a constructor run on every resolution. See [`provider()`].
pub struct ProviderRegistration<T: ?Sized> {
    ctor: Ctor<T>,
}

/// Describe a factory: `ctor` runs, with freshly resolved parameters, on every resolution.
#[inline]
pub fn provider<Args, F>(ctor: F) -> ProviderRegistration<F::Output>
where
    F: Signature<Args> + Send + Sync + 'static,
    F::Output: Injectable,
{
    ProviderRegistration {
        ctor: from_signature(ctor),
    }
}

impl<T: ?Sized + Injectable> ProviderRegistration<T> {
    /// Register under interface `I` instead of the concrete type.
    #[inline]
    pub fn as_interface<I, C>(self, cast: C) -> ProviderRegistration<I>
    where
        I: ?Sized + Injectable,
        C: Fn(Arc<T>) -> Arc<I> + Send + Sync + 'static,
    {
        ProviderRegistration {
            ctor: cast_ctor(self.ctor, cast),
        }
    }
}

impl<T: ?Sized + Injectable> Registration for ProviderRegistration<T> {
    fn register(&self, ctx: &Context) {
        let ctor = Arc::clone(&self.ctor);
        ctx.register(
            TypeId::of::<T>(),
            Provider::factory(move |ctx: &Context| (ctor)(ctx)),
        );
    }
}

// =============================================================================
// Value
// =============================================================================

/// Registers an externally owned handle. See [`value`].
pub struct ValueRegistration<T: ?Sized> {
    instance: Arc<T>,
}

/// Describe an existing instance; the context hands out clones of `instance`.
#[inline]
pub fn value<T: ?Sized + Injectable>(instance: Arc<T>) -> ValueRegistration<T> {
    ValueRegistration { instance }
}

impl<T: ?Sized + Injectable> ValueRegistration<T> {
    /// Register under interface `I` instead of the concrete type.
    #[inline]
    pub fn as_interface<I, C>(self, cast: C) -> ValueRegistration<I>
    where
        I: ?Sized + Injectable,
        C: FnOnce(Arc<T>) -> Arc<I>,
    {
        ValueRegistration {
            instance: cast(self.instance),
        }
    }
}

impl<T: ?Sized + Injectable> Registration for ValueRegistration<T> {
    fn register(&self, ctx: &Context) {
        ctx.register(TypeId::of::<T>(), Provider::value(Arc::clone(&self.instance)));
    }
}

// =============================================================================
// Component
// =============================================================================

/// Describe a singleton wired from `T`'s own [`Component`] declaration.
#[inline]
pub fn component<T: Component>() -> SingletonRegistration<T> {
    SingletonRegistration {
        ctor: Arc::new(component::construct::<T>),
    }
}

// =============================================================================
// Composition
// =============================================================================

impl Registration for () {
    #[inline]
    fn register(&self, _ctx: &Context) {}
}

impl<R: Registration + ?Sized> Registration for &R {
    #[inline]
    fn register(&self, ctx: &Context) {
        (**self).register(ctx);
    }
}

impl<R: Registration + ?Sized> Registration for Box<R> {
    #[inline]
    fn register(&self, ctx: &Context) {
        (**self).register(ctx);
    }
}

impl<R: Registration> Registration for Vec<R> {
    fn register(&self, ctx: &Context) {
        for registration in self {
            registration.register(ctx);
        }
    }
}

macro_rules! impl_registration_tuple {
    ($($R:ident),+) => {
        impl<$($R: Registration),+> Registration for ($($R,)+) {
            #[inline]
            #[allow(non_snake_case)]
            fn register(&self, ctx: &Context) {
                let ($($R,)+) = self;
                $($R.register(ctx);)+
            }
        }
    };
}

impl_registration_tuple!(A);
impl_registration_tuple!(A, B);
impl_registration_tuple!(A, B, C);
impl_registration_tuple!(A, B, C, D);
impl_registration_tuple!(A, B, C, D, E);
impl_registration_tuple!(A, B, C, D, E, F);
impl_registration_tuple!(A, B, C, D, E, F, G);
impl_registration_tuple!(A, B, C, D, E, F, G, H);
impl_registration_tuple!(A, B, C, D, E, F, G, H, I);
impl_registration_tuple!(A, B, C, D, E, F, G, H, I, J);
impl_registration_tuple!(A, B, C, D, E, F, G, H, I, J, K);
impl_registration_tuple!(A, B, C, D, E, F, G, H, I, J, K, L);

// =============================================================================
// Module
// =============================================================================

/// A named bundle of registrations, bound together.
///
/// Modules are registrations themselves, so they can be passed to an
/// application context next to plain helpers or nested in other modules.
///
/// # Example
///
/// ```rust
/// use diy_ioc::{ApplicationContext, Module, singleton, value};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Pool;
/// struct Url(&'static str);
///
/// let data = Module::new("data")
///     .with(value(Arc::new(Url("postgres://localhost"))))
///     .with(singleton(Pool::default));
///
/// let ctx = ApplicationContext::new(&data);
/// assert!(ctx.contains::<Pool>());
/// assert_eq!(ctx.resolve::<Url>().unwrap().0, "postgres://localhost");
/// ```
pub struct Module {
    name: &'static str,
    registrations: Vec<Box<dyn Registration>>,
}

impl Module {
    /// Create an empty module.
    #[inline]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            registrations: Vec::new(),
        }
    }

    /// Add a registration and continue the chain.
    #[inline]
    pub fn with<R: Registration + 'static>(mut self, registration: R) -> Self {
        self.registrations.push(Box::new(registration));
        self
    }

    /// Module name
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Number of registrations in the module
    #[inline]
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Check if the module has no registrations
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

impl Registration for Module {
    fn register(&self, ctx: &Context) {
        #[cfg(feature = "logging")]
        debug!(
            target: "diy_ioc",
            module = self.name,
            registrations = self.registrations.len(),
            depth = ctx.depth(),
            "Registering module"
        );

        for registration in &self.registrations {
            registration.register(ctx);
        }
    }
}

impl std::fmt::Debug for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("registrations", &self.registrations.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Lifetime;
    use std::sync::atomic::{AtomicU32, Ordering};

    trait Shape: Send + Sync {
        fn sides(&self) -> u32;
    }

    #[derive(Default)]
    struct Square;

    impl Shape for Square {
        fn sides(&self) -> u32 {
            4
        }
    }

    struct Counter {
        id: u32,
    }

    #[test]
    fn test_singleton_helper_reusable_across_contexts() {
        let helper = singleton(Square::default);
        let a = Context::new();
        let b = Context::new();

        helper.register(&a);
        helper.register(&b);

        let from_a = a.resolve::<Square>().unwrap();
        let from_b = b.resolve::<Square>().unwrap();
        assert!(!Arc::ptr_eq(&from_a, &from_b));
        assert!(Arc::ptr_eq(&from_a, &a.resolve::<Square>().unwrap()));
    }

    #[test]
    fn test_provider_helper_builds_fresh() {
        let next = Arc::new(AtomicU32::new(0));
        let ids = Arc::clone(&next);
        let ctx = Context::new();
        provider(move || Counter {
            id: ids.fetch_add(1, Ordering::SeqCst),
        })
        .register(&ctx);

        assert_eq!(ctx.resolve::<Counter>().unwrap().id, 0);
        assert_eq!(ctx.resolve::<Counter>().unwrap().id, 1);
        assert_eq!(ctx.lifetime_of::<Counter>(), Some(Lifetime::Factory));
    }

    #[test]
    fn test_interface_registration() {
        let ctx = Context::new();
        (
            singleton(Square::default).as_interface(|s| s as Arc<dyn Shape>),
            value(Arc::new(Counter { id: 9 })),
        )
            .register(&ctx);

        assert_eq!(ctx.resolve::<dyn Shape>().unwrap().sides(), 4);
        assert!(!ctx.contains::<Square>());
        assert_eq!(ctx.resolve::<Counter>().unwrap().id, 9);
    }

    #[test]
    fn test_value_as_interface_keeps_instance() {
        let square = Arc::new(Square);
        let shape: Arc<dyn Shape> = square.clone();
        let ctx = Context::new();
        value(square).as_interface(|s| s as Arc<dyn Shape>).register(&ctx);

        let resolved = ctx.resolve::<dyn Shape>().unwrap();
        assert!(std::ptr::addr_eq(Arc::as_ptr(&resolved), Arc::as_ptr(&shape)));
    }

    #[test]
    fn test_factory_as_interface() {
        let ctx = Context::new();
        provider(Square::default)
            .as_interface(|s| s as Arc<dyn Shape>)
            .register(&ctx);

        let a = ctx.resolve::<dyn Shape>().unwrap();
        let b = ctx.resolve::<dyn Shape>().unwrap();
        assert_eq!(a.sides() + b.sides(), 8);
        assert_eq!(ctx.lifetime_of::<dyn Shape>(), Some(Lifetime::Factory));
    }

    #[test]
    fn test_nested_modules() {
        let inner = Module::new("inner").with(singleton(Square::default));
        let outer = Module::new("outer")
            .with(inner)
            .with(value(Arc::new(Counter { id: 1 })));

        assert_eq!(outer.name(), "outer");
        assert_eq!(outer.len(), 2);

        let ctx = Context::new();
        outer.register(&ctx);
        assert!(ctx.contains::<Square>());
        assert!(ctx.contains::<Counter>());
    }

    #[test]
    fn test_vec_and_boxed_registrations() {
        let list: Vec<Box<dyn Registration>> = vec![
            Box::new(singleton(Square::default)),
            Box::new(value(Arc::new(Counter { id: 3 }))),
        ];
        let ctx = Context::new();
        list.register(&ctx);

        assert_eq!(ctx.len(), 2);
    }
}
