//! Registry entries: how an instance of one type is produced
//!
//! A [`Provider`] owns exactly one construction strategy:
//!
//! - **Factory** - constructs a fresh instance on every resolution
//! - **Singleton** - constructs once on first resolution, then hands out the cached handle
//! - **Value** - wraps an externally owned handle supplied at registration
//!
//! Providers are type-erased so a [`Context`] can key them by `TypeId`. The
//! erased value is always an `Arc<T>` boxed as `dyn Any`, which lets `T` be
//! unsized (`dyn Trait`) and is recovered with a checked downcast.

use crate::guard::ResolutionGuard;
use crate::{Context, DiError, Result};
use once_cell::sync::OnceCell;
use std::any::Any;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// Marker trait for types that can be stored in and resolved from a [`Context`].
///
/// Implemented automatically for every `Send + Sync + 'static` type,
/// including trait objects such as `dyn Logger + Send + Sync`.
pub trait Injectable: Send + Sync + 'static {}

impl<T: ?Sized + Send + Sync + 'static> Injectable for T {}

/// Construction strategy of a registered provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lifetime {
    /// New instance created on every resolve
    Factory,

    /// Created on first resolve, then shared
    #[default]
    Singleton,

    /// Externally owned instance, never constructed by the context
    Value,
}

/// An `Arc<T>` with its type erased
pub(crate) type Erased = Box<dyn Any + Send + Sync>;

/// Type-erased constructor. Receives the context the resolution originated from.
type ErasedCtor = Arc<dyn Fn(&Context) -> Result<Erased> + Send + Sync>;

#[inline]
fn erase<T, F>(ctor: F) -> ErasedCtor
where
    T: ?Sized + Injectable,
    F: Fn(&Context) -> Result<Arc<T>> + Send + Sync + 'static,
{
    Arc::new(move |ctx: &Context| ctor(ctx).map(|instance| Box::new(instance) as Erased))
}

#[inline]
fn unerase<T: ?Sized + Injectable>(erased: &Erased) -> Result<Arc<T>> {
    erased
        .downcast_ref::<Arc<T>>()
        .cloned()
        .ok_or_else(DiError::type_mismatch::<T>)
}

// =============================================================================
// Factory
// =============================================================================

/// Builds a new instance on every resolution. Holds no state.
pub struct FactoryProvider {
    ctor: ErasedCtor,
    type_name: &'static str,
}

impl FactoryProvider {
    fn create<T: ?Sized + Injectable>(&self, ctx: &Context, key: usize) -> Result<Arc<T>> {
        let _guard = ResolutionGuard::enter(key, self.type_name)?;

        #[cfg(feature = "logging")]
        trace!(
            target: "diy_ioc",
            service = self.type_name,
            "Creating new factory instance"
        );

        unerase(&(self.ctor)(ctx)?)
    }
}

// =============================================================================
// Singleton
// =============================================================================

/// Builds its instance on first resolution and caches it for the provider's lifetime.
pub struct SingletonProvider {
    ctor: ErasedCtor,
    instance: OnceCell<Erased>,
    type_name: &'static str,
}

impl SingletonProvider {
    fn create<T: ?Sized + Injectable>(&self, ctx: &Context, key: usize) -> Result<Arc<T>> {
        if let Some(instance) = self.instance.get() {
            #[cfg(feature = "logging")]
            trace!(
                target: "diy_ioc",
                service = self.type_name,
                "Singleton already initialized, returning cached instance"
            );
            return unerase(instance);
        }

        // Entered before the cell so a cycle errors out instead of re-entering `get_or_try_init`
        let _guard = ResolutionGuard::enter(key, self.type_name)?;

        let instance = self.instance.get_or_try_init(|| {
            #[cfg(feature = "logging")]
            debug!(
                target: "diy_ioc",
                service = self.type_name,
                "Singleton initializing on first access"
            );

            (self.ctor)(ctx)
        })?;

        unerase(instance)
    }
}

// =============================================================================
// Value
// =============================================================================

/// Wraps a handle owned outside the context.
pub struct ValueProvider {
    instance: Erased,
    type_name: &'static str,
}

// =============================================================================
// Provider
// =============================================================================

/// A registry entry: the construction strategy for a single type identity.
///
/// The owning [`Context`] keeps providers alive for its own lifetime; a
/// provider never holds on to a context. Constructors receive the context the
/// resolution started from, so dependencies of an ancestor's provider are
/// looked up through the descendant first.
///
/// # Examples
///
/// ```rust
/// use diy_ioc::{Context, Provider};
/// use std::any::TypeId;
/// use std::sync::Arc;
///
/// struct Config { debug: bool }
///
/// let ctx = Context::new();
/// ctx.register(
///     TypeId::of::<Config>(),
///     Provider::singleton(|_ctx: &Context| Ok(Arc::new(Config { debug: true }))),
/// );
///
/// assert!(ctx.resolve::<Config>().unwrap().debug);
/// ```
pub enum Provider {
    /// Fresh instance per resolution
    Factory(FactoryProvider),
    /// Lazily constructed, then cached
    Singleton(SingletonProvider),
    /// Externally supplied handle
    Value(ValueProvider),
}

impl Provider {
    /// Create a factory provider from a constructor.
    #[inline]
    pub fn factory<T, F>(ctor: F) -> Self
    where
        T: ?Sized + Injectable,
        F: Fn(&Context) -> Result<Arc<T>> + Send + Sync + 'static,
    {
        Provider::Factory(FactoryProvider {
            ctor: erase(ctor),
            type_name: std::any::type_name::<T>(),
        })
    }

    /// Create a singleton provider from a constructor.
    #[inline]
    pub fn singleton<T, F>(ctor: F) -> Self
    where
        T: ?Sized + Injectable,
        F: Fn(&Context) -> Result<Arc<T>> + Send + Sync + 'static,
    {
        Provider::Singleton(SingletonProvider {
            ctor: erase(ctor),
            instance: OnceCell::new(),
            type_name: std::any::type_name::<T>(),
        })
    }

    /// Create a value provider wrapping an existing handle.
    #[inline]
    pub fn value<T: ?Sized + Injectable>(instance: Arc<T>) -> Self {
        Provider::Value(ValueProvider {
            instance: Box::new(instance),
            type_name: std::any::type_name::<T>(),
        })
    }

    /// Produce an instance, resolving dependencies from `ctx`.
    ///
    /// Fails with [`DiError::TypeMismatch`] if `T` is not the type this
    /// provider was built for.
    #[inline]
    pub fn create<T: ?Sized + Injectable>(&self, ctx: &Context) -> Result<Arc<T>> {
        let key = self as *const Provider as usize;
        match self {
            Provider::Factory(p) => p.create(ctx, key),
            Provider::Singleton(p) => p.create(ctx, key),
            Provider::Value(p) => unerase(&p.instance),
        }
    }

    /// The construction strategy
    #[inline]
    pub fn lifetime(&self) -> Lifetime {
        match self {
            Provider::Factory(_) => Lifetime::Factory,
            Provider::Singleton(_) => Lifetime::Singleton,
            Provider::Value(_) => Lifetime::Value,
        }
    }

    /// Name of the type this provider produces
    #[inline]
    pub fn type_name(&self) -> &'static str {
        match self {
            Provider::Factory(p) => p.type_name,
            Provider::Singleton(p) => p.type_name,
            Provider::Value(p) => p.type_name,
        }
    }

    /// Whether a shared instance exists.
    ///
    /// Factories never hold one, values always do, singletons do after
    /// their first successful resolution.
    #[inline]
    pub fn is_initialized(&self) -> bool {
        match self {
            Provider::Factory(_) => false,
            Provider::Singleton(p) => p.instance.get().is_some(),
            Provider::Value(_) => true,
        }
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("lifetime", &self.lifetime())
            .field("type_name", &self.type_name())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
