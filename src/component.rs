//! Components: types that declare their own dependencies
//!
//! A [`Component`] names the handles it needs through an associated type and
//! builds itself from them in `create_instance`. That declaration is all a
//! context needs to wire it: [`component`](crate::component()) registers it,
//! and [`Context::resolve_component`] registers it on first use.
//!
//! # Example
//!
//! ```rust
//! use diy_ioc::{Component, Context};
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct Config {
//!     debug: bool,
//! }
//!
//! struct Logger {
//!     config: Arc<Config>,
//! }
//!
//! impl Component for Logger {
//!     type Dependencies = Arc<Config>;
//!
//!     fn create_instance(config: Arc<Config>) -> Arc<Self> {
//!         Arc::new(Logger { config })
//!     }
//! }
//!
//! let ctx = Context::new();
//! ctx.register_value(Arc::new(Config { debug: true }));
//!
//! let logger = ctx.resolve_component::<Logger>().unwrap();
//! assert!(logger.config.debug);
//! ```

use crate::{Context, DiError, Injectable, Result};
use std::any::TypeId;
use std::ops::Deref;
use std::sync::Arc;

// =============================================================================
// Dependency - a single resolvable parameter
// =============================================================================

/// A single parameter that can be resolved from a context.
///
/// Implemented for:
/// - `Arc<T>` - required; resolution fails if `T` is not available
/// - `Option<Arc<T>>` - optional; `None` if `T` is not registered
/// - [`Auto<T>`] - falls back to a root singleton of `T::default()`
/// - [`Autowired<T>`] - falls back to a root singleton wired from `T`'s [`Component`] impl
pub trait Dependency: Sized {
    /// Resolve this parameter from the context.
    fn resolve_from(ctx: &Context) -> Result<Self>;
}

impl<T: ?Sized + Injectable> Dependency for Arc<T> {
    #[inline]
    fn resolve_from(ctx: &Context) -> Result<Self> {
        ctx.resolve::<T>()
    }
}

impl<T: ?Sized + Injectable> Dependency for Option<Arc<T>> {
    /// `None` only when `T` itself is unregistered; failures while building
    /// a registered `T` propagate.
    #[inline]
    fn resolve_from(ctx: &Context) -> Result<Self> {
        match ctx.resolve::<T>() {
            Ok(instance) => Ok(Some(instance)),
            Err(DiError::NotFound { type_id, .. }) if type_id == TypeId::of::<T>() => Ok(None),
            Err(err) => Err(err),
        }
    }
}

// =============================================================================
// Auto-registering dependencies
// =============================================================================

/// A dependency on `T` that falls back to `T::default()`.
///
/// When no context in the chain provides `T`, a default-constructed
/// singleton is registered at the root and used from then on. Dereferences
/// to `T`.
///
/// ```rust
/// use diy_ioc::{Auto, Context};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Metrics;
///
/// struct Handler {
///     metrics: Arc<Metrics>,
/// }
///
/// let root = Context::new();
/// let request = root.scope();
/// request.register_singleton(|metrics: Auto<Metrics>| Handler {
///     metrics: metrics.into_inner(),
/// });
///
/// let handler = request.resolve::<Handler>().unwrap();
/// assert!(Arc::ptr_eq(&handler.metrics, &root.resolve::<Metrics>().unwrap()));
/// ```
pub struct Auto<T>(Arc<T>);

/// A dependency on a [`Component`], wired from its own declaration when
/// nothing provides it.
///
/// The fallback is the same as [`Context::resolve_component`]: a singleton
/// registered at the root of the chain. Dereferences to `T`.
pub struct Autowired<T>(Arc<T>);

macro_rules! impl_auto_handle {
    ($Handle:ident) => {
        impl<T> $Handle<T> {
            /// The shared handle
            #[inline]
            pub fn into_inner(self) -> Arc<T> {
                self.0
            }
        }

        impl<T> Deref for $Handle<T> {
            type Target = T;

            #[inline]
            fn deref(&self) -> &T {
                &self.0
            }
        }

        impl<T> Clone for $Handle<T> {
            #[inline]
            fn clone(&self) -> Self {
                Self(Arc::clone(&self.0))
            }
        }

        impl<T> From<$Handle<T>> for Arc<T> {
            #[inline]
            fn from(handle: $Handle<T>) -> Arc<T> {
                handle.0
            }
        }

        impl<T: std::fmt::Debug> std::fmt::Debug for $Handle<T> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_tuple(stringify!($Handle)).field(&self.0).finish()
            }
        }
    };
}

impl_auto_handle!(Auto);
impl_auto_handle!(Autowired);

impl<T: Injectable + Default> Dependency for Auto<T> {
    #[inline]
    fn resolve_from(ctx: &Context) -> Result<Self> {
        ctx.resolve_or_default::<T>().map(Auto)
    }
}

impl<T: Component> Dependency for Autowired<T> {
    #[inline]
    fn resolve_from(ctx: &Context) -> Result<Self> {
        ctx.resolve_component::<T>().map(Autowired)
    }
}

// =============================================================================
// Dependencies - a full parameter list
// =============================================================================

/// A dependency list that can be resolved from a context, in order.
///
/// This is automatically implemented for:
/// - `()` - no dependencies
/// - a single `Arc<T>`, `Option<Arc<T>>`, [`Auto<T>`] or [`Autowired<T>`]
/// - tuples of dependencies (up to 12)
pub trait Dependencies: Sized {
    /// Resolve every dependency, left to right.
    fn resolve_all(ctx: &Context) -> Result<Self>;

    /// Type names of the dependencies, for diagnostics.
    fn type_names() -> Vec<&'static str>;
}

impl Dependencies for () {
    #[inline]
    fn resolve_all(_ctx: &Context) -> Result<Self> {
        Ok(())
    }

    fn type_names() -> Vec<&'static str> {
        vec![]
    }
}

impl<T: ?Sized + Injectable> Dependencies for Arc<T> {
    #[inline]
    fn resolve_all(ctx: &Context) -> Result<Self> {
        Self::resolve_from(ctx)
    }

    fn type_names() -> Vec<&'static str> {
        vec![std::any::type_name::<T>()]
    }
}

impl<T: ?Sized + Injectable> Dependencies for Option<Arc<T>> {
    #[inline]
    fn resolve_all(ctx: &Context) -> Result<Self> {
        Self::resolve_from(ctx)
    }

    fn type_names() -> Vec<&'static str> {
        vec![std::any::type_name::<T>()]
    }
}

impl<T: Injectable + Default> Dependencies for Auto<T> {
    #[inline]
    fn resolve_all(ctx: &Context) -> Result<Self> {
        Self::resolve_from(ctx)
    }

    fn type_names() -> Vec<&'static str> {
        vec![std::any::type_name::<T>()]
    }
}

impl<T: Component> Dependencies for Autowired<T> {
    #[inline]
    fn resolve_all(ctx: &Context) -> Result<Self> {
        Self::resolve_from(ctx)
    }

    fn type_names() -> Vec<&'static str> {
        vec![std::any::type_name::<T>()]
    }
}

macro_rules! impl_dependencies_tuple {
    ($($T:ident),+) => {
        impl<$($T: Dependency),+> Dependencies for ($($T,)+) {
            #[inline]
            fn resolve_all(ctx: &Context) -> Result<Self> {
                Ok(($($T::resolve_from(ctx)?,)+))
            }

            fn type_names() -> Vec<&'static str> {
                vec![$(std::any::type_name::<$T>()),+]
            }
        }
    };
}

impl_dependencies_tuple!(A);
impl_dependencies_tuple!(A, B);
impl_dependencies_tuple!(A, B, C);
impl_dependencies_tuple!(A, B, C, D);
impl_dependencies_tuple!(A, B, C, D, E);
impl_dependencies_tuple!(A, B, C, D, E, F);
impl_dependencies_tuple!(A, B, C, D, E, F, G);
impl_dependencies_tuple!(A, B, C, D, E, F, G, H);
impl_dependencies_tuple!(A, B, C, D, E, F, G, H, I);
impl_dependencies_tuple!(A, B, C, D, E, F, G, H, I, J);
impl_dependencies_tuple!(A, B, C, D, E, F, G, H, I, J, K);
impl_dependencies_tuple!(A, B, C, D, E, F, G, H, I, J, K, L);

// =============================================================================
// Component
// =============================================================================

/// A type with a self-declared factory.
///
/// `Dependencies` is the parameter list of the factory and `create_instance`
/// the factory itself; both parameters and result are shared handles. With
/// the `derive` feature, `#[derive(Component)]` writes this impl from the
/// struct's `#[inject]` fields.
pub trait Component: Injectable + Sized {
    /// Handles the factory needs. Use `()` for none, `Arc<T>` for one, or a tuple.
    type Dependencies: Dependencies;

    /// Build an instance from resolved dependencies.
    fn create_instance(deps: Self::Dependencies) -> Arc<Self>;
}

/// Resolve `T`'s declared dependencies from `ctx` and build it.
#[inline]
pub(crate) fn construct<T: Component>(ctx: &Context) -> Result<Arc<T>> {
    let deps = T::Dependencies::resolve_all(ctx)?;
    Ok(T::create_instance(deps))
}
