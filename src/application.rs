//! Application context: a context built from a list of registrations

use crate::context::ContextRef;
use crate::registration::Registration;
use crate::{Context, Provider};
use std::any::TypeId;
use std::ops::Deref;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::info;

/// A [`Context`] populated from registrations at construction.
///
/// The context registers a [`ContextRef`] to itself first, so components can
/// take `Arc<ContextRef>` as a dependency to reach the context they were
/// built in. Registrations are bound in the order given; a later one for the
/// same type replaces an earlier one.
///
/// Dereferences to [`Context`], so every resolution method is available.
///
/// # Example
///
/// ```rust
/// use diy_ioc::{ApplicationContext, ContextRef, singleton, value};
/// use std::sync::Arc;
///
/// struct Port(u16);
///
/// struct Server {
///     ctx: Arc<ContextRef>,
/// }
///
/// impl Server {
///     fn port(&self) -> u16 {
///         self.ctx.resolve::<Port>().map(|p| p.0).unwrap_or(80)
///     }
/// }
///
/// let app = ApplicationContext::new((
///     value(Arc::new(Port(8080))),
///     singleton(|ctx: Arc<ContextRef>| Server { ctx }),
/// ));
///
/// assert_eq!(app.resolve::<Server>().unwrap().port(), 8080);
/// ```
#[derive(Clone, Debug)]
pub struct ApplicationContext {
    context: Context,
}

impl ApplicationContext {
    /// Create a root application context from `registrations`.
    pub fn new<R: Registration>(registrations: R) -> Self {
        Self::populate(Context::new(), registrations)
    }

    /// Create an application context as a child of `parent`.
    ///
    /// Types not registered here resolve through `parent` and its ancestors.
    pub fn with_parent<R: Registration>(parent: &Context, registrations: R) -> Self {
        Self::populate(parent.scope(), registrations)
    }

    fn populate<R: Registration>(context: Context, registrations: R) -> Self {
        context.register(
            TypeId::of::<ContextRef>(),
            Provider::value(Arc::new(context.downgrade())),
        );
        registrations.register(&context);

        #[cfg(feature = "logging")]
        info!(
            target: "diy_ioc",
            depth = context.depth(),
            providers = context.len(),
            "Application context ready"
        );

        Self { context }
    }

    /// The underlying context
    #[inline]
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Consume the application context, returning the underlying context.
    #[inline]
    pub fn into_context(self) -> Context {
        self.context
    }
}

impl Deref for ApplicationContext {
    type Target = Context;

    #[inline]
    fn deref(&self) -> &Context {
        &self.context
    }
}

impl AsRef<Context> for ApplicationContext {
    #[inline]
    fn as_ref(&self) -> &Context {
        &self.context
    }
}

impl From<ApplicationContext> for Context {
    #[inline]
    fn from(app: ApplicationContext) -> Self {
        app.context
    }
}
