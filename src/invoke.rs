//! Calling functions with their parameters resolved from a context
//!
//! Any function whose parameters are all [`Dependency`] handles is a
//! [`Signature`]: the context can supply every argument. The same trait backs
//! constructor registration, so `singleton(Controller::new)` learns the
//! controller's dependencies from `Controller::new`'s parameter list.
//!
//! Two parameter styles are supported:
//!
//! - shared handles (`Arc<T>`, `Option<Arc<T>>`) via [`call`] and [`call_method`]
//! - plain references (`&T`) via [`call_ref`] and [`call_method_ref`]
//!
//! One callable uses one style: `|a: Arc<A>, b: &B|` is neither a
//! [`Signature`] nor a [`RefSignature`]. Take every parameter as a handle and
//! borrow through it (`&*b`) when a function needs a mix.
//!
//! Leading arguments that are not dependencies are supplied by capturing them
//! in a closure.
//!
//! # Example
//!
//! ```rust
//! use diy_ioc::{Context, call, call_ref};
//! use std::sync::Arc;
//!
//! struct Greeting(String);
//! struct Name(String);
//!
//! fn greet(greeting: Arc<Greeting>, name: Arc<Name>) -> String {
//!     format!("{}, {}", greeting.0, name.0)
//! }
//!
//! fn shout(greeting: &Greeting, name: &Name) -> String {
//!     format!("{} {}!", greeting.0.to_uppercase(), name.0.to_uppercase())
//! }
//!
//! let ctx = Context::new();
//! ctx.register_value(Arc::new(Greeting("Hello".into())));
//! ctx.register_value(Arc::new(Name("world".into())));
//!
//! assert_eq!(call(&ctx, greet).unwrap(), "Hello, world");
//! assert_eq!(call_ref(&ctx, shout).unwrap(), "HELLO WORLD!");
//!
//! let punctuation = '?';
//! let asked = call(&ctx, |g: Arc<Greeting>| format!("{}{}", g.0, punctuation)).unwrap();
//! assert_eq!(asked, "Hello?");
//! ```

use crate::component::Dependency;
use crate::{Context, Injectable, Result};
use std::marker::PhantomData;

/// A function whose every parameter is a [`Dependency`].
///
/// `Args` is the parameter tuple; it only disambiguates implementations and
/// is inferred at the call site.
pub trait Signature<Args> {
    /// Return type of the function
    type Output;

    /// Resolve every parameter from `ctx` in declaration order and call.
    fn call_with(&self, ctx: &Context) -> Result<Self::Output>;
}

/// A method taking `&O` followed by [`Dependency`] parameters.
pub trait Method<O: ?Sized, Args> {
    /// Return type of the method
    type Output;

    /// Resolve every parameter after the receiver and call.
    fn call_on(&self, receiver: &O, ctx: &Context) -> Result<Self::Output>;
}

/// A function whose every parameter is a reference to a registered type.
pub trait RefSignature<Args> {
    /// Return type of the function
    type Output;

    /// Resolve every referenced type from `ctx` and call with borrows of the handles.
    fn call_with(&self, ctx: &Context) -> Result<Self::Output>;
}

/// A method taking `&O` followed by references to registered types.
pub trait RefMethod<O: ?Sized, Args> {
    /// Return type of the method
    type Output;

    /// Resolve every referenced type and call on `receiver`.
    fn call_on(&self, receiver: &O, ctx: &Context) -> Result<Self::Output>;
}

macro_rules! impl_signatures {
    ($($A:ident),*) => {
        impl<Func, R, $($A,)*> Signature<($($A,)*)> for Func
        where
            Func: Fn($($A),*) -> R,
            $($A: Dependency,)*
        {
            type Output = R;

            #[inline]
            #[allow(non_snake_case, unused_variables)]
            fn call_with(&self, ctx: &Context) -> Result<R> {
                $(let $A = $A::resolve_from(ctx)?;)*
                Ok(self($($A),*))
            }
        }

        impl<Func, O, R, $($A,)*> Method<O, ($($A,)*)> for Func
        where
            Func: Fn(&O, $($A),*) -> R,
            O: ?Sized,
            $($A: Dependency,)*
        {
            type Output = R;

            #[inline]
            #[allow(non_snake_case, unused_variables)]
            fn call_on(&self, receiver: &O, ctx: &Context) -> Result<R> {
                $(let $A = $A::resolve_from(ctx)?;)*
                Ok(self(receiver, $($A),*))
            }
        }

        impl<Func, R, $($A,)*> RefSignature<($(PhantomData<$A>,)*)> for Func
        where
            Func: Fn($(&$A),*) -> R,
            $($A: ?Sized + Injectable,)*
        {
            type Output = R;

            #[inline]
            #[allow(non_snake_case, unused_variables)]
            fn call_with(&self, ctx: &Context) -> Result<R> {
                $(let $A = ctx.resolve::<$A>()?;)*
                Ok(self($(&*$A),*))
            }
        }

        impl<Func, O, R, $($A,)*> RefMethod<O, ($(PhantomData<$A>,)*)> for Func
        where
            Func: Fn(&O, $(&$A),*) -> R,
            O: ?Sized,
            $($A: ?Sized + Injectable,)*
        {
            type Output = R;

            #[inline]
            #[allow(non_snake_case, unused_variables)]
            fn call_on(&self, receiver: &O, ctx: &Context) -> Result<R> {
                $(let $A = ctx.resolve::<$A>()?;)*
                Ok(self(receiver, $(&*$A),*))
            }
        }
    };
}

impl_signatures!();
impl_signatures!(A1);
impl_signatures!(A1, A2);
impl_signatures!(A1, A2, A3);
impl_signatures!(A1, A2, A3, A4);
impl_signatures!(A1, A2, A3, A4, A5);
impl_signatures!(A1, A2, A3, A4, A5, A6);
impl_signatures!(A1, A2, A3, A4, A5, A6, A7);
impl_signatures!(A1, A2, A3, A4, A5, A6, A7, A8);

/// Call `f`, resolving every parameter from `ctx`.
///
/// Returns `f`'s result, or the first resolution error.
#[inline]
pub fn call<Args, F: Signature<Args>>(ctx: &Context, f: F) -> Result<F::Output> {
    f.call_with(ctx)
}

/// Call a method on `receiver`, resolving every parameter after `&self`.
///
/// ```rust
/// use diy_ioc::{Context, call_method};
/// use std::sync::Arc;
///
/// struct Counter(u32);
/// struct Report;
///
/// impl Report {
///     fn describe(&self, counter: Arc<Counter>) -> String {
///         format!("count={}", counter.0)
///     }
/// }
///
/// let ctx = Context::new();
/// ctx.register_value(Arc::new(Counter(3)));
///
/// assert_eq!(call_method(&ctx, &Report, Report::describe).unwrap(), "count=3");
/// ```
#[inline]
pub fn call_method<O: ?Sized, Args, F: Method<O, Args>>(
    ctx: &Context,
    receiver: &O,
    f: F,
) -> Result<F::Output> {
    f.call_on(receiver, ctx)
}

/// Call `f`, passing references to instances resolved from `ctx`.
#[inline]
pub fn call_ref<Args, F: RefSignature<Args>>(ctx: &Context, f: F) -> Result<F::Output> {
    f.call_with(ctx)
}

/// Call a method on `receiver`, passing references to resolved instances.
#[inline]
pub fn call_method_ref<O: ?Sized, Args, F: RefMethod<O, Args>>(
    ctx: &Context,
    receiver: &O,
    f: F,
) -> Result<F::Output> {
    f.call_on(receiver, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct DependencyA {
        x: String,
    }

    struct DependencyB {
        x: i32,
    }

    impl Default for DependencyB {
        fn default() -> Self {
            DependencyB { x: 42 }
        }
    }

    fn ctx_with_deps() -> Context {
        let ctx = Context::new();
        ctx.register_singleton(|| DependencyA {
            x: "its an A!".into(),
        });
        ctx.register_singleton(DependencyB::default);
        ctx
    }

    fn with_handles(a: Arc<DependencyA>, b: Arc<DependencyB>) -> String {
        format!("with value: {} with {}", a.x, b.x)
    }

    fn with_refs(a: &DependencyA, b: &DependencyB) -> String {
        format!("with refs: {} with {}", a.x, b.x)
    }

    fn no_result(_a: Arc<DependencyA>, _b: Arc<DependencyB>) {}

    struct TestObj {
        calls: AtomicU32,
    }

    impl TestObj {
        fn with_handles(&self, a: Arc<DependencyA>, b: Arc<DependencyB>) -> String {
            self.calls.fetch_add(1, Ordering::SeqCst);
            format!("with value: {} with {}", a.x, b.x)
        }

        fn with_refs(&self, a: &DependencyA, b: &DependencyB) {
            assert_eq!(a.x, "its an A!");
            assert_eq!(b.x, 42);
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_mixed_use_through_handles() {
        let ctx = ctx_with_deps();
        let result = call(&ctx, |a: Arc<DependencyA>, b: Arc<DependencyB>| {
            let kept = Arc::clone(&a);
            with_refs(&kept, &b)
        });
        assert_eq!(result.unwrap(), "with refs: its an A! with 42");
    }

    #[test]
    fn test_call_free_function() {
        let ctx = ctx_with_deps();

        call(&ctx, no_result).unwrap();
        let s = call(&ctx, with_handles).unwrap();
        assert_eq!(s, "with value: its an A! with 42");
    }

    #[test]
    fn test_call_with_refs() {
        let ctx = ctx_with_deps();
        let s = call_ref(&ctx, with_refs).unwrap();
        assert_eq!(s, "with refs: its an A! with 42");
    }

    #[test]
    fn test_call_method() {
        let ctx = ctx_with_deps();
        let obj = TestObj {
            calls: AtomicU32::new(0),
        };

        let s = call_method(&ctx, &obj, TestObj::with_handles).unwrap();
        assert_eq!(s, "with value: its an A! with 42");

        call_method_ref(&ctx, &obj, TestObj::with_refs).unwrap();
        assert_eq!(obj.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_call_resolves_same_singletons() {
        let ctx = ctx_with_deps();
        let first = call(&ctx, |a: Arc<DependencyA>| a).unwrap();
        let second = call(&ctx, |a: Arc<DependencyA>| a).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_leading_arguments_by_capture() {
        let ctx = ctx_with_deps();
        let prefix = "leading";
        let s = call(&ctx, |b: Arc<DependencyB>| format!("{prefix}:{}", b.x)).unwrap();
        assert_eq!(s, "leading:42");
    }

    #[test]
    fn test_missing_dependency_fails_call() {
        let ctx = Context::new();
        let err = call(&ctx, with_handles).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_optional_parameter() {
        let ctx = Context::new();
        let got = call(&ctx, |a: Option<Arc<DependencyA>>| a.is_some()).unwrap();
        assert!(!got);
    }
}
