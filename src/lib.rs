//! # diy-ioc - A Small Type-Driven IOC Container
//!
//! A type-indexed registry that maps types to construction strategies and
//! wires dependency graphs on first use.
//!
//! ## Features
//!
//! - **Type-driven** - constructors declare their dependencies in their own parameter lists
//! - **Three lifetimes** - singletons, per-resolution factories, and external values
//! - **Interfaces** - register a concrete type under a `dyn Trait` key
//! - **Context chains** - child contexts shadow their ancestors for the whole dependency subtree
//! - **Cycle detection** - circular graphs fail with the offending path instead of recursing
//! - **Observable** - optional tracing integration with JSON or pretty output
//!
//! ## Quick Start
//!
//! ```rust
//! use diy_ioc::{ApplicationContext, singleton};
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct Database;
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! impl UserService {
//!     fn new(db: Arc<Database>) -> Self {
//!         UserService { db }
//!     }
//! }
//!
//! // Registration order does not matter; nothing is built until resolved
//! let ctx = ApplicationContext::new((
//!     singleton(UserService::new),
//!     singleton(Database::default),
//! ));
//!
//! let users = ctx.resolve::<UserService>().unwrap();
//! assert!(Arc::ptr_eq(&users.db, &ctx.resolve::<Database>().unwrap()));
//! ```
//!
//! ## Lifetimes
//!
//! ```rust
//! use diy_ioc::{ApplicationContext, provider, singleton, value};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU64, Ordering};
//!
//! struct Config { debug: bool }
//! struct Sequence(AtomicU64);
//! struct RequestId(u64);
//!
//! let ctx = ApplicationContext::new((
//!     // Value - supplied by the caller, handed out as-is
//!     value(Arc::new(Config { debug: true })),
//!     // Singleton - built once, on first resolution
//!     singleton(|| Sequence(AtomicU64::new(1))),
//!     // Factory - built on every resolution
//!     provider(|seq: Arc<Sequence>| RequestId(seq.0.fetch_add(1, Ordering::SeqCst))),
//! ));
//!
//! assert!(ctx.resolve::<Config>().unwrap().debug);
//! assert_eq!(ctx.resolve::<RequestId>().unwrap().0, 1);
//! assert_eq!(ctx.resolve::<RequestId>().unwrap().0, 2);
//! ```
//!
//! ## Context Chains
//!
//! ```rust
//! use diy_ioc::Context;
//! use std::sync::Arc;
//!
//! struct Database { url: &'static str }
//! struct Repository { db: Arc<Database> }
//!
//! let root = Context::new();
//! root.register_value(Arc::new(Database { url: "production" }));
//! root.register_factory(|db: Arc<Database>| Repository { db });
//!
//! // The child shadows Database; Repository is still found in the root
//! // but wired against the child
//! let test = root.scope();
//! test.register_value(Arc::new(Database { url: "test" }));
//!
//! assert_eq!(root.resolve::<Repository>().unwrap().db.url, "production");
//! assert_eq!(test.resolve::<Repository>().unwrap().db.url, "test");
//! ```

mod application;
mod component;
mod context;
mod error;
mod guard;
mod invoke;
#[cfg(feature = "logging")]
pub mod logging;
mod provider;
mod registration;
mod storage;

pub use application::*;
pub use component::*;
pub use context::*;
pub use error::*;
pub use invoke::*;
pub use provider::*;
pub use registration::*;

#[cfg(feature = "derive")]
pub use diy_ioc_derive::Component;

// Re-export tracing macros for convenience when logging feature is enabled
#[cfg(feature = "logging")]
pub use tracing::{debug, error, info, trace, warn};

// Re-export for convenience
pub use std::sync::Arc;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::registration::{Module, Registration, component, provider, singleton, value};
    pub use crate::{
        ApplicationContext, Auto, Autowired, Component, Context, ContextRef, DiError, Injectable,
        Lifetime, Result, call, call_method, call_method_ref, call_ref,
    };
    pub use std::sync::Arc;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Logger {
        buffer: Mutex<String>,
        count: AtomicUsize,
    }

    impl Logger {
        fn log(&self, message: &str) {
            self.buffer.lock().unwrap().push_str(message);
            self.count.fetch_add(1, Ordering::SeqCst);
        }

        fn contents(&self) -> String {
            self.buffer.lock().unwrap().clone()
        }
    }

    struct Controller {
        logger: Arc<Logger>,
        count: AtomicUsize,
    }

    impl Controller {
        fn new(logger: Arc<Logger>) -> Self {
            Controller {
                logger,
                count: AtomicUsize::new(0),
            }
        }

        fn execute(&self, v: i32) {
            self.count.fetch_add(1, Ordering::SeqCst);
            self.logger.log(&format!("value:{v}"));
        }
    }

    struct App {
        controller: Arc<Controller>,
    }

    impl App {
        fn new(controller: Arc<Controller>) -> Self {
            App { controller }
        }

        fn run(&self, v: i32) {
            self.controller.execute(v);
        }
    }

    #[test]
    fn test_singleton_graph() {
        let ctx = ApplicationContext::new((
            singleton(Logger::default),
            singleton(Controller::new),
            singleton(App::new),
        ));

        ctx.resolve::<App>().unwrap().run(42);
        ctx.resolve::<App>().unwrap().run(43);

        let logger = ctx.resolve::<Logger>().unwrap();
        let controller = ctx.resolve::<Controller>().unwrap();
        assert_eq!(logger.contents(), "value:42value:43");
        assert_eq!(logger.count.load(Ordering::SeqCst), 2);
        assert_eq!(controller.count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_value_with_factories() {
        let logger = Arc::new(Logger::default());
        let ctx = ApplicationContext::new((
            value(Arc::clone(&logger)),
            provider(Controller::new),
            provider(App::new),
        ));

        let first = ctx.resolve::<App>().unwrap();
        first.run(42);
        let second = ctx.resolve::<App>().unwrap();
        second.run(43);

        assert!(!Arc::ptr_eq(&first.controller, &second.controller));
        assert_eq!(first.controller.count.load(Ordering::SeqCst), 1);
        assert_eq!(second.controller.count.load(Ordering::SeqCst), 1);
        assert_eq!(logger.count.load(Ordering::SeqCst), 2);
        assert!(Arc::ptr_eq(&first.controller.logger, &logger));
        assert!(Arc::ptr_eq(&ctx.resolve::<Logger>().unwrap(), &logger));
    }

    trait Log: Send + Sync {
        fn log(&self, message: &str);
    }

    trait Run: Send + Sync {
        fn run(&self, v: i32);
    }

    impl Log for Logger {
        fn log(&self, message: &str) {
            Logger::log(self, message);
        }
    }

    struct LoggingRunner {
        log: Arc<dyn Log>,
    }

    impl Run for LoggingRunner {
        fn run(&self, v: i32) {
            self.log.log(&format!("run:{v}"));
        }
    }

    #[test]
    fn test_interfaces() {
        let logger = Arc::new(Logger::default());
        let ctx = ApplicationContext::new((
            singleton(|log: Arc<dyn Log>| LoggingRunner { log })
                .as_interface(|runner| runner as Arc<dyn Run>),
            value(Arc::clone(&logger)).as_interface(|logger| logger as Arc<dyn Log>),
        ));

        ctx.resolve::<dyn Run>().unwrap().run(7);
        assert_eq!(logger.contents(), "run:7");
        assert!(!ctx.contains::<Logger>());
        assert!(!ctx.contains::<LoggingRunner>());
    }

    struct Reporter {
        ctx: Arc<ContextRef>,
    }

    impl Component for Reporter {
        type Dependencies = Arc<ContextRef>;

        fn create_instance(ctx: Arc<ContextRef>) -> Arc<Self> {
            Arc::new(Reporter { ctx })
        }
    }

    #[test]
    fn test_component_depending_on_context() {
        let ctx = ApplicationContext::new((component::<Reporter>(), singleton(Logger::default)));

        let reporter = ctx.resolve::<Reporter>().unwrap();
        let logger = reporter.ctx.resolve::<Logger>().unwrap();
        assert!(Arc::ptr_eq(&logger, &ctx.resolve::<Logger>().unwrap()));
    }

    #[test]
    fn test_default_auto_registration() {
        #[derive(Debug)]
        struct NoDefault;

        let ctx = Context::new();
        let logger = ctx.resolve_or_default::<Logger>().unwrap();
        assert!(ctx.contains_local::<Logger>());
        assert!(Arc::ptr_eq(&logger, &ctx.resolve::<Logger>().unwrap()));

        assert!(ctx.resolve::<NoDefault>().unwrap_err().is_not_found());
    }

    impl Component for Controller {
        type Dependencies = Auto<Logger>;

        fn create_instance(logger: Auto<Logger>) -> Arc<Self> {
            Arc::new(Controller::new(logger.into_inner()))
        }
    }

    impl Component for App {
        type Dependencies = Autowired<Controller>;

        fn create_instance(controller: Autowired<Controller>) -> Arc<Self> {
            Arc::new(App::new(controller.into_inner()))
        }
    }

    #[test]
    fn test_nested_graph_auto_registers_at_root() {
        let root = ApplicationContext::new(());
        let request = root.scope();

        request.resolve_component::<App>().unwrap().run(42);
        root.resolve::<App>().unwrap().run(43);

        assert!(root.contains_local::<Logger>());
        assert!(root.contains_local::<Controller>());
        assert!(root.contains_local::<App>());
        assert!(request.is_empty());

        let logger = root.resolve::<Logger>().unwrap();
        assert_eq!(logger.contents(), "value:42value:43");
        assert_eq!(root.lifetime_of::<Controller>(), Some(Lifetime::Singleton));
    }

    #[test]
    fn test_auto_dependency_in_constructor() {
        let ctx = Context::new();
        ctx.register_singleton(|logger: Auto<Logger>| Controller::new(logger.into_inner()));

        ctx.resolve::<Controller>().unwrap().execute(1);
        assert_eq!(ctx.resolve::<Logger>().unwrap().contents(), "value:1");
        assert_eq!(ctx.lifetime_of::<Logger>(), Some(Lifetime::Singleton));
    }

    #[test]
    fn test_call_against_application_context() {
        let ctx = ApplicationContext::new((singleton(Logger::default), singleton(Controller::new)));

        call(&ctx, |c: Arc<Controller>| c.execute(1)).unwrap();
        call_ref(&ctx, |c: &Controller, l: &Logger| {
            c.execute(2);
            assert_eq!(l.count.load(Ordering::SeqCst), 2);
        })
        .unwrap();

        assert_eq!(ctx.resolve::<Logger>().unwrap().contents(), "value:1value:2");
    }

    #[test]
    fn test_failure_keeps_cached_dependencies() {
        struct Missing;
        #[derive(Debug)]
        struct NeedsMissing;

        let ctx = ApplicationContext::new((
            singleton(Logger::default),
            singleton(|_l: Arc<Logger>, _m: Arc<Missing>| NeedsMissing),
        ));

        let err = ctx.resolve::<NeedsMissing>().unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(ctx.lifetime_of::<Logger>(), Some(Lifetime::Singleton));

        // Logger was built during the failed attempt and stays cached
        let logger = ctx.resolve::<Logger>().unwrap();
        logger.log("x");
        assert_eq!(ctx.resolve::<Logger>().unwrap().contents(), "x");
    }
}
