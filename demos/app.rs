//! Logger / Controller / App wired three ways
//!
//! ```bash
//! cargo run --example app
//! ```

use diy_ioc::{ApplicationContext, Component, ContextRef, call_method, provider, singleton, value};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

trait Log: Send + Sync {
    fn log(&self, line: String);
    fn lines(&self) -> Vec<String>;
}

#[derive(Default)]
struct MemoryLog {
    lines: Mutex<Vec<String>>,
}

impl Log for MemoryLog {
    fn log(&self, line: String) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line);
        }
    }

    fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

struct Controller {
    log: Arc<dyn Log>,
    handled: AtomicUsize,
}

impl Controller {
    fn new(log: Arc<dyn Log>) -> Self {
        Controller {
            log,
            handled: AtomicUsize::new(0),
        }
    }

    fn handle(&self, request: u32) {
        let n = self.handled.fetch_add(1, Ordering::SeqCst) + 1;
        self.log.log(format!("request {request} (#{n} on this controller)"));
    }
}

struct App {
    controller: Arc<Controller>,
}

impl App {
    fn new(controller: Arc<Controller>) -> Self {
        App { controller }
    }

    fn run(&self, request: u32) {
        self.controller.handle(request);
    }
}

/// Reads its settings through the context it was built in.
struct Banner {
    ctx: Arc<ContextRef>,
}

impl Component for Banner {
    type Dependencies = Arc<ContextRef>;

    fn create_instance(ctx: Arc<ContextRef>) -> Arc<Self> {
        Arc::new(Banner { ctx })
    }
}

impl Banner {
    fn show(&self, log: Arc<dyn Log>) {
        let lines = self.ctx.resolve::<dyn Log>().map(|l| l.lines().len()).unwrap_or(0);
        log.log(format!("banner: {lines} lines so far"));
    }
}

fn main() -> diy_ioc::Result<()> {
    println!("== singletons ==");
    let ctx = ApplicationContext::new((
        singleton(App::new),
        singleton(Controller::new),
        singleton(MemoryLog::default).as_interface(|l| l as Arc<dyn Log>),
    ));
    ctx.resolve::<App>()?.run(42);
    ctx.resolve::<App>()?.run(43);
    for line in ctx.resolve::<dyn Log>()?.lines() {
        println!("  {line}");
    }

    println!("== shared value, fresh controllers ==");
    let log: Arc<dyn Log> = Arc::new(MemoryLog::default());
    let ctx = ApplicationContext::new((
        value(Arc::clone(&log)),
        provider(Controller::new),
        provider(App::new),
        diy_ioc::component::<Banner>(),
    ));
    ctx.resolve::<App>()?.run(42);
    ctx.resolve::<App>()?.run(43);
    let banner = ctx.resolve::<Banner>()?;
    call_method(&ctx, &*banner, Banner::show)?;
    for line in log.lines() {
        println!("  {line}");
    }

    println!("== child override ==");
    let test_log: Arc<dyn Log> = Arc::new(MemoryLog::default());
    let child = ctx.scope();
    child.register_value(Arc::clone(&test_log));
    child.resolve::<App>()?.run(7);
    println!("  parent log: {} lines, child log: {} lines", log.lines().len(), test_log.lines().len());

    Ok(())
}
