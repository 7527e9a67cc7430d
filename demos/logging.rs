//! Shows the events the container emits while wiring a small graph
//!
//! Run with JSON logging (production):
//! ```bash
//! cargo run --example logging --features logging-json
//! ```
//!
//! Run with pretty logging (development):
//! ```bash
//! RUST_LOG=diy_ioc=trace cargo run --example logging --features logging-pretty
//! ```

use diy_ioc::{ApplicationContext, Context, singleton, value};
use std::sync::Arc;

struct Database {
    url: String,
}

struct UserService {
    db: Arc<Database>,
}

struct RequestId(String);

#[derive(Default)]
struct Metrics;

fn main() {
    if !diy_ioc::logging::builder().trace().init() {
        println!("(no subscriber installed: enable logging-json or logging-pretty)");
    }

    println!("=== diy-ioc Logging Demo ===\n");

    // "Creating new root context", "Registering provider", "Application context ready"
    let app = ApplicationContext::new((
        value(Arc::new(Database {
            url: "postgres://localhost/mydb".into(),
        })),
        singleton(|db: Arc<Database>| {
            println!("  [App] UserService being created...");
            UserService { db }
        }),
    ));

    // "Resolving service" for UserService and Database, "Singleton initializing on first access"
    let users = app.resolve::<UserService>().unwrap();
    println!("  [App] users backed by {}", users.db.url);

    // "Service not found in context or parent chain"
    assert!(app.try_resolve::<i32>().is_none());

    // "Auto-registering singleton in root context"
    let _metrics = app.resolve_or_default::<Metrics>().unwrap();

    // "Creating child context"
    let request: Context = app.scope();
    request.register_value(Arc::new(RequestId("req-12345".into())));

    // Local hit, then a lookup in the parent
    println!("  [App] request {}", request.resolve::<RequestId>().unwrap().0);
    let _ = request.resolve::<UserService>().unwrap();

    // "Context cleared"
    request.clear();

    println!("\n=== Demo Complete ===");
}
