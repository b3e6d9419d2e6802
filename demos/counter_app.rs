//! Complete counter application demonstrating all features together
//!
//! Run with `RUST_LOG=unicycle=trace` to see dispatch and notification traces.

use serde_json::{json, Value};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use unicycle::{bind_many, bind_single, Dispatcher, Props, Render, Store, StoreDefinition, View};

fn counter_store(dispatcher: &Dispatcher) -> unicycle::Result<Store> {
    dispatcher.create_store(
        StoreDefinition::named("counter")
            .init(|store| store.set(json!({ "count": 0, "step": 1, "history": [0] })))
            .action("increment", |store, _| step(store, 1))
            .action("decrement", |store, _| step(store, -1))
            .action("set_step", |store, args| store.set(json!({ "step": args.i64(0)? })))
            .action("reset", |store, _| {
                let history = push_history(store, 0);
                store.set(json!({ "count": 0, "history": history }))
            })
            .method("history", |store, _| Ok(store.get("history").unwrap_or(Value::Null))),
    )
}

fn step(store: &Store, direction: i64) -> unicycle::Result<()> {
    let count = store.get("count").and_then(|v| v.as_i64()).unwrap_or(0);
    let step = store.get("step").and_then(|v| v.as_i64()).unwrap_or(1);
    let next = count + direction * step;
    let history = push_history(store, next);
    store.set(json!({ "count": next, "history": history }))
}

fn push_history(store: &Store, value: i64) -> Vec<Value> {
    let mut history = match store.get("history") {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    };
    history.push(json!(value));
    history
}

struct Console {
    store: Store,
}

impl View for Console {
    fn refresh(&self) -> unicycle::Result<()> {
        println!(
            "   [State] Count: {}, Step: {}",
            self.store.get("count").unwrap_or_default(),
            self.store.get("step").unwrap_or_default()
        );
        Ok(())
    }
}

struct Summary;

impl Render for Summary {
    fn render(&self, props: &Props) -> unicycle::Result<()> {
        println!(
            "   Count: {} | Positive: {} | Even: {} | Abs: {}",
            props["count"], props["positive"], props["even"], props["abs"]
        );
        Ok(())
    }
}

fn main() -> unicycle::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Complete Counter Application ===\n");

    println!("1. Initializing counter store");
    let dispatcher = Dispatcher::new();
    let store = counter_store(&dispatcher)?;

    println!("\n2. Binding a console view");
    let console = Arc::new(Console {
        store: store.clone(),
    });
    let binding = bind_single(&store, &console);
    binding.attach();

    println!("\n3. Connecting a derived summary");
    let source = store.clone();
    let summary = bind_many(
        Arc::new(Summary),
        &[store.clone()],
        move |_| {
            let count = source.get("count").and_then(|v| v.as_i64()).unwrap_or(0);
            let mut derived = Props::new();
            derived.insert("count".into(), json!(count));
            derived.insert("positive".into(), json!(count > 0));
            derived.insert("even".into(), json!(count % 2 == 0));
            derived.insert("abs".into(), json!(count.abs()));
            Ok(derived)
        },
        Props::new(),
    )?;
    summary.attach();

    println!("\n4. Initial state:");
    summary.render()?;

    println!("\n5. Incrementing...");
    for _ in 0..3 {
        dispatcher.exec("increment", &[])?;
    }

    println!("\n6. Changing step size to 5");
    dispatcher.exec("set_step", &[json!(5)])?;

    println!("\n7. Incrementing with new step...");
    dispatcher.exec("increment", &[])?;

    println!("\n8. Decrementing...");
    for _ in 0..3 {
        dispatcher.exec("decrement", &[])?;
    }

    println!("\n9. History:");
    println!("   {}", store.call("history", &[])?);

    println!("\n10. Resetting...");
    dispatcher.exec("reset", &[])?;

    println!("\n11. Detaching views");
    binding.detach();
    summary.detach();
    dispatcher.exec("increment", &[])?;
    println!("   Count after silent increment: {}", store.get("count").unwrap_or_default());

    println!("\n✓ Counter application complete!");
    Ok(())
}
