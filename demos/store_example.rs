//! Store example with complex state

use serde::{Deserialize, Serialize};
use serde_json::json;
use unicycle::{create_store, exec, StoreDefinition, StoreError};

#[derive(Clone, Debug, Serialize, Deserialize)]
struct TodoItem {
    id: usize,
    text: String,
    completed: bool,
}

fn todos(store: &unicycle::Store) -> unicycle::Result<Vec<TodoItem>> {
    match store.get("todos") {
        Some(value) => Ok(serde_json::from_value(value)?),
        None => Ok(Vec::new()),
    }
}

fn main() -> unicycle::Result<()> {
    println!("=== Store Example ===\n");

    // Create a store on the global dispatcher
    let store = create_store(
        StoreDefinition::named("todos")
            .init(|store| store.set(json!({ "todos": [], "filter": "all" })))
            .action("add_todo", |store, args| {
                let mut items = todos(store)?;
                items.push(TodoItem {
                    id: items.len() + 1,
                    text: args.str(0)?.to_string(),
                    completed: false,
                });
                store.set(json!({ "todos": items }))
            })
            .action("complete_todo", |store, args| {
                let id = args.i64(0)? as usize;
                let mut items = todos(store)?;
                let item = items
                    .iter_mut()
                    .find(|t| t.id == id)
                    .ok_or_else(|| StoreError::msg(format!("no todo with id {id}")))?;
                item.completed = true;
                store.set(json!({ "todos": items }))
            }),
    )?;

    // Subscribe to state changes
    let reader = store.clone();
    store.subscribe(move || {
        let active = todos(&reader)?.iter().filter(|t| !t.completed).count();
        println!("State updated! Active todos: {active}");
        Ok(())
    });

    println!("Adding todo...");
    exec("add_todo", &[json!("Learn Unicycle")])?;

    println!("\nCompleting todo...");
    exec("complete_todo", &[json!(1)])?;

    println!("\nCompleting a missing todo...");
    if let Err(err) = exec("complete_todo", &[json!(7)]) {
        println!("Rejected: {err}");
    }

    // Read final state
    println!("\nFinal state: {}", serde_json::to_string_pretty(&store.state())?);
    Ok(())
}
