//! Integration tests for Unicycle

use serde_json::{json, Value};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use unicycle::{
    bind_many, bind_single, create_store, exec, listener, Dispatcher, Props, Render, Store,
    StoreDefinition, StoreError, View,
};

fn counter() -> StoreDefinition {
    StoreDefinition::named("counter")
        .init(|store| store.set(json!({ "count": 0 })))
        .action("increment", |store, args| {
            let count = store.get("count").and_then(|v| v.as_i64()).unwrap_or(0);
            store.set(json!({ "count": count + args.i64(0)? }))
        })
        .action("reset", |store, _| store.clear())
}

fn obj(value: Value) -> Props {
    match value {
        Value::Object(map) => map,
        _ => Props::new(),
    }
}

#[test]
fn counter_scenario_through_free_functions() {
    Dispatcher::scope(|| {
        let store = create_store(counter()).unwrap();

        exec("increment", &[json!(5)]).unwrap();
        assert_eq!(store.get("count"), Some(json!(5)));

        exec("increment", &[json!(3)]).unwrap();
        assert_eq!(store.get("count"), Some(json!(8)));
    });
}

#[test]
fn one_action_reaches_every_store_that_handles_it() {
    let dispatcher = Dispatcher::new();
    let a = dispatcher.create_store(counter()).unwrap();
    let b = dispatcher.create_store(counter()).unwrap();
    let unrelated = dispatcher
        .create_store(StoreDefinition::named("unrelated").action("other", |store, _| {
            store.set(json!({ "touched": true }))
        }))
        .unwrap();

    dispatcher.exec("increment", &[json!(2)]).unwrap();

    assert_eq!(a.get("count"), Some(json!(2)));
    assert_eq!(b.get("count"), Some(json!(2)));
    assert_eq!(unrelated.get("touched"), None);
}

#[test]
fn clear_notifies_both_listeners_once() {
    let dispatcher = Dispatcher::new();
    let store = dispatcher.create_store(counter()).unwrap();
    let calls = Arc::new(AtomicUsize::new(0));

    for _ in 0..2 {
        let calls = calls.clone();
        store.subscribe(move || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
    }

    dispatcher.exec("reset", &[]).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(store.get("count"), None);
}

#[test]
fn unhandled_action_is_silent() {
    let dispatcher = Dispatcher::new();
    let store = dispatcher.create_store(counter()).unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    store.subscribe(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    assert!(dispatcher.exec("decrement", &[json!(1)]).is_ok());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn nested_exec_runs_immediately() {
    Dispatcher::scope(|| {
        let log = Arc::new(Mutex::new(Vec::new()));

        let outer_log = log.clone();
        let inner_log = log.clone();
        let _store = create_store(
            StoreDefinition::named("chain")
                .action("outer", move |_, _| {
                    outer_log.lock().unwrap().push("outer start");
                    exec("inner", &[])?;
                    outer_log.lock().unwrap().push("outer end");
                    Ok(())
                })
                .action("inner", move |_, _| {
                    inner_log.lock().unwrap().push("inner");
                    Ok(())
                }),
        )
        .unwrap();

        exec("outer", &[]).unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            vec!["outer start", "inner", "outer end"]
        );
    });
}

#[test]
fn listener_can_set_another_store() {
    let dispatcher = Dispatcher::new();
    let source = dispatcher.create_store(counter()).unwrap();
    let mirror = dispatcher.create_store(StoreDefinition::named("mirror")).unwrap();

    let reader = source.clone();
    let writer = mirror.clone();
    let _sub = source.subscribe(move || {
        writer.set(json!({ "copy": reader.get("count") }))
    });

    dispatcher.exec("increment", &[json!(4)]).unwrap();
    assert_eq!(mirror.get("copy"), Some(json!(4)));
}

#[test]
fn handler_errors_reach_the_caller() {
    let dispatcher = Dispatcher::new();
    let store = dispatcher.create_store(counter()).unwrap();

    let err = dispatcher.exec("increment", &[json!("five")]).unwrap_err();
    assert!(matches!(err, StoreError::InvalidArgument { index: 0, .. }));
    assert_eq!(store.get("count"), Some(json!(0)));

    let err = dispatcher.exec("increment", &[]).unwrap_err();
    assert!(matches!(err, StoreError::MissingArgument { index: 0 }));
}

#[test]
fn removing_a_listener_twice_matches_removing_once() {
    let dispatcher = Dispatcher::new();
    let store = dispatcher.create_store(counter()).unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let watcher = listener(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    let sub = store.add_listener(watcher.clone());
    store.remove_listener(&watcher);
    store.remove_listener(&watcher);
    sub.remove();

    dispatcher.exec("increment", &[json!(1)]).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.listener_count(), 0);
}

#[test]
fn stores_keep_handling_actions_until_detached() {
    let dispatcher = Dispatcher::new();
    let stores: Vec<Store> = (0..3)
        .map(|_| dispatcher.create_store(counter()).unwrap())
        .collect();
    let first = stores[0].clone();
    drop(stores);
    assert_eq!(dispatcher.handler_count("increment"), 3);

    dispatcher.exec("increment", &[json!(4)]).unwrap();
    assert_eq!(first.get("count"), Some(json!(4)));

    first.detach_actions();
    assert_eq!(dispatcher.handler_count("increment"), 2);
    dispatcher.exec("increment", &[json!(1)]).unwrap();
    assert_eq!(first.get("count"), Some(json!(4)));
}

#[test]
fn unbound_store_forwards_actions() {
    let dispatcher = Dispatcher::new();
    let target = dispatcher
        .create_store(StoreDefinition::named("target"))
        .unwrap();

    let sink = target.clone();
    let _ = dispatcher.create_store(StoreDefinition::named("logger").action(
        "log",
        move |_, args| sink.set(json!({ "last": args.value(0)?.clone() })),
    ));

    dispatcher.exec("log", &[json!("hello")]).unwrap();
    assert_eq!(target.get("last"), Some(json!("hello")));
}

struct Refreshes(AtomicUsize);

impl View for Refreshes {
    fn refresh(&self) -> unicycle::Result<()> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn single_binding_follows_mount_cycle() {
    let dispatcher = Dispatcher::new();
    let store = dispatcher.create_store(counter()).unwrap();
    let view = Arc::new(Refreshes(AtomicUsize::new(0)));
    let binding = bind_single(&store, &view);

    binding.attach();
    dispatcher.exec("increment", &[json!(1)]).unwrap();
    dispatcher.exec("increment", &[json!(1)]).unwrap();
    binding.detach();
    dispatcher.exec("increment", &[json!(1)]).unwrap();

    assert_eq!(view.0.load(Ordering::SeqCst), 2);
}

#[derive(Default)]
struct Screen {
    frames: Mutex<Vec<Props>>,
}

impl Render for Screen {
    fn render(&self, props: &Props) -> unicycle::Result<()> {
        self.frames.lock().unwrap().push(props.clone());
        Ok(())
    }
}

fn summary(count: &Store, user: &Store) -> impl Fn(&Props) -> unicycle::Result<Props> {
    let count = count.clone();
    let user = user.clone();
    move |props| {
        let scale = props.get("scale").and_then(Value::as_i64).unwrap_or(1);
        let total = count.get("count").and_then(|v| v.as_i64()).unwrap_or(0) * scale;
        Ok(obj(json!({
            "total": total,
            "owner": user.get("name").unwrap_or(Value::Null),
        })))
    }
}

#[test]
fn derived_binding_recomputes_only_on_prop_changes() {
    let dispatcher = Dispatcher::new();
    let count = dispatcher.create_store(counter()).unwrap();
    let user = dispatcher.create_store(StoreDefinition::named("user")).unwrap();
    let screen = Arc::new(Screen::default());

    let connected = bind_many(
        screen.clone(),
        &[count.clone(), user.clone()],
        summary(&count, &user),
        obj(json!({ "scale": 2 })),
    )
    .unwrap();
    connected.attach();
    let baseline = connected.recompute_count();

    for _ in 0..3 {
        assert!(!connected.receive_props(obj(json!({ "scale": 2 }))).unwrap());
    }
    assert_eq!(connected.recompute_count(), baseline);

    assert!(connected.receive_props(obj(json!({ "scale": 3 }))).unwrap());
    assert_eq!(connected.recompute_count(), baseline + 1);
    assert!(connected.receive_props(obj(json!({ "scale": 4 }))).unwrap());
    assert_eq!(connected.recompute_count(), baseline + 2);
    assert!(!connected.receive_props(obj(json!({ "scale": 4 }))).unwrap());
    assert_eq!(connected.recompute_count(), baseline + 2);
}

#[test]
fn derived_binding_tracks_every_store() {
    let dispatcher = Dispatcher::new();
    let count = dispatcher.create_store(counter()).unwrap();
    let user = dispatcher
        .create_store(
            StoreDefinition::named("user").action("login", |store, args| {
                store.set(json!({ "name": args.str(0)? }))
            }),
        )
        .unwrap();
    let screen = Arc::new(Screen::default());

    let connected = bind_many(
        screen.clone(),
        &[count.clone(), user.clone()],
        summary(&count, &user),
        obj(json!({ "scale": 10 })),
    )
    .unwrap();
    connected.attach();

    dispatcher.exec("increment", &[json!(2)]).unwrap();
    dispatcher.exec("login", &[json!("ada")]).unwrap();

    assert_eq!(
        screen.frames.lock().unwrap().last().cloned(),
        Some(obj(json!({ "scale": 10, "total": 20, "owner": "ada" })))
    );

    connected.detach();
    let frames = screen.frames.lock().unwrap().len();
    dispatcher.exec("increment", &[json!(1)]).unwrap();
    assert_eq!(screen.frames.lock().unwrap().len(), frames);
    assert_eq!(count.listener_count(), 0);
    assert_eq!(user.listener_count(), 0);
}
