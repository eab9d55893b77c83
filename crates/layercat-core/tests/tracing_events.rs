#![forbid(unsafe_code)]

//! Structured event coverage for structural commands.
//!
//! Every applied group/subgroup command emits one `debug` event with a dotted
//! message name; relocation internals log at `trace`; rejected commands emit
//! nothing from the core (the runtime logs rejections).

use std::sync::{Arc, Mutex};

use tracing_subscriber::layer::SubscriberExt;

use layercat_core::{
    ExpansionState, GroupDeletePolicy, GroupLifecycle, LayerEntry, OrderedLayerStore,
    SubgroupLifecycle,
};

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    message: String,
    fields: Vec<(String, String)>,
}

struct EventCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for EventCapture {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        let message = visitor
            .0
            .iter()
            .find(|(k, _)| k == "message")
            .map(|(_, v)| v.clone())
            .unwrap_or_default();
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message,
            fields: visitor.0,
        });
    }
}

fn capture<F: FnOnce()>(f: F) -> Vec<CapturedEvent> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::registry()
        .with(tracing_subscriber::filter::LevelFilter::TRACE)
        .with(EventCapture {
            events: Arc::clone(&events),
        });
    tracing::subscriber::with_default(subscriber, f);
    let captured = events.lock().unwrap().clone();
    captured
}

fn fixture() -> OrderedLayerStore {
    OrderedLayerStore::from_parts(
        vec!["Imagery".into(), "Hydro".into()],
        vec![
            LayerEntry::in_group("Imagery"),
            LayerEntry::in_subgroup("Imagery", "2020"),
            LayerEntry::in_subgroup("Imagery", "2021"),
            LayerEntry::in_group("Hydro"),
        ],
    )
}

fn field<'a>(event: &'a CapturedEvent, name: &str) -> Option<&'a str> {
    event
        .fields
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

#[test]
fn group_commands_emit_debug_events() {
    let mut store = fixture();
    let mut exp = ExpansionState::new();
    let events = capture(|| {
        let mut groups = GroupLifecycle::new(&mut store, &mut exp);
        groups.add("Roads").unwrap();
        groups.rename("Imagery", "Satellite").unwrap();
        groups
            .delete("Hydro", &GroupDeletePolicy::Migrate("Roads".into()))
            .unwrap();
    });

    let debug: Vec<&CapturedEvent> = events
        .iter()
        .filter(|e| e.level == tracing::Level::DEBUG)
        .collect();
    let names: Vec<&str> = debug.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(names, ["group.add", "group.rename", "group.delete"]);
    assert_eq!(field(debug[1], "retagged"), Some("3"));
    assert_eq!(field(debug[2], "policy"), Some("migrate"));
}

#[test]
fn rejected_command_is_silent() {
    let mut store = fixture();
    let mut exp = ExpansionState::new();
    let events = capture(|| {
        let _ = GroupLifecycle::new(&mut store, &mut exp).add("Imagery");
    });
    assert!(events.is_empty());
}

#[test]
fn block_moves_trace_the_store_splice() {
    let mut store = fixture();
    let mut exp = ExpansionState::new();
    let events = capture(|| {
        SubgroupLifecycle::new(&mut store, &mut exp)
            .move_subgroup("Imagery", "2021", layercat_core::Direction::Up)
            .unwrap();
    });
    let splice = events
        .iter()
        .find(|e| e.message == "store.relocate_block")
        .unwrap();
    assert_eq!(splice.level, tracing::Level::TRACE);
    assert_eq!(field(splice, "insert_at"), Some("1"));
}
