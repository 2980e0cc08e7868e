//! End-to-end routing tests for the reaction engine.

use pion_codec::{CodecConfig, FieldConfig};
use pion_engine::{CodecFactory, ReactionEngine, SchedulerHandle};
use pion_event::{Event, EventPtr, TermRef, TermType, VocabularyManager};
use pion_reactor::ReactorConfig;
use pion_types::{ErrorCode, PluginId};
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

const NS: &str = "urn:vocab:clickstream";

struct Harness {
    vocab: Arc<VocabularyManager>,
    codecs: Arc<CodecFactory>,
    engine: Arc<ReactionEngine>,
    event_type: TermRef,
    status: TermRef,
}

impl Harness {
    fn new() -> Self {
        let vocab = Arc::new(VocabularyManager::new());
        vocab.add_namespace(NS, false).unwrap();
        let event_type = vocab
            .add_term("urn:vocab:clickstream#http-request", TermType::Object)
            .unwrap();
        let status = vocab
            .add_term("urn:vocab:clickstream#status", TermType::UInt)
            .unwrap();

        let codecs = Arc::new(CodecFactory::new(vocab.clone()));
        let engine = Arc::new(ReactionEngine::new(
            vocab.clone(),
            codecs.clone(),
            SchedulerHandle::current(),
        ));
        Self {
            vocab,
            codecs,
            engine,
            event_type,
            status,
        }
    }

    fn add_filter(&self, id: &str, connections: &[&str]) -> PluginId {
        let mut config = ReactorConfig::for_plugin("FilterReactor").with_id(id);
        for downstream in connections {
            config = config.connect_to(*downstream);
        }
        self.engine.add_reactor(config).unwrap()
    }

    fn event(&self, status: u64) -> EventPtr {
        let mut event = Event::new(self.event_type);
        event.set_uint(self.status, status);
        Arc::new(event)
    }

    async fn wait_until(&self, mut condition: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(Instant::now() < deadline, "condition not reached in time");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn linear_chain_routes_one_event() {
    let harness = Harness::new();
    let a = harness.add_filter("a", &["b"]);
    let b = harness.add_filter("b", &["c"]);
    let c = harness.add_filter("c", &[]);

    harness.engine.start().unwrap();
    harness.engine.send(&a, harness.event(200));

    let engine = harness.engine.clone();
    harness
        .wait_until(|| engine.events_in(&c).unwrap() == 1)
        .await;

    assert_eq!(harness.engine.events_in(&a).unwrap(), 1);
    assert_eq!(harness.engine.events_in(&b).unwrap(), 1);
    assert_eq!(harness.engine.events_in(&c).unwrap(), 1);
    assert_eq!(harness.engine.events_out(&a).unwrap(), 1);
    assert_eq!(harness.engine.events_out(&b).unwrap(), 1);
    assert_eq!(harness.engine.events_out(&c).unwrap(), 0);
    assert_eq!(harness.engine.total_operations(), 3);

    harness.engine.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn fan_out_delivers_to_every_connection() {
    let harness = Harness::new();
    let a = harness.add_filter("a", &["b", "c"]);
    let b = harness.add_filter("b", &[]);
    let c = harness.add_filter("c", &[]);

    harness.engine.start().unwrap();
    harness.engine.send(&a, harness.event(200));

    let engine = harness.engine.clone();
    harness
        .wait_until(|| {
            engine.events_in(&b).unwrap() == 1 && engine.events_in(&c).unwrap() == 1
        })
        .await;

    // one produced event, fanned out to two downstreams
    assert_eq!(harness.engine.events_out(&a).unwrap(), 1);

    harness.engine.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cycles_do_not_recurse() {
    let harness = Harness::new();
    // a → b → a, broken by a filter that only lets 404 through on b
    let a = harness.add_filter("a", &["b"]);
    let mut config = ReactorConfig::for_plugin("FilterReactor")
        .with_id("b")
        .connect_to("a");
    config.options = toml::from_str(
        "[[rules]]\nterm = \"urn:vocab:clickstream#status\"\nop = \"equals\"\nvalue = \"404\"\n",
    )
    .unwrap();
    let b = harness.engine.add_reactor(config).unwrap();

    harness.engine.start().unwrap();
    harness.engine.send(&a, harness.event(200));

    let engine = harness.engine.clone();
    harness
        .wait_until(|| engine.events_in(&b).unwrap() == 1)
        .await;

    assert_eq!(harness.engine.events_out(&b).unwrap(), 0);
    assert_eq!(harness.engine.events_in(&a).unwrap(), 1);

    harness.engine.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn send_to_removed_reactor_is_a_silent_drop() {
    let harness = Harness::new();
    let a = harness.add_filter("a", &[]);
    harness.engine.start().unwrap();

    harness.engine.remove_reactor(&a).unwrap();
    harness.engine.send(&a, harness.event(200));
    harness.engine.send(&PluginId::from("ghost"), harness.event(200));

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(harness.engine.total_operations(), 0);

    harness.engine.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stop_quiesces_processing() {
    let harness = Harness::new();
    let a = harness.add_filter("a", &["b"]);
    let b = harness.add_filter("b", &[]);

    harness.engine.start().unwrap();
    harness.engine.send(&a, harness.event(200));

    let engine = harness.engine.clone();
    harness
        .wait_until(|| engine.events_in(&b).unwrap() == 1)
        .await;

    harness.engine.stop().await;

    // sends after stop never reach a reactor
    harness.engine.send(&a, harness.event(200));
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(harness.engine.events_in(&a).unwrap(), 1);

    // double stop is a no-op
    harness.engine.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn restart_after_stop() {
    let harness = Harness::new();
    let a = harness.add_filter("a", &[]);

    harness.engine.start().unwrap();
    assert_eq!(
        harness.engine.start().unwrap_err().code(),
        "ENGINE_ALREADY_RUNNING"
    );
    harness.engine.stop().await;

    harness.engine.start().unwrap();
    harness.engine.send(&a, harness.event(200));
    let engine = harness.engine.clone();
    harness
        .wait_until(|| engine.events_in(&a).unwrap() == 1)
        .await;
    harness.engine.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn clear_stats_resets_counters() {
    let harness = Harness::new();
    let a = harness.add_filter("a", &[]);

    harness.engine.start().unwrap();
    harness.engine.send(&a, harness.event(200));
    let engine = harness.engine.clone();
    harness
        .wait_until(|| engine.events_in(&a).unwrap() == 1)
        .await;

    harness.engine.clear_stats();
    assert_eq!(harness.engine.events_in(&a).unwrap(), 0);
    assert_eq!(harness.engine.total_operations(), 0);

    assert_eq!(
        harness
            .engine
            .clear_reactor_stats(&PluginId::from("ghost"))
            .unwrap_err()
            .code(),
        "ENGINE_REACTOR_NOT_FOUND"
    );

    harness.engine.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn reconfigure_swaps_rules_in_place() {
    let harness = Harness::new();
    let a = harness.add_filter("a", &[]);
    harness.engine.start().unwrap();

    harness.engine.send(&a, harness.event(200));
    let engine = harness.engine.clone();
    harness
        .wait_until(|| engine.events_in(&a).unwrap() == 1)
        .await;

    // swap in a config that drops everything but 404
    let mut config = ReactorConfig::for_plugin("FilterReactor");
    config.options = toml::from_str(
        "[[rules]]\nterm = \"urn:vocab:clickstream#status\"\nop = \"equals\"\nvalue = \"404\"\n",
    )
    .unwrap();
    harness.engine.set_reactor_config(&a, config).unwrap();

    harness.engine.send(&a, harness.event(200));
    harness.engine.send(&a, harness.event(404));
    let engine = harness.engine.clone();
    harness
        .wait_until(|| engine.events_in(&a).unwrap() == 2)
        .await;

    harness.engine.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn file_pipeline_reads_filters_and_writes() {
    let harness = Harness::new();

    harness
        .codecs
        .add_codec(CodecConfig {
            id: Some(PluginId::from("status-log")),
            name: "Status log".into(),
            event_type: "urn:vocab:clickstream#http-request".into(),
            fields: vec![FieldConfig::new("urn:vocab:clickstream#status", "status")],
            ..CodecConfig::for_plugin("LogCodec")
        })
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let input_path = dir.path().join("input.log");
    let output_path = dir.path().join("output.log");
    let mut input = std::fs::File::create(&input_path).unwrap();
    input.write_all(b"200\n404\n500\n404\n").unwrap();
    drop(input);

    // input file → filter(404) → output file
    let mut input_cfg = ReactorConfig::for_plugin("LogInputReactor")
        .with_id("in")
        .connect_to("only-404");
    input_cfg.options = toml::from_str(&format!(
        "file = {:?}\ncodec = \"status-log\"\n",
        input_path.to_str().unwrap()
    ))
    .unwrap();
    harness.engine.add_reactor(input_cfg).unwrap();

    let mut filter_cfg = ReactorConfig::for_plugin("FilterReactor")
        .with_id("only-404")
        .connect_to("out");
    filter_cfg.options = toml::from_str(
        "[[rules]]\nterm = \"urn:vocab:clickstream#status\"\nop = \"equals\"\nvalue = \"404\"\n",
    )
    .unwrap();
    let filter = harness.engine.add_reactor(filter_cfg).unwrap();

    let mut output_cfg = ReactorConfig::for_plugin("LogOutputReactor").with_id("out");
    output_cfg.options = toml::from_str(&format!(
        "file = {:?}\ncodec = \"status-log\"\n",
        output_path.to_str().unwrap()
    ))
    .unwrap();
    let out = harness.engine.add_reactor(output_cfg).unwrap();

    harness.engine.start().unwrap();

    let engine = harness.engine.clone();
    harness
        .wait_until(|| engine.events_in(&out).unwrap() == 2)
        .await;

    assert_eq!(harness.engine.events_in(&filter).unwrap(), 4);
    assert_eq!(harness.engine.events_out(&filter).unwrap(), 2);

    harness.engine.stop().await;

    let written = std::fs::read_to_string(&output_path).unwrap();
    assert_eq!(written, "404\n404\n");
}
