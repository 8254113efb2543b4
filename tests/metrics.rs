#![cfg(feature = "metrics")]
//! Tests for `storyframe` metrics.
//!
//! Counters and gauges are observed through
//! `metrics_util::debugging::DebuggingRecorder`.

use metrics::{SharedString, Unit};
use metrics_util::{
    CompositeKey,
    debugging::{DebugValue, DebuggingRecorder, Snapshotter},
};
use storyframe::{
    FragmentKind,
    KeyPolicy,
    ReassemblyConfig,
    ReassemblyEngine,
    UpdateRecord,
    metrics as sf_metrics,
};
use storyframe_testing::{fragment, story, story_payload};

fn debugging_recorder_setup() -> (Snapshotter, DebuggingRecorder) {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    (snapshotter, recorder)
}

type Entry = (CompositeKey, Option<Unit>, Option<SharedString>, DebugValue);

fn counter(metrics: &[Entry], name: &str, label: (&str, &str)) -> u64 {
    metrics
        .iter()
        .find_map(|(k, _, _, v)| {
            let key = k.key();
            let labelled = key
                .labels()
                .any(|l| l.key() == label.0 && l.value() == label.1);
            match v {
                DebugValue::Counter(c) if key.name() == name && labelled => Some(*c),
                _ => None,
            }
        })
        .unwrap_or(0)
}

#[test]
fn fragment_counter_is_labelled_by_kind() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    metrics::with_local_recorder(&recorder, || {
        sf_metrics::inc_fragments(FragmentKind::Continuation);
    });

    let metrics = snapshotter.snapshot().into_vec();
    assert_eq!(
        counter(&metrics, sf_metrics::FRAGMENTS_RECEIVED, ("kind", "continuation")),
        1
    );
}

#[test]
fn engine_records_fragments_and_emitted_story() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    let payload = story_payload(&story("urn:m", "Metrics", "Counted."));
    let records = fragment("G", "S", &payload, payload.len().div_ceil(3));

    metrics::with_local_recorder(&recorder, || {
        let mut engine = ReassemblyEngine::new(ReassemblyConfig::default());
        for record in &records {
            engine.on_update(record).expect("accepted");
        }
    });

    let metrics = snapshotter.snapshot().into_vec();
    assert_eq!(
        counter(&metrics, sf_metrics::FRAGMENTS_RECEIVED, ("kind", "first")),
        1
    );
    assert_eq!(
        counter(&metrics, sf_metrics::FRAGMENTS_RECEIVED, ("kind", "continuation")),
        records.len() as u64 - 1
    );
    assert_eq!(
        counter(&metrics, sf_metrics::ITEMS_EMITTED, ("type", "story")),
        1
    );
}

#[test]
fn discarded_assemblies_are_counted_by_reason() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    let orphan = UpdateRecord::new("G", "S", vec![0_u8; 2]).with_fragment_seq(2);

    metrics::with_local_recorder(&recorder, || {
        let mut engine = ReassemblyEngine::new(ReassemblyConfig::default());
        let _ = engine.on_update(&orphan);
    });

    let metrics = snapshotter.snapshot().into_vec();
    assert_eq!(
        counter(
            &metrics,
            sf_metrics::ASSEMBLIES_DISCARDED,
            ("reason", "no_matching_assembly")
        ),
        1
    );
}

#[test]
fn in_flight_gauge_tracks_registry() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    let first = UpdateRecord::new("G", "S", vec![0_u8; 2])
        .with_fragment_seq(1)
        .with_total_size(4);

    metrics::with_local_recorder(&recorder, || {
        let mut engine = ReassemblyEngine::new(ReassemblyConfig::default());
        engine.on_update(&first).expect("accepted");
    });

    let gauge = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .find_map(|(k, _, _, v)| match v {
            DebugValue::Gauge(g) if k.key().name() == sf_metrics::ASSEMBLIES_IN_FLIGHT => {
                Some(g.into_inner())
            }
            _ => None,
        });
    assert_eq!(gauge, Some(1.0));
}

#[test]
fn replaced_and_abandoned_assemblies_are_counted() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    let stalled = UpdateRecord::new("G1", "S", vec![0_u8; 2])
        .with_fragment_seq(1)
        .with_total_size(8);
    let restart = UpdateRecord::new("G2", "S", vec![0_u8; 2])
        .with_fragment_seq(1)
        .with_total_size(8);
    let stray = UpdateRecord::new("G3", "S", vec![0_u8; 2]).with_fragment_seq(2);

    metrics::with_local_recorder(&recorder, || {
        let config = ReassemblyConfig::default().with_key_policy(KeyPolicy::Sequential);
        let mut engine = ReassemblyEngine::new(config);
        engine.on_update(&stalled).expect("first");
        engine.on_update(&restart).expect("replaces slot 0");
        let _ = engine.on_update(&stray);
    });

    let metrics = snapshotter.snapshot().into_vec();
    assert_eq!(
        counter(
            &metrics,
            sf_metrics::ASSEMBLIES_DISCARDED,
            ("reason", sf_metrics::REASON_REPLACED)
        ),
        1
    );
    assert_eq!(
        counter(
            &metrics,
            sf_metrics::ASSEMBLIES_DISCARDED,
            ("reason", sf_metrics::REASON_ABANDONED)
        ),
        1
    );
}
