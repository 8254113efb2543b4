//! Unit tests for `AssemblyRegistry`.

use std::time::{Duration, Instant};

use rstest::{fixture, rstest};

use crate::{
    MessageType,
    ReassemblyError,
    UpdateRecord,
    assembly::{AssemblyKey, AssemblyRegistry, AssemblyStatus, StoryIdentity},
};

#[fixture]
fn registry() -> AssemblyRegistry { AssemblyRegistry::new(Some(Duration::from_secs(30))) }

fn first(guid: &str, source: &str, total: usize, payload: &[u8]) -> UpdateRecord {
    UpdateRecord::new(guid, source, payload.to_vec())
        .with_fragment_seq(1)
        .with_total_size(total)
}

fn next(guid: &str, source: &str, seq: u32, payload: &[u8]) -> UpdateRecord {
    UpdateRecord::new(guid, source, payload.to_vec()).with_fragment_seq(seq)
}

fn story_key(guid: &str, source: &str) -> AssemblyKey {
    AssemblyKey::Story(StoryIdentity::new(guid, source))
}

#[rstest]
fn begin_copies_identity_and_first_fragment(mut registry: AssemblyRegistry) {
    let key = AssemblyKey::Slot(0);
    let status = registry
        .begin(key.clone(), &first("G1", "S1", 10, &[0, 1, 2, 3, 4]))
        .expect("first fragment accepted");

    assert_eq!(status, AssemblyStatus::Incomplete);
    let assembly = registry.get(&key).expect("assembly stored");
    assert_eq!(assembly.guid(), "G1");
    assert_eq!(assembly.source(), "S1");
    assert_eq!(assembly.total_size(), 10);
    assert_eq!(assembly.filled_size(), 5);
    assert_eq!(assembly.payload(), &[0, 1, 2, 3, 4]);
    assert_eq!(registry.reserved_bytes(), 10);
}

#[rstest]
fn begin_reports_complete_single_fragment(mut registry: AssemblyRegistry) {
    let key = AssemblyKey::Slot(0);
    let status = registry
        .begin(key.clone(), &first("G1", "S1", 3, &[7, 8, 9]))
        .expect("first fragment accepted");
    assert_eq!(status, AssemblyStatus::Complete);
    assert!(registry.get(&key).is_some_and(|a| a.is_complete()));
}

#[rstest]
fn begin_replaces_incomplete_assembly(mut registry: AssemblyRegistry) {
    let key = AssemblyKey::Slot(4);
    registry
        .begin(key.clone(), &first("OLD", "S1", 10, &[1]))
        .expect("first story");
    registry
        .begin(key.clone(), &first("NEW", "S1", 4, &[2]))
        .expect("second story");

    assert_eq!(registry.len(), 1);
    assert_eq!(registry.get(&key).map(|a| a.guid()), Some("NEW"));
}

#[rstest]
fn begin_rejects_first_fragment_longer_than_total(mut registry: AssemblyRegistry) {
    let key = AssemblyKey::Slot(0);
    let err = registry
        .begin(key.clone(), &first("G1", "S1", 2, &[1, 2, 3]))
        .expect_err("oversized first fragment");

    assert!(matches!(
        err,
        ReassemblyError::OversizeFragment {
            attempted: 3,
            total: 2,
            ..
        }
    ));
    assert!(registry.get(&key).is_none());
}

#[rstest]
fn continuation_appends_at_filled_offset(mut registry: AssemblyRegistry) {
    let key = story_key("G1", "S1");
    registry
        .begin(key.clone(), &first("G1", "S1", 6, &[1, 2]))
        .expect("first");

    assert_eq!(
        registry
            .continue_assembly(&key, &next("G1", "S1", 2, &[3, 4]))
            .expect("second"),
        AssemblyStatus::Incomplete
    );
    assert_eq!(
        registry
            .continue_assembly(&key, &next("G1", "S1", 3, &[5, 6]))
            .expect("third"),
        AssemblyStatus::Complete
    );

    let (identity, _, bytes) = registry.remove(&key).expect("present").into_parts();
    assert_eq!(identity, StoryIdentity::new("G1", "S1"));
    assert_eq!(bytes, vec![1, 2, 3, 4, 5, 6]);
    assert!(registry.is_empty());
}

#[rstest]
fn continuation_carries_latest_message_type(mut registry: AssemblyRegistry) {
    let key = AssemblyKey::Slot(0);
    registry
        .begin(key.clone(), &first("G1", "S1", 4, &[1, 2]))
        .expect("first");
    let record = next("G1", "S1", 2, &[3]).with_message_type(MessageType::from_name("TRNA"));
    registry.continue_assembly(&key, &record).expect("second");

    assert_eq!(
        registry.get(&key).map(|a| a.message_type().clone()),
        Some(MessageType::Other("TRNA".into()))
    );
}

#[rstest]
fn continuation_without_assembly_is_rejected(mut registry: AssemblyRegistry) {
    let err = registry
        .continue_assembly(&story_key("G2", "S1"), &next("G2", "S1", 2, &[1]))
        .expect_err("no assembly");
    assert!(matches!(
        err,
        ReassemblyError::NoMatchingAssembly { ref story } if story.guid == "G2"
    ));
}

#[rstest]
#[case::different_guid("G9", "S1")]
#[case::different_source("G1", "S9")]
fn continuation_with_foreign_identity_leaves_assembly_untouched(
    mut registry: AssemblyRegistry,
    #[case] guid: &str,
    #[case] source: &str,
) {
    let key = AssemblyKey::Slot(0);
    registry
        .begin(key.clone(), &first("G1", "S1", 4, &[1, 2]))
        .expect("first");
    let before = registry.get(&key).cloned();

    let err = registry
        .continue_assembly(&key, &next(guid, source, 2, &[3, 4]))
        .expect_err("identity mismatch");

    assert!(matches!(err, ReassemblyError::NoMatchingAssembly { .. }));
    assert_eq!(registry.get(&key).cloned(), before);
}

#[rstest]
fn oversize_continuation_discards_assembly(mut registry: AssemblyRegistry) {
    let key = story_key("G1", "S1");
    registry
        .begin(key.clone(), &first("G1", "S1", 4, &[1, 2, 3]))
        .expect("first");

    let err = registry
        .continue_assembly(&key, &next("G1", "S1", 2, &[4, 5, 6]))
        .expect_err("overflow");

    assert!(matches!(
        err,
        ReassemblyError::OversizeFragment {
            attempted: 6,
            total: 4,
            ..
        }
    ));
    assert!(registry.get(&key).is_none());
}

#[rstest]
fn get_is_idempotent(mut registry: AssemblyRegistry) {
    let key = AssemblyKey::Slot(1);
    registry
        .begin(key.clone(), &first("G1", "S1", 8, &[1, 2, 3]))
        .expect("first");

    let snapshot = registry.get(&key).cloned();
    for _ in 0..5 {
        assert_eq!(registry.get(&key).cloned(), snapshot);
    }
    assert_eq!(registry.len(), 1);
}

#[test]
fn purges_assemblies_past_staleness_timeout() {
    let mut registry = AssemblyRegistry::new(Some(Duration::from_secs(30)));
    let now = Instant::now();
    registry
        .begin_at(AssemblyKey::Slot(0), &first("OLD", "S1", 8, &[1]), now)
        .expect("old");
    registry
        .begin_at(
            AssemblyKey::Slot(1),
            &first("NEW", "S1", 8, &[1]),
            now + Duration::from_secs(20),
        )
        .expect("new");

    let evicted = registry.purge_expired_at(now + Duration::from_secs(31));

    assert_eq!(evicted, vec![AssemblyKey::Slot(0)]);
    assert_eq!(registry.len(), 1);
}

#[test]
fn keeps_assemblies_without_staleness_timeout() {
    let mut registry = AssemblyRegistry::new(None);
    let now = Instant::now();
    registry
        .begin_at(AssemblyKey::Slot(0), &first("G1", "S1", 8, &[1]), now)
        .expect("first");

    assert!(
        registry
            .purge_expired_at(now + Duration::from_secs(86_400))
            .is_empty()
    );
    assert_eq!(registry.len(), 1);
}
