//! Metric helpers for `storyframe`.
//!
//! This module defines metric names and thin helpers wrapping the
//! [`metrics`](https://docs.rs/metrics) crate. Without the `metrics` feature
//! the helpers compile to no-ops.

use crate::record::FragmentKind;

/// Name of the counter tracking received fragments, labelled by `kind`.
pub const FRAGMENTS_RECEIVED: &str = "storyframe_fragments_total";
/// Name of the counter tracking emitted items, labelled by `type`.
pub const ITEMS_EMITTED: &str = "storyframe_items_emitted_total";
/// Name of the counter tracking discarded assemblies, labelled by `reason`.
pub const ASSEMBLIES_DISCARDED: &str = "storyframe_assemblies_discarded_total";
/// Name of the gauge tracking in-flight assemblies.
pub const ASSEMBLIES_IN_FLIGHT: &str = "storyframe_assemblies_in_flight";

/// Reason label recorded when a stale assembly is evicted.
pub const REASON_STALE: &str = "stale";
/// Reason label recorded when a new first fragment displaces an assembly.
pub const REASON_REPLACED: &str = "replaced";
/// Reason label recorded when a sequential slot is left behind.
pub const REASON_ABANDONED: &str = "abandoned";

/// Record a received fragment.
#[cfg(feature = "metrics")]
pub fn inc_fragments(kind: FragmentKind) {
    metrics::counter!(FRAGMENTS_RECEIVED, "kind" => kind.as_str()).increment(1);
}

/// Record an emitted item; `is_story` selects the `type` label.
#[cfg(feature = "metrics")]
pub fn inc_emitted(is_story: bool) {
    let kind = if is_story { "story" } else { "document" };
    metrics::counter!(ITEMS_EMITTED, "type" => kind).increment(1);
}

/// Record `count` discarded assemblies for `reason`.
#[cfg(feature = "metrics")]
pub fn inc_discarded(reason: &'static str, count: u64) {
    metrics::counter!(ASSEMBLIES_DISCARDED, "reason" => reason).increment(count);
}

/// Publish the number of in-flight assemblies.
#[cfg(feature = "metrics")]
pub fn set_in_flight(count: usize) {
    let count = u32::try_from(count).unwrap_or(u32::MAX);
    metrics::gauge!(ASSEMBLIES_IN_FLIGHT).set(f64::from(count));
}

#[cfg(not(feature = "metrics"))]
pub fn inc_fragments(_kind: FragmentKind) {}

#[cfg(not(feature = "metrics"))]
pub fn inc_emitted(_is_story: bool) {}

#[cfg(not(feature = "metrics"))]
pub fn inc_discarded(_reason: &'static str, _count: u64) {}

#[cfg(not(feature = "metrics"))]
pub fn set_in_flight(_count: usize) {}
