// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade so any installed recorder (the Prometheus
//! exporter in `herald serve`) collects these. With no recorder installed
//! every call is a no-op.

use std::time::Duration;

use herald_core::DeliveryOutcome;
use metrics::{describe_counter, describe_gauge, describe_histogram};

pub const MESSAGES_SENT: &str = "herald_messages_sent_total";
pub const MESSAGES_FAILED: &str = "herald_messages_failed_total";
pub const MESSAGES_DEFERRED: &str = "herald_messages_deferred_total";
pub const MESSAGES_MALFORMED: &str = "herald_messages_malformed_total";
pub const CYCLE_SECONDS: &str = "herald_dispatch_cycle_seconds";
pub const CLAIMED_MESSAGES: &str = "herald_claimed_messages";

/// Register all Herald metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(MESSAGES_SENT, "Messages delivered to the sender");
    describe_counter!(MESSAGES_FAILED, "Delivery attempts the sender rejected");
    describe_counter!(
        MESSAGES_DEFERRED,
        "Delivery attempts deferred because the sender was unavailable"
    );
    describe_counter!(MESSAGES_MALFORMED, "Messages failed permanently as malformed");
    describe_histogram!(CYCLE_SECONDS, "Wall time of one dispatch cycle in seconds");
    describe_gauge!(CLAIMED_MESSAGES, "Messages claimed by the latest dispatch cycle");
}

/// Metric name counting `outcome`.
pub fn outcome_metric(outcome: &DeliveryOutcome) -> &'static str {
    match outcome {
        DeliveryOutcome::Delivered { .. } => MESSAGES_SENT,
        DeliveryOutcome::Rejected { .. } => MESSAGES_FAILED,
        DeliveryOutcome::Malformed { .. } => MESSAGES_MALFORMED,
        DeliveryOutcome::Deferred { .. } => MESSAGES_DEFERRED,
    }
}

/// Record one recorded delivery outcome.
pub fn record_outcome(outcome: &DeliveryOutcome) {
    metrics::counter!(outcome_metric(outcome)).increment(1);
}

/// Record the duration of a dispatch cycle.
pub fn record_cycle(elapsed: Duration) {
    metrics::histogram!(CYCLE_SECONDS).record(elapsed.as_secs_f64());
}

/// Set the number of messages claimed by the latest cycle.
pub fn set_claimed(count: usize) {
    metrics::gauge!(CLAIMED_MESSAGES).set(count as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_outcome_has_its_own_counter() {
        let outcomes = [
            DeliveryOutcome::Delivered {
                provider_message_id: None,
                sent_at: herald_core::types::now_millis(),
            },
            DeliveryOutcome::Rejected { reason: "r".into() },
            DeliveryOutcome::Malformed { reason: "m".into() },
            DeliveryOutcome::Deferred { reason: "d".into() },
        ];
        let mut names: Vec<_> = outcomes.iter().map(outcome_metric).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 4);
    }

    #[test]
    fn recording_without_recorder_is_noop() {
        register_metrics();
        record_outcome(&DeliveryOutcome::Deferred { reason: "x".into() });
        record_cycle(Duration::from_millis(5));
        set_claimed(2);
    }
}
