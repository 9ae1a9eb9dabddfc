// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Herald message dispatch worker.
//!
//! This crate provides the message model, the status state machine, the
//! shared error type and the two adapter traits the worker is written
//! against: [`StorageAdapter`] for the persisted message store and
//! [`SenderAdapter`] for the external delivery capability.

pub mod error;
pub mod traits;
pub mod types;

pub use error::HeraldError;
pub use types::{
    AdapterType, ClaimRequest, DeliveryOutcome, DeliveryReceipt, HealthStatus, Message,
    MessageId, MessageStatus,
};

pub use traits::{PluginAdapter, SenderAdapter, StorageAdapter};

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    use chrono::TimeZone;
    use proptest::prelude::*;

    #[test]
    fn status_round_trips_through_display_and_from_str() {
        for status in MessageStatus::ALL {
            let parsed = MessageStatus::from_str(&status.to_string()).unwrap();
            assert_eq!(parsed, status);
            assert_eq!(status.as_str(), status.to_string());
        }
        assert!(MessageStatus::from_str("invalid").is_err());
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&MessageStatus::Failed).unwrap();
        assert_eq!(json, "\"failed\"");
    }

    #[test]
    fn only_three_transitions_are_legal() {
        use MessageStatus::*;
        assert!(Pending.can_transition_to(Sent));
        assert!(Pending.can_transition_to(Failed));
        assert!(Failed.can_transition_to(Pending));

        assert!(!Failed.can_transition_to(Sent));
        assert!(!Pending.can_transition_to(Pending));
        for next in MessageStatus::ALL {
            assert!(!Sent.can_transition_to(next), "sent -> {next} must be illegal");
        }
    }

    #[test]
    fn new_message_starts_pending_and_retryable() {
        let msg = Message::new(Some("+905551111111".into()), "hello");
        assert_eq!(msg.status, MessageStatus::Pending);
        assert_eq!(msg.attempt_count, 0);
        assert!(msg.retryable);
        assert!(msg.sent_at.is_none());
        assert_eq!(msg.created_at.timestamp_subsec_nanos() % 1_000_000, 0);
    }

    #[test]
    fn timestamps_format_fixed_width_and_parse_back() {
        let ts = chrono::Utc
            .with_ymd_and_hms(2026, 3, 4, 5, 6, 7)
            .unwrap();
        let text = types::format_timestamp(&ts);
        assert_eq!(text, "2026-03-04T05:06:07.000Z");
        assert_eq!(types::parse_timestamp(&text).unwrap(), ts);
    }

    #[test]
    fn outcome_maps_to_resulting_status() {
        let delivered = DeliveryOutcome::Delivered {
            provider_message_id: None,
            sent_at: types::now_millis(),
        };
        assert_eq!(delivered.resulting_status(), MessageStatus::Sent);
        assert_eq!(
            DeliveryOutcome::Malformed { reason: "x".into() }.resulting_status(),
            MessageStatus::Failed
        );
        assert_eq!(
            DeliveryOutcome::Deferred { reason: "x".into() }.resulting_status(),
            MessageStatus::Pending
        );
    }

    fn any_status() -> impl Strategy<Value = MessageStatus> {
        prop::sample::select(MessageStatus::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn walking_legal_transitions_never_leaves_sent(steps in prop::collection::vec(any_status(), 0..32)) {
            let mut current = MessageStatus::Pending;
            let mut reached_sent = false;
            for next in steps {
                if current.can_transition_to(next) {
                    prop_assert!(!reached_sent, "moved out of sent");
                    current = next;
                    reached_sent |= current == MessageStatus::Sent;
                }
            }
            prop_assert!(MessageStatus::ALL.contains(&current));
        }

        #[test]
        fn timestamp_order_matches_text_order(a in 0i64..4_102_444_800_000, b in 0i64..4_102_444_800_000) {
            let ta = chrono::Utc.timestamp_millis_opt(a).unwrap();
            let tb = chrono::Utc.timestamp_millis_opt(b).unwrap();
            let sa = types::format_timestamp(&ta);
            let sb = types::format_timestamp(&tb);
            prop_assert_eq!(ta.cmp(&tb), sa.cmp(&sb));
        }
    }
}
