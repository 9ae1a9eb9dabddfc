// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Claim protocol for crash-safe message dispatch.
//!
//! A worker claims a message inside an immediate transaction before sending
//! it, so at most one delivery attempt per message is in flight. Every
//! outcome is written back under the claim and releases it.

use std::str::FromStr;
use std::time::Duration;

use herald_core::types::{format_timestamp, now_millis};
use herald_core::{ClaimRequest, DeliveryOutcome, HeraldError, Message, MessageId, MessageStatus};
use rusqlite::{OptionalExtension, TransactionBehavior, params};

use crate::database::{Database, map_tr_err};
use crate::queries::{MESSAGE_COLUMNS, row_to_message};

/// Claim up to `request.limit` of the oldest eligible messages.
///
/// Eligible means unclaimed, retryable and either pending or failed with
/// `attempt_count <= retry_limit`. Claimed failed rows move back to pending.
pub async fn claim_due(db: &Database, request: &ClaimRequest) -> Result<Vec<Message>, HeraldError> {
    if request.limit == 0 {
        return Ok(Vec::new());
    }
    let request = request.clone();
    db.connection()
        .call(move |conn| -> Result<Vec<Message>, rusqlite::Error> {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let mut claimed = {
                let sql = format!(
                    "SELECT {MESSAGE_COLUMNS} FROM messages
                     WHERE status IN ('pending', 'failed')
                       AND claimed_by IS NULL
                       AND retryable = 1
                       AND (status = 'pending' OR attempt_count <= ?1)
                     ORDER BY created_at ASC, rowid ASC
                     LIMIT ?2"
                );
                let mut stmt = tx.prepare(&sql)?;
                let rows = stmt.query_map(params![request.retry_limit, request.limit], row_to_message)?;
                rows.collect::<Result<Vec<_>, _>>()?
            };

            let claimed_at = format_timestamp(&now_millis());
            {
                let mut stmt = tx.prepare(
                    "UPDATE messages
                     SET claimed_by = ?1, claimed_at = ?2, status = 'pending'
                     WHERE id = ?3",
                )?;
                for msg in &mut claimed {
                    stmt.execute(params![request.worker_id, claimed_at, msg.id.as_str()])?;
                    msg.status = MessageStatus::Pending;
                }
            }
            tx.commit()?;
            Ok(claimed)
        })
        .await
        .map_err(map_tr_err)
}

/// Write the outcome of one delivery attempt and release the claim.
///
/// The update only applies while `worker_id` still holds the claim and the
/// message is pending; otherwise the store is left untouched and the caller
/// gets [`HeraldError::ClaimLost`], [`HeraldError::InvalidTransition`] or
/// [`HeraldError::NotFound`].
pub async fn record_outcome(
    db: &Database,
    id: &MessageId,
    worker_id: &str,
    outcome: &DeliveryOutcome,
) -> Result<(), HeraldError> {
    let target = outcome.resulting_status();
    let (row_id, owner) = (id.as_str().to_string(), worker_id.to_string());
    let outcome = outcome.clone();

    let current = db
        .connection()
        .call(move |conn| -> Result<Option<Option<String>>, rusqlite::Error> {
            let changed = match &outcome {
                DeliveryOutcome::Delivered {
                    provider_message_id,
                    sent_at,
                } => conn.execute(
                    "UPDATE messages
                     SET status = 'sent', sent_at = ?1, provider_message_id = ?2,
                         last_error = NULL, claimed_by = NULL, claimed_at = NULL
                     WHERE id = ?3 AND claimed_by = ?4 AND status = 'pending'",
                    params![format_timestamp(sent_at), provider_message_id, row_id, owner],
                )?,
                DeliveryOutcome::Rejected { reason } => conn.execute(
                    "UPDATE messages
                     SET status = 'failed', attempt_count = attempt_count + 1,
                         last_error = ?1, claimed_by = NULL, claimed_at = NULL
                     WHERE id = ?2 AND claimed_by = ?3 AND status = 'pending'",
                    params![reason, row_id, owner],
                )?,
                DeliveryOutcome::Malformed { reason } => conn.execute(
                    "UPDATE messages
                     SET status = 'failed', retryable = 0,
                         last_error = ?1, claimed_by = NULL, claimed_at = NULL
                     WHERE id = ?2 AND claimed_by = ?3 AND status = 'pending'",
                    params![reason, row_id, owner],
                )?,
                DeliveryOutcome::Deferred { reason } => conn.execute(
                    "UPDATE messages
                     SET last_error = ?1, claimed_by = NULL, claimed_at = NULL
                     WHERE id = ?2 AND claimed_by = ?3 AND status = 'pending'",
                    params![reason, row_id, owner],
                )?,
            };
            if changed > 0 {
                return Ok(None);
            }
            // Nothing matched: report what the row looks like now.
            conn.query_row(
                "SELECT status FROM messages WHERE id = ?1",
                params![row_id],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map(Some)
        })
        .await
        .map_err(map_tr_err)?;

    match current {
        None => Ok(()),
        Some(None) => Err(HeraldError::NotFound(id.to_string())),
        Some(Some(status)) => match MessageStatus::from_str(&status) {
            // The row moved on without us; a lost claim unless the move it
            // made rules out the one we wanted.
            Ok(from) if from != MessageStatus::Pending && !from.can_transition_to(target) => {
                Err(HeraldError::InvalidTransition { from, to: target })
            }
            _ => Err(HeraldError::ClaimLost {
                id: id.to_string(),
                worker_id: worker_id.to_string(),
            }),
        },
    }
}

/// Restamp a claim so lease recovery leaves it alone while the send runs.
///
/// Returns `false` when `worker_id` no longer holds the claim; the caller
/// must not send in that case.
pub async fn renew_claim(
    db: &Database,
    id: &MessageId,
    worker_id: &str,
) -> Result<bool, HeraldError> {
    let (id, worker_id) = (id.as_str().to_string(), worker_id.to_string());
    let claimed_at = format_timestamp(&now_millis());
    let changed = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "UPDATE messages SET claimed_at = ?1
                 WHERE id = ?2 AND claimed_by = ?3 AND status = 'pending'",
                params![claimed_at, id, worker_id],
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(changed > 0)
}

/// Release one claim without touching status or attempts.
pub async fn release_claim(
    db: &Database,
    id: &MessageId,
    worker_id: &str,
) -> Result<bool, HeraldError> {
    let (id, worker_id) = (id.as_str().to_string(), worker_id.to_string());
    let changed = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "UPDATE messages SET claimed_by = NULL, claimed_at = NULL
                 WHERE id = ?1 AND claimed_by = ?2",
                params![id, worker_id],
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(changed > 0)
}

/// Release every claim held by `worker_id`.
pub async fn release_worker_claims(db: &Database, worker_id: &str) -> Result<u64, HeraldError> {
    let worker_id = worker_id.to_string();
    let changed = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "UPDATE messages SET claimed_by = NULL, claimed_at = NULL
                 WHERE claimed_by = ?1",
                params![worker_id],
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(changed as u64)
}

/// Release claims taken more than `lease` ago.
///
/// A claim that old belongs to a worker that died mid-cycle; the message goes
/// back into the due set unchanged.
pub async fn recover_stale_claims(db: &Database, lease: Duration) -> Result<u64, HeraldError> {
    let lease = chrono::TimeDelta::from_std(lease)
        .map_err(|e| HeraldError::Internal(format!("claim lease out of range: {e}")))?;
    let cutoff = format_timestamp(&(now_millis() - lease));
    let changed = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "UPDATE messages SET claimed_by = NULL, claimed_at = NULL
                 WHERE claimed_by IS NOT NULL AND claimed_at < ?1",
                params![cutoff],
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(changed as u64)
}

/// Operator retry: failed -> pending with a fresh attempt budget.
///
/// Returns `false` when the message is not failed or is claimed right now.
pub async fn requeue(db: &Database, id: &MessageId) -> Result<bool, HeraldError> {
    let row_id = id.as_str().to_string();
    let (changed, exists) = db
        .connection()
        .call(move |conn| -> Result<(usize, bool), rusqlite::Error> {
            let changed = conn.execute(
                "UPDATE messages
                 SET status = 'pending', attempt_count = 0, retryable = 1, last_error = NULL
                 WHERE id = ?1 AND status = 'failed' AND claimed_by IS NULL",
                params![row_id],
            )?;
            let exists = changed > 0
                || conn
                    .query_row(
                        "SELECT 1 FROM messages WHERE id = ?1",
                        params![row_id],
                        |_| Ok(()),
                    )
                    .optional()?
                    .is_some();
            Ok((changed, exists))
        })
        .await
        .map_err(map_tr_err)?;

    if !exists {
        return Err(HeraldError::NotFound(id.to_string()));
    }
    Ok(changed > 0)
}
