//! Bulk acquisition engine.
//!
//! One batch run authenticates once, then walks the CPF list in fixed-size
//! groups. Every member of a group is fetched concurrently and retried
//! independently; groups are strictly sequential with a cooldown in between.
//! A CPF whose retries are exhausted is dropped from the record list (its
//! outcome is kept for logging) and never aborts its siblings.

use crate::config::Config;
use crate::credit_client::CreditProClient;
use crate::errors::{AppError, ResultExt};
use crate::models::{BatchResult, CpfFailure, CpfOutcome, CreditRecord};
use futures::stream::{FuturesUnordered, StreamExt};
use std::time::Duration;

/// Tuning knobs for a batch run. Defaults preserve the observed behavior
/// (groups of 10, 500ms cooldown, 3 attempts per CPF).
#[derive(Debug, Clone, Copy)]
pub struct BatchTuning {
    pub group_size: usize,
    pub group_pause: Duration,
    pub max_attempts: u32,
}

impl BatchTuning {
    pub fn from_config(config: &Config) -> Self {
        Self {
            group_size: config.batch_size,
            group_pause: Duration::from_millis(config.batch_pause_ms),
            max_attempts: config.fetch_max_attempts,
        }
    }
}

impl Default for BatchTuning {
    fn default() -> Self {
        Self {
            group_size: 10,
            group_pause: Duration::from_millis(500),
            max_attempts: 3,
        }
    }
}

/// Delay before retry number `attempt + 1`: 1s, 2s, then capped at 5s.
/// Bounds worst-case latency per CPF to `max_attempts` network calls plus
/// at most 5s between each.
pub fn backoff_delay(attempt: u32) -> Duration {
    let ms = 1000u64.saturating_mul(1u64 << (attempt.saturating_sub(1)).min(16));
    Duration::from_millis(ms.min(5000))
}

/// How one CPF's fetch sequence ended.
struct Settled {
    /// Position within the group, used to restore input order in outcomes.
    slot: usize,
    cpf: String,
    attempts: u32,
    record: Option<CreditRecord>,
    last_status: Option<u16>,
}

/// Attempts one CPF up to `max_attempts` times with exponential backoff
/// between attempts (never after the last). Exhaustion is non-fatal: the
/// caller receives no record and the batch continues.
async fn fetch_with_retry(
    client: &CreditProClient,
    token: &str,
    slot: usize,
    cpf: String,
    max_attempts: u32,
) -> Settled {
    let mut last_status = None;

    for attempt in 1..=max_attempts {
        match client.fetch_credit_data(token, &cpf).await {
            Ok(record) => {
                return Settled {
                    slot,
                    cpf,
                    attempts: attempt,
                    record: Some(record),
                    last_status: None,
                };
            }
            Err(e) => {
                if let AppError::ProviderError { status, .. } = &e {
                    last_status = *status;
                }
                tracing::warn!(
                    "Attempt {}/{} failed for CPF {}: {}",
                    attempt,
                    max_attempts,
                    cpf,
                    e
                );

                if attempt < max_attempts {
                    tokio::time::sleep(backoff_delay(attempt)).await;
                }
            }
        }
    }

    tracing::error!(
        "Giving up on CPF {} after {} attempts (last status: {:?})",
        cpf,
        max_attempts,
        last_status
    );

    Settled {
        slot,
        cpf,
        attempts: max_attempts,
        record: None,
        last_status,
    }
}

/// Runs one full batch: single authentication, then grouped concurrent
/// fetches over the whole CPF list.
///
/// Successful records are appended in settle order within each group, so the
/// output is not guaranteed to mirror input order when retries stagger
/// completions. Outcomes, by contrast, are reported in input order.
pub async fn run_batch(
    client: &CreditProClient,
    cpfs: &[String],
    tuning: BatchTuning,
) -> Result<BatchResult, AppError> {
    let token = client
        .authenticate()
        .await
        .context("Credit Pro authentication failed, aborting batch")?;

    tracing::info!("Starting batch run for {} CPF(s)", cpfs.len());

    let groups: Vec<&[String]> = cpfs.chunks(tuning.group_size.max(1)).collect();
    let total_groups = groups.len();

    let mut records = Vec::new();
    let mut outcomes: Vec<CpfOutcome> = Vec::with_capacity(cpfs.len());

    for (group_idx, group) in groups.into_iter().enumerate() {
        tracing::info!(
            "Processing group {}/{} ({} CPFs)",
            group_idx + 1,
            total_groups,
            group.len()
        );

        let mut in_flight: FuturesUnordered<_> = group
            .iter()
            .enumerate()
            .map(|(slot, cpf)| {
                fetch_with_retry(client, &token.token, slot, cpf.clone(), tuning.max_attempts)
            })
            .collect();

        let mut group_outcomes: Vec<Option<CpfOutcome>> = vec![None; group.len()];

        // First settled, first appended. A sibling's failure never cancels
        // the rest of the group.
        while let Some(settled) = in_flight.next().await {
            let failure = if settled.record.is_none() {
                Some(CpfFailure::RetriesExhausted {
                    attempts: settled.attempts,
                    last_status: settled.last_status,
                })
            } else {
                None
            };

            group_outcomes[settled.slot] = Some(CpfOutcome {
                cpf: settled.cpf,
                attempts: settled.attempts,
                failure,
            });

            if let Some(record) = settled.record {
                records.push(record);
            }
        }

        outcomes.extend(group_outcomes.into_iter().flatten());

        // Cooldown between groups keeps sustained load off the provider.
        if group_idx + 1 < total_groups {
            tokio::time::sleep(tuning.group_pause).await;
        }
    }

    let failed = outcomes.iter().filter(|o| o.failure.is_some()).count();
    tracing::info!(
        "Batch run complete: {}/{} CPFs with data ({} failed)",
        records.len(),
        cpfs.len(),
        failed
    );

    Ok(BatchResult {
        records,
        outcomes,
        cpfs_processed: cpfs.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_then_caps() {
        assert_eq!(backoff_delay(1), Duration::from_millis(1000));
        assert_eq!(backoff_delay(2), Duration::from_millis(2000));
        assert_eq!(backoff_delay(3), Duration::from_millis(4000));
        assert_eq!(backoff_delay(4), Duration::from_millis(5000));
        assert_eq!(backoff_delay(10), Duration::from_millis(5000));
    }

    #[test]
    fn backoff_does_not_overflow_on_large_attempts() {
        assert_eq!(backoff_delay(u32::MAX), Duration::from_millis(5000));
    }

    #[test]
    fn grouping_is_contiguous_and_bounded() {
        let cpfs: Vec<String> = (0..23).map(|i| format!("{:011}", i)).collect();
        let groups: Vec<&[String]> = cpfs.chunks(10).collect();

        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].len(), 10);
        assert_eq!(groups[1].len(), 10);
        assert_eq!(groups[2].len(), 3);
        // Input order preserved within and across groups.
        assert_eq!(groups[0][0], cpfs[0]);
        assert_eq!(groups[2][2], cpfs[22]);
    }
}
