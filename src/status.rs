//! Writes probe observations back to the store.
//!
//! The status writer owns the transition history discipline: consecutive
//! identical outcomes are compressed into one condition, a new condition is
//! appended only when the outcome status or the observed spec generation
//! changes, and a positive `historyLimit` bounds the list to the most
//! recent entries.

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::probe::ProbeOutcome;
use crate::resource::{Condition, ConditionStatus, NetworkTest};
use crate::store::Store;

const CONDITION_TYPE: &str = "Probe";
const CONDITION_REASON: &str = "Probe";

/// Record a probe outcome on a freshly fetched definition and submit the
/// status update. The caller holds the resource-version fence; a conflict
/// here means the fence raced and the next cycle settles it.
pub async fn write_outcome<S: Store>(
    store: &S,
    mut test: NetworkTest,
    outcome: &ProbeOutcome,
    next_run: DateTime<Utc>,
) -> Result<()> {
    let now = Utc::now();

    test.status.last_result = Some(outcome.result());
    test.status.message = Some(outcome.message.clone());
    test.status.last_run = Some(now);
    test.status.next_run = Some(next_run);

    let condition = Condition {
        kind: CONDITION_TYPE.to_string(),
        reason: CONDITION_REASON.to_string(),
        status: if outcome.success {
            ConditionStatus::True
        } else {
            ConditionStatus::False
        },
        observed_generation: test.metadata.generation,
        last_transition_time: now,
        message: outcome.message.clone(),
    };
    append_condition(
        &mut test.status.conditions,
        condition,
        test.spec.history_limit,
    );

    store.update_status(&test).await.map(|_| ())
}

/// Append `condition` unless the last entry already has the same status and
/// observed generation, then truncate from the head when a positive
/// `history_limit` is exceeded.
pub fn append_condition(conditions: &mut Vec<Condition>, condition: Condition, history_limit: usize) {
    let is_transition = conditions.last().is_none_or(|last| {
        last.status != condition.status || last.observed_generation != condition.observed_generation
    });
    if is_transition {
        conditions.push(condition);
    }

    if history_limit > 0 && conditions.len() > history_limit {
        let excess = conditions.len() - history_limit;
        conditions.drain(..excess);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn condition(status: ConditionStatus, generation: i64, message: &str) -> Condition {
        Condition {
            kind: CONDITION_TYPE.to_string(),
            reason: CONDITION_REASON.to_string(),
            status,
            observed_generation: generation,
            last_transition_time: Utc::now(),
            message: message.to_string(),
        }
    }

    #[test]
    fn identical_outcomes_compress() {
        let mut conditions = Vec::new();
        append_condition(&mut conditions, condition(ConditionStatus::True, 1, "ok"), 0);
        append_condition(&mut conditions, condition(ConditionStatus::True, 1, "ok again"), 0);
        append_condition(&mut conditions, condition(ConditionStatus::True, 1, "still ok"), 0);

        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].message, "ok");
    }

    #[test]
    fn status_flip_appends() {
        let mut conditions = Vec::new();
        append_condition(&mut conditions, condition(ConditionStatus::True, 1, "ok"), 0);
        append_condition(&mut conditions, condition(ConditionStatus::False, 1, "down"), 0);
        append_condition(&mut conditions, condition(ConditionStatus::True, 1, "back"), 0);

        assert_eq!(conditions.len(), 3);
        // Adjacent entries always differ in status or generation.
        for pair in conditions.windows(2) {
            assert!(
                pair[0].status != pair[1].status
                    || pair[0].observed_generation != pair[1].observed_generation
            );
        }
    }

    #[test]
    fn generation_change_appends_even_with_same_status() {
        let mut conditions = Vec::new();
        append_condition(&mut conditions, condition(ConditionStatus::True, 1, "ok"), 0);
        append_condition(&mut conditions, condition(ConditionStatus::True, 2, "ok, new spec"), 0);

        assert_eq!(conditions.len(), 2);
        assert_eq!(conditions[1].observed_generation, 2);
    }

    #[test]
    fn positive_history_limit_keeps_most_recent() {
        let mut conditions = Vec::new();
        for generation in 1..=5 {
            append_condition(
                &mut conditions,
                condition(ConditionStatus::True, generation, &format!("gen {generation}")),
                3,
            );
        }

        assert_eq!(conditions.len(), 3);
        assert_eq!(
            conditions.iter().map(|c| c.observed_generation).collect::<Vec<_>>(),
            vec![3, 4, 5]
        );
    }

    #[test]
    fn zero_history_limit_is_unbounded() {
        let mut conditions = Vec::new();
        for generation in 1..=50 {
            append_condition(
                &mut conditions,
                condition(ConditionStatus::True, generation, "ok"),
                0,
            );
        }
        assert_eq!(conditions.len(), 50);
    }
}
