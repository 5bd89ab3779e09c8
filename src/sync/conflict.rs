use crate::remote::ConcurrencyToken;

/// Outcome of the optimistic concurrency check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Proceed,
    /// The remote record changed after the change was queued.
    Conflict {
        baseline: ConcurrencyToken,
        current: ConcurrencyToken,
    },
}

impl Verdict {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Verdict::Conflict { .. })
    }
}

/// Remote wins: a queued change whose baseline no longer matches the remote
/// is dropped instead of overwriting the newer remote data.
pub struct ConflictPolicy;

impl ConflictPolicy {
    /// Conflict only if both tokens are known and differ.
    pub fn check(
        baseline: Option<&ConcurrencyToken>,
        current: Option<&ConcurrencyToken>,
    ) -> Verdict {
        match (baseline, current) {
            (Some(baseline), Some(current)) if baseline != current => Verdict::Conflict {
                baseline: baseline.clone(),
                current: current.clone(),
            },
            _ => Verdict::Proceed,
        }
    }
}
