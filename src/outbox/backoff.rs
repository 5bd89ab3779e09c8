use std::time::Duration;

use crate::config::ConfigError;

/// Retry delays indexed by attempt count.
///
/// `backoff_for(n)` returns the delay after the `n`-th failed attempt; attempt
/// counts past the end of the table reuse the last (largest) step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackoffSchedule {
    steps: Vec<Duration>,
}

impl BackoffSchedule {
    /// Minutes used when nothing is configured.
    pub const DEFAULT_MINUTES: [u64; 8] = [0, 1, 2, 5, 10, 20, 40, 80];

    /// Longest single step: 366 days.
    pub const MAX_STEP: Duration = Duration::from_secs(366 * 24 * 60 * 60);

    /// Build a schedule from steps; must be non-empty, ascending and no step
    /// longer than [`Self::MAX_STEP`].
    pub fn new(steps: Vec<Duration>) -> Result<Self, ConfigError> {
        if steps.is_empty() {
            return Err(ConfigError::Invalid("backoff table is empty".into()));
        }
        if steps.iter().any(|step| *step > Self::MAX_STEP) {
            return Err(ConfigError::Invalid(
                "backoff step longer than 366 days".into(),
            ));
        }
        if steps.windows(2).any(|pair| pair[1] < pair[0]) {
            return Err(ConfigError::Invalid(
                "backoff table must be ascending".into(),
            ));
        }
        Ok(Self { steps })
    }

    pub fn from_minutes(minutes: &[u64]) -> Result<Self, ConfigError> {
        let steps = minutes
            .iter()
            .map(|m| {
                m.checked_mul(60).map(Duration::from_secs).ok_or_else(|| {
                    ConfigError::Invalid(format!("backoff step of {} minutes is out of range", m))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(steps)
    }

    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let index = (attempt as usize).min(self.steps.len() - 1);
        self.steps[index]
    }

    pub fn steps(&self) -> &[Duration] {
        &self.steps
    }

    pub fn minutes(&self) -> Vec<u64> {
        self.steps.iter().map(|d| d.as_secs() / 60).collect()
    }
}

impl Default for BackoffSchedule {
    fn default() -> Self {
        Self {
            steps: Self::DEFAULT_MINUTES
                .iter()
                .map(|m| Duration::from_secs(m * 60))
                .collect(),
        }
    }
}
