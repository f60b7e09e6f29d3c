use parse_display::{Display, FromStr};
use serde::{Deserialize, Serialize};


/// What happens when an observable is written outside any action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, FromStr, Serialize, Deserialize)]
#[display(style = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WritePolicy {
    /// The write fails with [`Error::NotInAction`](crate::Error::NotInAction).
    #[default]
    Strict,
    /// The write is wrapped in an implicit action containing only that write.
    Lenient,
}

/// Thread-wide settings of a [`Runtime`](crate::core::Runtime).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    pub write_policy: WritePolicy,

    /// Upper bound on the rounds of one flush.
    ///
    /// Reactions that write to observables queue more reactions for the next round;
    /// exceeding the bound fails the flush with [`Error::FlushLimitExceeded`](crate::Error::FlushLimitExceeded).
    /// `0` is treated as `1`.
    pub max_flush_rounds: usize,
}

impl RuntimeConfig {
    pub const DEFAULT_MAX_FLUSH_ROUNDS: usize = 100;

    pub fn with_write_policy(mut self, write_policy: WritePolicy) -> Self {
        self.write_policy = write_policy;
        self
    }
    pub fn with_max_flush_rounds(mut self, max_flush_rounds: usize) -> Self {
        self.max_flush_rounds = max_flush_rounds;
        self
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            write_policy: WritePolicy::default(),
            max_flush_rounds: Self::DEFAULT_MAX_FLUSH_ROUNDS,
        }
    }
}
