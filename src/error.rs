use parse_display::Display;

use crate::core::ReactionId;

/// Errors reported by writes, actions and reactions.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum Error {
    /// An observable was written outside any action while the write policy is
    /// [`Strict`](crate::WritePolicy::Strict). The observable is left unchanged.
    #[display("observable written outside of an action")]
    NotInAction,

    /// A reaction was run again from inside its own body.
    #[display("{0} re-entered while running")]
    ReentrantReaction(ReactionId),

    /// Reactions kept writing to their own dependencies for more than this many flush rounds.
    #[display("reactions did not settle after {0} flush rounds")]
    FlushLimitExceeded(usize),
}

impl std::error::Error for Error {}
