/// Completion state derived from stored attempts.
///
/// Two externally visible states, derived on demand: `Complete` iff at least
/// one completed attempt exists for the (activity, user) pair. The transition
/// `Incomplete` to `Complete` is irreversible because the attempt store is
/// append-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionState {
    Incomplete,
    Complete,
}

impl CompletionState {
    /// Derives the state from an existence check on completed attempts.
    #[must_use]
    pub fn from_completed_exists(exists: bool) -> Self {
        if exists {
            Self::Complete
        } else {
            Self::Incomplete
        }
    }

    #[must_use]
    pub fn is_complete(self) -> bool {
        matches!(self, Self::Complete)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Incomplete => "incomplete",
            Self::Complete => "complete",
        }
    }
}
