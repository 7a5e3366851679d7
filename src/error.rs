use thiserror::Error;

/// Failure taxonomy for the quiz core.
///
/// Read-side persistence corruption is deliberately absent: a corrupt or
/// unreadable attempt log degrades to an empty history inside the store and
/// never surfaces as an error value. Individually malformed question records
/// are counted at load time, not raised.
#[derive(Debug, Error)]
pub enum QuizError {
    /// The question source could not be read or parsed at all. Fatal for
    /// the session.
    #[error("failed to load questions: {reason}")]
    Load { reason: String },

    /// The question source parsed, but the top level is not an array.
    #[error("question data must be a top-level array")]
    InvalidShape,

    /// Navigation or a CLI command referenced an unknown question id.
    #[error("question '{id}' not found")]
    NotFound { id: String },

    /// The attempt log could not be written. The in-memory attempt still
    /// stands; only durability was lost.
    #[error("failed to persist attempt log: {0}")]
    PersistWrite(#[source] std::io::Error),

    /// Submission was attempted with no choices selected.
    #[error("no choices selected")]
    EmptySelection,

    /// A second submission was attempted on the same question instance.
    #[error("answer already submitted for this question")]
    AlreadySubmitted,

    /// Submission or choice toggling with no question on screen.
    #[error("no question is being answered")]
    NoActiveQuestion,
}
