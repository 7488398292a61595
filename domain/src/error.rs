//! Domain-level error types

use thiserror::Error;

/// Domain-level errors: violations of invariants that the domain itself
/// can detect, independent of any adapter.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("idea must contain between 1 and 10 sentences, found {0}")]
    InvalidSentenceCount(usize),

    #[error("idea exceeds the maximum length of {max} characters ({actual} given)")]
    IdeaTooLong { max: usize, actual: usize },

    #[error("extra_context exceeds the maximum length of {max} characters ({actual} given)")]
    ExtraContextTooLong { max: usize, actual: usize },

    #[error("persona weights must sum to 1.0, got {0}")]
    PersonaWeightsInvalid(f64),

    #[error("cannot aggregate a decision from zero persona reviews")]
    NoReviews,

    #[error("unknown step name: {0}")]
    UnknownStep(String),

    #[error("unknown persona id: {0}")]
    UnknownPersona(String),

    #[error("revision requested with neither edited_proposal nor edit_notes")]
    MissingEditInputs,

    #[error("parent run {0} is not completed")]
    ParentNotCompleted(uuid::Uuid),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_sentence_count_error() {
        let err = DomainError::InvalidSentenceCount(11);
        assert_eq!(
            err.to_string(),
            "idea must contain between 1 and 10 sentences, found 11"
        );
    }
}
