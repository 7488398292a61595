//! Input validation rules for idea submissions
//!
//! Grounded in spec.md §8's boundary cases: 1 sentence accepted, 10 accepted,
//! 11 rejected, 0 rejected, and a 10,001-char input rejected.

use crate::error::DomainError;

pub const MAX_IDEA_CHARS: usize = 10_000;
pub const MAX_EXTRA_CONTEXT_CHARS: usize = 50_000;
pub const MIN_SENTENCES: usize = 1;
pub const MAX_SENTENCES: usize = 10;

/// Count sentences in free text by scanning for `.`, `!`, `?` terminators.
///
/// A run of terminator characters closes one sentence. Any trailing
/// non-whitespace content after the last terminator counts as one more
/// (unterminated) sentence. Whitespace-only input has zero sentences.
pub fn count_sentences(text: &str) -> usize {
    let mut count = 0;
    let mut in_sentence = false;

    for ch in text.chars() {
        if ch == '.' || ch == '!' || ch == '?' {
            if in_sentence {
                count += 1;
                in_sentence = false;
            }
        } else if !ch.is_whitespace() {
            in_sentence = true;
        }
    }

    if in_sentence {
        count += 1;
    }

    count
}

/// Validate a trimmed idea string against the sentence-count and length rules.
pub fn validate_idea(raw: &str) -> Result<String, DomainError> {
    let trimmed = raw.trim().to_string();

    if trimmed.chars().count() > MAX_IDEA_CHARS {
        return Err(DomainError::IdeaTooLong {
            max: MAX_IDEA_CHARS,
            actual: trimmed.chars().count(),
        });
    }

    let sentences = count_sentences(&trimmed);
    if sentences < MIN_SENTENCES || sentences > MAX_SENTENCES {
        return Err(DomainError::InvalidSentenceCount(sentences));
    }

    Ok(trimmed)
}

/// Validate the optional `extra_context` string against its length rule.
pub fn validate_extra_context(raw: &str) -> Result<(), DomainError> {
    if raw.chars().count() > MAX_EXTRA_CONTEXT_CHARS {
        return Err(DomainError::ExtraContextTooLong {
            max: MAX_EXTRA_CONTEXT_CHARS,
            actual: raw.chars().count(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_single_sentence() {
        assert_eq!(count_sentences("Build a thing."), 1);
    }

    #[test]
    fn counts_ten_sentences() {
        let idea = "One. Two. Three. Four. Five. Six. Seven. Eight. Nine. Ten.";
        assert_eq!(count_sentences(idea), 10);
    }

    #[test]
    fn counts_unterminated_trailing_sentence() {
        assert_eq!(count_sentences("No terminator here"), 1);
    }

    #[test]
    fn counts_zero_for_blank_input() {
        assert_eq!(count_sentences("   \n\t  "), 0);
    }

    #[test]
    fn rejects_zero_sentences() {
        let err = validate_idea("   ").unwrap_err();
        assert!(matches!(err, DomainError::InvalidSentenceCount(0)));
    }

    #[test]
    fn rejects_eleven_sentences() {
        let idea = "One. Two. Three. Four. Five. Six. Seven. Eight. Nine. Ten. Eleven.";
        let err = validate_idea(idea).unwrap_err();
        assert!(matches!(err, DomainError::InvalidSentenceCount(11)));
    }

    #[test]
    fn accepts_ten_sentences() {
        let idea = "One. Two. Three. Four. Five. Six. Seven. Eight. Nine. Ten.";
        assert!(validate_idea(idea).is_ok());
    }

    #[test]
    fn rejects_idea_over_max_chars() {
        let idea = "a".repeat(10_001) + ".";
        let err = validate_idea(&idea).unwrap_err();
        assert!(matches!(err, DomainError::IdeaTooLong { .. }));
    }

    #[test]
    fn trims_whitespace() {
        let idea = validate_idea("  Build a thing.  ").unwrap();
        assert_eq!(idea, "Build a thing.");
    }
}
