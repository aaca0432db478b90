//! Admission checks for review text.
//!
//! [`validate_review`] decides whether raw text may reach the model. Checks run in a fixed order
//! and the first failing one is reported:
//!
//! 1. empty after trimming
//! 2. no Latin or Cyrillic letter
//! 3. fewer than `min_words` words
//! 4. more than `max_words` words
//! 5. a word longer than `max_word_length` characters
//!
//! Only Latin and Cyrillic count as letters. Text written entirely in other scripts (CJK,
//! Arabic, Greek, ...) is rejected with [`ValidationError::NoLetters`].
//!
//! Words are separated by Unicode whitespace and by the ASCII separators U+001C..U+001F.
//!
//! ```rust
//! use film_review_sentiment::validation::{validate_review, ValidationError};
//!
//! assert_eq!(validate_review("Bad movie"), Err(ValidationError::TooFewWords { min: 10 }));
//!
//! let text = "  One two three four five six seven eight nine ten.  ";
//! assert_eq!(validate_review(text), Ok("One two three four five six seven eight nine ten."));
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Minimum number of words in a review.
pub const MIN_WORDS: usize = 10;
/// Maximum number of words in a review.
pub const MAX_WORDS: usize = 256;
/// Maximum length of a single word, in characters.
pub const MAX_WORD_LENGTH: usize = 30;

static LETTER: Lazy<Regex> =
    Lazy::new(|| Regex::new("[a-zA-Zа-яА-ЯёЁ]").expect("letter pattern is valid"));

/// Why a review was rejected. `Display` yields the message shown to the user.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Nothing but whitespace.
    #[error("The review cannot be empty.")]
    EmptyInput,

    /// No Latin or Cyrillic letter anywhere in the text.
    #[error("The review must contain at least one letter.")]
    NoLetters,

    /// Fewer words than allowed.
    #[error("The review must contain at least {min} words.")]
    TooFewWords { min: usize },

    /// More words than allowed.
    #[error("The review must contain no more than {max} words.")]
    TooManyWords { max: usize },

    /// At least one word is longer than allowed.
    #[error("Each word in the review must not exceed {max} characters.")]
    WordTooLong { max: usize },
}

/// Limits applied by [`ReviewRules::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewRules {
    pub min_words: usize,
    pub max_words: usize,
    pub max_word_length: usize,
}

impl Default for ReviewRules {
    fn default() -> Self {
        Self {
            min_words: MIN_WORDS,
            max_words: MAX_WORDS,
            max_word_length: MAX_WORD_LENGTH,
        }
    }
}

impl ReviewRules {
    /// Check `text` and return it trimmed, or the first rule it breaks.
    ///
    /// The returned slice is the trimmed input itself; inner spacing and punctuation are
    /// untouched.
    pub fn validate<'a>(&self, text: &'a str) -> Result<&'a str, ValidationError> {
        let text = text.trim_matches(is_separator);

        if text.is_empty() {
            return Err(ValidationError::EmptyInput);
        }

        if !LETTER.is_match(text) {
            return Err(ValidationError::NoLetters);
        }

        let word_count = split_words(text).count();
        if word_count < self.min_words {
            return Err(ValidationError::TooFewWords {
                min: self.min_words,
            });
        }
        if word_count > self.max_words {
            return Err(ValidationError::TooManyWords {
                max: self.max_words,
            });
        }

        if split_words(text).any(|word| word.chars().count() > self.max_word_length) {
            return Err(ValidationError::WordTooLong {
                max: self.max_word_length,
            });
        }

        Ok(text)
    }
}

/// Unicode whitespace plus the ASCII file, group, record and unit separators (U+001C..U+001F).
fn is_separator(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

fn split_words(text: &str) -> impl Iterator<Item = &str> {
    text.split(is_separator).filter(|word| !word.is_empty())
}

/// Validate `text` against the default [`ReviewRules`].
pub fn validate_review(text: &str) -> Result<&str, ValidationError> {
    ReviewRules::default().validate(text)
}
