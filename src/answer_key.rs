use std::collections::HashSet;
use std::fmt;
use std::num::IntErrorKind;
use std::str::FromStr;

use crate::choice::{CHOICE_SLOTS, ChoicePosition};
use crate::config::CorrectFormat;

/// Whether a card accepts one or several correct positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Single,
    Multi,
}

impl Mode {
    /// Reads the free-text `Mode` field. Only the exact token `single` (surrounding
    /// whitespace ignored) selects single mode; anything else, including an empty field, is
    /// multi mode.
    pub fn normalize(raw: &str) -> Self {
        if raw.trim() == "single" {
            Self::Single
        } else {
            Self::Multi
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Multi => "multi",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum AnswerKeyError {
    #[error("Invalid Correct field (no answers given).")]
    Empty,
    #[error("Invalid Correct field ({token:?} is not a number).")]
    InvalidToken { token: String },
    #[error("Invalid Correct field ({token} is outside 1-{}).", CHOICE_SLOTS)]
    OutOfRange { token: String },
    #[error("Invalid Correct field (single mode cannot have multiple answers).")]
    TooManyForSingle { count: usize },
}

/// Parsed `Correct` field: distinct positions in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectKey {
    positions: Vec<ChoicePosition>,
}

impl CorrectKey {
    /// Parses a comma-separated list such as `"1, 3"`.
    ///
    /// Tokens are trimmed and empty tokens dropped. A single token that is not an integer in
    /// `1..=6` rejects the whole key, as does a key without any token.
    pub fn parse(raw: &str) -> Result<Self, AnswerKeyError> {
        let mut seen = HashSet::new();
        let mut positions = Vec::new();

        for token in raw.split(',').map(str::trim).filter(|token| !token.is_empty()) {
            let out_of_range = || AnswerKeyError::OutOfRange {
                token: token.to_string(),
            };
            let value: i64 = token.parse().map_err(|error: std::num::ParseIntError| {
                match error.kind() {
                    IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => out_of_range(),
                    _ => AnswerKeyError::InvalidToken {
                        token: token.to_string(),
                    },
                }
            })?;
            let position = ChoicePosition::try_from(value).map_err(|_| out_of_range())?;

            if seen.insert(position) {
                positions.push(position);
            }
        }

        if positions.is_empty() {
            return Err(AnswerKeyError::Empty);
        }

        Ok(Self { positions })
    }

    pub fn positions(&self) -> &[ChoicePosition] {
        &self.positions
    }

    pub fn contains(&self, position: ChoicePosition) -> bool {
        self.positions.contains(&position)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn sorted(&self) -> Vec<ChoicePosition> {
        let mut sorted = self.positions.clone();
        sorted.sort();
        sorted
    }

    /// Canonical field encoding: ascending positions joined by commas.
    pub fn to_encoded(&self) -> String {
        self.format(CorrectFormat::Index)
    }

    /// Ascending positions rendered as numbers or letters.
    pub fn format(&self, format: CorrectFormat) -> String {
        self.sorted()
            .into_iter()
            .map(|position| match format {
                CorrectFormat::Index => position.to_string(),
                CorrectFormat::Letter => position.letter().to_string(),
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl FromStr for CorrectKey {
    type Err = AnswerKeyError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::parse(raw)
    }
}

/// Mode and correct key of one card, checked against each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerKey {
    pub mode: Mode,
    pub correct: CorrectKey,
}

impl AnswerKey {
    /// Parses the raw `Mode` and `Correct` field values.
    ///
    /// # Errors
    /// * Any [`CorrectKey::parse`] failure.
    /// * [`AnswerKeyError::TooManyForSingle`] when single mode lists more than one position.
    pub fn parse(raw_mode: &str, raw_correct: &str) -> Result<Self, AnswerKeyError> {
        let mode = Mode::normalize(raw_mode);
        let correct = CorrectKey::parse(raw_correct)?;

        if mode == Mode::Single && correct.len() > 1 {
            return Err(AnswerKeyError::TooManyForSingle {
                count: correct.len(),
            });
        }

        Ok(Self { mode, correct })
    }
}
