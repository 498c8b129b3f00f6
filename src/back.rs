//! Answer side: validation of the answer key and per-choice judgement.

use std::collections::BTreeSet;

use crate::answer_key::{AnswerKey, AnswerKeyError, Mode};
use crate::card::CardContent;
use crate::choice::{Choice, ChoiceList, ChoicePosition};
use crate::config::{DisplayConfig, ExplanationPosition};
use crate::front::NO_CHOICES_TEXT;
use crate::identity::CardIdentity;
use crate::store::{SelectionStore, StorageBackend};

pub const CORRECT_ANSWERS_LABEL: &str = "Correct answers: ";
/// Stands in for a raw field value that is blank in a diagnostic.
pub const EMPTY_FIELD_TEXT: &str = "(empty)";

/// Shown instead of the judged card when `Mode` and `Correct` cannot be graded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub error: AnswerKeyError,
    pub raw_mode: String,
    pub raw_correct: String,
}

impl Diagnostic {
    pub fn message(&self) -> String {
        self.error.to_string()
    }

    pub fn raw_mode_text(&self) -> &str {
        display_raw(&self.raw_mode)
    }

    pub fn raw_correct_text(&self) -> &str {
        display_raw(&self.raw_correct)
    }
}

fn display_raw(raw: &str) -> &str {
    if raw.trim().is_empty() {
        EMPTY_FIELD_TEXT
    } else {
        raw
    }
}

/// Visual treatment of a judged row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowTreatment {
    /// Selected and correct.
    FullyCorrect,
    /// Selected but not correct, or correct but not selected.
    Discordant,
    Plain,
}

impl RowTreatment {
    pub fn css_class(self) -> Option<&'static str> {
        match self {
            Self::FullyCorrect => Some("mcq-row-correct"),
            Self::Discordant => Some("mcq-row-discordant"),
            Self::Plain => None,
        }
    }
}

/// The two judgement columns of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowMarks {
    pub was_selected: bool,
    pub is_correct: bool,
}

impl RowMarks {
    pub fn treatment(self) -> RowTreatment {
        match (self.was_selected, self.is_correct) {
            (true, true) => RowTreatment::FullyCorrect,
            (true, false) | (false, true) => RowTreatment::Discordant,
            (false, false) => RowTreatment::Plain,
        }
    }

    /// Text of the "selected" and "correct" columns.
    pub fn columns(self, glyph: &str) -> [&str; 2] {
        let column = |flag: bool| if flag { glyph } else { "" };
        [column(self.was_selected), column(self.is_correct)]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackRow {
    pub choice: Choice,
    pub label: String,
    /// `None` when the card was not answered; such rows carry no judgement.
    pub marks: Option<RowMarks>,
}

impl BackRow {
    pub fn treatment(&self) -> RowTreatment {
        self.marks
            .map(RowMarks::treatment)
            .unwrap_or(RowTreatment::Plain)
    }
}

/// One block of the result area, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultBlock<'a> {
    Status(&'a str),
    Summary(&'a str),
    Explanation(&'a str),
}

/// Answer side of a card whose key validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackCard {
    pub mode: Mode,
    pub rows: Vec<BackRow>,
    pub answered: bool,
    /// Empty once answered; the configured unanswered text otherwise.
    pub result_text: String,
    pub summary: String,
    /// Glyph drawn in a judgement column that holds.
    pub mark: String,
    pub explanation: Option<String>,
    pub explanation_position: ExplanationPosition,
}

impl BackCard {
    pub fn placeholder(&self) -> Option<&'static str> {
        self.rows.is_empty().then_some(NO_CHOICES_TEXT)
    }

    pub fn row(&self, position: ChoicePosition) -> Option<&BackRow> {
        self.rows.iter().find(|row| row.choice.position == position)
    }

    /// Result area contents with the explanation placed before or after the result block.
    pub fn result_blocks(&self) -> Vec<ResultBlock<'_>> {
        let mut blocks = Vec::new();
        let explanation = self.explanation.as_deref().map(ResultBlock::Explanation);

        if self.explanation_position == ExplanationPosition::Top {
            blocks.extend(explanation);
        }
        if !self.result_text.is_empty() {
            blocks.push(ResultBlock::Status(&self.result_text));
        }
        blocks.push(ResultBlock::Summary(&self.summary));
        if self.explanation_position == ExplanationPosition::Bottom {
            blocks.extend(explanation);
        }

        blocks
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackOutcome {
    Diagnostic(Diagnostic),
    Judged(BackCard),
}

/// Judges every present choice against `key` and the learner's `selection`.
///
/// An empty selection means the card was not answered: rows carry no marks and the result
/// text is the configured unanswered text. Positions referenced by the key or the selection
/// but missing from `choices` produce no row.
pub fn judge(
    choices: &ChoiceList,
    key: &AnswerKey,
    selection: &BTreeSet<ChoicePosition>,
    explanation: Option<&str>,
    config: &DisplayConfig,
) -> BackCard {
    let answered = !selection.is_empty();

    let rows = choices
        .iter()
        .map(|choice| BackRow {
            choice: choice.clone(),
            label: choice.position.prefix_label(config.choice_prefix),
            marks: answered.then(|| RowMarks {
                was_selected: selection.contains(&choice.position),
                is_correct: key.correct.contains(choice.position),
            }),
        })
        .collect();

    BackCard {
        mode: key.mode,
        rows,
        answered,
        result_text: if answered {
            String::new()
        } else {
            config.unanswered_text.clone()
        },
        summary: format!(
            "{}{}",
            CORRECT_ANSWERS_LABEL,
            key.correct.format(config.correct_format)
        ),
        mark: config.correct_mark.clone(),
        explanation: explanation
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string),
        explanation_position: config.explanation_position,
    }
}

/// Builds the answer side for `content`.
///
/// The answer key is validated before the store is touched. The saved selection for
/// `identity` is then read and, when `clear_selection_on_back` is set and something was
/// selected, deleted right away so a second reveal shows the card as unanswered.
pub fn render_back<B: StorageBackend>(
    content: &CardContent,
    identity: Option<&CardIdentity>,
    store: &mut SelectionStore<B>,
    config: &DisplayConfig,
) -> BackOutcome {
    let key = match AnswerKey::parse(&content.mode, &content.correct) {
        Ok(key) => key,
        Err(error) => {
            tracing::debug!(
                "Answer key rejected (mode {:?}, correct {:?}): {}",
                content.mode,
                content.correct,
                error
            );
            return BackOutcome::Diagnostic(Diagnostic {
                error,
                raw_mode: content.mode.clone(),
                raw_correct: content.correct.clone(),
            });
        }
    };

    let selection = identity
        .and_then(|identity| store.get(identity))
        .map(|record| record.selected)
        .unwrap_or_default();

    if config.clear_selection_on_back && !selection.is_empty() {
        if let Some(identity) = identity {
            store.delete(identity);
        }
    }

    BackOutcome::Judged(judge(
        &content.choices,
        &key,
        &selection,
        content.explanation.as_deref(),
        config,
    ))
}
