//! Authoring model for the dialog that writes `Mode` and `Correct` on a note.
//!
//! The host owns the window; this type holds the dialog state and applies it to the note it
//! was opened with. Everything the dialog needs is passed to [`AuthoringDialog::open`].

use std::collections::BTreeSet;

use crate::answer_key::Mode;
use crate::choice::{ChoiceList, ChoicePosition};
use crate::config::UiConfig;
use crate::front::NO_CHOICES_TEXT;

/// Note being edited, as exposed by the host.
pub trait NoteFields {
    fn field(&self, name: &str) -> Option<String>;
    fn set_field(&mut self, name: &str, value: String);
    /// Persists pending field changes.
    fn flush(&mut self) -> Result<(), AuthoringError>;
}

/// In-place editor currently showing the note, if the dialog was opened from one.
pub trait EditorHandle {
    fn reload_note(&mut self);
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthoringError {
    #[error("select at least one correct answer")]
    NoCorrectAnswer,
    #[error("single mode allows one correct answer but {count} are selected")]
    TooManyForSingle { count: usize },
    #[error("choice {position} has no content")]
    MissingChoice { position: ChoicePosition },
    #[error("failed to save note: {0}")]
    Flush(String),
}

/// A choice as listed in the dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogRow {
    pub position: ChoicePosition,
    pub label: String,
    pub checked: bool,
}

/// Field values written by [`AuthoringDialog::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedAnswer {
    pub mode: Mode,
    pub correct: String,
}

pub struct AuthoringDialog<'a> {
    note: &'a mut dyn NoteFields,
    editor: Option<&'a mut dyn EditorHandle>,
    title: String,
    mode: Mode,
    choices: ChoiceList,
    checked: BTreeSet<ChoicePosition>,
}

/// Reads `Correct` as the dialog's starting point. Unlike the card renderer this skips
/// unreadable tokens instead of rejecting the field, so a broken key can be repaired.
fn lenient_positions(raw: &str) -> Vec<ChoicePosition> {
    let mut positions = Vec::new();

    for token in raw.split(',').map(str::trim) {
        let Some(position) = token
            .parse::<i64>()
            .ok()
            .and_then(|value| ChoicePosition::try_from(value).ok())
        else {
            continue;
        };
        if !positions.contains(&position) {
            positions.push(position);
        }
    }

    positions
}

impl<'a> AuthoringDialog<'a> {
    /// Opens the dialog on `note`. A blank `Mode` field starts in single mode; any other value
    /// is read the way the card renders it.
    pub fn open(
        note: &'a mut dyn NoteFields,
        editor: Option<&'a mut dyn EditorHandle>,
        ui: &UiConfig,
    ) -> Self {
        let raw_mode = note.field("Mode").unwrap_or_default();
        let mode = if raw_mode.trim().is_empty() {
            Mode::Single
        } else {
            Mode::normalize(&raw_mode)
        };

        let choices = ChoiceList::from_fields(|name| note.field(name));
        let mut initial: Vec<ChoicePosition> =
            lenient_positions(&note.field("Correct").unwrap_or_default())
                .into_iter()
                .filter(|position| choices.contains(*position))
                .collect();
        if mode == Mode::Single {
            initial.truncate(1);
        }

        Self {
            note,
            editor,
            title: ui.editor_button_label.clone(),
            mode,
            choices,
            checked: initial.into_iter().collect(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Switches mode. Going to single mode keeps only the lowest checked position.
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;

        if mode == Mode::Single {
            if let Some(first) = self.checked.first().copied() {
                self.checked = BTreeSet::from([first]);
            }
        }
    }

    /// Checks or unchecks a choice. In single mode checking one choice unchecks the others.
    /// Positions without content are ignored.
    pub fn set_checked(&mut self, position: ChoicePosition, checked: bool) {
        if !self.choices.contains(position) {
            return;
        }

        if !checked {
            self.checked.remove(&position);
            return;
        }

        if self.mode == Mode::Single {
            self.checked.clear();
        }
        self.checked.insert(position);
    }

    pub fn checked(&self) -> &BTreeSet<ChoicePosition> {
        &self.checked
    }

    pub fn rows(&self) -> Vec<DialogRow> {
        self.choices
            .iter()
            .map(|choice| DialogRow {
                position: choice.position,
                label: format!("{}. {}", choice.position, choice.content),
                checked: self.checked.contains(&choice.position),
            })
            .collect()
    }

    pub fn placeholder(&self) -> Option<&'static str> {
        self.choices.is_empty().then_some(NO_CHOICES_TEXT)
    }

    fn validate(&self) -> Result<(), AuthoringError> {
        if self.checked.is_empty() {
            return Err(AuthoringError::NoCorrectAnswer);
        }

        if self.mode == Mode::Single && self.checked.len() > 1 {
            return Err(AuthoringError::TooManyForSingle {
                count: self.checked.len(),
            });
        }

        if let Some(position) = self
            .checked
            .iter()
            .find(|position| !self.choices.contains(**position))
        {
            return Err(AuthoringError::MissingChoice {
                position: *position,
            });
        }

        Ok(())
    }

    /// Validates the dialog state, then writes `Mode` and `Correct`, persists the note and
    /// reloads the attached editor. Nothing is written when validation fails.
    pub fn apply(&mut self) -> Result<AppliedAnswer, AuthoringError> {
        self.validate()?;

        let correct = self
            .checked
            .iter()
            .map(ChoicePosition::to_string)
            .collect::<Vec<_>>()
            .join(",");

        self.note.set_field("Mode", self.mode.as_str().to_string());
        self.note.set_field("Correct", correct.clone());
        self.note.flush()?;

        if let Some(editor) = self.editor.as_mut() {
            editor.reload_note();
        }

        tracing::info!("Saved answer key {} ({})", correct, self.mode);

        Ok(AppliedAnswer {
            mode: self.mode,
            correct,
        })
    }
}
