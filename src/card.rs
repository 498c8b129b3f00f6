use crate::choice::ChoiceList;
use crate::config::DisplayConfig;
use crate::identity::CardIdentity;
use crate::note_type::CardSide;

/// Field names of the note type, in schema order.
pub const FIELD_NAMES: [&str; 10] = [
    "Question",
    "Choice1",
    "Choice2",
    "Choice3",
    "Choice4",
    "Choice5",
    "Choice6",
    "Correct",
    "Mode",
    "Explanation",
];

/// Field values of one card as the renderers consume them. `mode` and `correct` are kept
/// raw so a diagnostic can show exactly what the author typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardContent {
    pub question: String,
    pub choices: ChoiceList,
    pub mode: String,
    pub correct: String,
    pub explanation: Option<String>,
}

impl CardContent {
    /// Reads every field through `field`, which returns `None` for a missing field.
    pub fn from_fields<F>(field: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |name: &str| field(name).unwrap_or_default();
        let explanation = text("Explanation").trim().to_string();

        Self {
            question: text("Question"),
            choices: ChoiceList::from_fields(&field),
            mode: text("Mode").trim().to_string(),
            correct: text("Correct").trim().to_string(),
            explanation: (!explanation.is_empty()).then_some(explanation),
        }
    }
}

/// Rendered card markup that the behaviour module cannot work with.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Card template is missing its MCQ data block. Update the note type.")]
    MissingAnchor,
    #[error("Card template names an unknown side ({raw:?}). Update the note type.")]
    UnknownSide { raw: String },
}

/// Everything a rendered card hands to the behaviour module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardPage {
    pub side: CardSide,
    pub content: CardContent,
    pub identity: Option<CardIdentity>,
    pub config: DisplayConfig,
}

impl CardPage {
    /// Reads the page from the anchor's attributes and the hidden field blocks. `attribute`
    /// looks up an anchor attribute, `hidden_field` a field rendered in a hidden block
    /// (`Choice1..Choice6`, `Explanation`).
    pub fn from_anchor<A, H>(attribute: A, hidden_field: H) -> Result<Self, TemplateError>
    where
        A: Fn(&str) -> Option<String>,
        H: Fn(&str) -> Option<String>,
    {
        let text = |name: &str| attribute(name).unwrap_or_default();

        let raw_side = text("data-side");
        let side = CardSide::parse(&raw_side)
            .ok_or(TemplateError::UnknownSide { raw: raw_side })?;

        let content = CardContent::from_fields(|name| match name {
            "Mode" => attribute("data-mode"),
            "Correct" => attribute("data-correct"),
            other => hidden_field(other),
        });

        Ok(Self {
            side,
            content,
            identity: CardIdentity::from_anchor(
                &text("data-note-id"),
                &text("data-ord"),
                &text("data-card-id"),
            ),
            config: DisplayConfig::from_embedded(&text("data-config")),
        })
    }
}
