use std::collections::BTreeSet;
use std::fmt;

use crate::config::ChoicePrefix;

/// Number of choice slots a card template exposes (`Choice1` through `Choice6`).
pub const CHOICE_SLOTS: u8 = 6;

/// One-based slot number of a choice on the card.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(try_from = "i64", into = "u8")]
pub struct ChoicePosition(u8);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("choice position {0} is outside 1..={}", CHOICE_SLOTS)]
pub struct PositionOutOfRange(pub i64);

impl ChoicePosition {
    pub fn new(value: u8) -> Option<Self> {
        (1..=CHOICE_SLOTS).contains(&value).then_some(Self(value))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Every slot in ascending order.
    pub fn all() -> impl Iterator<Item = Self> {
        (1..=CHOICE_SLOTS).map(Self)
    }

    /// Upper-case letter for the slot, `A` for position 1.
    pub fn letter(self) -> char {
        char::from(b'A' + self.0 - 1)
    }

    /// Name of the note field holding this slot's content.
    pub fn field_name(self) -> String {
        format!("Choice{}", self.0)
    }

    /// Label rendered in front of the choice content.
    pub fn prefix_label(self, prefix: ChoicePrefix) -> String {
        match prefix {
            ChoicePrefix::None => String::new(),
            ChoicePrefix::Index => format!("{}.", self.0),
            ChoicePrefix::Letter => format!("{}.", self.letter()),
        }
    }
}

impl TryFrom<i64> for ChoicePosition {
    type Error = PositionOutOfRange;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .and_then(Self::new)
            .ok_or(PositionOutOfRange(value))
    }
}

impl From<ChoicePosition> for u8 {
    fn from(position: ChoicePosition) -> Self {
        position.0
    }
}

impl fmt::Display for ChoicePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A choice slot that has content.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Choice {
    pub position: ChoicePosition,
    /// Rich text (HTML) as authored in the note field.
    pub content: String,
}

/// The choices present on one card, in slot order. Empty slots are not part of the list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChoiceList {
    choices: Vec<Choice>,
}

impl ChoiceList {
    /// Builds the list from `(position, content)` slots, dropping slots whose content is blank.
    /// A position seen twice keeps its first content.
    pub fn from_slots<I, S>(slots: I) -> Self
    where
        I: IntoIterator<Item = (ChoicePosition, S)>,
        S: AsRef<str>,
    {
        let mut seen = BTreeSet::new();
        let mut choices: Vec<Choice> = slots
            .into_iter()
            .filter_map(|(position, content)| {
                let content = content.as_ref().trim();
                (!content.is_empty() && seen.insert(position)).then(|| Choice {
                    position,
                    content: content.to_string(),
                })
            })
            .collect();
        choices.sort_by_key(|choice| choice.position);

        Self { choices }
    }

    /// Reads `Choice1..Choice6` through `field`, which returns `None` for a missing field.
    pub fn from_fields<F>(field: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::from_slots(ChoicePosition::all().map(|position| {
            (
                position,
                field(&position.field_name()).unwrap_or_default(),
            )
        }))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Choice> {
        self.choices.iter()
    }

    pub fn positions(&self) -> BTreeSet<ChoicePosition> {
        self.choices.iter().map(|choice| choice.position).collect()
    }

    pub fn contains(&self, position: ChoicePosition) -> bool {
        self.choices.iter().any(|choice| choice.position == position)
    }

    pub fn len(&self) -> usize {
        self.choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }
}
