//! Question side: the interactive choice list and selection persistence.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::answer_key::Mode;
use crate::card::CardContent;
use crate::choice::{Choice, ChoiceList, ChoicePosition};
use crate::config::DisplayConfig;
use crate::identity::CardIdentity;
use crate::store::{SelectionRecord, SelectionStore, StorageBackend};

/// Shown instead of an empty list when a card has no choices.
pub const NO_CHOICES_TEXT: &str = "No choices found.";

/// Form control used for every choice on the card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Radio,
    Checkbox,
}

impl ControlKind {
    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Single => Self::Radio,
            Mode::Multi => Self::Checkbox,
        }
    }

    /// Value of the `type` attribute of the `<input>`.
    pub fn input_type(self) -> &'static str {
        match self {
            Self::Radio => "radio",
            Self::Checkbox => "checkbox",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontRow {
    pub choice: Choice,
    pub label: String,
    pub checked: bool,
}

/// Question side of a card, ready to be drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontCard {
    pub control: ControlKind,
    pub rows: Vec<FrontRow>,
}

impl FrontCard {
    /// One row per present choice, pre-checked when the position is in `stored`.
    pub fn build(
        choices: &ChoiceList,
        mode: Mode,
        stored: Option<&SelectionRecord>,
        config: &DisplayConfig,
    ) -> Self {
        let rows = choices
            .iter()
            .map(|choice| FrontRow {
                choice: choice.clone(),
                label: choice.position.prefix_label(config.choice_prefix),
                checked: stored.is_some_and(|record| record.selected.contains(&choice.position)),
            })
            .collect();

        Self {
            control: ControlKind::for_mode(mode),
            rows,
        }
    }

    /// Placeholder text to show instead of the list, if any.
    pub fn placeholder(&self) -> Option<&'static str> {
        self.rows.is_empty().then_some(NO_CHOICES_TEXT)
    }

    pub fn rendered_positions(&self) -> BTreeSet<ChoicePosition> {
        self.rows.iter().map(|row| row.choice.position).collect()
    }
}

/// Tracks the rendered card so change events can be written to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontSession {
    identity: Option<CardIdentity>,
    rendered: BTreeSet<ChoicePosition>,
}

impl FrontSession {
    pub fn new(identity: Option<CardIdentity>, card: &FrontCard) -> Self {
        Self {
            identity,
            rendered: card.rendered_positions(),
        }
    }

    pub fn identity(&self) -> Option<&CardIdentity> {
        self.identity.as_ref()
    }

    /// Handles one change event. `checked` lists the positions whose control is checked after
    /// the change; the stored record is overwritten with that full set.
    pub fn record_change<B, I>(
        &self,
        store: &mut SelectionStore<B>,
        checked: I,
    ) -> BTreeSet<ChoicePosition>
    where
        B: StorageBackend,
        I: IntoIterator<Item = ChoicePosition>,
    {
        self.record_change_at(store, checked, Utc::now())
    }

    pub fn record_change_at<B, I>(
        &self,
        store: &mut SelectionStore<B>,
        checked: I,
        now: DateTime<Utc>,
    ) -> BTreeSet<ChoicePosition>
    where
        B: StorageBackend,
        I: IntoIterator<Item = ChoicePosition>,
    {
        let selected: BTreeSet<ChoicePosition> = checked
            .into_iter()
            .filter(|position| self.rendered.contains(position))
            .collect();

        match &self.identity {
            Some(identity) => store.set(identity, &SelectionRecord::new(selected.clone(), now)),
            None => tracing::debug!("Card identity missing, selection not saved"),
        }

        selected
    }
}

/// Builds the question side for `content`, restoring any selection saved for `identity`.
pub fn render_front<B: StorageBackend>(
    content: &CardContent,
    identity: Option<&CardIdentity>,
    store: &SelectionStore<B>,
    config: &DisplayConfig,
) -> (FrontCard, FrontSession) {
    let mode = Mode::normalize(&content.mode);
    let stored = identity.and_then(|identity| store.get(identity));

    let card = FrontCard::build(&content.choices, mode, stored.as_ref(), config);
    let session = FrontSession::new(identity.cloned(), &card);

    (card, session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChoicePrefix;
    use crate::store::MemoryBackend;

    fn position(value: u8) -> ChoicePosition {
        ChoicePosition::new(value).expect("position should be in range")
    }

    fn content(mode: &str) -> CardContent {
        CardContent {
            question: "Capital of Italy?".to_string(),
            choices: ChoiceList::from_slots(vec![
                (position(1), "Paris"),
                (position(2), "Rome"),
                (position(4), "Berlin"),
            ]),
            mode: mode.to_string(),
            correct: "2".to_string(),
            explanation: None,
        }
    }

    #[test]
    fn control_kind_follows_mode() {
        let store = SelectionStore::new(MemoryBackend::new());
        let config = DisplayConfig::default();

        let (single, _) = render_front(&content("single"), None, &store, &config);
        let (multi, _) = render_front(&content("multi"), None, &store, &config);
        let (unknown, _) = render_front(&content("whatever"), None, &store, &config);

        assert_eq!(single.control, ControlKind::Radio);
        assert_eq!(multi.control, ControlKind::Checkbox);
        assert_eq!(unknown.control, ControlKind::Checkbox);
        assert_eq!(single.control.input_type(), "radio");
    }

    #[test]
    fn rows_use_prefix_and_skip_gaps() {
        let store = SelectionStore::new(MemoryBackend::new());
        let config = DisplayConfig {
            choice_prefix: ChoicePrefix::Letter,
            ..DisplayConfig::default()
        };

        let (card, _) = render_front(&content("multi"), None, &store, &config);

        let labels: Vec<&str> = card.rows.iter().map(|row| row.label.as_str()).collect();
        assert_eq!(labels, vec!["A.", "B.", "D."]);
        assert!(card.placeholder().is_none());
        assert!(card.rows.iter().all(|row| !row.checked));
    }

    #[test]
    fn restores_saved_selection() {
        let identity = CardIdentity::new(1, 0, "10");
        let mut store = SelectionStore::new(MemoryBackend::new());
        store.set(
            &identity,
            &SelectionRecord::now([position(2), position(5)].into_iter().collect()),
        );

        let (card, _) = render_front(
            &content("multi"),
            Some(&identity),
            &store,
            &DisplayConfig::default(),
        );

        let checked: Vec<ChoicePosition> = card
            .rows
            .iter()
            .filter(|row| row.checked)
            .map(|row| row.choice.position)
            .collect();
        assert_eq!(checked, vec![position(2)]);
    }

    #[test]
    fn every_change_overwrites_the_record() {
        let identity = CardIdentity::new(1, 0, "10");
        let mut store = SelectionStore::new(MemoryBackend::new());
        let (_, session) = render_front(
            &content("multi"),
            Some(&identity),
            &store,
            &DisplayConfig::default(),
        );

        session.record_change(&mut store, [position(1)]);
        session.record_change(&mut store, [position(1), position(4)]);

        let record = store.get(&identity).expect("selection should be saved");
        assert_eq!(record.selected, [position(1), position(4)].into_iter().collect());

        session.record_change(&mut store, Vec::<ChoicePosition>::new());
        let cleared = store.get(&identity).expect("empty selection is still a record");
        assert!(cleared.is_empty());
    }

    #[test]
    fn positions_without_a_row_are_not_saved() {
        let identity = CardIdentity::new(1, 0, "10");
        let mut store = SelectionStore::new(MemoryBackend::new());
        let (_, session) = render_front(
            &content("multi"),
            Some(&identity),
            &store,
            &DisplayConfig::default(),
        );

        let saved = session.record_change(&mut store, [position(3), position(2)]);

        assert_eq!(saved, [position(2)].into_iter().collect());
    }

    #[test]
    fn missing_identity_skips_persistence() {
        let mut store = SelectionStore::new(MemoryBackend::new());
        let (_, session) = render_front(&content("multi"), None, &store, &DisplayConfig::default());

        let saved = session.record_change(&mut store, [position(1)]);

        assert_eq!(saved.len(), 1);
        assert!(session.identity().is_none());
        assert!(store.backend().raw("mcq_addon:v2:1:0").is_none());
    }

    #[test]
    fn empty_card_shows_placeholder() {
        let store = SelectionStore::new(MemoryBackend::new());
        let empty = CardContent::default();

        let (card, _) = render_front(&empty, None, &store, &DisplayConfig::default());

        assert!(card.rows.is_empty());
        assert_eq!(card.placeholder(), Some(NO_CHOICES_TEXT));
    }
}
