use std::collections::BTreeMap;

use mcq_card::{
    AuthoringDialog, AuthoringError, BackOutcome, CardContent, CardIdentity, ChoicePosition,
    DisplayConfig, EditorHandle, FIELD_NAMES, MemoryBackend, Mode, NoteFields, RowTreatment,
    SelectionStore, UiConfig, render_back, render_front,
};

struct Note {
    fields: BTreeMap<String, String>,
    saved: BTreeMap<String, String>,
}

impl Note {
    fn new(values: &[(&str, &str)]) -> Self {
        let mut fields: BTreeMap<String, String> = FIELD_NAMES
            .iter()
            .map(|name| (name.to_string(), String::new()))
            .collect();
        for (name, value) in values {
            fields.insert(name.to_string(), value.to_string());
        }

        Self {
            saved: fields.clone(),
            fields,
        }
    }

    fn content(&self) -> CardContent {
        CardContent::from_fields(|name| self.saved.get(name).cloned())
    }
}

impl NoteFields for Note {
    fn field(&self, name: &str) -> Option<String> {
        self.fields.get(name).cloned()
    }

    fn set_field(&mut self, name: &str, value: String) {
        self.fields.insert(name.to_string(), value);
    }

    fn flush(&mut self) -> Result<(), AuthoringError> {
        self.saved = self.fields.clone();
        Ok(())
    }
}

#[derive(Default)]
struct Editor {
    reloads: usize,
}

impl EditorHandle for Editor {
    fn reload_note(&mut self) {
        self.reloads += 1;
    }
}

fn position(value: u8) -> ChoicePosition {
    ChoicePosition::new(value).expect("position should be in range")
}

#[test]
fn authored_key_grades_the_card() {
    let mut note = Note::new(&[
        ("Question", "Which are prime?"),
        ("Choice1", "2"),
        ("Choice2", "4"),
        ("Choice3", "7"),
    ]);
    let mut editor = Editor::default();

    {
        let mut dialog = AuthoringDialog::open(&mut note, Some(&mut editor), &UiConfig::default());
        assert_eq!(dialog.mode(), Mode::Single);

        dialog.set_mode(Mode::Multi);
        dialog.set_checked(position(3), true);
        dialog.set_checked(position(1), true);
        dialog.apply().expect("valid selection should apply");
    }
    assert_eq!(editor.reloads, 1);

    let identity = CardIdentity::new(55, 0, "77");
    let config = DisplayConfig::default();
    let content = note.content();
    let mut store = SelectionStore::new(MemoryBackend::new());

    let (_, session) = render_front(&content, Some(&identity), &store, &config);
    session.record_change(&mut store, [position(1), position(2)]);

    let BackOutcome::Judged(card) = render_back(&content, Some(&identity), &mut store, &config)
    else {
        panic!("authored key should validate");
    };
    let treatments: Vec<RowTreatment> = card.rows.iter().map(|row| row.treatment()).collect();
    assert_eq!(
        treatments,
        vec![
            RowTreatment::FullyCorrect,
            RowTreatment::Discordant,
            RowTreatment::Discordant,
        ]
    );
}

#[test]
fn reopening_restores_the_saved_key() {
    let mut note = Note::new(&[("Choice2", "Rome"), ("Choice5", "Milan")]);

    {
        let mut dialog = AuthoringDialog::open(&mut note, None, &UiConfig::default());
        dialog.set_checked(position(5), true);
        dialog.apply().expect("valid selection should apply");
    }

    let dialog = AuthoringDialog::open(&mut note, None, &UiConfig::default());
    assert_eq!(dialog.mode(), Mode::Single);
    assert_eq!(dialog.checked().iter().copied().collect::<Vec<_>>(), vec![position(5)]);
}

#[test]
fn rejected_apply_leaves_note_untouched() {
    let mut note = Note::new(&[("Choice1", "Paris"), ("Mode", "multi"), ("Correct", "1")]);

    {
        let mut dialog = AuthoringDialog::open(&mut note, None, &UiConfig::default());
        dialog.set_checked(position(1), false);
        assert_eq!(dialog.apply(), Err(AuthoringError::NoCorrectAnswer));
    }

    assert_eq!(note.saved.get("Correct").map(String::as_str), Some("1"));
}

#[test]
fn card_without_choices_offers_nothing_to_check() {
    let mut note = Note::new(&[("Question", "Empty?")]);
    let mut dialog = AuthoringDialog::open(&mut note, None, &UiConfig::default());

    dialog.set_checked(position(1), true);

    assert!(dialog.rows().is_empty());
    assert!(dialog.placeholder().is_some());
    assert!(dialog.checked().is_empty());
}
