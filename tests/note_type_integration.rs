use std::collections::HashMap;

use mcq_card::{
    AddonConfig, CardIdentity, ChoicePrefix, DisplayConfig, FIELD_NAMES, NoteTypeError,
    NoteTypeModel, NoteTypeStore, build_note_type, inject_identity, sync_note_type,
};

#[derive(Default)]
struct Collection {
    note_types: HashMap<String, NoteTypeModel>,
}

impl NoteTypeStore for Collection {
    fn find(&self, name: &str) -> Option<NoteTypeModel> {
        self.note_types.get(name).cloned()
    }

    fn save(&mut self, model: NoteTypeModel) -> Result<(), NoteTypeError> {
        self.note_types.insert(model.name.clone(), model);
        Ok(())
    }
}

/// Substitutes `{{Field}}` references the way the host does when it renders a card.
fn fill(template: &str, fields: &[(&str, &str)]) -> String {
    let mut rendered = template.to_string();
    for (name, value) in fields {
        rendered = rendered.replace(&format!("{{{{{}}}}}", name), value);
    }
    for name in FIELD_NAMES {
        rendered = rendered.replace(&format!("{{{{{}}}}}", name), "");
    }
    rendered
}

fn attribute(markup: &str, name: &str) -> Option<String> {
    let start = markup.find(&format!("{}=\"", name))? + name.len() + 2;
    let end = markup[start..].find('"')? + start;
    Some(markup[start..end].to_string())
}

#[test]
fn configured_name_is_used_for_the_note_type() {
    let mut config = AddonConfig::default();
    config.note_type.name = "Quiz".to_string();
    let mut collection = Collection::default();

    let report = sync_note_type(&mut collection, &config).expect("sync should succeed");

    assert!(report.created);
    assert!(collection.note_types.contains_key("Quiz"));
}

#[test]
fn rendered_back_carries_identity_and_config() {
    let mut config = AddonConfig::default();
    config.display.choice_prefix = ChoicePrefix::None;
    let model = build_note_type(&config).expect("note type should build");
    let template = &model.templates[0];

    let back = fill(
        &template.back,
        &[("Choice1", "Paris"), ("Mode", "single"), ("Correct", "1")],
    );
    let injected = inject_identity(&back, &CardIdentity::new(1700, 0, "42"));

    assert_eq!(attribute(&injected, "data-note-id").as_deref(), Some("1700"));
    assert_eq!(attribute(&injected, "data-ord").as_deref(), Some("0"));
    assert_eq!(attribute(&injected, "data-card-id").as_deref(), Some("42"));
    assert_eq!(attribute(&injected, "data-mode").as_deref(), Some("single"));
    assert_eq!(attribute(&injected, "data-correct").as_deref(), Some("1"));

    let encoded = attribute(&injected, "data-config").expect("config attribute should exist");
    let decoded: DisplayConfig =
        serde_json::from_str(&html_escape::decode_html_entities(&encoded))
            .expect("embedded config should decode");
    assert_eq!(decoded, config.display);
}

#[test]
fn front_and_back_of_one_card_share_a_storage_key() {
    let model = build_note_type(&AddonConfig::default()).expect("note type should build");
    let template = &model.templates[0];
    let identity = CardIdentity::new(3, 1, "8");

    let front = inject_identity(&fill(&template.front, &[]), &identity);
    let back = inject_identity(&fill(&template.back, &[]), &identity);

    let read = |markup: &str| {
        CardIdentity::from_anchor(
            &attribute(markup, "data-note-id").unwrap_or_default(),
            &attribute(markup, "data-ord").unwrap_or_default(),
            &attribute(markup, "data-card-id").unwrap_or_default(),
        )
        .expect("anchor should carry an identity")
    };

    assert_eq!(read(&front).storage_key(), read(&back).storage_key());
    assert_eq!(read(&front).storage_key(), "mcq_addon:v2:3:1");
}
