//! Note-type schema exposed to the host and the policy that keeps it in sync.

use crate::card::FIELD_NAMES;
use crate::choice::ChoicePosition;
use crate::config::{AddonConfig, DisplayConfig};
use crate::identity::META_ANCHOR_ID;

/// Element the behaviour module mounts the choice list into.
pub const CARD_CONTAINER_ID: &str = "mcq-card";
pub const HIDDEN_CHOICES_ID: &str = "mcq-hidden";
pub const HIDDEN_EXPLANATION_ID: &str = "mcq-explanation";
/// Media file name of the compiled behaviour module's JS loader.
pub const BEHAVIOUR_MODULE: &str = "_mcq_card.js";
pub const TEMPLATE_NAME: &str = "Card 1";

pub const STYLESHEET: &str = r#".mcq-choices {
  margin-top: 0.75rem;
  display: flex;
  flex-direction: column;
  gap: 0.5rem;
}

.mcq-choice {
  display: flex;
  align-items: flex-start;
  gap: 0.5rem;
  padding: 0.25rem 0.5rem;
  border-radius: 4px;
}

.mcq-choice input {
  margin-top: 0.2rem;
}

.mcq-prefix {
  font-weight: bold;
}

.mcq-col {
  width: 1.25rem;
  text-align: center;
  font-weight: bold;
}

.mcq-row-correct {
  background: #d6f5d6;
}

.mcq-row-discordant {
  background: #f8d7da;
}

.mcq-status,
.mcq-summary {
  margin-top: 0.75rem;
  font-weight: bold;
}

.mcq-explanation {
  margin-top: 0.75rem;
}

.mcq-empty {
  font-style: italic;
}

.mcq-error {
  border: 1px solid #d9534f;
  background: #f8d7da;
  padding: 0.75rem;
  border-radius: 4px;
}

.mcq-error-title {
  font-weight: bold;
  margin-bottom: 0.5rem;
}

.mcq-raw {
  font-family: monospace;
}
"#;

#[derive(Debug, thiserror::Error)]
pub enum NoteTypeError {
    #[error("failed to encode display config: {0}")]
    Config(#[from] serde_json::Error),
    #[error("note type store failed: {0}")]
    Store(String),
}

/// Which side of the card a template renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardSide {
    Front,
    Back,
}

impl CardSide {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::Back => "back",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "front" => Some(Self::Front),
            "back" => Some(Self::Back),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardTemplate {
    pub name: String,
    pub front: String,
    pub back: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteTypeModel {
    pub name: String,
    pub fields: Vec<String>,
    pub templates: Vec<CardTemplate>,
    pub css: String,
}

/// Host-side storage of note types.
pub trait NoteTypeStore {
    fn find(&self, name: &str) -> Option<NoteTypeModel>;
    /// Adds the model, or replaces the stored model with the same name.
    fn save(&mut self, model: NoteTypeModel) -> Result<(), NoteTypeError>;
}

fn field_reference(field: &str) -> String {
    format!("{{{{{}}}}}", field)
}

fn hidden_choices() -> String {
    let slots: Vec<String> = ChoicePosition::all()
        .map(|position| {
            format!(
                "  <div data-index=\"{}\">{}</div>",
                position,
                field_reference(&position.field_name())
            )
        })
        .collect();

    format!(
        "<div id=\"{}\" style=\"display:none;\">\n{}\n</div>",
        HIDDEN_CHOICES_ID,
        slots.join("\n")
    )
}

fn meta_anchor(side: CardSide, config: &DisplayConfig) -> Result<String, NoteTypeError> {
    let encoded = serde_json::to_string(config)?;
    let correct = match side {
        CardSide::Front => String::new(),
        CardSide::Back => format!("\n     data-correct=\"{}\"", field_reference("Correct")),
    };

    Ok(format!(
        concat!(
            "<div id=\"{id}\"\n",
            "     data-side=\"{side}\"\n",
            "     data-mode=\"{mode}\"{correct}\n",
            "     data-note-id=\"\"\n",
            "     data-ord=\"\"\n",
            "     data-card-id=\"\"\n",
            "     data-config=\"{config}\">\n",
            "</div>"
        ),
        id = META_ANCHOR_ID,
        side = side.as_str(),
        mode = field_reference("Mode"),
        correct = correct,
        config = html_escape::encode_double_quoted_attribute(&encoded),
    ))
}

fn behaviour_script() -> String {
    format!(
        "<script type=\"module\">\nimport init, {{ mountCard }} from \"./{}\";\ninit().then(() => mountCard());\n</script>",
        BEHAVIOUR_MODULE
    )
}

/// Question-side template text.
pub fn render_front_template(config: &DisplayConfig) -> Result<String, NoteTypeError> {
    Ok([
        format!("<div id=\"mcq-question\">{}</div>", field_reference("Question")),
        format!("<div id=\"{}\" class=\"mcq-choices\"></div>", CARD_CONTAINER_ID),
        hidden_choices(),
        meta_anchor(CardSide::Front, config)?,
        behaviour_script(),
    ]
    .join("\n\n"))
}

/// Answer-side template text.
pub fn render_back_template(config: &DisplayConfig) -> Result<String, NoteTypeError> {
    Ok([
        format!("<div id=\"mcq-question\">{}</div>", field_reference("Question")),
        format!("<div id=\"{}\" class=\"mcq-choices\"></div>", CARD_CONTAINER_ID),
        hidden_choices(),
        format!(
            "<div id=\"{}\" style=\"display:none;\">{}</div>",
            HIDDEN_EXPLANATION_ID,
            field_reference("Explanation")
        ),
        meta_anchor(CardSide::Back, config)?,
        behaviour_script(),
    ]
    .join("\n\n"))
}

/// The complete note type for the current configuration.
pub fn build_note_type(config: &AddonConfig) -> Result<NoteTypeModel, NoteTypeError> {
    Ok(NoteTypeModel {
        name: config.note_type.name.clone(),
        fields: FIELD_NAMES.iter().map(|field| field.to_string()).collect(),
        templates: vec![CardTemplate {
            name: TEMPLATE_NAME.to_string(),
            front: render_front_template(&config.display)?,
            back: render_back_template(&config.display)?,
        }],
        css: STYLESHEET.to_string(),
    })
}

fn references_field(template: &str, field: &str) -> bool {
    template.contains(&field_reference(field)) || template.contains(&format!(":{}}}}}", field))
}

/// Fields the question side cannot render without.
pub fn required_front_fields() -> Vec<String> {
    let mut fields = vec!["Question".to_string()];
    fields.extend(ChoicePosition::all().map(ChoicePosition::field_name));
    fields.push("Mode".to_string());
    fields
}

/// A template is broken when its front lacks a required field reference or its back is blank.
pub fn template_is_valid(template: &CardTemplate) -> bool {
    let front_complete = required_front_fields()
        .iter()
        .all(|field| references_field(&template.front, field));

    front_complete && !template.back.trim().is_empty()
}

/// What [`sync_note_type`] changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub created: bool,
    pub added_fields: Vec<String>,
    pub templates_rebuilt: bool,
}

impl SyncReport {
    pub fn changed(&self) -> bool {
        self.created || !self.added_fields.is_empty() || self.templates_rebuilt
    }
}

/// Creates the note type, or repairs it in place.
///
/// Missing fields are always appended. Templates and stylesheet are rewritten when
/// `force_template_sync` is set or when no template is valid per [`template_is_valid`].
pub fn sync_note_type<S: NoteTypeStore>(
    store: &mut S,
    config: &AddonConfig,
) -> Result<SyncReport, NoteTypeError> {
    let rendered = build_note_type(config)?;
    let mut report = SyncReport::default();

    let Some(mut model) = store.find(&rendered.name) else {
        tracing::info!("Creating note type {}", rendered.name);
        store.save(rendered)?;
        report.created = true;
        return Ok(report);
    };

    for field in &rendered.fields {
        if !model.fields.contains(field) {
            model.fields.push(field.clone());
            report.added_fields.push(field.clone());
        }
    }

    let broken = model.templates.is_empty() || !model.templates.iter().all(template_is_valid);
    if config.note_type.force_template_sync || broken {
        model.templates = rendered.templates;
        model.css = rendered.css;
        report.templates_rebuilt = true;
    }

    if report.changed() {
        tracing::info!(
            "Updated note type {} (added fields: {:?}, templates rebuilt: {})",
            model.name,
            report.added_fields,
            report.templates_rebuilt
        );
        store.save(model)?;
    }

    Ok(report)
}
