pub mod answer_key;
pub mod authoring;
pub mod back;
pub mod card;
pub mod choice;
pub mod config;
pub mod front;
pub mod identity;
pub mod note_type;
pub mod store;
#[cfg(target_arch = "wasm32")]
mod wasm;

pub use answer_key::{AnswerKey, AnswerKeyError, CorrectKey, Mode};
pub use authoring::{
    AppliedAnswer, AuthoringDialog, AuthoringError, DialogRow, EditorHandle, NoteFields,
};
pub use back::{
    BackCard, BackOutcome, BackRow, CORRECT_ANSWERS_LABEL, Diagnostic, EMPTY_FIELD_TEXT,
    ResultBlock, RowMarks, RowTreatment, judge, render_back,
};
pub use card::{CardContent, CardPage, FIELD_NAMES, TemplateError};
pub use choice::{CHOICE_SLOTS, Choice, ChoiceList, ChoicePosition, PositionOutOfRange};
pub use config::{
    AddonConfig, ChoicePrefix, ConfigLoadError, CorrectFormat, DisplayConfig,
    ExplanationPosition, NoteTypeConfig, UiConfig,
};
pub use front::{ControlKind, FrontCard, FrontRow, FrontSession, NO_CHOICES_TEXT, render_front};
pub use identity::{CardIdentity, META_ANCHOR_ID, inject_identity};
pub use note_type::{
    BEHAVIOUR_MODULE, CARD_CONTAINER_ID, CardSide, CardTemplate, HIDDEN_CHOICES_ID,
    HIDDEN_EXPLANATION_ID, NoteTypeError, NoteTypeModel, NoteTypeStore, STYLESHEET, SyncReport,
    build_note_type, render_back_template, render_front_template, sync_note_type,
};
pub use store::{MemoryBackend, SelectionRecord, SelectionStore, StorageBackend, StorageError};
