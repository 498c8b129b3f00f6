#![cfg(target_arch = "wasm32")]

use crate::{
    BackCard, BackOutcome, CARD_CONTAINER_ID, CardPage, CardSide, ChoicePosition, Diagnostic,
    FrontCard, HIDDEN_CHOICES_ID, HIDDEN_EXPLANATION_ID, META_ANCHOR_ID, ResultBlock,
    SelectionStore, StorageBackend, StorageError, TemplateError, render_back, render_front,
};
use leptos::*;
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, DomException, Element, HtmlElement, HtmlInputElement, Storage};

/// Browser `localStorage`. Every operation fails with [`StorageError::Unavailable`] when the
/// webview exposes no storage.
struct LocalStorage {
    storage: Option<Storage>,
}

impl LocalStorage {
    fn open() -> Self {
        let storage = window().local_storage().ok().flatten();
        if storage.is_none() {
            tracing::debug!("localStorage unavailable, selections will not persist");
        }
        Self { storage }
    }

    fn storage(&self) -> Result<&Storage, StorageError> {
        self.storage.as_ref().ok_or(StorageError::Unavailable)
    }
}

fn storage_error(value: JsValue) -> StorageError {
    match value.dyn_ref::<DomException>() {
        Some(exception) if exception.name() == "QuotaExceededError" => StorageError::QuotaExceeded,
        Some(exception) => StorageError::Access(exception.message()),
        None => StorageError::Access(format!("{value:?}")),
    }
}

impl StorageBackend for LocalStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage()?.get_item(key).map_err(storage_error)
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage()?.set_item(key, value).map_err(storage_error)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.storage()?.remove_item(key).map_err(storage_error)
    }
}

fn hidden_choice_slots(document: &Document) -> HashMap<String, String> {
    let mut slots = HashMap::new();
    let Ok(nodes) = document.query_selector_all(&format!("#{} > div", HIDDEN_CHOICES_ID)) else {
        return slots;
    };

    for index in 0..nodes.length() {
        let Some(element) = nodes
            .item(index)
            .and_then(|node| node.dyn_into::<Element>().ok())
        else {
            continue;
        };
        let Some(position) = element
            .get_attribute("data-index")
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .and_then(|value| ChoicePosition::try_from(value).ok())
        else {
            continue;
        };
        slots.insert(position.field_name(), element.inner_html());
    }

    slots
}

fn read_page(document: &Document) -> Result<CardPage, TemplateError> {
    let anchor = document
        .get_element_by_id(META_ANCHOR_ID)
        .ok_or(TemplateError::MissingAnchor)?;
    let slots = hidden_choice_slots(document);
    let explanation = document
        .get_element_by_id(HIDDEN_EXPLANATION_ID)
        .map(|element| element.inner_html());

    CardPage::from_anchor(
        |name| anchor.get_attribute(name),
        |name| match name {
            "Explanation" => explanation.clone(),
            other => slots.get(other).cloned(),
        },
    )
}

/// Positions whose control is checked right now.
fn checked_positions() -> BTreeSet<ChoicePosition> {
    let mut positions = BTreeSet::new();
    let Some(nodes) = window().document().and_then(|document| {
        document
            .query_selector_all(&format!("#{} input:checked", CARD_CONTAINER_ID))
            .ok()
    }) else {
        return positions;
    };

    for index in 0..nodes.length() {
        let position = nodes
            .item(index)
            .and_then(|node| node.dyn_into::<HtmlInputElement>().ok())
            .and_then(|input| input.value().parse::<i64>().ok())
            .and_then(|value| ChoicePosition::try_from(value).ok());
        positions.extend(position);
    }

    positions
}

#[component]
fn Placeholder(text: &'static str) -> impl IntoView {
    view! { <div class="mcq-empty">{text}</div> }
}

#[component]
fn FrontChoices(card: FrontCard, on_change: Callback<BTreeSet<ChoicePosition>>) -> impl IntoView {
    if let Some(text) = card.placeholder() {
        return view! { <Placeholder text=text /> }.into_view();
    }

    let input_type = card.control.input_type();

    card.rows
        .into_iter()
        .map(|row| {
            let on_change = on_change.clone();

            view! {
                <label class="mcq-choice">
                    <input
                        type=input_type
                        name="mcq-choice"
                        value=row.choice.position.to_string()
                        prop:checked=row.checked
                        on:change=move |_| on_change.call(checked_positions())
                    />
                    <span class="mcq-prefix">{row.label}</span>
                    <span inner_html=row.choice.content></span>
                </label>
            }
        })
        .collect_view()
}

#[component]
fn DiagnosticView(diagnostic: Diagnostic) -> impl IntoView {
    view! {
        <div class="mcq-error">
            <div class="mcq-error-title">{diagnostic.message()}</div>
            <div class="mcq-raw">"Mode: " {diagnostic.raw_mode_text().to_string()}</div>
            <div class="mcq-raw">"Correct: " {diagnostic.raw_correct_text().to_string()}</div>
        </div>
    }
}

fn result_block_view(block: ResultBlock<'_>) -> View {
    match block {
        ResultBlock::Status(text) => {
            view! { <div class="mcq-status">{text.to_string()}</div> }.into_view()
        }
        ResultBlock::Summary(text) => {
            view! { <div class="mcq-summary">{text.to_string()}</div> }.into_view()
        }
        ResultBlock::Explanation(html) => {
            view! { <div class="mcq-explanation" inner_html=html.to_string()></div> }.into_view()
        }
    }
}

#[component]
fn BackChoices(card: BackCard) -> impl IntoView {
    let rows = match card.placeholder() {
        Some(text) => view! { <Placeholder text=text /> }.into_view(),
        None => card
            .rows
            .iter()
            .map(|row| {
                let class = match row.treatment().css_class() {
                    Some(treatment) => format!("mcq-choice {}", treatment),
                    None => "mcq-choice".to_string(),
                };
                let [selected, correct] = row
                    .marks
                    .map(|marks| marks.columns(&card.mark))
                    .unwrap_or(["", ""]);

                view! {
                    <div class=class>
                        <span class="mcq-col">{selected.to_string()}</span>
                        <span class="mcq-col">{correct.to_string()}</span>
                        <span class="mcq-prefix">{row.label.clone()}</span>
                        <span inner_html=row.choice.content.clone()></span>
                    </div>
                }
            })
            .collect_view(),
    };
    let blocks = card
        .result_blocks()
        .into_iter()
        .map(result_block_view)
        .collect_view();

    view! {
        {rows}
        {blocks}
    }
}

fn mount_front(container: HtmlElement, page: CardPage) {
    let store = SelectionStore::new(LocalStorage::open());
    let (card, session) = render_front(
        &page.content,
        page.identity.as_ref(),
        &store,
        &page.config,
    );
    let store = Rc::new(RefCell::new(store));

    let on_change = Callback::new(move |checked: BTreeSet<ChoicePosition>| {
        let saved = session.record_change(&mut *store.borrow_mut(), checked);
        tracing::debug!("Selection now {:?}", saved);
    });

    mount_to(container, move || view! { <FrontChoices card=card on_change=on_change /> });
}

fn mount_back(container: HtmlElement, page: CardPage) {
    let mut store = SelectionStore::new(LocalStorage::open());
    let outcome = render_back(
        &page.content,
        page.identity.as_ref(),
        &mut store,
        &page.config,
    );

    mount_to(container, move || match outcome {
        BackOutcome::Diagnostic(diagnostic) => {
            view! { <DiagnosticView diagnostic=diagnostic /> }.into_view()
        }
        BackOutcome::Judged(card) => view! { <BackChoices card=card /> }.into_view(),
    });
}

#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
}

/// Renders the card side described by the meta anchor into the card container.
#[wasm_bindgen(js_name = mountCard)]
pub fn mount_card() {
    let Some(document) = window().document() else {
        return;
    };
    let Some(container) = document
        .get_element_by_id(CARD_CONTAINER_ID)
        .and_then(|element| element.dyn_into::<HtmlElement>().ok())
    else {
        tracing::debug!("No #{} container on this card", CARD_CONTAINER_ID);
        return;
    };
    let page = match read_page(&document) {
        Ok(page) => page,
        Err(error) => {
            tracing::debug!("Card template unreadable: {}", error);
            container.set_inner_html(&format!(
                "<div class=\"mcq-error\"><div class=\"mcq-error-title\">{}</div></div>",
                html_escape::encode_text(&error.to_string())
            ));
            return;
        }
    };

    container.set_inner_html("");
    match page.side {
        CardSide::Front => mount_front(container, page),
        CardSide::Back => mount_back(container, page),
    }
}
