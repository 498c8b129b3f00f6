use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

/// `id` of the element that carries per-card data in both card templates.
pub const META_ANCHOR_ID: &str = "mcq-meta";

pub const STORAGE_NAMESPACE: &str = "mcq_addon";
/// Bumping this drops every saved in-progress selection.
pub const STORAGE_VERSION: &str = "v2";

/// Identifies one rendered card variant: a note and one of its templates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CardIdentity {
    pub note_id: i64,
    pub template_ordinal: u32,
    /// Shown for debugging only; not part of the storage key.
    pub card_id: String,
}

impl CardIdentity {
    pub fn new(note_id: i64, template_ordinal: u32, card_id: impl Into<String>) -> Self {
        Self {
            note_id,
            template_ordinal,
            card_id: card_id.into(),
        }
    }

    /// Parses the attribute strings found on the anchor. Returns `None` while the host has not
    /// injected an identity yet.
    pub fn from_anchor(note_id: &str, template_ordinal: &str, card_id: &str) -> Option<Self> {
        let note_id = note_id.trim().parse().ok()?;
        let template_ordinal = template_ordinal.trim().parse().ok()?;

        Some(Self::new(note_id, template_ordinal, card_id.trim()))
    }

    /// Key under which the selection for this card variant is stored.
    pub fn storage_key(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            STORAGE_NAMESPACE, STORAGE_VERSION, self.note_id, self.template_ordinal
        )
    }
}

impl fmt::Display for CardIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "note {} / template {} (card {})",
            self.note_id, self.template_ordinal, self.card_id
        )
    }
}

fn anchor_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"<div\b(?:[^>"]|"[^"]*")*?\bid\s*=\s*"mcq-meta"(?:[^>"]|"[^"]*")*>"#)
            .expect("anchor pattern is valid")
    })
}

fn identity_attribute_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"\s+data-(?:note-id|ord|card-id)\s*=\s*"[^"]*""#)
            .expect("identity attribute pattern is valid")
    })
}

/// Writes `identity` into the anchor element of already rendered card markup.
///
/// Existing `data-note-id`, `data-ord` and `data-card-id` attributes on the anchor are
/// replaced; the rest of the markup is left untouched. Markup without an anchor is returned
/// as is.
pub fn inject_identity(markup: &str, identity: &CardIdentity) -> String {
    let Some(anchor) = anchor_pattern().find(markup) else {
        tracing::debug!("No identity anchor found while rendering {}", identity);
        return markup.to_string();
    };

    let stripped = identity_attribute_pattern().replace_all(anchor.as_str(), "");
    let (head, close) = match stripped.strip_suffix("/>") {
        Some(head) => (head, "/>"),
        None => (stripped.strip_suffix('>').unwrap_or(&*stripped), ">"),
    };

    let patched = format!(
        "{} data-note-id=\"{}\" data-ord=\"{}\" data-card-id=\"{}\"{}",
        head.trim_end(),
        identity.note_id,
        identity.template_ordinal,
        html_escape::encode_double_quoted_attribute(&identity.card_id),
        close
    );

    let mut injected = String::with_capacity(markup.len() + patched.len());
    injected.push_str(&markup[..anchor.start()]);
    injected.push_str(&patched);
    injected.push_str(&markup[anchor.end()..]);
    injected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_key_includes_note_and_template() {
        let first = CardIdentity::new(1700, 0, "42");
        let second = CardIdentity::new(1700, 1, "43");

        assert_eq!(first.storage_key(), "mcq_addon:v2:1700:0");
        assert_ne!(first.storage_key(), second.storage_key());
    }

    #[test]
    fn card_id_does_not_change_the_key() {
        let first = CardIdentity::new(5, 2, "100");
        let second = CardIdentity::new(5, 2, "200");

        assert_eq!(first.storage_key(), second.storage_key());
    }

    #[test]
    fn parses_anchor_attributes() {
        let identity = CardIdentity::from_anchor(" 123 ", "1", "77").expect("identity should parse");
        assert_eq!(identity, CardIdentity::new(123, 1, "77"));

        assert!(CardIdentity::from_anchor("", "0", "").is_none());
        assert!(CardIdentity::from_anchor("12", "first", "").is_none());
    }

    #[test]
    fn replaces_placeholder_attributes_in_place() {
        let markup = concat!(
            "<div id=\"mcq-question\">Q</div>\n",
            "<div id=\"mcq-meta\"\n     data-mode=\"single\"\n     data-note-id=\"\"\n",
            "     data-ord=\"\"\n     data-card-id=\"\">\n</div>\n<div id=\"mcq-card\"></div>"
        );

        let injected = inject_identity(markup, &CardIdentity::new(99, 3, "1234"));

        assert!(injected.starts_with("<div id=\"mcq-question\">Q</div>\n"));
        assert!(injected.ends_with("\n</div>\n<div id=\"mcq-card\"></div>"));
        assert!(injected.contains("data-mode=\"single\""));
        assert!(injected.contains("data-note-id=\"99\""));
        assert!(injected.contains("data-ord=\"3\""));
        assert!(injected.contains("data-card-id=\"1234\""));
        assert_eq!(injected.matches("data-note-id").count(), 1);
    }

    #[test]
    fn adds_attributes_missing_from_anchor() {
        let markup = r#"<div id="mcq-meta" data-side="back"></div>"#;

        let injected = inject_identity(markup, &CardIdentity::new(7, 0, "8"));

        assert_eq!(
            injected,
            r#"<div id="mcq-meta" data-side="back" data-note-id="7" data-ord="0" data-card-id="8"></div>"#
        );
    }

    #[test]
    fn reinjection_overwrites_previous_identity() {
        let markup = r#"<div id="mcq-meta"></div>"#;

        let first = inject_identity(markup, &CardIdentity::new(1, 0, "1"));
        let second = inject_identity(&first, &CardIdentity::new(2, 1, "5"));

        assert_eq!(
            second,
            r#"<div id="mcq-meta" data-note-id="2" data-ord="1" data-card-id="5"></div>"#
        );
    }

    #[test]
    fn quoted_angle_brackets_do_not_end_the_anchor() {
        let markup = r#"<div id="mcq-meta" data-config="a > b" data-note-id=""></div>"#;

        let injected = inject_identity(markup, &CardIdentity::new(4, 0, "9"));

        assert!(injected.contains(r#"data-config="a > b""#));
        assert!(injected.contains(r#"data-note-id="4""#));
    }

    #[test]
    fn markup_without_anchor_is_unchanged() {
        let markup = "<div id=\"other\"></div>";
        assert_eq!(inject_identity(markup, &CardIdentity::new(1, 0, "1")), markup);
    }
}
