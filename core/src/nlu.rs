//! Natural-language preference-update detection.
//!
//! Decides whether a free-text utterance asks to change a preference,
//! which profile category it targets, and what the replacement value is.
//! This is a keyword/regex heuristic, not language understanding: the
//! extracted value is a proposal the caller must confirm with the user,
//! never an authoritative result. The tables live here so the whole
//! heuristic can be swapped for a real classifier without touching
//! callers.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use utoipa::ToSchema;

use crate::catalog::FIELDS;

/// Imperative verb stems that signal an update intent, matched
/// case-insensitively as substrings.
const INTENT_KEYWORDS: &[&str] = &[
    "измени",
    "поменяй",
    "обнови",
    "замени",
    "установи",
    "хочу изменить",
    "хочу поменять",
];

/// Leading connector words stripped from an extracted value.
const CONNECTORS: &[&str] = &["на", "в", "к", "это", "чтобы"];

/// Value-extraction patterns, tried in order. Each marks a connector
/// position; the value is everything after the connector's *last*
/// occurrence (the value follows the category mention, not precedes it).
static VALUE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"(?i)\bна\s+", r"(?i)\bчтобы\s+", r":\s*"]
        .iter()
        .map(|p| Regex::new(p).expect("static pattern"))
        .collect()
});

/// Outcome of update detection over one utterance.
#[derive(Debug, Serialize, ToSchema)]
pub struct UpdateDetection {
    /// The text expresses an intent to change a preference
    pub is_update_request: bool,
    /// Catalog key of the targeted field, when one matched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_key: Option<String>,
    /// Russian label of the targeted field
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Proposed replacement value — confirm with the user before applying
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_value: Option<String>,
}

impl UpdateDetection {
    fn none() -> Self {
        Self {
            is_update_request: false,
            category_key: None,
            category: None,
            new_value: None,
        }
    }
}

/// Classify one utterance. Intent first, then category (first match in
/// catalog order), then value extraction.
pub fn detect_update(text: &str) -> UpdateDetection {
    let lowered = text.to_lowercase();

    if !INTENT_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
        return UpdateDetection::none();
    }

    let Some(field) = FIELDS
        .iter()
        .find(|f| f.keywords.iter().any(|kw| lowered.contains(kw)))
    else {
        // Intent without a recognizable category: the caller should ask
        // the user which preference they meant.
        return UpdateDetection {
            is_update_request: true,
            category_key: None,
            category: None,
            new_value: None,
        };
    };

    let new_value = extract_value(text, field.keywords);

    UpdateDetection {
        is_update_request: true,
        category_key: Some(field.key.to_string()),
        category: Some(field.label.to_string()),
        new_value,
    }
}

/// Try the ordered patterns, then fall back to the text after the last
/// occurrence of one of the category's keywords.
fn extract_value(text: &str, keywords: &[&str]) -> Option<String> {
    for pattern in VALUE_PATTERNS.iter() {
        if let Some(m) = pattern.find_iter(text).last() {
            let cleaned = clean_value(&text[m.end()..]);
            if !cleaned.is_empty() {
                return Some(cleaned);
            }
        }
    }

    // Fallback: whatever follows the category's last keyword mention,
    // searched back-to-front so the most specific keyword wins.
    for keyword in keywords.iter().rev() {
        let ci = Regex::new(&format!("(?i){}", regex::escape(keyword))).ok()?;
        if let Some(m) = ci.find_iter(text).last() {
            // Skip the rest of the word the stem matched inside.
            let tail_start = text[m.end()..]
                .find(char::is_whitespace)
                .map(|i| m.end() + i)
                .unwrap_or(text.len());
            let cleaned = clean_value(&text[tail_start..]);
            if !cleaned.is_empty() {
                return Some(cleaned);
            }
        }
    }

    None
}

/// Strip leading connector words and surrounding punctuation.
fn clean_value(raw: &str) -> String {
    let mut value = raw.trim();
    loop {
        let lowered = value.to_lowercase();
        let Some(connector) = CONNECTORS
            .iter()
            .find(|c| {
                lowered.strip_prefix(**c).is_some_and(|rest| {
                    rest.starts_with(char::is_whitespace)
                })
            })
        else {
            break;
        };
        value = value[connector.len()..].trim_start();
    }
    value
        .trim_end_matches(['.', '!', '?'])
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_communication_style_update() {
        let detection = detect_update("Измени стиль общения на неформальный");
        assert!(detection.is_update_request);
        assert_eq!(detection.category.as_deref(), Some("стиль общения"));
        assert_eq!(detection.category_key.as_deref(), Some("communication_style"));
        assert_eq!(detection.new_value.as_deref(), Some("неформальный"));
    }

    #[test]
    fn plain_question_is_not_an_update() {
        let detection = detect_update("Расскажи о своих возможностях");
        assert!(!detection.is_update_request);
        assert!(detection.category.is_none());
        assert!(detection.new_value.is_none());
    }

    #[test]
    fn intent_without_category_is_reported_as_such() {
        let detection = detect_update("Поменяй это, пожалуйста");
        assert!(detection.is_update_request);
        assert!(detection.category.is_none());
    }

    #[test]
    fn career_goal_update_with_colon_pattern() {
        let detection = detect_update("Обнови карьерные цели: стать архитектором");
        assert!(detection.is_update_request);
        assert_eq!(detection.category.as_deref(), Some("карьерные цели"));
        assert_eq!(detection.new_value.as_deref(), Some("стать архитектором"));
    }

    #[test]
    fn last_na_occurrence_wins() {
        let detection =
            detect_update("Замени предпочтения по встречам на созвоны на 15 минут утром");
        assert_eq!(
            detection.category.as_deref(),
            Some("предпочтения по встречам")
        );
        // The final "на ..." clause is the value
        assert_eq!(detection.new_value.as_deref(), Some("15 минут утром"));
    }

    #[test]
    fn fallback_uses_text_after_the_keyword() {
        let detection = detect_update("Установи стиль работы командный");
        assert_eq!(detection.category.as_deref(), Some("стиль работы"));
        assert_eq!(detection.new_value.as_deref(), Some("командный"));
    }

    #[test]
    fn trailing_punctuation_is_stripped() {
        let detection = detect_update("Измени стиль общения на формальный.");
        assert_eq!(detection.new_value.as_deref(), Some("формальный"));
    }
}
