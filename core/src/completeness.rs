//! Profile completeness heuristic.
//!
//! Given the free-text answer the RAG collaborator returns for a broad
//! "full profile" query, decide whether the user's profile covers all
//! required categories. Keyword and length checks are approximate by
//! design: a false negative costs one redundant question, a false
//! positive silently loses a required field, so the gates err toward
//! "not complete".

use serde::Serialize;
use utoipa::ToSchema;

use crate::catalog::{FIELD_COUNT, FIELDS, NOT_SPECIFIED, field_by_key};

/// Phrases the RAG engine emits when a workspace holds no usable context.
/// Any of these short-circuits the scan: the profile cannot be complete
/// if the knowledge base has nothing to say about it.
pub const NO_DATA_SENTINELS: &[&str] = &[
    "no relevant context",
    "not enough information",
    "нет релевантной информации",
    "недостаточно информации",
];

/// Tunable gates of the heuristic. The defaults are product-calibrated
/// values; change them through configuration, not here.
#[derive(Debug, Clone, Copy)]
pub struct CompletenessThresholds {
    /// Minimum response length for a profile to count as substantive
    pub min_profile_len: usize,
    /// `not_specified_count` must stay strictly below this
    pub max_not_specified: usize,
}

impl Default for CompletenessThresholds {
    fn default() -> Self {
        Self {
            min_profile_len: 300,
            max_not_specified: FIELD_COUNT,
        }
    }
}

/// Raw scan result over one RAG response. All gates reported separately
/// so callers can explain *why* a profile is incomplete.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileScan {
    /// Labels of required fields whose keywords never appear in the text
    pub missing_fields: Vec<String>,
    /// Occurrences of the "не указано" placeholder
    pub not_specified_count: usize,
    /// Response length cleared the minimum-length gate
    pub is_long_enough: bool,
    /// All three gates passed
    pub is_complete: bool,
}

/// Aggregated view shared by the full and progressive checks: how much of
/// the profile is filled and which category to explore next.
#[derive(Debug, Serialize, ToSchema)]
pub struct CompletenessAssessment {
    /// 0–100, rounded down
    pub percent_complete: u8,
    pub filled_categories: Vec<String>,
    pub missing_categories: Vec<String>,
    /// Highest-priority missing category, if any
    pub next_category: Option<String>,
}

/// Scan one full-profile RAG response. Pure function of its inputs.
pub fn scan_profile(response: &str, thresholds: &CompletenessThresholds) -> ProfileScan {
    let haystack = response.to_lowercase();

    if NO_DATA_SENTINELS.iter().any(|s| haystack.contains(s)) {
        return ProfileScan {
            missing_fields: FIELDS.iter().map(|f| f.label.to_string()).collect(),
            not_specified_count: 0,
            is_long_enough: false,
            is_complete: false,
        };
    }

    let missing_fields: Vec<String> = FIELDS
        .iter()
        .filter(|f| !f.keywords.iter().any(|kw| haystack.contains(kw)))
        .map(|f| f.label.to_string())
        .collect();

    let not_specified_count = haystack.matches(NOT_SPECIFIED).count();
    let is_long_enough = response.chars().count() >= thresholds.min_profile_len;
    let is_complete = missing_fields.is_empty()
        && not_specified_count < thresholds.max_not_specified
        && is_long_enough;

    ProfileScan {
        missing_fields,
        not_specified_count,
        is_long_enough,
        is_complete,
    }
}

/// Fold per-category hit/miss results into the shared assessment shape.
///
/// `categories` must be in priority order (first missing entry becomes
/// `next_category`). Used by the progressive flow, where each category is
/// probed with its own RAG query and a failed probe counts as a miss.
pub fn assess_categories(categories: &[(&str, bool)]) -> CompletenessAssessment {
    let mut filled = Vec::new();
    let mut missing = Vec::new();

    for (key, hit) in categories {
        let label = field_by_key(key)
            .map(|f| f.label.to_string())
            .unwrap_or_else(|| (*key).to_string());
        if *hit {
            filled.push(label);
        } else {
            missing.push(label);
        }
    }

    let total = categories.len().max(1);
    let percent_complete = (filled.len() * 100 / total) as u8;

    CompletenessAssessment {
        percent_complete,
        next_category: missing.first().cloned(),
        filled_categories: filled,
        missing_categories: missing,
    }
}

/// Assessment view of a full-profile scan.
pub fn assess_scan(scan: &ProfileScan) -> CompletenessAssessment {
    let missing = scan.missing_fields.clone();
    let filled: Vec<String> = FIELDS
        .iter()
        .map(|f| f.label.to_string())
        .filter(|label| !missing.contains(label))
        .collect();

    let percent_complete = (filled.len() * 100 / FIELD_COUNT) as u8;

    CompletenessAssessment {
        percent_complete,
        next_category: missing.first().cloned(),
        filled_categories: filled,
        missing_categories: missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A response mentioning every catalog keyword, long enough to clear
    /// the length gate.
    fn rich_response() -> String {
        let body = "Компетенции: разработка на Rust и архитектура. \
                    Стиль общения: неформальный, обратная связь напрямую. \
                    Предпочтения по встречам: утро, короткие созвоны. \
                    Сфокусированная работа: лучше всего до обеда. \
                    Стиль работы: самостоятельно, планирование заранее. \
                    Карьерные цели: рост до архитектора. \
                    Подход к решению проблем: декомпозиция и прототипы.";
        assert!(body.chars().count() >= 300);
        body.to_string()
    }

    #[test]
    fn complete_profile_passes_all_gates() {
        let scan = scan_profile(&rich_response(), &CompletenessThresholds::default());
        assert!(scan.missing_fields.is_empty(), "{:?}", scan.missing_fields);
        assert!(scan.is_long_enough);
        assert!(scan.is_complete);
    }

    #[test]
    fn missing_keyword_forces_incomplete_regardless_of_length() {
        // Drop everything about meetings from an otherwise rich profile.
        let text = rich_response().replace("Предпочтения по встречам", "Прочее");
        let scan = scan_profile(&text, &CompletenessThresholds::default());
        assert!(
            scan.missing_fields
                .contains(&"предпочтения по встречам".to_string())
        );
        assert!(!scan.is_complete);
    }

    #[test]
    fn no_data_sentinel_short_circuits() {
        let mut text = rich_response();
        text.push_str(" No relevant context found in the knowledge base.");
        let scan = scan_profile(&text, &CompletenessThresholds::default());
        assert!(!scan.is_complete);
        assert_eq!(scan.missing_fields.len(), FIELD_COUNT);
    }

    #[test]
    fn short_response_fails_length_gate_with_all_keywords_present() {
        let text = "компетенции общение встречи фокус стиль работы карьерные решение проблем";
        let scan = scan_profile(text, &CompletenessThresholds::default());
        assert!(scan.missing_fields.is_empty());
        assert_eq!(scan.not_specified_count, 0);
        assert!(!scan.is_long_enough);
        assert!(!scan.is_complete);
    }

    #[test]
    fn not_specified_placeholders_block_completion() {
        let mut text = rich_response();
        for _ in 0..FIELD_COUNT {
            text.push_str(" не указано.");
        }
        let scan = scan_profile(&text, &CompletenessThresholds::default());
        assert_eq!(scan.not_specified_count, FIELD_COUNT);
        assert!(!scan.is_complete);
    }

    #[test]
    fn placeholder_count_is_case_insensitive() {
        let scan = scan_profile("Не указано. НЕ УКАЗАНО.", &CompletenessThresholds::default());
        assert_eq!(scan.not_specified_count, 2);
    }

    #[test]
    fn category_assessment_orders_next_by_priority() {
        let assessment = assess_categories(&[
            ("competencies", true),
            ("communication_style", false),
            ("work_style", false),
            ("career_goals", true),
            ("problem_solving_approach", true),
        ]);
        assert_eq!(assessment.percent_complete, 60);
        assert_eq!(assessment.next_category.as_deref(), Some("стиль общения"));
        assert_eq!(assessment.missing_categories.len(), 2);
    }

    #[test]
    fn scan_assessment_reports_percentage() {
        let scan = scan_profile(&rich_response(), &CompletenessThresholds::default());
        let assessment = assess_scan(&scan);
        assert_eq!(assessment.percent_complete, 100);
        assert!(assessment.next_category.is_none());
    }
}
