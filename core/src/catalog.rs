use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Placeholder written into the profile document for fields the user has
/// not answered yet. Also counted by the completeness heuristic as a
/// "nominally present but empty" signal.
pub const NOT_SPECIFIED: &str = "не указано";

/// Suffix appended to the user id to form their private RAG workspace name.
const WORKSPACE_SUFFIX: &str = "_user_key_preferences";

/// One of the seven profile fields collected by the interview.
///
/// Declaration order is significant twice over: it is the interview
/// question order, and it is the first-match order of the category
/// detector in [`crate::nlu`].
#[derive(Debug)]
pub struct PreferenceField {
    /// Stable snake_case key used in `InterviewState` and the preferences
    /// collaborator
    pub key: &'static str,
    /// Human-facing Russian label, as it appears in the profile document
    pub label: &'static str,
    /// Interview prompt read to the user for this field
    pub question: &'static str,
    /// Lower-case substrings that signal this field in free text
    pub keywords: &'static [&'static str],
}

pub const FIELDS: [PreferenceField; 7] = [
    PreferenceField {
        key: "competencies",
        label: "компетенции",
        question: "Расскажите о ваших ключевых компетенциях и профессиональных навыках. \
                   В чём вы особенно сильны?",
        keywords: &["компетенц", "навык", "экспертиз"],
    },
    PreferenceField {
        key: "communication_style",
        label: "стиль общения",
        question: "Какой стиль общения вам ближе — формальный или неформальный? \
                   Как вы предпочитаете получать обратную связь?",
        keywords: &["стиль общения", "общени", "коммуникац"],
    },
    PreferenceField {
        key: "meeting_preferences",
        label: "предпочтения по встречам",
        question: "Какие у вас предпочтения по встречам? \
                   Какое время и какой формат вам удобнее?",
        keywords: &["встреч", "совещани"],
    },
    PreferenceField {
        key: "focused_work",
        label: "сфокусированная работа",
        question: "Когда вам лучше всего работается сосредоточенно? \
                   Что помогает вам не отвлекаться?",
        keywords: &["сфокусированн", "фокус", "концентрац"],
    },
    PreferenceField {
        key: "work_style",
        label: "стиль работы",
        question: "Опишите ваш стиль работы: самостоятельно или в команде, \
                   планировать заранее или действовать по ситуации?",
        keywords: &["стиль работы", "режим работы", "темп работы"],
    },
    PreferenceField {
        key: "career_goals",
        label: "карьерные цели",
        question: "Какие у вас карьерные цели на ближайшие годы? \
                   Куда вы хотите расти?",
        keywords: &["карьерн", "карьер", "развити"],
    },
    PreferenceField {
        key: "problem_solving_approach",
        label: "подход к решению проблем",
        question: "Как вы обычно подходите к решению сложных проблем? \
                   С чего начинаете?",
        keywords: &["решени", "проблем"],
    },
];

pub const FIELD_COUNT: usize = FIELDS.len();

/// Fields probed by the progressive (free-order) completeness check,
/// highest priority first. A subset of [`FIELDS`] — the progressive flow
/// tracks five categories, not all seven.
pub const PROGRESSIVE_FIELD_KEYS: [&str; 5] = [
    "competencies",
    "communication_style",
    "work_style",
    "career_goals",
    "problem_solving_approach",
];

/// Look up a field by its 1-based interview question number.
pub fn field_by_number(question_number: usize) -> Option<&'static PreferenceField> {
    if (1..=FIELD_COUNT).contains(&question_number) {
        Some(&FIELDS[question_number - 1])
    } else {
        None
    }
}

/// Look up a field by its snake_case key.
pub fn field_by_key(key: &str) -> Option<&'static PreferenceField> {
    FIELDS.iter().find(|f| f.key == key)
}

/// The RAG workspace name holding this user's profile documents.
pub fn workspace_for(user_id: &str) -> String {
    format!("{user_id}{WORKSPACE_SUFFIX}")
}

/// Accumulated interview answers, one slot per profile field.
///
/// This state is caller-owned: the service never stores it between calls.
/// Every interview turn receives the full current state and returns the
/// full updated state. Missing keys deserialize as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct InterviewState {
    #[serde(default)]
    pub competencies: String,
    #[serde(default)]
    pub communication_style: String,
    #[serde(default)]
    pub meeting_preferences: String,
    #[serde(default)]
    pub focused_work: String,
    #[serde(default)]
    pub work_style: String,
    #[serde(default)]
    pub career_goals: String,
    #[serde(default)]
    pub problem_solving_approach: String,
}

impl InterviewState {
    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            "competencies" => Some(&self.competencies),
            "communication_style" => Some(&self.communication_style),
            "meeting_preferences" => Some(&self.meeting_preferences),
            "focused_work" => Some(&self.focused_work),
            "work_style" => Some(&self.work_style),
            "career_goals" => Some(&self.career_goals),
            "problem_solving_approach" => Some(&self.problem_solving_approach),
            _ => None,
        }
    }

    /// Overwrite one field. Unknown keys are ignored (the catalog is the
    /// source of truth for valid keys).
    pub fn set(&mut self, key: &str, value: &str) {
        let slot = match key {
            "competencies" => &mut self.competencies,
            "communication_style" => &mut self.communication_style,
            "meeting_preferences" => &mut self.meeting_preferences,
            "focused_work" => &mut self.focused_work,
            "work_style" => &mut self.work_style,
            "career_goals" => &mut self.career_goals,
            "problem_solving_approach" => &mut self.problem_solving_approach,
            _ => return,
        };
        *slot = value.to_string();
    }

    pub fn is_empty(&self) -> bool {
        FIELDS
            .iter()
            .all(|f| self.get(f.key).is_none_or(str::is_empty))
    }
}

/// A user's stored preference record, as held by the preferences
/// collaborator. At most one record per user id (enforced upstream).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserPreferenceRecord {
    pub user_id: String,
    #[serde(flatten)]
    pub fields: InterviewState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_numbers_are_one_based() {
        assert_eq!(field_by_number(1).unwrap().key, "competencies");
        assert_eq!(
            field_by_number(7).unwrap().key,
            "problem_solving_approach"
        );
        assert!(field_by_number(0).is_none());
        assert!(field_by_number(8).is_none());
    }

    #[test]
    fn workspace_name_uses_preferences_suffix() {
        assert_eq!(workspace_for("u-42"), "u-42_user_key_preferences");
    }

    #[test]
    fn state_set_overwrites_not_appends() {
        let mut state = InterviewState::default();
        state.set("career_goals", "стать тимлидом");
        state.set("career_goals", "стать архитектором");
        assert_eq!(state.career_goals, "стать архитектором");
    }

    #[test]
    fn state_deserializes_with_missing_keys_as_empty() {
        let state: InterviewState =
            serde_json::from_str(r#"{"competencies": "Rust"}"#).unwrap();
        assert_eq!(state.competencies, "Rust");
        assert!(state.communication_style.is_empty());
    }

    #[test]
    fn progressive_keys_are_a_subset_of_the_catalog() {
        for key in PROGRESSIVE_FIELD_KEYS {
            assert!(field_by_key(key).is_some(), "unknown key {key}");
        }
    }
}
