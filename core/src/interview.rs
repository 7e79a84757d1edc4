//! Interview flow transition logic.
//!
//! The interview is a fixed, ordered sequence of seven questions, one per
//! profile field. The service holds no session: the caller replays the
//! accumulated [`InterviewState`] every turn and receives the updated
//! state back. Two concurrent turns for the same user therefore race
//! last-write-wins; this is an accepted limitation of the caller-owned
//! state design, not something this module tries to mediate.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::catalog::{FIELD_COUNT, FIELDS, InterviewState, NOT_SPECIFIED, field_by_number};

pub const QUESTION_COUNT: usize = FIELD_COUNT;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InterviewError {
    #[error("question number {0} is out of range 1..={QUESTION_COUNT}")]
    QuestionOutOfRange(usize),
}

/// What the caller should do after one interview turn.
#[derive(Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// Questions remain: read the prompt to the user and call again with
    /// the returned state.
    AskNext {
        next_question_number: usize,
        prompt: &'static str,
    },
    /// The final answer has been merged. The caller must now persist
    /// `document` into the user's RAG workspace; the state itself is
    /// returned to the caller either way so no answers are lost if the
    /// write fails.
    ReadyToPersist { document: String },
}

/// The prompt for a 1-based question number.
pub fn question_prompt(question_number: usize) -> Option<&'static str> {
    field_by_number(question_number).map(|f| f.question)
}

/// Merge `answer` into the field addressed by `question_number` and
/// decide the next step. Merging overwrites: replaying the same turn
/// twice yields the same state both times.
pub fn advance(
    question_number: usize,
    answer: &str,
    state: &mut InterviewState,
    now: DateTime<Utc>,
) -> Result<StepOutcome, InterviewError> {
    let field = field_by_number(question_number)
        .ok_or(InterviewError::QuestionOutOfRange(question_number))?;

    state.set(field.key, answer.trim());

    if question_number < QUESTION_COUNT {
        let next = question_number + 1;
        Ok(StepOutcome::AskNext {
            next_question_number: next,
            // next is always in range here
            prompt: question_prompt(next).unwrap_or_default(),
        })
    } else {
        Ok(StepOutcome::ReadyToPersist {
            document: format_profile_document(state, now),
        })
    }
}

/// Render the accumulated answers as the profile document written to the
/// user's workspace. Every field appears with its Russian label;
/// unanswered fields are rendered as the "не указано" placeholder so the
/// completeness heuristic can see them.
pub fn format_profile_document(state: &InterviewState, now: DateTime<Utc>) -> String {
    let mut doc = format!("Профиль пользователя (обновлён {})\n", now.to_rfc3339());
    for field in &FIELDS {
        let answer = state.get(field.key).unwrap_or_default().trim();
        let value = if answer.is_empty() { NOT_SPECIFIED } else { answer };
        doc.push_str(&format!("\n{}: {}", capitalize(field.label), value));
    }
    doc
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn intermediate_steps_ask_the_next_question() {
        for k in 1..QUESTION_COUNT {
            let mut state = InterviewState::default();
            let outcome = advance(k, "ответ", &mut state, now()).unwrap();
            match outcome {
                StepOutcome::AskNext {
                    next_question_number,
                    prompt,
                } => {
                    assert_eq!(next_question_number, k + 1);
                    assert!(!prompt.is_empty());
                }
                other => panic!("step {k} returned {other:?}"),
            }
        }
    }

    #[test]
    fn final_step_yields_a_document_never_a_next_question() {
        let mut state = InterviewState::default();
        let outcome = advance(QUESTION_COUNT, "декомпозиция", &mut state, now()).unwrap();
        match outcome {
            StepOutcome::ReadyToPersist { document } => {
                assert!(document.contains("Подход к решению проблем: декомпозиция"));
            }
            other => panic!("final step returned {other:?}"),
        }
    }

    #[test]
    fn out_of_range_question_is_a_validation_error() {
        let mut state = InterviewState::default();
        assert_eq!(
            advance(0, "x", &mut state, now()),
            Err(InterviewError::QuestionOutOfRange(0))
        );
        assert_eq!(
            advance(8, "x", &mut state, now()),
            Err(InterviewError::QuestionOutOfRange(8))
        );
    }

    #[test]
    fn replaying_a_turn_is_idempotent() {
        let mut first = InterviewState::default();
        first.set("competencies", "Rust");
        let mut second = first.clone();

        advance(3, "утренние встречи", &mut first, now()).unwrap();
        advance(3, "утренние встречи", &mut second, now()).unwrap();
        advance(3, "утренние встречи", &mut second, now()).unwrap();

        assert_eq!(first, second);
        assert_eq!(second.meeting_preferences, "утренние встречи");
    }

    #[test]
    fn document_renders_placeholders_for_unanswered_fields() {
        let mut state = InterviewState::default();
        state.set("competencies", "Rust, распределённые системы");
        let doc = format_profile_document(&state, now());
        assert!(doc.contains("Компетенции: Rust, распределённые системы"));
        assert!(doc.contains(&format!("Стиль общения: {NOT_SPECIFIED}")));
        // One placeholder per unanswered field
        assert_eq!(doc.matches(NOT_SPECIFIED).count(), QUESTION_COUNT - 1);
    }

    #[test]
    fn answers_are_trimmed_before_merge() {
        let mut state = InterviewState::default();
        advance(1, "  Rust  ", &mut state, now()).unwrap();
        assert_eq!(state.competencies, "Rust");
    }
}
