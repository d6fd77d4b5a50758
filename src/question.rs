use serde::{Deserialize, Serialize};

/// Shape of a question as reported by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum QuestionKind {
    Multiple,
    Boolean,
}

/// A single trivia question with plain-text (entity decoded) answers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub prompt: String,
    pub correct_answer: String,
    pub incorrect_answers: Vec<String>,
    pub kind: QuestionKind,
    pub difficulty: String,
}

/// Identifies an answer option independently of its display text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnswerId {
    Correct,
    /// Position in [`Question::incorrect_answers`]
    Incorrect(usize),
}

impl AnswerId {
    pub fn is_correct(&self) -> bool {
        matches!(self, AnswerId::Correct)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOption {
    pub id: AnswerId,
    pub text: String,
}

impl Question {
    /// All answers in provider order: the correct one first, then the incorrect ones.
    pub fn options(&self) -> Vec<AnswerOption> {
        std::iter::once(AnswerOption {
            id: AnswerId::Correct,
            text: self.correct_answer.clone(),
        })
        .chain(
            self.incorrect_answers
                .iter()
                .enumerate()
                .map(|(i, text)| AnswerOption {
                    id: AnswerId::Incorrect(i),
                    text: text.clone(),
                }),
        )
        .collect()
    }

    pub fn answer_text(&self, id: AnswerId) -> Option<&str> {
        match id {
            AnswerId::Correct => Some(&self.correct_answer),
            AnswerId::Incorrect(i) => self.incorrect_answers.get(i).map(String::as_str),
        }
    }

    /// Texts translated together for this question: prompt, correct answer, incorrect answers.
    pub fn to_batch(&self) -> Vec<String> {
        let mut batch = Vec::with_capacity(self.incorrect_answers.len() + 2);
        batch.push(self.prompt.clone());
        batch.push(self.correct_answer.clone());
        batch.extend(self.incorrect_answers.iter().cloned());
        batch
    }

    /// Rebuild the question from a batch laid out like [`Question::to_batch`].
    /// A batch of the wrong length leaves the question untouched.
    pub fn with_batch(&self, batch: Vec<String>) -> Question {
        if batch.len() != self.incorrect_answers.len() + 2 {
            return self.clone();
        }

        let mut texts = batch.into_iter();
        let prompt = texts.next().unwrap_or_default();
        let correct_answer = texts.next().unwrap_or_default();

        Question {
            prompt,
            correct_answer,
            incorrect_answers: texts.collect(),
            kind: self.kind,
            difficulty: self.difficulty.clone(),
        }
    }
}

/// Decode HTML entities (`&quot;`, `&#039;`, `&eacute;`, ...) into plain text
pub fn decode_entities(input: &str) -> String {
    html_escape::decode_html_entities(input).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Question {
        Question {
            prompt: "Which planet is largest?".to_string(),
            correct_answer: "Jupiter".to_string(),
            incorrect_answers: vec!["Mars".to_string(), "Venus".to_string()],
            kind: QuestionKind::Multiple,
            difficulty: "easy".to_string(),
        }
    }

    #[test]
    fn decodes_named_and_numeric_entities() {
        assert_eq!(
            decode_entities("&quot;Who&#039;s there?&quot; &amp; Pok&eacute;mon"),
            "\"Who's there?\" & Pokémon"
        );
        assert_eq!(decode_entities("plain"), "plain");
        assert_eq!(decode_entities(""), "");
    }

    #[test]
    fn options_identify_the_correct_answer_by_id() {
        let q = sample();
        let options = q.options();
        assert_eq!(options.len(), 3);
        assert_eq!(options[0].id, AnswerId::Correct);
        assert_eq!(options[2].id, AnswerId::Incorrect(1));
        assert_eq!(q.answer_text(AnswerId::Incorrect(1)), Some("Venus"));
        assert_eq!(q.answer_text(AnswerId::Incorrect(5)), None);
    }

    #[test]
    fn batch_layout_is_prompt_correct_then_incorrect() {
        let q = sample();
        assert_eq!(
            q.to_batch(),
            vec!["Which planet is largest?", "Jupiter", "Mars", "Venus"]
        );

        let translated = q.with_batch(vec![
            "¿Qué planeta es el más grande?".to_string(),
            "Júpiter".to_string(),
            "Marte".to_string(),
            "Venus".to_string(),
        ]);
        assert_eq!(translated.prompt, "¿Qué planeta es el más grande?");
        assert_eq!(translated.correct_answer, "Júpiter");
        assert_eq!(translated.incorrect_answers, vec!["Marte", "Venus"]);
        assert_eq!(translated.kind, QuestionKind::Multiple);
    }

    #[test]
    fn mismatched_batch_keeps_original() {
        let q = sample();
        assert_eq!(q.with_batch(vec!["only one".to_string()]), q);
    }

    #[test]
    fn kind_display_matches_wire_format() {
        assert_eq!(QuestionKind::Boolean.to_string(), "boolean");
        assert_eq!(QuestionKind::Multiple.to_string(), "multiple");
    }
}
