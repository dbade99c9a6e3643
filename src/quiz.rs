//! Multiple-choice quiz: generation from the model, scoring, level mapping.

use thiserror::Error;

use crate::ai::{ModelError, TextModel};

pub const QUESTION_COUNT: usize = 3;
pub const OPTION_COUNT: usize = 4;

const QUIZ_PROMPT: &str = "Створи тест з української мови з 3 запитань. \
    Для кожного питання дай 4 варіанти відповіді, познач правильний. \
    Видай у форматі JSON: [{\"question\":\"...\", \"options\":[\"...\",\"...\",\"...\",\"...\"], \"answer\":\"...\"}]";

#[derive(Debug, Error)]
pub enum QuizError {
    #[error("запит до моделі не вдався: {0}")]
    Backend(#[from] ModelError),
    #[error("відповідь моделі не містить JSON-масиву")]
    NoPayload,
    #[error("некоректний JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("очікувалося {expected} питань, отримано {got}")]
    WrongQuestionCount { expected: usize, got: usize },
    #[error("питання \"{question}\" має {got} варіантів замість {expected}")]
    WrongOptionCount {
        question: String,
        expected: usize,
        got: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Question {
    #[serde(rename = "question")]
    pub text: String,
    pub options: Vec<String>,
    pub answer: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Quiz {
    pub questions: Vec<Question>,
    pub cursor: usize,
    pub score: usize,
}

/// Outcome of one submitted answer.
#[derive(Debug, Clone)]
pub enum Progress {
    /// More questions remain; this is the next one to ask.
    Next(Question),
    Finished {
        score: usize,
        total: usize,
        level: Level,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Beginner,
    Intermediate,
    Advanced,
}

impl Level {
    /// Integer-division thresholds: a full score is advanced, at least half
    /// (rounded down) is intermediate, anything below that is beginner.
    pub fn from_score(score: usize, total: usize) -> Self {
        if score == total {
            Level::Advanced
        } else if score >= total / 2 {
            Level::Intermediate
        } else {
            Level::Beginner
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Level::Beginner => "початковий",
            Level::Intermediate => "середній",
            Level::Advanced => "просунутий",
        }
    }
}

impl Quiz {
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            questions,
            cursor: 0,
            score: 0,
        }
    }

    pub fn first_question(&self) -> &Question {
        &self.questions[0]
    }

    /// Scores `answer` against the current question (trimmed,
    /// case-insensitive) and advances the cursor by one.
    pub fn submit(&mut self, answer: &str) -> Progress {
        let question = &self.questions[self.cursor];
        if answer.trim().to_lowercase() == question.answer.trim().to_lowercase() {
            self.score += 1;
        }
        self.cursor += 1;

        if self.cursor < self.questions.len() {
            Progress::Next(self.questions[self.cursor].clone())
        } else {
            Progress::Finished {
                score: self.score,
                total: self.questions.len(),
                level: Level::from_score(self.score, self.questions.len()),
            }
        }
    }
}

/// The built-in quiz used whenever the model output cannot be turned into a
/// valid one.
pub fn fallback_quiz() -> Vec<Question> {
    let question = |text: &str, options: [&str; OPTION_COUNT], answer: &str| Question {
        text: text.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
        answer: answer.to_string(),
    };
    vec![
        question(
            "Як перекласти слово 'місяць'?",
            ["Sun", "Moon", "Star", "Sky"],
            "Moon",
        ),
        question(
            "Переклади слово 'сонце'",
            ["Sun", "Moon", "Star", "Sky"],
            "Sun",
        ),
        question(
            "Переклади 'вода'",
            ["Water", "Fire", "Earth", "Air"],
            "Water",
        ),
    ]
}

/// Cuts the JSON array out of the raw model reply (first `[` through last
/// `]`) and decodes it into typed questions.
pub fn parse_quiz(raw: &str) -> Result<Vec<Question>, QuizError> {
    let start = raw.find('[').ok_or(QuizError::NoPayload)?;
    let end = raw.rfind(']').ok_or(QuizError::NoPayload)?;
    if end < start {
        return Err(QuizError::NoPayload);
    }

    let questions: Vec<Question> = serde_json::from_str(&raw[start..=end])?;

    if questions.len() != QUESTION_COUNT {
        return Err(QuizError::WrongQuestionCount {
            expected: QUESTION_COUNT,
            got: questions.len(),
        });
    }
    for q in &questions {
        if q.options.len() != OPTION_COUNT {
            return Err(QuizError::WrongOptionCount {
                question: q.text.clone(),
                expected: OPTION_COUNT,
                got: q.options.len(),
            });
        }
    }

    Ok(questions)
}

/// Asks the model for a fresh quiz; any backend or shape failure falls back
/// to the built-in quiz, so this never fails and never returns an empty set.
pub async fn generate_quiz<M: TextModel + ?Sized>(model: &M) -> Vec<Question> {
    let attempt = async {
        let raw = model.complete(QUIZ_PROMPT).await?;
        parse_quiz(&raw)
    };
    match attempt.await {
        Ok(questions) => questions,
        Err(e) => {
            log::warn!("Falling back to the built-in quiz: {}", e);
            fallback_quiz()
        }
    }
}

/// Best-effort study-plan recommendation for a finished quiz; a backend
/// failure becomes a fixed apology, same as chat generation.
pub async fn generate_study_plan<M: TextModel + ?Sized>(model: &M, level: Level) -> String {
    let prompt = format!(
        "Підбери коротку навчальну програму для студента з {} знаннями української мови.",
        level.label()
    );
    match model.complete(&prompt).await {
        Ok(plan) => crate::text::sanitize(&plan),
        Err(e) => {
            log::warn!("Study plan generation failed: {}", e);
            format!("Не вдалося згенерувати програму: {}", e)
        }
    }
}
