//! Per-chat state: dialogue history, selected category, in-progress quiz.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::quiz::{Progress, Quiz};

/// How many trailing history entries go into the chat prompt.
pub const CONTEXT_WINDOW: usize = 5;

/// Conversational mode; selects the system instruction for chat generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Category {
    Learning,
    Translation,
    Programming,
    Fun,
    #[default]
    General,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::Learning => "🎓 Навчання",
            Category::Translation => "🌍 Переклад",
            Category::Programming => "💻 Програмування",
            Category::Fun => "🎭 Розваги",
            Category::General => "Спілкування",
        }
    }

    pub fn instruction(&self) -> &'static str {
        match self {
            Category::Learning => {
                "Ти — викладач української мови або мови, яку вибере користувач. Пояснюй чітко та просто."
            }
            Category::Translation => {
                "Ти — перекладач. Перекладай текст українською або мовою, яку вибере користувач, точно."
            }
            Category::Programming => {
                "Ти — програміст. Пояснюй код українською або мовою, яку вибере користувач."
            }
            Category::Fun => {
                "Ти — веселий співрозмовник. Жартуй українською або мовою, яку вибере користувач."
            }
            Category::General => "Ти — дружній AI.",
        }
    }
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Session {
    pub history: Vec<String>,
    pub category: Category,
    pub quiz: Option<Quiz>,
}

impl Session {
    /// The trailing [`CONTEXT_WINDOW`] history entries, oldest first, joined
    /// with newlines.
    pub fn context(&self) -> String {
        let skip = self.history.len().saturating_sub(CONTEXT_WINDOW);
        self.history[skip..].join("\n")
    }
}

/// Process-wide chat-id → [`Session`] map. Every mutation runs as a single
/// read-modify-write under one lock, so two concurrent messages for the same
/// chat cannot interleave inside a transition.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<i64, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` against the session for `chat`, creating a fresh default
    /// session first if none exists.
    pub fn update<R>(&self, chat: i64, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut sessions = self.sessions.lock().expect("session store lock poisoned");
        f(sessions.entry(chat).or_default())
    }

    /// Replaces the session with a fresh one: empty history, General category,
    /// no quiz.
    pub fn reset(&self, chat: i64) {
        self.update(chat, |session| *session = Session::default());
    }

    pub fn set_category(&self, chat: i64, category: Category) {
        self.update(chat, |session| session.category = category);
    }

    /// Installs a new quiz, silently discarding any quiz already in progress.
    pub fn start_quiz(&self, chat: i64, quiz: Quiz) {
        self.update(chat, |session| session.quiz = Some(quiz));
    }

    /// Appends one user turn and one bot turn to the history.
    pub fn push_turns(&self, chat: i64, user_text: &str, reply: &str) {
        self.update(chat, |session| {
            session.history.push(format!("Користувач: {}", user_text));
            session.history.push(format!("Бот: {}", reply));
        });
    }

    /// Feeds `answer` to the active quiz, if any. The whole transition runs
    /// under the store lock, and a finished quiz is removed from the session
    /// in the same step. Returns `None` when no quiz is active.
    pub fn submit_answer(&self, chat: i64, answer: &str) -> Option<Progress> {
        self.update(chat, |session| {
            let quiz = session.quiz.as_mut()?;
            let progress = quiz.submit(answer);
            if matches!(progress, Progress::Finished { .. }) {
                session.quiz = None;
            }
            Some(progress)
        })
    }
}
