//! Routing of inbound messages: quiz answers first, then control commands,
//! then plain chat.

use crate::ai::TextModel;
use crate::chat;
use crate::quiz::{self, Progress, Quiz};
use crate::session::{Category, SessionStore};

// Main keyboard button labels, Ukrainian part first. Routing matches on the
// Ukrainian prefix, so the English half can change freely.
pub const LEARNING_BUTTON: &str = "🎓 Навчання / Learning";
pub const TRANSLATION_BUTTON: &str = "🌍 Переклад / Translation";
pub const PROGRAMMING_BUTTON: &str = "💻 Програмування / Programming";
pub const FUN_BUTTON: &str = "🎭 Розваги / Fun";
pub const QUIZ_BUTTON: &str = "📘 Тест з української мови / Ukrainian Test";
pub const RESET_BUTTON: &str = "🧠 Новий діалог / New Chat";
pub const STOP_BUTTON: &str = "❌ Стоп / Stop";

/// What an inbound message means once the button labels are peeled off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SetCategory(Category),
    StartQuiz,
    Reset,
    Stop,
    Chat,
}

impl Command {
    pub fn parse(text: &str) -> Command {
        if text.starts_with("🎓 Навчання") {
            Command::SetCategory(Category::Learning)
        } else if text.starts_with("🌍 Переклад") {
            Command::SetCategory(Category::Translation)
        } else if text.starts_with("💻 Програмування") {
            Command::SetCategory(Category::Programming)
        } else if text.starts_with("🎭 Розваги") {
            Command::SetCategory(Category::Fun)
        } else if text.starts_with("📘 Тест з української мови") {
            Command::StartQuiz
        } else if text.starts_with("🧠 Новий діалог") {
            Command::Reset
        } else if text.starts_with("❌ Стоп") {
            Command::Stop
        } else {
            Command::Chat
        }
    }
}

/// Keyboard directive attached to an outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    Main,
    /// One button per option, in question order.
    Options(Vec<String>),
    Remove,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub text: String,
    pub keyboard: Keyboard,
}

impl Outbound {
    fn new(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            text: text.into(),
            keyboard,
        }
    }
}

fn ask(question: quiz::Question) -> Outbound {
    Outbound::new(question.text, Keyboard::Options(question.options))
}

/// Greets the user on `/start`, reinitializing their session.
pub fn start(store: &SessionStore, chat: i64, first_name: &str) -> Outbound {
    store.reset(chat);
    Outbound::new(
        format!(
            "Привіт, {}! 🤖 Я UAHelper.\nОбери категорію або спробуй пройти тест з української мови 🇺🇦:",
            first_name
        ),
        Keyboard::Main,
    )
}

/// Handles one inbound message end to end. An active quiz claims every
/// message; otherwise the text is parsed as a command and dispatched.
pub async fn handle_message<M: TextModel + ?Sized>(
    model: &M,
    store: &SessionStore,
    chat: i64,
    text: &str,
) -> Vec<Outbound> {
    if let Some(progress) = store.submit_answer(chat, text) {
        return match progress {
            Progress::Next(question) => vec![ask(question)],
            Progress::Finished { score, total, level } => {
                let plan = quiz::generate_study_plan(model, level).await;
                let summary = format!(
                    "📋 Тест завершено.\nРезультат: {}/{}\nРівень: {}\n\n📚 Рекомендована програма:\n{}",
                    score,
                    total,
                    level.label(),
                    plan
                );
                vec![
                    Outbound::new(summary, Keyboard::Unchanged),
                    Outbound::new("Тест завершено.", Keyboard::Main),
                ]
            }
        };
    }

    match Command::parse(text) {
        Command::SetCategory(category) => {
            store.set_category(chat, category);
            vec![Outbound::new(
                format!("Категорія встановлена: {}", category.label()),
                Keyboard::Unchanged,
            )]
        }
        Command::StartQuiz => {
            let notice = Outbound::new("⏳ Генерую тест, зачекай...", Keyboard::Unchanged);
            let questions = quiz::generate_quiz(model).await;
            let quiz = Quiz::new(questions);
            let first = quiz.first_question().clone();
            store.start_quiz(chat, quiz);
            vec![notice, ask(first)]
        }
        Command::Reset => {
            store.reset(chat);
            vec![Outbound::new(
                "🧹 Історія очищена. Почнемо заново.",
                Keyboard::Main,
            )]
        }
        Command::Stop => {
            // Session state is left alone; only the keyboard goes away.
            vec![Outbound::new("🚫 Діалог завершено.", Keyboard::Remove)]
        }
        Command::Chat => {
            let reply = chat::generate(model, store, chat, text).await;
            vec![Outbound::new(reply.text(), Keyboard::Main)]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::mock::MockModel;

    const CHAT: i64 = 42;

    #[test]
    fn labels_parse_to_commands_by_ukrainian_prefix() {
        assert_eq!(
            Command::parse(LEARNING_BUTTON),
            Command::SetCategory(Category::Learning)
        );
        assert_eq!(Command::parse("🎭 Розваги"), Command::SetCategory(Category::Fun));
        assert_eq!(Command::parse(QUIZ_BUTTON), Command::StartQuiz);
        assert_eq!(Command::parse(RESET_BUTTON), Command::Reset);
        assert_eq!(Command::parse(STOP_BUTTON), Command::Stop);
        assert_eq!(Command::parse("розкажи про відмінки"), Command::Chat);
    }

    #[tokio::test]
    async fn category_label_sets_category_without_touching_history() {
        let store = SessionStore::new();
        let model = MockModel::new(vec![]);

        let out = handle_message(&model, &store, CHAT, LEARNING_BUTTON).await;
        assert_eq!(
            out,
            vec![Outbound::new(
                "Категорія встановлена: 🎓 Навчання",
                Keyboard::Unchanged
            )]
        );
        store.update(CHAT, |s| {
            assert_eq!(s.category, Category::Learning);
            assert!(s.history.is_empty());
        });
        assert!(model.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn plain_text_goes_to_chat_generation() {
        let store = SessionStore::new();
        let model = MockModel::new(vec![Ok("Відмінків сім.".to_string())]);

        let out = handle_message(&model, &store, CHAT, "скільки відмінків?").await;
        assert_eq!(out, vec![Outbound::new("Відмінків сім.", Keyboard::Main)]);
        assert_eq!(store.update(CHAT, |s| s.history.len()), 2);
    }

    #[tokio::test]
    async fn quiz_start_installs_quiz_and_asks_the_first_question() {
        let store = SessionStore::new();
        // Garbage backend output: the fallback quiz is installed.
        let model = MockModel::new(vec![Ok("не json".to_string())]);

        let out = handle_message(&model, &store, CHAT, QUIZ_BUTTON).await;
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].text, "⏳ Генерую тест, зачекай...");
        assert_eq!(out[1].text, "Як перекласти слово 'місяць'?");
        assert_eq!(
            out[1].keyboard,
            Keyboard::Options(
                ["Sun", "Moon", "Star", "Sky"].map(String::from).to_vec()
            )
        );
        assert!(store.update(CHAT, |s| s.quiz.is_some()));
    }

    #[tokio::test]
    async fn active_quiz_claims_even_command_labels() {
        let store = SessionStore::new();
        let model = MockModel::new(vec![Ok("не json".to_string())]);
        handle_message(&model, &store, CHAT, QUIZ_BUTTON).await;

        // A category button during a quiz is just a wrong answer.
        let out = handle_message(&model, &store, CHAT, LEARNING_BUTTON).await;
        assert_eq!(out[0].text, "Переклади слово 'сонце'");
        store.update(CHAT, |s| {
            assert_eq!(s.category, Category::General);
            let quiz = s.quiz.as_ref().unwrap();
            assert_eq!(quiz.cursor, 1);
            assert_eq!(quiz.score, 0);
        });
    }

    #[tokio::test]
    async fn two_correct_of_three_finishes_as_intermediate() {
        let store = SessionStore::new();
        let model = MockModel::new(vec![
            Ok("не json".to_string()),          // quiz generation -> fallback
            Ok("Читай щодня.".to_string()),     // study plan
        ]);
        handle_message(&model, &store, CHAT, QUIZ_BUTTON).await;

        handle_message(&model, &store, CHAT, "Moon").await;
        handle_message(&model, &store, CHAT, "Star").await;
        let out = handle_message(&model, &store, CHAT, "Water").await;

        assert_eq!(out.len(), 2);
        assert!(out[0].text.contains("Результат: 2/3"));
        assert!(out[0].text.contains("Рівень: середній"));
        assert!(out[0].text.contains("Читай щодня."));
        assert_eq!(out[1], Outbound::new("Тест завершено.", Keyboard::Main));
        assert!(store.update(CHAT, |s| s.quiz.is_none()));
    }

    #[tokio::test]
    async fn failed_study_plan_degrades_into_the_summary() {
        let store = SessionStore::new();
        let model = MockModel::new(vec![
            Ok("не json".to_string()),
            Err(crate::ai::ModelError::Backend("timeout".to_string())),
        ]);
        handle_message(&model, &store, CHAT, QUIZ_BUTTON).await;

        handle_message(&model, &store, CHAT, "Moon").await;
        handle_message(&model, &store, CHAT, "Sun").await;
        let out = handle_message(&model, &store, CHAT, "Water").await;

        assert!(out[0].text.contains("Рівень: просунутий"));
        assert!(out[0].text.contains("Не вдалося згенерувати програму: timeout"));
    }

    #[tokio::test]
    async fn starting_a_new_quiz_replaces_the_old_one() {
        let store = SessionStore::new();
        let model = MockModel::new(vec![
            Ok("не json".to_string()),
            Ok("не json".to_string()),
        ]);
        handle_message(&model, &store, CHAT, QUIZ_BUTTON).await;
        handle_message(&model, &store, CHAT, "Moon").await;

        handle_message(&model, &store, CHAT, QUIZ_BUTTON).await;
        store.update(CHAT, |s| {
            let quiz = s.quiz.as_ref().unwrap();
            assert_eq!(quiz.cursor, 0);
            assert_eq!(quiz.score, 0);
        });
    }

    #[tokio::test]
    async fn reset_reinitializes_the_session() {
        let store = SessionStore::new();
        let model = MockModel::new(vec![Ok("відповідь".to_string())]);
        handle_message(&model, &store, CHAT, "питання").await;
        store.set_category(CHAT, Category::Fun);

        let out = handle_message(&model, &store, CHAT, RESET_BUTTON).await;
        assert_eq!(
            out,
            vec![Outbound::new("🧹 Історія очищена. Почнемо заново.", Keyboard::Main)]
        );
        store.update(CHAT, |s| {
            assert!(s.history.is_empty());
            assert_eq!(s.category, Category::General);
        });
    }

    #[tokio::test]
    async fn stop_removes_the_keyboard_but_keeps_the_session() {
        let store = SessionStore::new();
        let model = MockModel::new(vec![Ok("відповідь".to_string())]);
        handle_message(&model, &store, CHAT, "питання").await;

        let out = handle_message(&model, &store, CHAT, STOP_BUTTON).await;
        assert_eq!(out, vec![Outbound::new("🚫 Діалог завершено.", Keyboard::Remove)]);
        assert_eq!(store.update(CHAT, |s| s.history.len()), 2);
    }

    #[test]
    fn start_greets_by_name_and_resets() {
        let store = SessionStore::new();
        store.set_category(CHAT, Category::Fun);

        let out = start(&store, CHAT, "Оля");
        assert!(out.text.starts_with("Привіт, Оля!"));
        assert_eq!(out.keyboard, Keyboard::Main);
        assert_eq!(store.update(CHAT, |s| s.category), Category::General);
    }
}
