//! Free-form chat generation with category instructions and history context.

use crate::ai::{ModelError, TextModel};
use crate::session::SessionStore;
use crate::text;

const EMPTY_REPLY_TEXT: &str = "Не вдалося отримати відповідь";

/// A chat reply. Generation never fails outright: backend errors become a
/// [`Reply::Degraded`] whose text is still shown to the user, while the cause
/// stays available for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Generated(String),
    Degraded { text: String, cause: ModelError },
}

impl Reply {
    pub fn text(&self) -> &str {
        match self {
            Reply::Generated(text) => text,
            Reply::Degraded { text, .. } => text,
        }
    }
}

fn build_prompt(instruction: &str, context: &str, user_text: &str) -> String {
    format!(
        "{}\n\nІсторія діалогу:\n{}\nКористувач: {}\nБот:",
        instruction, context, user_text
    )
}

/// Produces a reply for one chat turn and records both the user turn and the
/// reply in the session history, degraded or not.
pub async fn generate<M: TextModel + ?Sized>(
    model: &M,
    store: &SessionStore,
    chat: i64,
    user_text: &str,
) -> Reply {
    let (category, context) = store.update(chat, |s| (s.category, s.context()));
    let prompt = build_prompt(category.instruction(), &context, user_text);

    let reply = match model.complete(&prompt).await {
        Ok(raw) => {
            let cleaned = text::sanitize(&raw);
            if cleaned.is_empty() {
                Reply::Generated(EMPTY_REPLY_TEXT.to_string())
            } else {
                Reply::Generated(cleaned)
            }
        }
        Err(cause) => {
            log::warn!("Chat generation failed: {}", cause);
            Reply::Degraded {
                text: format!("Помилка моделі: {}", cause),
                cause,
            }
        }
    };

    store.push_turns(chat, user_text, reply.text());
    reply
}
