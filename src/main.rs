mod ai;
mod chat;
mod quiz;
mod router;
mod session;
mod text;

use std::sync::Arc;

use chatgpt::{client::ChatGPT, config::ChatGPTEngine};
use dotenv::dotenv;
use teloxide::{
    prelude::*,
    types::{KeyboardButton, KeyboardMarkup, KeyboardRemove, ReplyMarkup},
    utils::command::BotCommands,
};

use ai::GptModel;
use router::{Keyboard, Outbound};
use session::SessionStore;

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
enum BotCmd {
    #[command(description = "почати роботу з ботом")]
    Start,
}

#[tokio::main]
async fn main() {
    dotenv().expect("Failed to load .env file");
    let api_key = std::env::var("CHATGPT_API_KEY").expect("CHATGPT_API_KEY is not set");

    pretty_env_logger::init();
    log::info!("Starting UAHelper bot...");

    let bot = Bot::from_env();

    let gpt = {
        let mut gpt = ChatGPT::new(api_key).expect("Unable to connect with ChatGPT");

        gpt.config.engine = ChatGPTEngine::Gpt35Turbo;
        // Bounded timeout: a hung backend degrades into an error reply
        // instead of stalling the chat.
        gpt.config.timeout = std::time::Duration::from_secs(15);

        gpt
    };

    let model = Arc::new(GptModel::new(gpt));
    let store = Arc::new(SessionStore::new());
    let store_for_start = store.clone();

    Dispatcher::builder(
        bot,
        Update::filter_message()
            .branch(dptree::entry().filter_command::<BotCmd>().endpoint(
                move |bot: Bot, msg: Message, cmd: BotCmd| {
                    let store = store_for_start.clone();
                    async move { on_command(bot, msg, cmd, store).await }
                },
            ))
            .branch(dptree::endpoint(move |bot: Bot, msg: Message| {
                let store = store.clone();
                let model = model.clone();
                async move { on_message(bot, msg, store, model).await }
            })),
    )
    .enable_ctrlc_handler()
    .build()
    .dispatch()
    .await;
}

async fn on_command(bot: Bot, msg: Message, cmd: BotCmd, store: Arc<SessionStore>) -> HandlerResult {
    match cmd {
        BotCmd::Start => {
            let first_name = msg
                .from()
                .map(|user| user.first_name.clone())
                .unwrap_or_default();
            let out = router::start(&store, msg.chat.id.0, &first_name);
            send(&bot, msg.chat.id, out).await?;
        }
    }
    Ok(())
}

async fn on_message(
    bot: Bot,
    msg: Message,
    store: Arc<SessionStore>,
    model: Arc<GptModel>,
) -> HandlerResult {
    let Some(inbound) = msg.text() else {
        bot.send_message(msg.chat.id, "Будь ласка, напиши мені текстом")
            .await?;
        return Ok(());
    };

    for out in router::handle_message(model.as_ref(), store.as_ref(), msg.chat.id.0, inbound).await
    {
        send(&bot, msg.chat.id, out).await?;
    }
    Ok(())
}

/// Sends one outbound reply, splitting long text into ordered chunks. The
/// keyboard directive is attached to the final chunk.
async fn send(bot: &Bot, chat: ChatId, out: Outbound) -> HandlerResult {
    let parts = text::chunks(&out.text);
    if parts.is_empty() {
        return Ok(());
    }

    let markup = render_keyboard(&out.keyboard);
    let last = parts.len() - 1;
    for (i, part) in parts.into_iter().enumerate() {
        let request = bot.send_message(chat, part);
        match (&markup, i == last) {
            (Some(markup), true) => request.reply_markup(markup.clone()).await?,
            _ => request.await?,
        };
    }
    Ok(())
}

fn render_keyboard(keyboard: &Keyboard) -> Option<ReplyMarkup> {
    match keyboard {
        Keyboard::Main => Some(ReplyMarkup::Keyboard(main_keyboard())),
        Keyboard::Options(options) => {
            let rows = options
                .iter()
                .map(|option| vec![KeyboardButton::new(option.clone())]);
            Some(ReplyMarkup::Keyboard(
                KeyboardMarkup::new(rows).resize_keyboard(true),
            ))
        }
        Keyboard::Remove => Some(ReplyMarkup::KeyboardRemove(KeyboardRemove::new())),
        Keyboard::Unchanged => None,
    }
}

fn main_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![
            KeyboardButton::new(router::LEARNING_BUTTON),
            KeyboardButton::new(router::TRANSLATION_BUTTON),
        ],
        vec![
            KeyboardButton::new(router::PROGRAMMING_BUTTON),
            KeyboardButton::new(router::FUN_BUTTON),
        ],
        vec![KeyboardButton::new(router::QUIZ_BUTTON)],
        vec![
            KeyboardButton::new(router::RESET_BUTTON),
            KeyboardButton::new(router::STOP_BUTTON),
        ],
    ])
    .resize_keyboard(true)
}
