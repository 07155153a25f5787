//! Command bot: slash commands, an admin-only command, inline answers, callback buttons and a
//! welcome message for new members.
//!
//! Commands: /help, /say_hi, /my_pics, /members (admins only), /buttons.

use anyhow::Result;
use chrono::Local;
use clap::Parser;
use tgbot_api::methods::{
    AnswerCallbackQuery, AnswerInlineQuery, EditMessageText, GetChatMemberCount,
    GetUserProfilePhotos, MessageTarget, SendChatAction, SendMessage, SendPhoto,
};
use tgbot_api::ApiClient;
use tgbot_core::{
    init_tracing, CallbackQuery, ChatAction, ChatEvent, InlineKeyboardButton, InlineQuery,
    InlineQueryResult, InputFile, Message, ReplyMarkup,
};
use tgbot_runtime::{command_args, with_auth, Action, Bot, BotConfig, Command, CommandRegistry, Then};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "command-bot", about = "Slash-command demo bot", version)]
struct Cli {
    /// Bot token; overrides BOT_TOKEN.
    #[arg(short, long)]
    token: Option<String>,
}

fn say_hi(message: &Message) -> Action {
    let name = message
        .from
        .as_ref()
        .map(|u| u.display_name())
        .unwrap_or_else(|| "there".to_string());
    let args = command_args(message.text().unwrap_or_default());
    let text = if args.is_empty() {
        format!("Hi, {name}!")
    } else {
        format!("Hi, {name}! You said: {}", args.join(" "))
    };
    Action::reply(message, text)
}

/// Sends back up to three of the sender's profile photos.
fn my_pics(message: &Message) -> Action {
    let Some(user_id) = message.sender_id() else {
        return Action::Nothing;
    };
    let chat_id = message.chat_id();
    Action::SendChatAction(SendChatAction::new(chat_id, ChatAction::UploadPhoto)).chain(
        Action::get_user_profile_photos(
            GetUserProfilePhotos::new(user_id).limit(3),
            move |photos| match photos {
                Ok(photos) if photos.total_count > 0 => Action::sequence(
                    photos.largest_file_ids().into_iter().map(|file_id| {
                        Action::SendPhoto(
                            SendPhoto::new(chat_id, InputFile::file_id(file_id)),
                            Then::ignore(),
                        )
                    }),
                ),
                Ok(_) => Action::send_text(chat_id, "You have no profile photos."),
                Err(err) => {
                    warn!(user_id, error = %err, "Failed to fetch profile photos");
                    Action::send_text(chat_id, "Could not fetch your photos.")
                }
            },
        ),
    )
}

fn members(message: &Message) -> Action {
    let chat_id = message.chat_id();
    Action::get_chat_member_count(GetChatMemberCount::new(chat_id), move |count| match count {
        Ok(count) => Action::send_text(chat_id, format!("This chat has {count} members.")),
        Err(err) => Action::send_text(chat_id, format!("Could not count members: {err}")),
    })
}

fn buttons(message: &Message) -> Action {
    let markup = ReplyMarkup::inline(vec![vec![
        InlineKeyboardButton::callback("Yes", "yes"),
        InlineKeyboardButton::callback("No", "no"),
    ]]);
    Action::SendMessage(
        SendMessage::new(message.chat_id(), "Do you like this bot?").reply_markup(markup),
        Then::ignore(),
    )
}

/// Answers the press and replaces the question with the choice.
fn on_callback(query: &CallbackQuery) -> Action {
    let choice = query.data.clone().unwrap_or_default();
    let answer = Action::AnswerCallbackQuery(AnswerCallbackQuery::new(query.id.clone()).text("Thanks!"));
    match &query.message {
        Some(message) => answer.chain(Action::EditMessageText(EditMessageText::new(
            MessageTarget::chat(message.chat_id(), message.message_id),
            format!("You answered: {choice}"),
        ))),
        None => answer,
    }
}

fn on_inline_query(query: &InlineQuery) -> Action {
    let text = if query.query.is_empty() { "..." } else { query.query.as_str() };
    Action::AnswerInlineQuery(
        AnswerInlineQuery::new(
            query.id.clone(),
            vec![
                InlineQueryResult::article("echo", "Echo", text),
                InlineQueryResult::article("upper", "Shout", text.to_uppercase()),
            ],
        )
        .cache_time(0),
    )
}

fn on_chat_event(message: &Message, event: &ChatEvent) -> Action {
    match event {
        ChatEvent::NewChatMembers(users) => Action::sequence(users.iter().filter(|u| !u.is_bot).map(|u| {
            Action::send_text(message.chat_id(), format!("Welcome, {}!", u.display_name()))
        })),
        ChatEvent::LeftChatMember(user) => {
            Action::send_text(message.chat_id(), format!("Goodbye, {}.", user.display_name()))
        }
        _ => Action::Nothing,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = BotConfig::from_env(cli.token)?;
    let log_file = config.log_file.clone().unwrap_or_else(|| "logs/command-bot.log".to_string());
    init_tracing(Some(&log_file))?;

    let mut registry = CommandRegistry::new()
        .add(Command::new("say_hi", "Greets you", say_hi))
        .add(Command::new("my_pics", "Shows your profile photos", my_pics))
        .add(Command::new("members", "Counts chat members (admins only)", with_auth(members)))
        .add(Command::new("buttons", "Asks a question with buttons", buttons));
    if let Some(suffix) = &config.command_suffix {
        registry = registry.suffix(suffix.clone());
    }

    let client = ApiClient::new(config.api.clone())?;
    let mut bot = Bot::builder(client)
        .with_config(&config)
        .commands(registry)
        .on_callback_query(on_callback)
        .on_inline_query(on_inline_query)
        .on_chat_event(on_chat_event)
        .build();
    info!(
        start_time = %Local::now().format("%Y-%m-%d %H:%M:%S"),
        log_file = %log_file,
        "Command Bot started"
    );

    bot.run().await;
    Ok(())
}
