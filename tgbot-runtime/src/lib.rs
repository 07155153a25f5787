//! # tgbot-runtime
//!
//! Bot operations as data ([`Action`]), the interpreter that performs them against the API
//! ([`Bot::interpret`]), the update polling loop ([`Bot::pop_update`], [`Bot::run`]) and the
//! slash-command registry with its admin-only wrapper ([`with_auth`]).

mod action;
mod auth;
mod bot;
mod command;
mod config;
mod handlers;
mod poll;

pub use action::{Action, Then};
pub use auth::with_auth;
pub use bot::{Bot, BotBuilder};
pub use command::{command_args, tokenize, Command, CommandHandler, CommandRegistry};
pub use config::BotConfig;
pub use handlers::{
    CallbackQueryHandler, ChatEventHandler, ChosenInlineResultHandler, InlineQueryHandler,
};
pub use poll::{PollError, PollOutcome};
