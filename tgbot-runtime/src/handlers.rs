//! Handlers for the update kinds that do not go through the command registry.

use std::sync::Arc;

use tgbot_core::{CallbackQuery, ChatEvent, ChosenInlineResult, InlineQuery, Message};

use crate::action::Action;

pub type InlineQueryHandler = Arc<dyn Fn(&InlineQuery) -> Action + Send + Sync>;
pub type CallbackQueryHandler = Arc<dyn Fn(&CallbackQuery) -> Action + Send + Sync>;
pub type ChosenInlineResultHandler = Arc<dyn Fn(&ChosenInlineResult) -> Action + Send + Sync>;
/// Receives service messages (members joining or leaving, title changes, ...).
pub type ChatEventHandler = Arc<dyn Fn(&Message, &ChatEvent) -> Action + Send + Sync>;

#[derive(Clone, Default)]
pub(crate) struct Handlers {
    pub inline_query: Option<InlineQueryHandler>,
    pub callback_query: Option<CallbackQueryHandler>,
    pub chosen_inline_result: Option<ChosenInlineResultHandler>,
    pub chat_event: Option<ChatEventHandler>,
}
