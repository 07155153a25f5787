use std::sync::Arc;

use tgbot_api::methods::GetChatAdministrators;
use tgbot_core::Message;
use tracing::{debug, warn};

use crate::action::Action;

/// Restricts `handler` to chat administrators.
///
/// The returned handler asks for the chat's administrators first and only runs `handler` when the
/// sender is one of them; otherwise (including when the lookup fails) the result is `Nothing` and
/// `handler` is never called.
pub fn with_auth<F>(handler: F) -> impl Fn(&Message) -> Action + Send + Sync + 'static
where
    F: Fn(&Message) -> Action + Send + Sync + 'static,
{
    let handler = Arc::new(handler);
    move |message: &Message| {
        let Some(sender_id) = message.sender_id() else {
            return Action::Nothing;
        };
        let handler = Arc::clone(&handler);
        let message = message.clone();
        Action::get_chat_administrators(
            GetChatAdministrators::new(message.chat_id()),
            move |admins| match admins {
                Ok(admins) if admins.iter().any(|m| m.user.id == sender_id) => handler(&message),
                Ok(_) => {
                    debug!(sender_id, chat_id = message.chat_id(), "Sender is not an administrator");
                    Action::Nothing
                }
                Err(err) => {
                    warn!(chat_id = message.chat_id(), error = %err, "Administrator lookup failed");
                    Action::Nothing
                }
            },
        )
    }
}
