//! Bot operations as data.
//!
//! An [`Action`] describes what the bot should do; nothing happens until
//! [`Bot::interpret`](crate::Bot::interpret) walks it. Result-producing tags carry a [`Then`]
//! continuation that receives the call's [`ApiResult`] and returns the next action.

use std::fmt;

use tgbot_api::methods;
use tgbot_core::{
    ApiResult, Chat, ChatId, ChatMember, File, Message, Update, User, UserProfilePhotos,
};

use crate::poll::PollOutcome;

/// Continuation of a result-producing action.
pub struct Then<T>(Box<dyn FnOnce(ApiResult<T>) -> Action + Send>);

impl<T> Then<T> {
    pub fn new(f: impl FnOnce(ApiResult<T>) -> Action + Send + 'static) -> Self {
        Self(Box::new(f))
    }

    /// Drops the result.
    pub fn ignore() -> Self {
        Self::new(|_| Action::Nothing)
    }

    pub fn call(self, result: ApiResult<T>) -> Action {
        (self.0)(result)
    }
}

impl<T> fmt::Debug for Then<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Then(..)")
    }
}

#[derive(Default)]
pub enum Action {
    // Acknowledgement-only calls. A refused call is logged and otherwise ignored.
    SendChatAction(methods::SendChatAction),
    ForwardMessage(methods::ForwardMessage),
    BanChatMember(methods::BanChatMember),
    UnbanChatMember(methods::UnbanChatMember),
    LeaveChat(methods::LeaveChat),
    AnswerCallbackQuery(methods::AnswerCallbackQuery),
    AnswerInlineQuery(methods::AnswerInlineQuery),
    EditMessageText(methods::EditMessageText),
    EditMessageCaption(methods::EditMessageCaption),
    EditMessageReplyMarkup(methods::EditMessageReplyMarkup),
    DeleteMessage(methods::DeleteMessage),

    GetMe(Then<User>),
    SendMessage(methods::SendMessage, Then<Message>),
    SendPhoto(methods::SendPhoto, Then<Message>),
    SendAudio(methods::SendAudio, Then<Message>),
    SendDocument(methods::SendDocument, Then<Message>),
    SendSticker(methods::SendSticker, Then<Message>),
    SendVideo(methods::SendVideo, Then<Message>),
    SendVoice(methods::SendVoice, Then<Message>),
    SendLocation(methods::SendLocation, Then<Message>),
    SendVenue(methods::SendVenue, Then<Message>),
    SendContact(methods::SendContact, Then<Message>),
    GetUserProfilePhotos(methods::GetUserProfilePhotos, Then<UserProfilePhotos>),
    GetFile(methods::GetFile, Then<File>),
    /// Fetches the bytes of a file previously resolved with `GetFile`.
    DownloadFile(File, Then<Vec<u8>>),
    GetChat(methods::GetChat, Then<Chat>),
    GetChatAdministrators(methods::GetChatAdministrators, Then<Vec<ChatMember>>),
    GetChatMemberCount(methods::GetChatMemberCount, Then<i64>),
    GetChatMember(methods::GetChatMember, Then<ChatMember>),

    /// Every pending update at the current offset. The offset is not moved.
    GetUpdates(Then<Vec<Update>>),
    /// The next pending update without consuming it.
    PeekUpdate(Then<Update>),
    /// One step of the polling loop: consume the next update and dispatch it when
    /// `run_commands` is set.
    PopUpdate {
        run_commands: bool,
        then: Then<PollOutcome>,
    },

    /// Runs the first action to completion, continuations included, then the second.
    Chain(Box<Action>, Box<Action>),
    #[default]
    Nothing,
}

impl Action {
    pub fn chain(self, next: Action) -> Action {
        Action::Chain(Box::new(self), Box::new(next))
    }

    /// Runs the actions in order.
    pub fn sequence(actions: impl IntoIterator<Item = Action>) -> Action {
        actions
            .into_iter()
            .fold(Action::Nothing, |acc, action| match acc {
                Action::Nothing => action,
                acc => acc.chain(action),
            })
    }

    pub fn send_text(chat_id: impl Into<ChatId>, text: impl Into<String>) -> Action {
        Action::SendMessage(methods::SendMessage::new(chat_id, text), Then::ignore())
    }

    /// Sends `text` to the message's chat as a reply to it.
    pub fn reply(message: &Message, text: impl Into<String>) -> Action {
        Action::SendMessage(
            methods::SendMessage::new(message.chat_id(), text).reply_to(message.message_id),
            Then::ignore(),
        )
    }

    pub fn is_nothing(&self) -> bool {
        matches!(self, Action::Nothing)
    }

    /// Tag name, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Action::SendChatAction(_) => "SendChatAction",
            Action::ForwardMessage(_) => "ForwardMessage",
            Action::BanChatMember(_) => "BanChatMember",
            Action::UnbanChatMember(_) => "UnbanChatMember",
            Action::LeaveChat(_) => "LeaveChat",
            Action::AnswerCallbackQuery(_) => "AnswerCallbackQuery",
            Action::AnswerInlineQuery(_) => "AnswerInlineQuery",
            Action::EditMessageText(_) => "EditMessageText",
            Action::EditMessageCaption(_) => "EditMessageCaption",
            Action::EditMessageReplyMarkup(_) => "EditMessageReplyMarkup",
            Action::DeleteMessage(_) => "DeleteMessage",
            Action::GetMe(_) => "GetMe",
            Action::SendMessage(..) => "SendMessage",
            Action::SendPhoto(..) => "SendPhoto",
            Action::SendAudio(..) => "SendAudio",
            Action::SendDocument(..) => "SendDocument",
            Action::SendSticker(..) => "SendSticker",
            Action::SendVideo(..) => "SendVideo",
            Action::SendVoice(..) => "SendVoice",
            Action::SendLocation(..) => "SendLocation",
            Action::SendVenue(..) => "SendVenue",
            Action::SendContact(..) => "SendContact",
            Action::GetUserProfilePhotos(..) => "GetUserProfilePhotos",
            Action::GetFile(..) => "GetFile",
            Action::DownloadFile(..) => "DownloadFile",
            Action::GetChat(..) => "GetChat",
            Action::GetChatAdministrators(..) => "GetChatAdministrators",
            Action::GetChatMemberCount(..) => "GetChatMemberCount",
            Action::GetChatMember(..) => "GetChatMember",
            Action::GetUpdates(_) => "GetUpdates",
            Action::PeekUpdate(_) => "PeekUpdate",
            Action::PopUpdate { .. } => "PopUpdate",
            Action::Chain(..) => "Chain",
            Action::Nothing => "Nothing",
        }
    }
}

/// Constructors for the result-producing tags. The continuation's parameter type is fixed by the
/// tag, so closures need no annotations.
macro_rules! result_actions {
    ($($name:ident => $variant:ident($request:ty) -> $output:ty;)*) => {
        impl Action {
            $(
                pub fn $name(
                    request: $request,
                    then: impl FnOnce(ApiResult<$output>) -> Action + Send + 'static,
                ) -> Action {
                    Action::$variant(request, Then::new(then))
                }
            )*
        }
    };
}

result_actions! {
    send_message => SendMessage(methods::SendMessage) -> Message;
    send_photo => SendPhoto(methods::SendPhoto) -> Message;
    send_audio => SendAudio(methods::SendAudio) -> Message;
    send_document => SendDocument(methods::SendDocument) -> Message;
    send_sticker => SendSticker(methods::SendSticker) -> Message;
    send_video => SendVideo(methods::SendVideo) -> Message;
    send_voice => SendVoice(methods::SendVoice) -> Message;
    send_location => SendLocation(methods::SendLocation) -> Message;
    send_venue => SendVenue(methods::SendVenue) -> Message;
    send_contact => SendContact(methods::SendContact) -> Message;
    get_user_profile_photos => GetUserProfilePhotos(methods::GetUserProfilePhotos) -> UserProfilePhotos;
    get_file => GetFile(methods::GetFile) -> File;
    download_file => DownloadFile(File) -> Vec<u8>;
    get_chat => GetChat(methods::GetChat) -> Chat;
    get_chat_administrators => GetChatAdministrators(methods::GetChatAdministrators) -> Vec<ChatMember>;
    get_chat_member_count => GetChatMemberCount(methods::GetChatMemberCount) -> i64;
    get_chat_member => GetChatMember(methods::GetChatMember) -> ChatMember;
}

impl Action {
    pub fn get_me(then: impl FnOnce(ApiResult<User>) -> Action + Send + 'static) -> Action {
        Action::GetMe(Then::new(then))
    }

    pub fn get_updates(then: impl FnOnce(ApiResult<Vec<Update>>) -> Action + Send + 'static) -> Action {
        Action::GetUpdates(Then::new(then))
    }

    pub fn peek_update(then: impl FnOnce(ApiResult<Update>) -> Action + Send + 'static) -> Action {
        Action::PeekUpdate(Then::new(then))
    }

    pub fn pop_update(
        run_commands: bool,
        then: impl FnOnce(ApiResult<PollOutcome>) -> Action + Send + 'static,
    ) -> Action {
        Action::PopUpdate {
            run_commands,
            then: Then::new(then),
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Chain(first, second) => f.debug_tuple("Chain").field(first).field(second).finish(),
            other => f.write_str(other.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_construction_does_not_run_continuation() {
        let called = Arc::new(AtomicBool::new(false));
        let flag = called.clone();
        let action = Action::get_me(move |_| {
            flag.store(true, Ordering::SeqCst);
            Action::Nothing
        });

        assert_eq!(action.name(), "GetMe");
        assert!(!called.load(Ordering::SeqCst));
    }

    #[test]
    fn test_sequence_skips_leading_nothing() {
        assert!(Action::sequence(Vec::new()).is_nothing());
        assert_eq!(Action::sequence(vec![Action::send_text(1, "a")]).name(), "SendMessage");
        assert_eq!(
            format!("{:?}", Action::sequence(vec![Action::send_text(1, "a"), Action::Nothing])),
            "Chain(SendMessage, Nothing)"
        );
    }

    #[test]
    fn test_reply_targets_message() {
        let message: Message = serde_json::from_value(serde_json::json!({
            "message_id": 5, "date": 0, "chat": {"id": 42, "type": "private"}, "text": "hi"
        }))
        .unwrap();
        match Action::reply(&message, "pong") {
            Action::SendMessage(m, _) => {
                assert_eq!(m.chat_id, ChatId::from(42));
                assert_eq!(m.reply_to_message_id, Some(5));
                assert_eq!(m.text, "pong");
            }
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn test_typed_constructors_infer_results() {
        use tgbot_core::InputFile;

        let file = File {
            file_id: "f".to_string(),
            file_size: None,
            file_path: None,
        };
        let actions = vec![
            Action::get_me(|me| match me {
                Ok(me) if me.is_bot => Action::Nothing,
                _ => Action::Nothing,
            }),
            Action::send_message(methods::SendMessage::new(1, "a"), |sent| {
                sent.map(|m| Action::send_text(m.chat_id(), "b")).unwrap_or_default()
            }),
            Action::send_photo(methods::SendPhoto::new(1, InputFile::file_id("p")), |sent| {
                sent.map(|m| Action::reply(&m, "b")).unwrap_or_default()
            }),
            Action::get_user_profile_photos(methods::GetUserProfilePhotos::new(1), |photos| {
                match photos {
                    Ok(photos) if photos.total_count > 0 => Action::send_text(1, "yes"),
                    _ => Action::Nothing,
                }
            }),
            Action::get_file(methods::GetFile::new("f"), |file| match file {
                Ok(file) => Action::download_file(file, |bytes| {
                    Action::send_text(1, bytes.map(|b| b.len()).unwrap_or(0).to_string())
                }),
                Err(_) => Action::Nothing,
            }),
            Action::download_file(file, |bytes| match bytes {
                Ok(bytes) if bytes.is_empty() => Action::Nothing,
                _ => Action::Nothing,
            }),
            Action::get_chat(methods::GetChat::new(1), |chat| {
                chat.map(|c| Action::send_text(c.id, "here")).unwrap_or_default()
            }),
            Action::get_chat_administrators(methods::GetChatAdministrators::new(1), |admins| {
                match admins {
                    Ok(admins) if admins.iter().any(|m| m.user.id == 42) => Action::send_text(1, "admin"),
                    _ => Action::Nothing,
                }
            }),
            Action::get_chat_member_count(methods::GetChatMemberCount::new(1), |count| {
                Action::send_text(1, count.unwrap_or(0).to_string())
            }),
            Action::get_chat_member(methods::GetChatMember::new(1, 42), |member| {
                member.map(|m| Action::send_text(1, m.user.display_name())).unwrap_or_default()
            }),
            Action::get_updates(|updates| match updates {
                Ok(updates) if updates.is_empty() => Action::Nothing,
                _ => Action::Nothing,
            }),
            Action::peek_update(|update| match update {
                Ok(update) if update.id > 0 => Action::Nothing,
                _ => Action::Nothing,
            }),
            Action::pop_update(true, |outcome| match outcome {
                Ok(PollOutcome::Unhandled(update)) => Action::send_text(1, update.id.to_string()),
                _ => Action::Nothing,
            }),
        ];

        let names: Vec<&str> = actions.iter().map(Action::name).collect();
        assert_eq!(
            names,
            vec![
                "GetMe",
                "SendMessage",
                "SendPhoto",
                "GetUserProfilePhotos",
                "GetFile",
                "DownloadFile",
                "GetChat",
                "GetChatAdministrators",
                "GetChatMemberCount",
                "GetChatMember",
                "GetUpdates",
                "PeekUpdate",
                "PopUpdate",
            ]
        );
    }

    #[test]
    fn test_then_passes_result() {
        let then = Then::<i64>::new(|result| match result {
            Ok(n) if n > 0 => Action::send_text(1, n.to_string()),
            _ => Action::Nothing,
        });
        assert_eq!(then.call(Ok(3)).name(), "SendMessage");
        assert!(Then::<i64>::ignore().call(Ok(3)).is_nothing());
    }
}
