//! Outgoing method records. Each serializes to the method's JSON parameters: required fields
//! first, optional fields in declaration order, absent optionals omitted.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tgbot_core::{
    Chat, ChatAction, ChatId, ChatMember, File, InlineQueryResult, InputFile, Message, ParseMode,
    ReplyMarkup, Update, User, UserProfilePhotos,
};

/// One Bot API method.
pub trait Method: Serialize + Send + Sync {
    /// Path segment, e.g. `sendMessage`.
    const NAME: &'static str;
    /// Type of `result` in a successful envelope.
    type Response: DeserializeOwned + Send + 'static;

    /// Field name and file for methods that take a file argument.
    fn input_file(&self) -> Option<(&'static str, &InputFile)> {
        None
    }
}

/// Setters shared by every send method.
macro_rules! send_options {
    ($name:ident) => {
        impl $name {
            pub fn disable_notification(mut self, value: bool) -> Self {
                self.disable_notification = Some(value);
                self
            }

            pub fn reply_to(mut self, message_id: i64) -> Self {
                self.reply_to_message_id = Some(message_id);
                self
            }

            pub fn reply_markup(mut self, markup: ReplyMarkup) -> Self {
                self.reply_markup = Some(markup);
                self
            }
        }
    };
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GetMe {}

impl Method for GetMe {
    const NAME: &'static str = "getMe";
    type Response = User;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendMessage {
    pub chat_id: ChatId,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_web_page_preview: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_notification: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyMarkup>,
}

impl SendMessage {
    pub fn new(chat_id: impl Into<ChatId>, text: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            text: text.into(),
            parse_mode: None,
            disable_web_page_preview: None,
            disable_notification: None,
            reply_to_message_id: None,
            reply_markup: None,
        }
    }

    pub fn parse_mode(mut self, mode: ParseMode) -> Self {
        self.parse_mode = Some(mode);
        self
    }

    pub fn disable_web_page_preview(mut self, value: bool) -> Self {
        self.disable_web_page_preview = Some(value);
        self
    }
}

send_options!(SendMessage);

impl Method for SendMessage {
    const NAME: &'static str = "sendMessage";
    type Response = Message;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForwardMessage {
    pub chat_id: ChatId,
    pub from_chat_id: ChatId,
    pub message_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_notification: Option<bool>,
}

impl ForwardMessage {
    pub fn new(chat_id: impl Into<ChatId>, from_chat_id: impl Into<ChatId>, message_id: i64) -> Self {
        Self {
            chat_id: chat_id.into(),
            from_chat_id: from_chat_id.into(),
            message_id,
            disable_notification: None,
        }
    }
}

impl Method for ForwardMessage {
    const NAME: &'static str = "forwardMessage";
    type Response = Message;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendPhoto {
    pub chat_id: ChatId,
    pub photo: InputFile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_notification: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyMarkup>,
}

impl SendPhoto {
    pub fn new(chat_id: impl Into<ChatId>, photo: InputFile) -> Self {
        Self {
            chat_id: chat_id.into(),
            photo,
            caption: None,
            parse_mode: None,
            disable_notification: None,
            reply_to_message_id: None,
            reply_markup: None,
        }
    }

    pub fn caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn parse_mode(mut self, mode: ParseMode) -> Self {
        self.parse_mode = Some(mode);
        self
    }
}

send_options!(SendPhoto);

impl Method for SendPhoto {
    const NAME: &'static str = "sendPhoto";
    type Response = Message;

    fn input_file(&self) -> Option<(&'static str, &InputFile)> {
        Some(("photo", &self.photo))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendAudio {
    pub chat_id: ChatId,
    pub audio: InputFile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_notification: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyMarkup>,
}

impl SendAudio {
    pub fn new(chat_id: impl Into<ChatId>, audio: InputFile) -> Self {
        Self {
            chat_id: chat_id.into(),
            audio,
            caption: None,
            duration: None,
            performer: None,
            title: None,
            disable_notification: None,
            reply_to_message_id: None,
            reply_markup: None,
        }
    }

    pub fn caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn performer(mut self, performer: impl Into<String>) -> Self {
        self.performer = Some(performer.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

send_options!(SendAudio);

impl Method for SendAudio {
    const NAME: &'static str = "sendAudio";
    type Response = Message;

    fn input_file(&self) -> Option<(&'static str, &InputFile)> {
        Some(("audio", &self.audio))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendDocument {
    pub chat_id: ChatId,
    pub document: InputFile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_notification: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyMarkup>,
}

impl SendDocument {
    pub fn new(chat_id: impl Into<ChatId>, document: InputFile) -> Self {
        Self {
            chat_id: chat_id.into(),
            document,
            caption: None,
            disable_notification: None,
            reply_to_message_id: None,
            reply_markup: None,
        }
    }

    pub fn caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }
}

send_options!(SendDocument);

impl Method for SendDocument {
    const NAME: &'static str = "sendDocument";
    type Response = Message;

    fn input_file(&self) -> Option<(&'static str, &InputFile)> {
        Some(("document", &self.document))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendSticker {
    pub chat_id: ChatId,
    pub sticker: InputFile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_notification: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyMarkup>,
}

impl SendSticker {
    pub fn new(chat_id: impl Into<ChatId>, sticker: InputFile) -> Self {
        Self {
            chat_id: chat_id.into(),
            sticker,
            disable_notification: None,
            reply_to_message_id: None,
            reply_markup: None,
        }
    }
}

send_options!(SendSticker);

impl Method for SendSticker {
    const NAME: &'static str = "sendSticker";
    type Response = Message;

    fn input_file(&self) -> Option<(&'static str, &InputFile)> {
        Some(("sticker", &self.sticker))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendVideo {
    pub chat_id: ChatId,
    pub video: InputFile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_notification: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyMarkup>,
}

impl SendVideo {
    pub fn new(chat_id: impl Into<ChatId>, video: InputFile) -> Self {
        Self {
            chat_id: chat_id.into(),
            video,
            duration: None,
            width: None,
            height: None,
            caption: None,
            disable_notification: None,
            reply_to_message_id: None,
            reply_markup: None,
        }
    }

    pub fn caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }
}

send_options!(SendVideo);

impl Method for SendVideo {
    const NAME: &'static str = "sendVideo";
    type Response = Message;

    fn input_file(&self) -> Option<(&'static str, &InputFile)> {
        Some(("video", &self.video))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendVoice {
    pub chat_id: ChatId,
    pub voice: InputFile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_notification: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyMarkup>,
}

impl SendVoice {
    pub fn new(chat_id: impl Into<ChatId>, voice: InputFile) -> Self {
        Self {
            chat_id: chat_id.into(),
            voice,
            caption: None,
            duration: None,
            disable_notification: None,
            reply_to_message_id: None,
            reply_markup: None,
        }
    }
}

send_options!(SendVoice);

impl Method for SendVoice {
    const NAME: &'static str = "sendVoice";
    type Response = Message;

    fn input_file(&self) -> Option<(&'static str, &InputFile)> {
        Some(("voice", &self.voice))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendLocation {
    pub chat_id: ChatId,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_notification: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyMarkup>,
}

impl SendLocation {
    pub fn new(chat_id: impl Into<ChatId>, latitude: f64, longitude: f64) -> Self {
        Self {
            chat_id: chat_id.into(),
            latitude,
            longitude,
            disable_notification: None,
            reply_to_message_id: None,
            reply_markup: None,
        }
    }
}

send_options!(SendLocation);

impl Method for SendLocation {
    const NAME: &'static str = "sendLocation";
    type Response = Message;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendVenue {
    pub chat_id: ChatId,
    pub latitude: f64,
    pub longitude: f64,
    pub title: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foursquare_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_notification: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyMarkup>,
}

impl SendVenue {
    pub fn new(
        chat_id: impl Into<ChatId>,
        latitude: f64,
        longitude: f64,
        title: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            chat_id: chat_id.into(),
            latitude,
            longitude,
            title: title.into(),
            address: address.into(),
            foursquare_id: None,
            disable_notification: None,
            reply_to_message_id: None,
            reply_markup: None,
        }
    }
}

send_options!(SendVenue);

impl Method for SendVenue {
    const NAME: &'static str = "sendVenue";
    type Response = Message;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendContact {
    pub chat_id: ChatId,
    pub phone_number: String,
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_notification: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyMarkup>,
}

impl SendContact {
    pub fn new(
        chat_id: impl Into<ChatId>,
        phone_number: impl Into<String>,
        first_name: impl Into<String>,
    ) -> Self {
        Self {
            chat_id: chat_id.into(),
            phone_number: phone_number.into(),
            first_name: first_name.into(),
            last_name: None,
            disable_notification: None,
            reply_to_message_id: None,
            reply_markup: None,
        }
    }

    pub fn last_name(mut self, last_name: impl Into<String>) -> Self {
        self.last_name = Some(last_name.into());
        self
    }
}

send_options!(SendContact);

impl Method for SendContact {
    const NAME: &'static str = "sendContact";
    type Response = Message;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendChatAction {
    pub chat_id: ChatId,
    pub action: ChatAction,
}

impl SendChatAction {
    pub fn new(chat_id: impl Into<ChatId>, action: ChatAction) -> Self {
        Self {
            chat_id: chat_id.into(),
            action,
        }
    }
}

impl Method for SendChatAction {
    const NAME: &'static str = "sendChatAction";
    type Response = bool;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GetUserProfilePhotos {
    pub user_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

impl GetUserProfilePhotos {
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            offset: None,
            limit: None,
        }
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }
}

impl Method for GetUserProfilePhotos {
    const NAME: &'static str = "getUserProfilePhotos";
    type Response = UserProfilePhotos;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GetFile {
    pub file_id: String,
}

impl GetFile {
    pub fn new(file_id: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
        }
    }
}

impl Method for GetFile {
    const NAME: &'static str = "getFile";
    type Response = File;
}

/// Removes a user from a chat (formerly `kickChatMember`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BanChatMember {
    pub chat_id: ChatId,
    pub user_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub until_date: Option<i64>,
}

impl BanChatMember {
    pub fn new(chat_id: impl Into<ChatId>, user_id: i64) -> Self {
        Self {
            chat_id: chat_id.into(),
            user_id,
            until_date: None,
        }
    }

    pub fn until(mut self, unix_time: i64) -> Self {
        self.until_date = Some(unix_time);
        self
    }
}

impl Method for BanChatMember {
    const NAME: &'static str = "banChatMember";
    type Response = bool;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnbanChatMember {
    pub chat_id: ChatId,
    pub user_id: i64,
}

impl UnbanChatMember {
    pub fn new(chat_id: impl Into<ChatId>, user_id: i64) -> Self {
        Self {
            chat_id: chat_id.into(),
            user_id,
        }
    }
}

impl Method for UnbanChatMember {
    const NAME: &'static str = "unbanChatMember";
    type Response = bool;
}

/// Request record for the methods that take nothing but a chat.
macro_rules! chat_method {
    ($name:ident, $wire:literal, $response:ty) => {
        #[derive(Debug, Clone, PartialEq, Serialize)]
        pub struct $name {
            pub chat_id: ChatId,
        }

        impl $name {
            pub fn new(chat_id: impl Into<ChatId>) -> Self {
                Self {
                    chat_id: chat_id.into(),
                }
            }
        }

        impl Method for $name {
            const NAME: &'static str = $wire;
            type Response = $response;
        }
    };
}

chat_method!(LeaveChat, "leaveChat", bool);
chat_method!(GetChat, "getChat", Chat);
chat_method!(GetChatAdministrators, "getChatAdministrators", Vec<ChatMember>);
chat_method!(GetChatMemberCount, "getChatMemberCount", i64);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GetChatMember {
    pub chat_id: ChatId,
    pub user_id: i64,
}

impl GetChatMember {
    pub fn new(chat_id: impl Into<ChatId>, user_id: i64) -> Self {
        Self {
            chat_id: chat_id.into(),
            user_id,
        }
    }
}

impl Method for GetChatMember {
    const NAME: &'static str = "getChatMember";
    type Response = ChatMember;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerCallbackQuery {
    pub callback_query_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_alert: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_time: Option<i64>,
}

impl AnswerCallbackQuery {
    pub fn new(callback_query_id: impl Into<String>) -> Self {
        Self {
            callback_query_id: callback_query_id.into(),
            text: None,
            show_alert: None,
            url: None,
            cache_time: None,
        }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn show_alert(mut self, value: bool) -> Self {
        self.show_alert = Some(value);
        self
    }
}

impl Method for AnswerCallbackQuery {
    const NAME: &'static str = "answerCallbackQuery";
    type Response = bool;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerInlineQuery {
    pub inline_query_id: String,
    pub results: Vec<InlineQueryResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_personal: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_offset: Option<String>,
}

impl AnswerInlineQuery {
    pub fn new(inline_query_id: impl Into<String>, results: Vec<InlineQueryResult>) -> Self {
        Self {
            inline_query_id: inline_query_id.into(),
            results,
            cache_time: None,
            is_personal: None,
            next_offset: None,
        }
    }

    pub fn cache_time(mut self, seconds: i64) -> Self {
        self.cache_time = Some(seconds);
        self
    }

    pub fn is_personal(mut self, value: bool) -> Self {
        self.is_personal = Some(value);
        self
    }

    pub fn next_offset(mut self, offset: impl Into<String>) -> Self {
        self.next_offset = Some(offset.into());
        self
    }
}

impl Method for AnswerInlineQuery {
    const NAME: &'static str = "answerInlineQuery";
    type Response = bool;
}

/// Which message an edit applies to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MessageTarget {
    Chat { chat_id: ChatId, message_id: i64 },
    Inline { inline_message_id: String },
}

impl MessageTarget {
    pub fn chat(chat_id: impl Into<ChatId>, message_id: i64) -> Self {
        Self::Chat {
            chat_id: chat_id.into(),
            message_id,
        }
    }

    pub fn inline(inline_message_id: impl Into<String>) -> Self {
        Self::Inline {
            inline_message_id: inline_message_id.into(),
        }
    }
}

/// Edits return the edited message, or `true` when the message was sent via inline mode.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Edited {
    Message(Box<Message>),
    Inline(bool),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditMessageText {
    #[serde(flatten)]
    pub target: MessageTarget,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_web_page_preview: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyMarkup>,
}

impl EditMessageText {
    pub fn new(target: MessageTarget, text: impl Into<String>) -> Self {
        Self {
            target,
            text: text.into(),
            parse_mode: None,
            disable_web_page_preview: None,
            reply_markup: None,
        }
    }

    pub fn parse_mode(mut self, mode: ParseMode) -> Self {
        self.parse_mode = Some(mode);
        self
    }

    pub fn reply_markup(mut self, markup: ReplyMarkup) -> Self {
        self.reply_markup = Some(markup);
        self
    }
}

impl Method for EditMessageText {
    const NAME: &'static str = "editMessageText";
    type Response = Edited;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditMessageCaption {
    #[serde(flatten)]
    pub target: MessageTarget,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyMarkup>,
}

impl EditMessageCaption {
    pub fn new(target: MessageTarget, caption: impl Into<String>) -> Self {
        Self {
            target,
            caption: Some(caption.into()),
            reply_markup: None,
        }
    }
}

impl Method for EditMessageCaption {
    const NAME: &'static str = "editMessageCaption";
    type Response = Edited;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditMessageReplyMarkup {
    #[serde(flatten)]
    pub target: MessageTarget,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyMarkup>,
}

impl EditMessageReplyMarkup {
    /// `None` removes the inline keyboard.
    pub fn new(target: MessageTarget, reply_markup: Option<ReplyMarkup>) -> Self {
        Self {
            target,
            reply_markup,
        }
    }
}

impl Method for EditMessageReplyMarkup {
    const NAME: &'static str = "editMessageReplyMarkup";
    type Response = Edited;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeleteMessage {
    pub chat_id: ChatId,
    pub message_id: i64,
}

impl DeleteMessage {
    pub fn new(chat_id: impl Into<ChatId>, message_id: i64) -> Self {
        Self {
            chat_id: chat_id.into(),
            message_id,
        }
    }
}

impl Method for DeleteMessage {
    const NAME: &'static str = "deleteMessage";
    type Response = bool;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GetUpdates {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    /// Long-polling timeout in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_updates: Option<Vec<String>>,
}

impl GetUpdates {
    pub fn new(offset: i64) -> Self {
        Self {
            offset: Some(offset),
            ..Self::default()
        }
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn timeout(mut self, seconds: u64) -> Self {
        self.timeout = Some(seconds);
        self
    }
}

impl Method for GetUpdates {
    const NAME: &'static str = "getUpdates";
    type Response = Vec<Update>;
}
