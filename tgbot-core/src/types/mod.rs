//! Telegram Bot API records. Incoming records derive both serde directions so they round-trip;
//! outgoing-only records (inline results, input content) only serialize.

mod chat;
mod inline;
mod input;
mod keyboard;
mod media;
mod message;
mod update;
mod user;

pub use chat::{Chat, ChatMember, ChatMemberStatus, ChatType};
pub use inline::{CallbackQuery, ChosenInlineResult, InlineQuery, InlineQueryResult, InputMessageContent};
pub use input::{ChatAction, ChatId, InputFile, ParseMode};
pub use keyboard::{
    ForceReply, InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, ReplyKeyboardMarkup,
    ReplyKeyboardRemove, ReplyMarkup,
};
pub use media::{
    Audio, Contact, Document, File, Location, PhotoSize, Sticker, UserProfilePhotos, Venue, Video,
    Voice,
};
pub use message::{ChatEvent, Message, MessageEntity};
pub use update::{Update, UpdateKind};
pub use user::User;
