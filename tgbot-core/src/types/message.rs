//! Incoming message record and the service events a message can carry.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::{Audio, Chat, Contact, Document, Location, PhotoSize, Sticker, User, Venue, Video, Voice};

/// Formatting span inside `text` or `caption` (command, mention, url, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEntity {
    #[serde(rename = "type")]
    pub kind: String,
    pub offset: i64,
    pub length: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<User>,
    pub date: i64,
    pub chat: Chat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forward_from: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forward_from_chat: Option<Chat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forward_date: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_message: Option<Box<Message>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit_date: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<MessageEntity>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<Audio>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<Document>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<Vec<PhotoSize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sticker: Option<Sticker>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<Video>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<Voice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<Venue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_chat_members: Option<Vec<User>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_chat_member: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_chat_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_chat_photo: Option<Vec<PhotoSize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_chat_photo: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_chat_created: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supergroup_chat_created: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_chat_created: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migrate_to_chat_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migrate_from_chat_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned_message: Option<Box<Message>>,
}

/// Chat-membership and other service notifications a message may carry instead of content.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    NewChatMembers(Vec<User>),
    LeftChatMember(User),
    NewChatTitle(String),
    NewChatPhoto(Vec<PhotoSize>),
    DeleteChatPhoto,
    GroupChatCreated,
    SupergroupChatCreated,
    ChannelChatCreated,
    MigrateToChatId(i64),
    MigrateFromChatId(i64),
    PinnedMessage(Box<Message>),
}

impl Message {
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn chat_id(&self) -> i64 {
        self.chat.id
    }

    pub fn sender_id(&self) -> Option<i64> {
        self.from.as_ref().map(|u| u.id)
    }

    /// True when the text starts with `/`.
    pub fn is_command(&self) -> bool {
        self.text().is_some_and(|t| t.starts_with('/'))
    }

    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.date, 0).single()
    }

    /// The service event this message carries, if any.
    pub fn chat_event(&self) -> Option<ChatEvent> {
        if let Some(users) = &self.new_chat_members {
            return Some(ChatEvent::NewChatMembers(users.clone()));
        }
        if let Some(user) = &self.left_chat_member {
            return Some(ChatEvent::LeftChatMember(user.clone()));
        }
        if let Some(title) = &self.new_chat_title {
            return Some(ChatEvent::NewChatTitle(title.clone()));
        }
        if let Some(photo) = &self.new_chat_photo {
            return Some(ChatEvent::NewChatPhoto(photo.clone()));
        }
        if self.delete_chat_photo == Some(true) {
            return Some(ChatEvent::DeleteChatPhoto);
        }
        if self.group_chat_created == Some(true) {
            return Some(ChatEvent::GroupChatCreated);
        }
        if self.supergroup_chat_created == Some(true) {
            return Some(ChatEvent::SupergroupChatCreated);
        }
        if self.channel_chat_created == Some(true) {
            return Some(ChatEvent::ChannelChatCreated);
        }
        if let Some(id) = self.migrate_to_chat_id {
            return Some(ChatEvent::MigrateToChatId(id));
        }
        if let Some(id) = self.migrate_from_chat_id {
            return Some(ChatEvent::MigrateFromChatId(id));
        }
        self.pinned_message
            .as_ref()
            .map(|m| ChatEvent::PinnedMessage(m.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode, encode};
    use serde_json::json;

    fn full_message() -> Message {
        Message {
            message_id: 10,
            from: Some(User {
                id: 42,
                is_bot: false,
                first_name: "Ada".to_string(),
                last_name: Some("Lovelace".to_string()),
                username: Some("ada".to_string()),
                language_code: Some("en".to_string()),
            }),
            date: 1_706_529_600,
            chat: Chat {
                id: -100,
                kind: super::super::ChatType::Supergroup,
                title: Some("Engines".to_string()),
                ..Default::default()
            },
            edit_date: Some(1_706_529_700),
            text: Some("/say_hi there".to_string()),
            entities: Some(vec![MessageEntity {
                kind: "bot_command".to_string(),
                offset: 0,
                length: 7,
                url: None,
                user: None,
            }]),
            photo: Some(vec![PhotoSize {
                file_id: "AgAD".to_string(),
                file_unique_id: Some("u1".to_string()),
                width: 90,
                height: 90,
                file_size: Some(1024),
            }]),
            location: Some(Location {
                longitude: 2.35,
                latitude: 48.85,
            }),
            reply_to_message: Some(Box::new(Message {
                message_id: 9,
                date: 1_706_529_500,
                chat: Chat {
                    id: -100,
                    kind: super::super::ChatType::Supergroup,
                    ..Default::default()
                },
                text: Some("earlier".to_string()),
                ..Default::default()
            })),
            ..Default::default()
        }
    }

    #[test]
    fn test_full_message_round_trip() {
        let message = full_message();
        let encoded = encode(&message).unwrap();
        let decoded: Message = decode(&encoded, "message").unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn test_partial_message_round_trip_has_no_spurious_fields() {
        let raw = json!({
            "message_id": 1,
            "date": 1706529600,
            "chat": {"id": 7, "type": "private"},
            "text": "hello"
        });
        let message: Message = decode(&raw, "message").unwrap();
        assert_eq!(message.text(), Some("hello"));
        assert!(message.from.is_none());

        let encoded = encode(&message).unwrap();
        assert_eq!(encoded, raw);
    }

    #[test]
    fn test_missing_required_field_is_schema_error() {
        let raw = json!({"date": 1, "chat": {"id": 7, "type": "private"}});
        let err = decode::<Message>(&raw, "message").unwrap_err();
        assert_eq!(err.field, "message");
        assert!(err.reason.contains("message_id"));
    }

    #[test]
    fn test_chat_event_classification() {
        let mut message = full_message();
        assert_eq!(message.chat_event(), None);

        message.left_chat_member = Some(User {
            id: 7,
            first_name: "Bob".to_string(),
            ..Default::default()
        });
        assert!(matches!(message.chat_event(), Some(ChatEvent::LeftChatMember(u)) if u.id == 7));

        let created = Message {
            group_chat_created: Some(true),
            ..Default::default()
        };
        assert_eq!(created.chat_event(), Some(ChatEvent::GroupChatCreated));
    }

    #[test]
    fn test_is_command_and_sent_at() {
        let message = full_message();
        assert!(message.is_command());
        assert_eq!(message.sender_id(), Some(42));
        assert_eq!(message.sent_at().unwrap().timestamp(), 1_706_529_600);
    }
}
