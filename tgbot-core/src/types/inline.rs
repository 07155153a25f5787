//! Inline mode and callback queries: incoming queries plus the results a bot answers with.

use serde::{Deserialize, Serialize};

use super::{Location, Message, ParseMode, ReplyMarkup, User};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineQuery {
    pub id: String,
    pub from: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    pub query: String,
    pub offset: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChosenInlineResult {
    pub result_id: String,
    pub from: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_message_id: Option<String>,
    pub query: String,
}

/// A press on an inline keyboard button.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_instance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_short_name: Option<String>,
}

/// Content sent when an inline result is picked, instead of the result's own media.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InputMessageContent {
    Text {
        message_text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        parse_mode: Option<ParseMode>,
        #[serde(skip_serializing_if = "Option::is_none")]
        disable_web_page_preview: Option<bool>,
    },
    Location {
        latitude: f64,
        longitude: f64,
    },
    Venue {
        latitude: f64,
        longitude: f64,
        title: String,
        address: String,
    },
    Contact {
        phone_number: String,
        first_name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        last_name: Option<String>,
    },
}

impl InputMessageContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            message_text: text.into(),
            parse_mode: None,
            disable_web_page_preview: None,
        }
    }
}

/// One entry of an `answerInlineQuery` result list. Outgoing only.
///
/// The `Cached*` variants reuse a file already on the server and share the wire `type` of their
/// URL-based counterparts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InlineQueryResult {
    Article {
        id: String,
        title: String,
        input_message_content: InputMessageContent,
        #[serde(skip_serializing_if = "Option::is_none")]
        reply_markup: Option<ReplyMarkup>,
        #[serde(skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        thumbnail_url: Option<String>,
    },
    Photo {
        id: String,
        photo_url: String,
        thumbnail_url: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
    },
    Gif {
        id: String,
        gif_url: String,
        thumbnail_url: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
    },
    Video {
        id: String,
        video_url: String,
        mime_type: String,
        thumbnail_url: String,
        title: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    Audio {
        id: String,
        audio_url: String,
        title: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        performer: Option<String>,
    },
    Document {
        id: String,
        title: String,
        document_url: String,
        mime_type: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    Location {
        id: String,
        latitude: f64,
        longitude: f64,
        title: String,
    },
    #[serde(rename = "photo")]
    CachedPhoto {
        id: String,
        photo_file_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
    },
    #[serde(rename = "sticker")]
    CachedSticker { id: String, sticker_file_id: String },
    #[serde(rename = "document")]
    CachedDocument {
        id: String,
        title: String,
        document_file_id: String,
    },
}

impl InlineQueryResult {
    /// Plain text article, the most common inline answer.
    pub fn article(id: impl Into<String>, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Article {
            id: id.into(),
            title: title.into(),
            input_message_content: InputMessageContent::text(text),
            reply_markup: None,
            url: None,
            description: None,
            thumbnail_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_article_wire_shape() {
        let result = InlineQueryResult::article("1", "Echo", "hello");
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "type": "article",
                "id": "1",
                "title": "Echo",
                "input_message_content": {"message_text": "hello"}
            })
        );
    }

    #[test]
    fn test_cached_variants_share_wire_type() {
        let result = InlineQueryResult::CachedSticker {
            id: "s".to_string(),
            sticker_file_id: "CAAD".to_string(),
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["type"], "sticker");
        assert_eq!(value["sticker_file_id"], "CAAD");
    }
}
