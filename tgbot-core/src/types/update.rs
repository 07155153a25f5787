//! `Update`: one event from `getUpdates`, carrying exactly one payload.

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{CallbackQuery, ChosenInlineResult, InlineQuery, Message};
use crate::codec::{as_object, required};
use crate::error::SchemaError;

#[derive(Debug, Clone, PartialEq)]
pub enum UpdateKind {
    Message(Message),
    EditedMessage(Message),
    ChannelPost(Message),
    EditedChannelPost(Message),
    InlineQuery(InlineQuery),
    ChosenInlineResult(ChosenInlineResult),
    CallbackQuery(CallbackQuery),
    /// A payload key this library does not model (polls, reactions, ...), kept raw.
    Unsupported { kind: String, payload: Value },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub id: i64,
    pub kind: UpdateKind,
}

const PAYLOAD_KEYS: [&str; 7] = [
    "message",
    "edited_message",
    "channel_post",
    "edited_channel_post",
    "inline_query",
    "chosen_inline_result",
    "callback_query",
];

impl UpdateKind {
    /// Wire key of the payload.
    pub fn key(&self) -> &str {
        match self {
            Self::Message(_) => "message",
            Self::EditedMessage(_) => "edited_message",
            Self::ChannelPost(_) => "channel_post",
            Self::EditedChannelPost(_) => "edited_channel_post",
            Self::InlineQuery(_) => "inline_query",
            Self::ChosenInlineResult(_) => "chosen_inline_result",
            Self::CallbackQuery(_) => "callback_query",
            Self::Unsupported { kind, .. } => kind,
        }
    }
}

impl Update {
    /// Decodes one update object.
    ///
    /// More than one recognised payload key is rejected rather than silently picking one.
    pub fn from_json(value: &Value) -> Result<Self, SchemaError> {
        let obj = as_object(value, "update")?;
        let id: i64 = required(obj, "update_id")?;

        let present: Vec<&str> = PAYLOAD_KEYS
            .iter()
            .copied()
            .filter(|key| obj.get(*key).is_some_and(|v| !v.is_null()))
            .collect();

        let kind = match present.as_slice() {
            [] => unsupported(obj)?,
            [key] => decode_kind(obj, key)?,
            keys => {
                return Err(SchemaError::mismatch(
                    "update",
                    format!("update {id} carries more than one payload: {}", keys.join(", ")),
                ))
            }
        };
        Ok(Self { id, kind })
    }

    pub fn message(&self) -> Option<&Message> {
        match &self.kind {
            UpdateKind::Message(m)
            | UpdateKind::EditedMessage(m)
            | UpdateKind::ChannelPost(m)
            | UpdateKind::EditedChannelPost(m) => Some(m),
            _ => None,
        }
    }
}

fn decode_kind(obj: &Map<String, Value>, key: &str) -> Result<UpdateKind, SchemaError> {
    Ok(match key {
        "message" => UpdateKind::Message(required(obj, key)?),
        "edited_message" => UpdateKind::EditedMessage(required(obj, key)?),
        "channel_post" => UpdateKind::ChannelPost(required(obj, key)?),
        "edited_channel_post" => UpdateKind::EditedChannelPost(required(obj, key)?),
        "inline_query" => UpdateKind::InlineQuery(required(obj, key)?),
        "chosen_inline_result" => UpdateKind::ChosenInlineResult(required(obj, key)?),
        "callback_query" => UpdateKind::CallbackQuery(required(obj, key)?),
        other => return Err(SchemaError::mismatch("update", format!("unknown payload {other}"))),
    })
}

fn unsupported(obj: &Map<String, Value>) -> Result<UpdateKind, SchemaError> {
    obj.iter()
        .find(|(key, value)| key.as_str() != "update_id" && !value.is_null())
        .map(|(key, value)| UpdateKind::Unsupported {
            kind: key.clone(),
            payload: value.clone(),
        })
        .ok_or_else(|| SchemaError::mismatch("update", "update carries no payload"))
}

impl<'de> Deserialize<'de> for Update {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Update::from_json(&value).map_err(de::Error::custom)
    }
}

impl Serialize for Update {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("update_id", &self.id)?;
        match &self.kind {
            UpdateKind::Message(m)
            | UpdateKind::EditedMessage(m)
            | UpdateKind::ChannelPost(m)
            | UpdateKind::EditedChannelPost(m) => map.serialize_entry(self.kind.key(), m)?,
            UpdateKind::InlineQuery(q) => map.serialize_entry(self.kind.key(), q)?,
            UpdateKind::ChosenInlineResult(r) => map.serialize_entry(self.kind.key(), r)?,
            UpdateKind::CallbackQuery(q) => map.serialize_entry(self.kind.key(), q)?,
            UpdateKind::Unsupported { kind, payload } => map.serialize_entry(kind, payload)?,
        }
        map.end()
    }
}
