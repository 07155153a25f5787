//! Parameter types that only appear in outgoing requests.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;

/// Target chat: numeric id or `@channelusername`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatId {
    Id(i64),
    Username(String),
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for ChatId {
    fn from(username: &str) -> Self {
        Self::Username(username.to_string())
    }
}

impl From<String> for ChatId {
    fn from(username: String) -> Self {
        Self::Username(username)
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Username(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseMode {
    Markdown,
    MarkdownV2,
    #[serde(rename = "HTML")]
    Html,
}

/// Status shown in the chat header while the bot prepares a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatAction {
    Typing,
    UploadPhoto,
    RecordVideo,
    UploadVideo,
    RecordVoice,
    UploadVoice,
    UploadDocument,
    ChooseSticker,
    FindLocation,
}

/// A file argument of a send method.
///
/// `FileId` and `Url` are references the server resolves itself and travel in a JSON body.
/// `Path` and `Memory` carry bytes and force a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputFile {
    FileId(String),
    Url(String),
    Path(PathBuf),
    Memory { file_name: String, data: Vec<u8> },
}

impl InputFile {
    pub fn file_id(id: impl Into<String>) -> Self {
        Self::FileId(id.into())
    }

    pub fn url(url: impl Into<String>) -> Self {
        Self::Url(url.into())
    }

    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    pub fn memory(file_name: impl Into<String>, data: Vec<u8>) -> Self {
        Self::Memory {
            file_name: file_name.into(),
            data,
        }
    }

    pub fn is_upload(&self) -> bool {
        matches!(self, Self::Path(_) | Self::Memory { .. })
    }

    /// Name reported in the multipart part; `None` for server-side references.
    pub fn file_name(&self) -> Option<String> {
        match self {
            Self::Path(path) => Some(
                path.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "file".to_string()),
            ),
            Self::Memory { file_name, .. } => Some(file_name.clone()),
            Self::FileId(_) | Self::Url(_) => None,
        }
    }
}

impl Serialize for InputFile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::FileId(value) | Self::Url(value) => serializer.serialize_str(value),
            // Replaced by a binary part when the request is encoded as multipart.
            Self::Path(_) | Self::Memory { .. } => {
                let name = self.file_name().unwrap_or_default();
                serializer.serialize_str(&format!("attach://{name}"))
            }
        }
    }
}
