//! # tgbot-core
//!
//! Telegram Bot API records ([`Message`], [`Update`], [`User`], ...), the wire [`codec`]
//! (field extraction and the `{ok, result | description}` envelope), the error taxonomy and
//! tracing initialisation. Transport-agnostic; used by tgbot-api and tgbot-runtime.

pub mod codec;
pub mod error;
pub mod logger;
pub mod types;

pub use error::{ApiError, ApiResult, BotError, ResponseParameters, Result, SchemaError, NO_UPDATES};
pub use logger::init_tracing;
pub use types::*;
