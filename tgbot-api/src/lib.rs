//! # tgbot-api
//!
//! Telegram Bot API client: one record per method ([`methods`]), the JSON / multipart request
//! builder, an injectable HTTP [`Transport`] and the [`ApiClient`] that ties them together.
//! No polling or dispatch here; see tgbot-runtime.

pub mod methods;

mod client;
mod config;
mod request;
mod transport;

pub use client::ApiClient;
pub use config::{mask_token, ApiConfig, DEFAULT_API_URL};
pub use methods::Method;
pub use request::{build_request, content_type_for};
pub use transport::{
    FormPart, FormValue, HttpMethod, HttpRequest, HttpResponse, ReqwestTransport, RequestBody,
    Transport,
};
