use crate::config::{mask_token, ApiConfig};
use crate::methods::Method;
use crate::request::build_request;
use crate::transport::{HttpRequest, ReqwestTransport, Transport};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tgbot_core::codec::decode_envelope;
use tgbot_core::{ApiError, ApiResult, File, Result};
use tracing::{debug, info, instrument};

/// Bot API client: builds the request for a method, sends it through a [`Transport`] and decodes
/// the `{ok, result | description}` envelope.
///
/// `Ok(Err(ApiError))` means the server refused the call; `Err(BotError)` means no usable answer
/// was obtained at all.
#[derive(Clone)]
pub struct ApiClient {
    config: ApiConfig,
    transport: Arc<dyn Transport>,
}

impl ApiClient {
    /// Client over reqwest with the configured timeout.
    pub fn new(config: ApiConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config.request_timeout)?;
        info!(
            api_url = %config.api_url,
            token = %mask_token(&config.bot_token),
            "Bot API client ready"
        );
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(config: ApiConfig, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Calls `M` and decodes its declared response type.
    pub async fn call<M: Method>(&self, method: &M) -> Result<ApiResult<M::Response>> {
        self.request(method).await
    }

    /// Calls `M` but decodes `result` as `R`. The poller uses this to read raw update objects
    /// before decoding them one by one.
    #[instrument(skip(self, method), fields(method = M::NAME))]
    pub async fn request<M: Method, R: DeserializeOwned>(&self, method: &M) -> Result<ApiResult<R>> {
        let request = build_request(&self.config, method).await?;
        debug!(bytes = request.body.len(), "Sending request");
        let response = self.transport.send(request).await?;

        match decode_envelope::<R>(&response.body) {
            Ok(result) => {
                if let Err(err) = &result {
                    debug!(status = response.status, error = %err, "API refused call");
                }
                Ok(result)
            }
            // Proxies and gateways answer errors with non-envelope bodies.
            Err(_) if !(200..300).contains(&response.status) => Ok(Err(http_status_error(response.status))),
            Err(err) => Err(err.into()),
        }
    }

    /// Downloads the contents of a file returned by `getFile`.
    #[instrument(skip(self, file), fields(file_id = %file.file_id))]
    pub async fn download_file(&self, file: &File) -> Result<ApiResult<Vec<u8>>> {
        let Some(path) = file.file_path.as_deref() else {
            return Ok(Err(ApiError::new("file has no file_path; call getFile first")));
        };
        let response = self.transport.send(HttpRequest::get(self.config.file_url(path))).await?;
        if !(200..300).contains(&response.status) {
            return Ok(Err(http_status_error(response.status)));
        }
        debug!(bytes = response.body.len(), "Downloaded file");
        Ok(Ok(response.body))
    }
}

fn http_status_error(status: u16) -> ApiError {
    ApiError {
        description: format!("HTTP status {status}"),
        error_code: Some(i64::from(status)),
        parameters: None,
    }
}
