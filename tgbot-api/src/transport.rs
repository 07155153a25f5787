//! HTTP collaborator. The client only needs `request(method, url, headers, body) -> (status, body)`;
//! [`ReqwestTransport`] is the production implementation, tests substitute their own.

use async_trait::async_trait;
use reqwest::multipart;
use std::time::Duration;
use tgbot_core::{BotError, Result, SchemaError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Body of an outgoing request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Vec<u8>),
    /// `multipart/form-data` fields in send order. The transport owns the encoding and boundary.
    Multipart(Vec<FormPart>),
}

impl RequestBody {
    /// Payload size in bytes, without multipart framing.
    pub fn len(&self) -> usize {
        match self {
            RequestBody::Empty => 0,
            RequestBody::Json(bytes) => bytes.len(),
            RequestBody::Multipart(parts) => parts.iter().map(|p| p.value.len()).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPart {
    pub name: String,
    pub value: FormValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    File {
        file_name: String,
        content_type: String,
        data: Vec<u8>,
    },
}

impl FormValue {
    fn len(&self) -> usize {
        match self {
            FormValue::Text(text) => text.len(),
            FormValue::File { data, .. } => data.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Last path segment of the URL, i.e. the API method name.
    pub fn api_method(&self) -> &str {
        self.url.rsplit('/').next().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs one exchange. Non-2xx statuses are not errors here; only failing to talk to the
    /// server is.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// reqwest-backed transport (rustls).
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BotError::Transport(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(bytes) => builder.body(bytes),
            RequestBody::Multipart(parts) => builder.multipart(into_form(parts)?),
        };

        // reqwest errors embed the URL, which embeds the token.
        let response = builder
            .send()
            .await
            .map_err(|e| BotError::Transport(e.without_url().to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| BotError::Transport(e.without_url().to_string()))?;

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}

fn into_form(parts: Vec<FormPart>) -> Result<multipart::Form> {
    parts.into_iter().try_fold(multipart::Form::new(), |form, part| {
        let field = match part.value {
            FormValue::Text(text) => multipart::Part::text(text),
            FormValue::File {
                file_name,
                content_type,
                data,
            } => multipart::Part::bytes(data)
                .file_name(file_name)
                .mime_str(&content_type)
                .map_err(|e| SchemaError::mismatch(&part.name, format!("bad content type: {e}")))?,
        };
        Ok(form.part(part.name, field))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_method_from_url() {
        let request = HttpRequest::get("https://api.telegram.org/bot1:x/getUpdates");
        assert_eq!(request.api_method(), "getUpdates");
    }

    #[tokio::test]
    async fn test_reqwest_transport_round_trip() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/botT/sendMessage")
            .match_header("content-type", "application/json")
            .match_body(r#"{"chat_id":1,"text":"hi"}"#)
            .with_status(200)
            .with_body(r#"{"ok":true,"result":true}"#)
            .create_async()
            .await;

        let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();
        let response = transport
            .send(HttpRequest {
                method: HttpMethod::Post,
                url: format!("{}/botT/sendMessage", server.url()),
                headers: vec![("Content-Type".to_string(), "application/json".to_string())],
                body: RequestBody::Json(br#"{"chat_id":1,"text":"hi"}"#.to_vec()),
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.status, 200);
        assert_eq!(response.body, br#"{"ok":true,"result":true}"#.to_vec());
    }

    #[tokio::test]
    async fn test_multipart_form_round_trip() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/botT/sendDocument")
            .match_header(
                "content-type",
                mockito::Matcher::Regex("^multipart/form-data; boundary=".to_string()),
            )
            .match_body(mockito::Matcher::Regex(
                r#"(?s)name="chat_id"\r\n\r\n7\r\n.*name="document"; filename="a.txt"\r\nContent-Type: text/plain\r\n\r\nhello\r\n"#
                    .to_string(),
            ))
            .with_status(200)
            .with_body(r#"{"ok":true,"result":true}"#)
            .create_async()
            .await;

        let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();
        let body = RequestBody::Multipart(vec![
            FormPart {
                name: "chat_id".to_string(),
                value: FormValue::Text("7".to_string()),
            },
            FormPart {
                name: "document".to_string(),
                value: FormValue::File {
                    file_name: "a.txt".to_string(),
                    content_type: "text/plain".to_string(),
                    data: b"hello".to_vec(),
                },
            },
        ]);
        assert_eq!(body.len(), 6);
        let response = transport
            .send(HttpRequest {
                method: HttpMethod::Post,
                url: format!("{}/botT/sendDocument", server.url()),
                headers: Vec::new(),
                body,
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.status, 200);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let transport = ReqwestTransport::new(Duration::from_secs(2)).unwrap();
        let err = transport
            .send(HttpRequest::get("http://127.0.0.1:1/botT/getMe"))
            .await
            .unwrap_err();
        assert!(matches!(err, BotError::Transport(_)));
    }
}
