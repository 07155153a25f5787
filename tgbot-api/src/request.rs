//! Turns a [`Method`] record into an [`HttpRequest`].
//!
//! Requests whose file argument carries bytes go out as `multipart/form-data`; everything else is
//! a JSON POST. Multipart text parts keep the record's field order.

use crate::config::ApiConfig;
use crate::methods::Method;
use crate::transport::{FormPart, FormValue, HttpMethod, HttpRequest, RequestBody};
use serde_json::Value;
use tgbot_core::{codec, BotError, InputFile, Result, SchemaError};
use tracing::debug;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Builds the HTTP request for one method call.
pub async fn build_request<M: Method>(config: &ApiConfig, method: &M) -> Result<HttpRequest> {
    let url = config.method_url(M::NAME);

    match method.input_file() {
        Some((field, file)) if file.is_upload() => {
            let parts = multipart_parts(method, field, file).await?;
            debug!(method = M::NAME, parts = parts.len(), "Built multipart request");
            Ok(HttpRequest {
                method: HttpMethod::Post,
                url,
                headers: Vec::new(),
                body: RequestBody::Multipart(parts),
            })
        }
        _ => {
            let body = serde_json::to_vec(method)
                .map_err(|e| SchemaError::mismatch(M::NAME, format!("failed to encode: {e}")))?;
            Ok(HttpRequest {
                method: HttpMethod::Post,
                url,
                headers: vec![("Content-Type".to_string(), "application/json".to_string())],
                body: RequestBody::Json(body),
            })
        }
    }
}

/// Content type for an upload, guessed from the file extension.
pub fn content_type_for(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .first()
        .map(|mime| mime.essence_str().to_string())
        .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string())
}

async fn multipart_parts<M: Method>(method: &M, field: &str, file: &InputFile) -> Result<Vec<FormPart>> {
    let encoded = codec::encode(method)?;
    let fields = codec::as_object(&encoded, M::NAME)?;

    let mut parts = Vec::with_capacity(fields.len());
    for (name, value) in fields {
        if name == field {
            parts.push(file_part(name, file).await?);
            continue;
        }
        let text = match value {
            Value::Null => continue,
            Value::String(s) => s.clone(),
            // Nested values (reply markup, result lists) travel as JSON text.
            other => other.to_string(),
        };
        parts.push(FormPart {
            name: name.clone(),
            value: FormValue::Text(text),
        });
    }
    Ok(parts)
}

async fn file_part(name: &str, file: &InputFile) -> Result<FormPart> {
    let file_name = header_safe(&file.file_name().unwrap_or_else(|| "file".to_string()));
    let data = match file {
        InputFile::Path(path) => tokio::fs::read(path).await.map_err(BotError::Io)?,
        InputFile::Memory { data, .. } => data.clone(),
        InputFile::FileId(_) | InputFile::Url(_) => {
            return Err(SchemaError::mismatch(name, "file reference is not an upload").into())
        }
    };
    Ok(FormPart {
        name: name.to_string(),
        value: FormValue::File {
            content_type: content_type_for(&file_name),
            file_name,
            data,
        },
    })
}

/// Drops control characters so a file name cannot break out of its part header line.
fn header_safe(file_name: &str) -> String {
    file_name.chars().filter(|c| !c.is_control()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::methods::{SendDocument, SendMessage, SendPhoto};
    use std::io::Write;
    use tgbot_core::ReplyMarkup;

    fn config() -> ApiConfig {
        ApiConfig::with_token("123:abc").with_api_url("http://localhost")
    }

    fn parts(request: HttpRequest) -> Vec<FormPart> {
        match request.body {
            RequestBody::Multipart(parts) => parts,
            other => panic!("expected multipart body, got {other:?}"),
        }
    }

    fn text(value: &str) -> FormValue {
        FormValue::Text(value.to_string())
    }

    #[test]
    fn test_content_type_guess() {
        assert_eq!(content_type_for("cat.jpg"), "image/jpeg");
        assert_eq!(content_type_for("notes.pdf"), "application/pdf");
        assert_eq!(content_type_for("blob.xyz123"), "application/octet-stream");
        assert_eq!(content_type_for("no_extension"), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_file_id_goes_as_json() {
        let request = build_request(&config(), &SendPhoto::new(42, InputFile::file_id("AgAD")).caption("c"))
            .await
            .unwrap();

        assert_eq!(request.url, "http://localhost/bot123:abc/sendPhoto");
        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(
            request.body,
            RequestBody::Json(br#"{"chat_id":42,"photo":"AgAD","caption":"c"}"#.to_vec())
        );
    }

    #[tokio::test]
    async fn test_path_upload_is_multipart_in_field_order() {
        let mut file = tempfile::Builder::new().suffix(".jpg").tempfile().unwrap();
        file.write_all(b"\xFF\xD8jpegbytes").unwrap();

        let method = SendPhoto::new(42, InputFile::path(file.path()))
            .caption("look")
            .reply_markup(ReplyMarkup::remove());
        let request = build_request(&config(), &method).await.unwrap();
        assert_eq!(request.header("content-type"), None);

        let parts = parts(request);
        let names: Vec<&str> = parts.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["chat_id", "photo", "caption", "reply_markup"]);
        assert_eq!(parts[0].value, text("42"));
        assert_eq!(parts[2].value, text("look"));
        assert_eq!(parts[3].value, text(r#"{"remove_keyboard":true}"#));
        match &parts[1].value {
            FormValue::File {
                file_name,
                content_type,
                data,
            } => {
                assert!(file_name.ends_with(".jpg"));
                assert_eq!(content_type, "image/jpeg");
                assert_eq!(data, &b"\xFF\xD8jpegbytes".to_vec());
            }
            other => panic!("expected file part, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_memory_upload_unknown_extension() {
        let method = SendDocument::new("@channel", InputFile::memory("dump.xyz123", b"raw".to_vec()));
        let parts = parts(build_request(&config(), &method).await.unwrap());

        assert_eq!(parts[0].value, text("@channel"));
        assert_eq!(
            parts[1].value,
            FormValue::File {
                file_name: "dump.xyz123".to_string(),
                content_type: "application/octet-stream".to_string(),
                data: b"raw".to_vec(),
            }
        );
    }

    #[tokio::test]
    async fn test_file_name_cannot_inject_headers() {
        let name = "evil.txt\"\r\nContent-Type: text/html\r\nX: \"x.jpg";
        let method = SendDocument::new(1, InputFile::memory(name, b"<b>".to_vec()));
        let parts = parts(build_request(&config(), &method).await.unwrap());

        match &parts[1].value {
            FormValue::File {
                file_name,
                content_type,
                ..
            } => {
                assert!(!file_name.contains('\r') && !file_name.contains('\n'));
                assert!(file_name.ends_with("x.jpg"));
                assert_eq!(content_type, "image/jpeg");
            }
            other => panic!("expected file part, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_upload_file_is_io_error() {
        let method = SendPhoto::new(1, InputFile::path("/nonexistent/dir/cat.jpg"));
        let err = build_request(&config(), &method).await.unwrap_err();
        assert!(matches!(err, BotError::Io(_)));
    }

    #[tokio::test]
    async fn test_plain_method_body() {
        let request = build_request(&config(), &SendMessage::new(7, "hi")).await.unwrap();
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.api_method(), "sendMessage");
    }
}
