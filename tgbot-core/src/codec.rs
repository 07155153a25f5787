//! Wire codec: JSON <-> records, field extraction, and the `{ok, result | description}` envelope.
//!
//! Records derive serde; the helpers here are for hand-written decoders that need to report the
//! offending field (the [`Update`](crate::types::Update) union and the envelope itself).

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{ApiError, ApiResult, ResponseParameters, SchemaError};

/// Views `value` as a JSON object; `what` names the record for the error.
pub fn as_object<'a>(value: &'a Value, what: &str) -> Result<&'a Map<String, Value>, SchemaError> {
    value
        .as_object()
        .ok_or_else(|| SchemaError::mismatch(what, format!("expected object, got {}", kind_of(value))))
}

/// Required field: absent or `null` fails, wrong JSON type fails.
pub fn required<T: DeserializeOwned>(obj: &Map<String, Value>, field: &str) -> Result<T, SchemaError> {
    match obj.get(field) {
        None | Some(Value::Null) => Err(SchemaError::missing(field)),
        Some(value) => convert(value, field),
    }
}

/// Optional field: absent or `null` is `None`, wrong JSON type still fails.
pub fn optional<T: DeserializeOwned>(
    obj: &Map<String, Value>,
    field: &str,
) -> Result<Option<T>, SchemaError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => convert(value, field).map(Some),
    }
}

fn convert<T: DeserializeOwned>(value: &Value, field: &str) -> Result<T, SchemaError> {
    T::deserialize(value).map_err(|e| SchemaError::mismatch(field, e))
}

/// Decodes a whole record. Nested records decode through their own `Deserialize` impls.
pub fn decode<T: DeserializeOwned>(value: &Value, what: &str) -> Result<T, SchemaError> {
    T::deserialize(value).map_err(|e| SchemaError::mismatch(what, e))
}

/// Encodes a record to JSON. Absent optional fields are omitted, never written as `null`.
pub fn encode<T: Serialize>(record: &T) -> Result<Value, SchemaError> {
    serde_json::to_value(record).map_err(|e| SchemaError::mismatch("<encode>", e))
}

/// Decodes a raw response body.
///
/// `ok: true` yields `Ok(Ok(result))`, `ok: false` yields `Ok(Err(ApiError))`; a body that is not
/// an envelope, or a `result` that does not decode as `T`, is a [`SchemaError`].
pub fn decode_envelope<T: DeserializeOwned>(body: &[u8]) -> Result<ApiResult<T>, SchemaError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| SchemaError::mismatch("<response>", format!("invalid JSON: {e}")))?;
    let obj = as_object(&value, "<response>")?;

    let ok: bool = required(obj, "ok")?;
    if ok {
        let result = obj.get("result").ok_or_else(|| SchemaError::missing("result"))?;
        let decoded = convert(result, "result")?;
        return Ok(Ok(decoded));
    }

    let description: Option<String> = optional(obj, "description")?;
    let error_code: Option<i64> = optional(obj, "error_code")?;
    let parameters: Option<ResponseParameters> = optional(obj, "parameters")?;
    Ok(Err(ApiError {
        description: description.unwrap_or_else(|| "unknown error".to_string()),
        error_code,
        parameters,
    }))
}

/// Builds the envelope the server would send for `result`. Used by tests and mock transports.
pub fn encode_envelope<T: Serialize>(result: &ApiResult<T>) -> Result<Value, SchemaError> {
    let mut obj = Map::new();
    match result {
        Ok(value) => {
            obj.insert("ok".to_string(), Value::Bool(true));
            obj.insert("result".to_string(), encode(value)?);
        }
        Err(err) => {
            obj.insert("ok".to_string(), Value::Bool(false));
            obj.insert("description".to_string(), Value::String(err.description.clone()));
            if let Some(code) = err.error_code {
                obj.insert("error_code".to_string(), Value::from(code));
            }
            if let Some(parameters) = &err.parameters {
                obj.insert("parameters".to_string(), encode(parameters)?);
            }
        }
    }
    Ok(Value::Object(obj))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
