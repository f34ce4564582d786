//! Response resolution and encoding.
//!
//! Turns the outcome of materialization and dispatch into the HTTP response,
//! checks the body against the schema declared for its status, and reports
//! everything collected along the way to the service observer.

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, Response, StatusCode};
use http_body_util::Full;
use oasis_core::{internal_envelope, OasError, Reply, RequestContext};
use oasis_schema::ResponseSchemas;
use oasis_telemetry::{record_request, record_validation_failure};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::service::ServiceSettings;

/// Request header overriding the JSON indent of a single response.
pub const JSON_INDENT_HEADER: &str = "Oas-Json-Indent";

/// Largest indent accepted from [`JSON_INDENT_HEADER`].
pub const MAX_JSON_INDENT: usize = 16;

const APPLICATION_JSON: &str = "application/json";

/// Reads the per-request indent override, if present and numeric.
pub(crate) fn indent_override(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(JSON_INDENT_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<usize>().ok())
        .map(|indent| indent.min(MAX_JSON_INDENT))
}

/// Encodes `value` compactly, or pretty-printed with `indent` spaces.
pub(crate) fn encode_json(value: &Value, indent: usize) -> serde_json::Result<Vec<u8>> {
    if indent == 0 {
        return serde_json::to_vec(value);
    }
    let pad = " ".repeat(indent);
    let mut out = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(pad.as_bytes()));
    value.serialize(&mut serializer)?;
    Ok(out)
}

/// Builds the HTTP response for one request and notifies the observer.
pub(crate) fn resolve(
    ctx: &mut RequestContext,
    outcome: Result<Reply, OasError>,
    response_schemas: &ResponseSchemas,
    settings: &ServiceSettings,
    indent: usize,
) -> Response<Full<Bytes>> {
    let mut errors = Vec::new();

    let mut reply = match outcome {
        Ok(reply) if reply.is_ignored() => return raw_response(ctx),
        Ok(reply) => reply,
        Err(err) => {
            if err.is_client_error() {
                record_validation_failure(err.kind_name());
            }
            let reply = Reply::json(err.status_code().as_u16(), err.to_body());
            errors.push(err);
            reply
        }
    };

    let mut status = match StatusCode::from_u16(reply.resolved_status()) {
        Ok(status) => status,
        Err(_) => {
            let err = OasError::internal(format!("invalid status code {}", reply.resolved_status()));
            reply.set_body(err.to_body());
            errors.push(err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    // a body serializing to `null` is the same as no body
    let body = match reply.body_json() {
        None | Some(Ok(Value::Null)) => None,
        Some(Ok(value)) => {
            if let Some(schema) = response_schemas.get(status.as_u16()) {
                if let Err(violations) = schema.validate(&value) {
                    record_validation_failure("response");
                    errors.push(OasError::ResponseValidation {
                        status: status.as_u16(),
                        errors: violations,
                    });
                }
            }
            match encode_json(&value, indent) {
                Ok(bytes) => Some(bytes),
                Err(err) => Some(serialization_failure(&mut reply, &mut status, &mut errors, &err)),
            }
        }
        Some(Err(err)) => Some(serialization_failure(&mut reply, &mut status, &mut errors, &err)),
    };
    reply.set_status(status.as_u16());

    let mut builder = Response::builder().status(status);
    if let Some(headers) = builder.headers_mut() {
        for (name, value) in reply.headers() {
            headers.append(name, value.clone());
        }
        if body.is_some() && !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        }
    }
    let response = builder
        .body(Full::new(body.map(Bytes::from).unwrap_or_default()))
        .unwrap_or_else(|_| {
            let mut fallback = Response::new(Full::new(Bytes::new()));
            *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            fallback
        });

    report(ctx, &reply, &errors, settings);
    record_request(&ctx.endpoint().operation_id, response.status().as_u16(), ctx.elapsed());
    response
}

/// Replaces the reply with the generic envelope after the body failed to encode.
fn serialization_failure(
    reply: &mut Reply,
    status: &mut StatusCode,
    errors: &mut Vec<OasError>,
    err: &serde_json::Error,
) -> Vec<u8> {
    let failure = OasError::internal(format!("failed to serialize response body: {err}"));
    let envelope = internal_envelope(&failure.to_string());
    let bytes = serde_json::to_vec(&envelope).unwrap_or_default();
    reply.set_body(envelope);
    *status = StatusCode::INTERNAL_SERVER_ERROR;
    errors.push(failure);
    bytes
}

/// Emits what the handler wrote through the context's writer, unchanged.
fn raw_response(ctx: &mut RequestContext) -> Response<Full<Bytes>> {
    let (status, headers, body) = ctx.writer_mut().take();
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;

    record_request(&ctx.endpoint().operation_id, status.as_u16(), ctx.elapsed());
    response
}

/// Hands the collected errors to the observer, or logs them.
fn report(ctx: &RequestContext, reply: &Reply, errors: &[OasError], settings: &ServiceSettings) {
    let operation_id = ctx.endpoint().operation_id.as_str();
    let request_id = ctx.request_id();

    for err in errors {
        if let OasError::Internal { source, .. } = err {
            error!(
                operation_id,
                request_id = %request_id,
                error = %err,
                cause = ?source,
                "internal error"
            );
        }
    }

    if let Some(observer) = settings.observer() {
        observer(ctx, reply, errors);
        return;
    }

    for err in errors {
        match err {
            OasError::ResponseValidation { status, .. } => warn!(
                operation_id,
                request_id = %request_id,
                http.status_code = status,
                error = %err,
                "response does not match its schema"
            ),
            err if err.is_client_error() => debug!(
                operation_id,
                request_id = %request_id,
                error = %err,
                "request rejected"
            ),
            // panics are logged by the dispatcher, internal errors above
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_indent_override() {
        let mut headers = HeaderMap::new();
        assert_eq!(indent_override(&headers), None);

        headers.insert(JSON_INDENT_HEADER, HeaderValue::from_static(" 4 "));
        assert_eq!(indent_override(&headers), Some(4));

        headers.insert(JSON_INDENT_HEADER, HeaderValue::from_static("1000"));
        assert_eq!(indent_override(&headers), Some(MAX_JSON_INDENT));

        headers.insert(JSON_INDENT_HEADER, HeaderValue::from_static("wide"));
        assert_eq!(indent_override(&headers), None);
    }

    #[test]
    fn test_encode_json() {
        let value = json!({"a": [1]});
        assert_eq!(encode_json(&value, 0).unwrap(), br#"{"a":[1]}"#);
        assert_eq!(
            String::from_utf8(encode_json(&value, 2).unwrap()).unwrap(),
            "{\n  \"a\": [\n    1\n  ]\n}"
        );
    }
}
