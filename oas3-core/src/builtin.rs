//! Built-in Endpoints (§4.5): `oas3.model` and `oas3.console`. These are bound
//! with `Mapper::handle_func` the same way application code binds its own
//! operations — the OpenAPI document must declare them under those two
//! operation ids for them to be reachable.

use axum::body::Body;
use axum::extract::Request;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};

use crate::error::MediaError;
use crate::model::Document;

/// Negotiates on the *request's* `Content-type` header, not `Accept` —
/// preserved from the source this kernel follows even though `Accept` would
/// be the idiomatic choice (SPEC_FULL.md §9 "Content-type split").
pub async fn model(doc: Document, req: Request) -> Response {
    let content_types = get_content_types(req.headers());

    if content_types.iter().any(|ct| ct.essence_str() == "application/json") {
        return match serde_json::to_vec(doc.as_json()) {
            Ok(body) => respond(body, "application/json; charset=utf-8"),
            Err(e) => MediaError::Render(anyhow::Error::new(e)).into_response(),
        };
    }

    if content_types.iter().any(|ct| ct.essence_str() == "application/yaml") {
        return match doc.to_yaml() {
            Ok(body) => respond(body.into_bytes(), "application/yaml; charset=utf-8"),
            Err(e) => MediaError::Render(anyhow::Error::new(e)).into_response(),
        };
    }

    let requested = content_types
        .iter()
        .map(|ct| ct.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    MediaError::Unsupported(requested).into_response()
}

/// Always renders YAML under `text/plain`, regardless of the request's
/// `Content-type`.
pub async fn console(doc: Document) -> Response {
    match doc.to_yaml() {
        Ok(body) => respond(body.into_bytes(), "text/plain; charset=utf-8"),
        Err(e) => MediaError::Render(anyhow::Error::new(e)).into_response(),
    }
}

fn respond(body: Vec<u8>, content_type: &'static str) -> Response {
    Response::builder()
        .header(CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .expect("static header name/value is always a valid response")
}

/// Comma-splits the `Content-type` header and MIME-parses each candidate;
/// defaults to `application/octet-stream` if the header is absent.
fn get_content_types(headers: &http::HeaderMap) -> Vec<mime::Mime> {
    let Some(raw) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return vec![mime::APPLICATION_OCTET_STREAM];
    };
    raw.split(',')
        .filter_map(|s| s.trim().parse::<mime::Mime>().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_octet_stream_when_header_absent() {
        let headers = http::HeaderMap::new();
        let types = get_content_types(&headers);
        assert_eq!(types, vec![mime::APPLICATION_OCTET_STREAM]);
    }

    #[test]
    fn splits_comma_separated_content_types() {
        let mut headers = http::HeaderMap::new();
        headers.insert(CONTENT_TYPE, "application/json, application/yaml".parse().unwrap());
        let types = get_content_types(&headers);
        assert_eq!(types.len(), 2);
    }
}
