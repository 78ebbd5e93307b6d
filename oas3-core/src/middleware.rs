//! Validation Middleware (§4.4).
//!
//! Each registered route is bound to its own dispatch closure at registration
//! time (see `router::build_router`), so there is no need to introspect a
//! "currently matched route" the way `gorilla/mux`'s `mux.CurrentRoute` does —
//! the closure already owns the `Item` and the route's own compiled metadata.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{FromRequestParts, Path, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::error::RequestError;
use crate::mapping::{Item, RouteHandle, RouteMeta};
use crate::model::{ParamDescriptor, ParamLocation};

/// Which directions of validation are enabled (`Config.validate.{request,response}`).
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidateConfig {
    pub request: bool,
    pub response: bool,
}

/// The Item (and its specific route) a request resolved to, injected into the
/// request's extensions under this private type so handlers can retrieve it
/// through `operation_from_request` without ever seeing a raw key.
#[derive(Clone)]
pub struct OperationContext {
    item: Arc<Item>,
    route: RouteHandle,
}

impl OperationContext {
    pub fn operation_id(&self) -> &str {
        self.item.id()
    }
}

pub fn operation_from_request(req: &Request) -> Option<&OperationContext> {
    req.extensions().get::<OperationContext>()
}

/// Runs the full per-request sequence described in §4.4: context injection,
/// optional request validation, dispatch to the bound terminal handler (or a
/// 404 placeholder if the operation was never bound), optional response
/// buffering.
pub async fn dispatch(item: Arc<Item>, route: RouteHandle, validate: ValidateConfig, mut req: Request) -> Response {
    req.extensions_mut().insert(OperationContext {
        item: item.clone(),
        route,
    });

    if validate.request {
        if let Some(meta) = item.route_meta(route) {
            if let Some(validator) = &meta.validator {
                let (mut parts, body) = req.into_parts();
                let doc = match build_validation_document(&mut parts, meta).await {
                    Ok(doc) => doc,
                    Err(msg) => return RequestError::Validation(msg).into_response(),
                };
                if let Err(msg) = validate_document(validator, &doc) {
                    return RequestError::Validation(msg).into_response();
                }
                req = Request::from_parts(parts, body);
            }
        }
    }

    let Some(handler) = item.terminal_handler() else {
        return (StatusCode::NOT_FOUND, "operation not bound").into_response();
    };

    // Response validation in the source this kernel follows only buffers the
    // response before flushing it; no schema is ever consulted against the
    // body. Every axum handler already returns a fully-built `Response`
    // before we see it, so that buffering is inherent and this branch is
    // semantically a pass-through — kept distinct so the write-amplification
    // intent stays visible at the call site (DESIGN.md).
    if validate.response {
        tracing::debug!(operation_id = item.id(), "response buffered for validation (no-op)");
    }
    handler(req).await
}

async fn build_validation_document(
    parts: &mut http::request::Parts,
    meta: &RouteMeta,
) -> Result<serde_json::Value, String> {
    let path_params: HashMap<String, String> = match Path::<HashMap<String, String>>::from_request_parts(parts, &()).await {
        Ok(Path(p)) => p,
        Err(_) => HashMap::new(),
    };

    let mut by_location: HashMap<ParamLocation, Vec<&ParamDescriptor>> = HashMap::new();
    for d in &meta.descriptors {
        by_location.entry(d.location).or_default().push(d);
    }

    let mut sections = serde_json::Map::new();
    for (location, descriptors) in by_location {
        let mut obj = serde_json::Map::new();
        for d in descriptors {
            let raw_values: Vec<String> = match location {
                ParamLocation::Path => path_params.get(&d.name).cloned().into_iter().collect(),
                ParamLocation::Query => query_values(parts.uri.query().unwrap_or(""), &d.name),
                ParamLocation::Header => header_values(&parts.headers, &d.name),
                ParamLocation::Cookie => cookie_values(&parts.headers, &d.name),
            };
            if raw_values.is_empty() {
                continue;
            }
            obj.insert(d.name.clone(), crate::schema::encode(d, &raw_values));
        }
        if !obj.is_empty() {
            sections.insert(location.as_str().to_string(), serde_json::Value::Object(obj));
        }
    }

    Ok(serde_json::Value::Object(sections))
}

fn query_values(query: &str, name: &str) -> Vec<String> {
    form_urlencoded::parse(query.as_bytes())
        .filter(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
        .collect()
}

fn header_values(headers: &http::HeaderMap, name: &str) -> Vec<String> {
    match http::HeaderName::from_bytes(name.as_bytes()) {
        Ok(header_name) => headers
            .get_all(header_name)
            .iter()
            .filter_map(|v| v.to_str().ok().map(str::to_string))
            .collect(),
        Err(_) => Vec::new(),
    }
}

fn cookie_values(headers: &http::HeaderMap, name: &str) -> Vec<String> {
    let mut out = Vec::new();
    for value in headers.get_all(http::header::COOKIE) {
        let Ok(value) = value.to_str() else { continue };
        for pair in value.split(';') {
            if let Some((k, v)) = pair.trim().split_once('=') {
                if k.trim() == name {
                    out.push(v.trim().to_string());
                }
            }
        }
    }
    out
}

/// Evaluates a request document against its route's precompiled validator
/// (compiled once, at registration time, in `mapping::register_operations`).
fn validate_document(validator: &jsonschema::JSONSchema<'static>, doc: &serde_json::Value) -> Result<(), String> {
    let errors: Vec<String> = validator
        .validate(doc)
        .err()
        .into_iter()
        .flatten()
        .map(|e| e.to_string())
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_values_parses_multiple_pairs() {
        let mut headers = http::HeaderMap::new();
        headers.insert(http::header::COOKIE, "a=1; b=2; a=3".parse().unwrap());
        assert_eq!(cookie_values(&headers, "a"), vec!["1", "3"]);
        assert_eq!(cookie_values(&headers, "b"), vec!["2"]);
        assert!(cookie_values(&headers, "c").is_empty());
    }

    #[test]
    fn header_values_collects_repeated_headers() {
        let mut headers = http::HeaderMap::new();
        headers.append("x-tag", "one".parse().unwrap());
        headers.append("x-tag", "two".parse().unwrap());
        assert_eq!(header_values(&headers, "X-Tag"), vec!["one", "two"]);
    }

    #[test]
    fn query_values_filters_by_key() {
        assert_eq!(query_values("a=1&b=2&a=3", "a"), vec!["1", "3"]);
        assert!(query_values("a=1", "missing").is_empty());
    }

    #[test]
    fn validate_document_rejects_missing_required_field() {
        let schema = serde_json::json!({
            "type": "object",
            "required": ["query"],
            "properties": {
                "query": {
                    "type": "object",
                    "required": ["limit"],
                    "properties": { "limit": { "type": "integer" } }
                }
            }
        });
        let leaked: &'static serde_json::Value = Box::leak(Box::new(schema));
        let validator = jsonschema::JSONSchema::compile(leaked).unwrap();

        let doc = serde_json::json!({});
        assert!(validate_document(&validator, &doc).is_err());
        let doc_ok = serde_json::json!({"query": {"limit": 5}});
        assert!(validate_document(&validator, &doc_ok).is_ok());
    }
}
