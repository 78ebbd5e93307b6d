//! Parsed OpenAPI 3 document plus the flattening helpers the mapping engine
//! needs: the eight method slots a Path Item Object can carry, and the
//! path-item/operation parameter union.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use openapiv3::{OpenAPI, Operation, Parameter as OasParameter, PathItem, ReferenceOr};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// The eight HTTP methods an OpenAPI 3 Path Item Object can carry. The original
/// implementation this kernel descends from also special-cased `CONNECT` as a
/// non-standard ninth slot local to its parsing library; the `openapiv3` crate
/// (and the OpenAPI 3.0 schema itself) models only these eight, so `CONNECT` is
/// dropped. See DESIGN.md.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl Method {
    pub const ALL: [Method; 8] = [
        Method::Get,
        Method::Put,
        Method::Post,
        Method::Delete,
        Method::Options,
        Method::Head,
        Method::Patch,
        Method::Trace,
    ];

    pub fn as_http(self) -> http::Method {
        match self {
            Method::Get => http::Method::GET,
            Method::Put => http::Method::PUT,
            Method::Post => http::Method::POST,
            Method::Delete => http::Method::DELETE,
            Method::Options => http::Method::OPTIONS,
            Method::Head => http::Method::HEAD,
            Method::Patch => http::Method::PATCH,
            Method::Trace => http::Method::TRACE,
        }
    }

    fn slot(self, item: &PathItem) -> Option<&Operation> {
        match self {
            Method::Get => item.get.as_ref(),
            Method::Put => item.put.as_ref(),
            Method::Post => item.post.as_ref(),
            Method::Delete => item.delete.as_ref(),
            Method::Options => item.options.as_ref(),
            Method::Head => item.head.as_ref(),
            Method::Patch => item.patch.as_ref(),
            Method::Trace => item.trace.as_ref(),
        }
    }
}

/// Where a parameter is read from on an incoming request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl ParamLocation {
    pub fn as_str(self) -> &'static str {
        match self {
            ParamLocation::Path => "path",
            ParamLocation::Query => "query",
            ParamLocation::Header => "header",
            ParamLocation::Cookie => "cookie",
        }
    }
}

/// A single flattened parameter descriptor, independent of whether it was
/// declared at the path-item level or the operation level.
#[derive(Debug, Clone)]
pub struct ParamDescriptor {
    pub location: ParamLocation,
    pub name: String,
    pub required: bool,
    pub schema: serde_json::Value,
    /// Schema type isn't `string`; §4.1 of the kernel's contract emits these
    /// as raw JSON rather than a quoted string.
    pub non_string: bool,
}

impl ParamDescriptor {
    fn from_parameter(p: &OasParameter, operation_id: &str) -> Result<ParamDescriptor, ModelError> {
        let (location, data) = match p {
            OasParameter::Query { parameter_data, .. } => (ParamLocation::Query, parameter_data),
            OasParameter::Header { parameter_data, .. } => (ParamLocation::Header, parameter_data),
            OasParameter::Path { parameter_data, .. } => (ParamLocation::Path, parameter_data),
            OasParameter::Cookie { parameter_data, .. } => (ParamLocation::Cookie, parameter_data),
        };
        let schema = match &data.format {
            openapiv3::ParameterSchemaOrContent::Schema(ReferenceOr::Item(schema)) => {
                serde_json::to_value(schema).map_err(|_| ModelError::MissingSchema {
                    operation_id: operation_id.to_string(),
                    name: data.name.clone(),
                })?
            }
            _ => {
                return Err(ModelError::MissingSchema {
                    operation_id: operation_id.to_string(),
                    name: data.name.clone(),
                })
            }
        };
        let non_string = schema
            .get("type")
            .and_then(|t| t.as_str())
            .map(|t| t != "string")
            .unwrap_or(false);
        Ok(ParamDescriptor {
            location,
            name: data.name.clone(),
            required: data.required,
            schema,
            non_string,
        })
    }
}

/// The parsed OpenAPI document. `raw` mirrors the exact on-disk document (as a
/// `serde_json::Value`) so the `oas3.model`/`oas3.console` endpoints can
/// re-render it without a lossy round trip through `openapiv3::OpenAPI`.
#[derive(Debug, Clone)]
pub struct Document {
    spec: Arc<OpenAPI>,
    raw: Arc<serde_json::Value>,
}

impl Document {
    pub fn load(path: impl AsRef<Path>) -> Result<Document, ModelError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ModelError::Load {
            path: path.to_path_buf(),
            source: anyhow::Error::new(source),
        })?;
        let raw: serde_json::Value = serde_yaml::from_str(&text).map_err(|source| ModelError::Load {
            path: path.to_path_buf(),
            source: anyhow::Error::new(source),
        })?;
        let spec: OpenAPI = serde_json::from_value(raw.clone()).map_err(|source| ModelError::Load {
            path: path.to_path_buf(),
            source: anyhow::Error::new(source),
        })?;
        Ok(Document {
            spec: Arc::new(spec),
            raw: Arc::new(raw),
        })
    }

    /// Parses a document already held in memory (used by tests and by callers
    /// embedding a document rather than loading one from disk).
    pub fn from_yaml_str(text: &str) -> Result<Document, ModelError> {
        let raw: serde_json::Value = serde_yaml::from_str(text).map_err(|source| ModelError::Load {
            path: PathBuf::new(),
            source: anyhow::Error::new(source),
        })?;
        let spec: OpenAPI = serde_json::from_value(raw.clone()).map_err(|source| ModelError::Load {
            path: PathBuf::new(),
            source: anyhow::Error::new(source),
        })?;
        Ok(Document {
            spec: Arc::new(spec),
            raw: Arc::new(raw),
        })
    }

    pub fn as_json(&self) -> &serde_json::Value {
        &self.raw
    }

    pub fn to_yaml(&self) -> Result<String, ModelError> {
        serde_yaml::to_string(self.raw.as_ref()).map_err(|e| ModelError::Load {
            path: PathBuf::new(),
            source: anyhow::Error::new(e),
        })
    }

    /// Every `(path template, method, path-item, operation)` in document order.
    pub fn operations(&self) -> impl Iterator<Item = (&str, Method, &PathItem, &Operation)> {
        self.spec
            .paths
            .paths
            .iter()
            .filter_map(|(path, item)| match item {
                ReferenceOr::Item(item) => Some((path.as_str(), item)),
                ReferenceOr::Reference { .. } => None,
            })
            .flat_map(|(path, item)| {
                Method::ALL
                    .iter()
                    .filter_map(move |m| m.slot(item).map(|op| (path, *m, item, op)))
            })
    }

    fn resolve_parameter<'a>(&'a self, r: &'a ReferenceOr<OasParameter>) -> Option<&'a OasParameter> {
        match r {
            ReferenceOr::Item(p) => Some(p),
            ReferenceOr::Reference { reference } => {
                let name = reference.rsplit('/').next()?;
                match self.spec.components.as_ref()?.parameters.get(name)? {
                    ReferenceOr::Item(p) => Some(p),
                    ReferenceOr::Reference { .. } => None,
                }
            }
        }
    }

    /// Union of path-item-scoped and operation-scoped parameters, the latter
    /// overriding the former on a `(location, name)` collision per the
    /// OpenAPI 3 Path Item Object semantics.
    pub fn effective_parameters(
        &self,
        path_item: &PathItem,
        op: &Operation,
        operation_id: &str,
    ) -> Result<Vec<ParamDescriptor>, ModelError> {
        let mut by_key: IndexMap<(ParamLocation, String), ParamDescriptor> = IndexMap::new();
        for r in path_item.parameters.iter().chain(op.parameters.iter()) {
            let Some(p) = self.resolve_parameter(r) else {
                continue;
            };
            let descriptor = ParamDescriptor::from_parameter(p, operation_id)?;
            by_key.insert((descriptor.location, descriptor.name.clone()), descriptor);
        }
        Ok(by_key.into_values().collect())
    }
}

/// Reads the `x-wildcard` extension off an operation (§4.3 step 3).
pub fn is_wildcard(op: &Operation) -> bool {
    op.extensions
        .get("x-wildcard")
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        let yaml = r#"
openapi: "3.0.0"
info: { title: t, version: "1" }
paths:
  /items:
    get:
      operationId: list-items
      parameters:
        - name: limit
          in: query
          required: true
          schema: { type: integer }
      responses:
        "200": { description: ok }
  /assets/:
    get:
      operationId: assets
      x-wildcard: true
      responses:
        "200": { description: ok }
"#;
        let raw: serde_json::Value = serde_yaml::from_str(yaml).unwrap();
        let spec: OpenAPI = serde_json::from_value(raw.clone()).unwrap();
        Document {
            spec: Arc::new(spec),
            raw: Arc::new(raw),
        }
    }

    #[test]
    fn flattens_operations_in_document_order() {
        let doc = sample();
        let ids: Vec<_> = doc
            .operations()
            .map(|(_, _, _, op)| op.operation_id.clone().unwrap())
            .collect();
        assert_eq!(ids, vec!["list-items", "assets"]);
    }

    #[test]
    fn reads_wildcard_extension() {
        let doc = sample();
        let (_, _, _, op) = doc.operations().nth(1).unwrap();
        assert!(is_wildcard(op));
        let (_, _, _, first_op) = doc.operations().next().unwrap();
        assert!(!is_wildcard(first_op));
    }

    #[test]
    fn compiles_required_query_parameter() {
        let doc = sample();
        let (_, _, item, op) = doc.operations().next().unwrap();
        let params = doc.effective_parameters(item, op, "list-items").unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].location, ParamLocation::Query);
        assert_eq!(params[0].name, "limit");
        assert!(params[0].required);
        assert!(params[0].non_string);
    }
}
