//! Spec-driven HTTP server kernel: install a routing table from an OpenAPI 3
//! document, validate every request's parameters against the document's
//! schemas, and let application code bind handlers by `operationId`.

pub mod builtin;
pub mod config;
pub mod error;
pub mod mapping;
pub mod middleware;
pub mod model;
pub mod router;
pub mod schema;
pub mod server;
pub mod static_files;

pub use config::Config;
pub use error::{BindError, ConfigError, MediaError, ModelError, RequestError, StartupError, TransportError};
pub use mapping::{Item, Mapper, RouteHandle};
pub use middleware::{operation_from_request, OperationContext, ValidateConfig};
pub use model::Document;
pub use server::Server;
