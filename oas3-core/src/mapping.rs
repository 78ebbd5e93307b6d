//! Operation Index (Mapper) & Router Binder (§4.3).
//!
//! Items are built in two passes: first every `(path, method)` slot is walked
//! and grouped by `operationId`, then one immutable `Item` is constructed per
//! id. This sidesteps needing interior mutability on an already-shared `Item`
//! — registration is strictly single-threaded and happens once, before the
//! Mapper is handed to the router builder.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use axum::extract::Request;
use axum::response::Response;
use indexmap::IndexMap;

use crate::error::{BindError, ModelError};
use crate::model::{is_wildcard, Document, Method, ParamDescriptor};
use crate::schema::compile_schema;

/// Opaque router identity. Equality is by the id assigned at registration, not
/// by the path template or method it was bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteHandle(u64);

pub type HandlerFuture = Pin<Box<dyn Future<Output = Response> + Send>>;
pub type HandlerFn = dyn Fn(Request) -> HandlerFuture + Send + Sync;

/// Per-route compiled metadata: the parameter set and its compiled schema.
///
/// `validator` is compiled once here, at registration time, rather than per
/// request. `jsonschema::JSONSchema::compile` borrows from the `Value` it
/// compiles, so the source document is leaked to `'static` first — registration
/// runs once per process and the number of routes is bounded, so the leak is a
/// fixed, one-time cost rather than a per-request one.
#[derive(Clone)]
pub struct RouteMeta {
    pub path: String,
    pub method: Method,
    pub wildcard: bool,
    pub schema: Option<serde_json::Value>,
    pub validator: Option<Arc<jsonschema::JSONSchema<'static>>>,
    pub descriptors: Vec<ParamDescriptor>,
}

/// One entry per distinct `operationId`.
pub struct Item {
    id: String,
    routes: Vec<RouteHandle>,
    route_meta: HashMap<RouteHandle, RouteMeta>,
    handler: ArcSwapOption<HandlerFn>,
}

impl Item {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn routes(&self) -> &[RouteHandle] {
        &self.routes
    }

    pub fn route_meta(&self, route: RouteHandle) -> Option<&RouteMeta> {
        self.route_meta.get(&route)
    }

    /// The currently bound terminal handler, if `HandleFunc` has been called
    /// for this operation. Absent means "respond 404".
    pub fn terminal_handler(&self) -> Option<Arc<HandlerFn>> {
        self.handler.load_full()
    }

    fn bind_handler(&self, handler: Arc<HandlerFn>) {
        self.handler.store(Some(handler));
    }
}

/// What the Router Binder needs to install one axum route: which path
/// template, which method, whether it is a prefix match, and the Item it
/// resolves to.
#[derive(Clone)]
pub struct RouteRegistration {
    pub route: RouteHandle,
    pub path: String,
    pub method: Method,
    pub wildcard: bool,
    pub item: Arc<Item>,
}

/// Bidirectional index over Items: `operationId -> Item`, `route-handle -> Item`.
pub struct Mapper {
    by_id: HashMap<String, Arc<Item>>,
    by_route: HashMap<RouteHandle, Arc<Item>>,
}

impl Mapper {
    pub fn by_id(&self, operation_id: &str) -> Option<&Arc<Item>> {
        self.by_id.get(operation_id)
    }

    pub fn by_route(&self, route: RouteHandle) -> Option<&Arc<Item>> {
        self.by_route.get(&route)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Handler Binder (§4.6). Replaces the terminal handler on every route the
    /// named operation owns. Binding before `Serve` is the supported use; the
    /// bound handler is shared by construction across every route of the Item
    /// (§9 "same operationId on disjoint paths").
    pub fn handle_func<F, Fut>(&self, operation_id: &str, f: F) -> Result<(), BindError>
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        let item = self
            .by_id(operation_id)
            .ok_or_else(|| BindError::UnknownOperation(operation_id.to_string()))?;
        let handler: Arc<HandlerFn> = Arc::new(move |req| Box::pin(f(req)));
        item.bind_handler(handler);
        Ok(())
    }
}

/// Walks every `(path, method)` in the document, skipping operations with no
/// `operationId` (§4.3 step 1), and produces the frozen Mapper plus the list
/// of axum routes the Router Binder should install.
pub fn register_operations(doc: &Document) -> Result<(Mapper, Vec<RouteRegistration>), ModelError> {
    struct Pending {
        route: RouteHandle,
        path: String,
        method: Method,
        wildcard: bool,
        meta: RouteMeta,
    }

    let mut pending: IndexMap<String, Vec<Pending>> = IndexMap::new();
    let mut next_id: u64 = 0;

    for (path, method, path_item, op) in doc.operations() {
        let Some(operation_id) = op.operation_id.as_deref() else {
            tracing::debug!(path, ?method, "skipping operation with no operationId");
            continue;
        };

        let params = doc.effective_parameters(path_item, op, operation_id)?;
        let schema = compile_schema(&params);
        let validator = match &schema {
            Some(schema) => {
                let leaked: &'static serde_json::Value = Box::leak(Box::new(schema.clone()));
                let compiled = jsonschema::JSONSchema::compile(leaked).map_err(|e| ModelError::InvalidSchema {
                    operation_id: operation_id.to_string(),
                    reason: e.to_string(),
                })?;
                Some(Arc::new(compiled))
            }
            None => None,
        };
        let wildcard = is_wildcard(op);
        let route = RouteHandle(next_id);
        next_id += 1;

        let meta = RouteMeta {
            path: path.to_string(),
            method,
            wildcard,
            schema,
            validator,
            descriptors: params,
        };

        pending.entry(operation_id.to_string()).or_default().push(Pending {
            route,
            path: path.to_string(),
            method,
            wildcard,
            meta,
        });
    }

    let mut by_id = HashMap::new();
    let mut by_route = HashMap::new();
    let mut registrations = Vec::new();

    for (operation_id, routes) in pending {
        let mut route_handles = Vec::with_capacity(routes.len());
        let mut route_meta = HashMap::with_capacity(routes.len());
        for r in &routes {
            route_handles.push(r.route);
            route_meta.insert(r.route, r.meta.clone());
        }

        let item = Arc::new(Item {
            id: operation_id.clone(),
            routes: route_handles,
            route_meta,
            handler: ArcSwapOption::empty(),
        });

        for r in routes {
            by_route.insert(r.route, item.clone());
            registrations.push(RouteRegistration {
                route: r.route,
                path: r.path,
                method: r.method,
                wildcard: r.wildcard,
                item: item.clone(),
            });
        }
        by_id.insert(operation_id, item);
    }

    Ok((Mapper { by_id, by_route }, registrations))
}
