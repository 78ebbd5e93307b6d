//! Server Lifecycle (§4.6, §5). Grounded on `pkg/server/server.go` for the
//! shape (`NewServer` → `HandleFunc`* → `Serve`) and on
//! `libs/modkit/src/runtime/shutdown.rs` for the termination-signal handling.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::Request;
use axum::response::Response;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::{BindError, StartupError, TransportError};
use crate::mapping::{register_operations, Mapper};
use crate::middleware::ValidateConfig;
use crate::model::Document;
use crate::router::build_router;
use crate::{builtin, static_files};

const EMPTY_DOCUMENT: &str = "openapi: \"3.0.0\"\ninfo: { title: empty, version: \"1\" }\npaths: {}\n";

pub struct Server {
    config: Config,
    doc: Document,
    mapper: Arc<Mapper>,
    router: Router,
}

impl Server {
    /// Builds the Mapper and the axum router from `config.model` (§4.3). A
    /// config with no `oas3` document yields an empty, but valid, mapper.
    pub fn new(config: Config) -> Result<Server, StartupError> {
        let doc = config
            .model
            .clone()
            .unwrap_or_else(|| Document::from_yaml_str(EMPTY_DOCUMENT).expect("constant document always parses"));

        let (mapper, registrations) = register_operations(&doc)?;
        let mapper = Arc::new(mapper);

        let validate = ValidateConfig {
            request: config.validate.request,
            response: config.validate.response,
        };
        let mut router = build_router(registrations, validate);

        if let Some(dir) = config.static_dir.as_deref() {
            if let Some(svc) = static_files::service(dir) {
                router = router.fallback_service(svc);
            } else {
                tracing::warn!(dir, "static directory not found, not mounting static route");
            }
        }

        Ok(Server {
            config,
            doc,
            mapper,
            router,
        })
    }

    pub fn mapper(&self) -> &Arc<Mapper> {
        &self.mapper
    }

    /// Handler Binder (§4.6): replaces the terminal handler for every route of
    /// `operation_id`. Call before `serve`.
    pub fn handle_func<F, Fut>(&self, operation_id: &str, f: F) -> Result<(), BindError>
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.mapper.handle_func(operation_id, f)
    }

    /// Binds `oas3.model`/`oas3.console` (§4.5) if the document declares
    /// them. A document that omits either id simply leaves that operation as
    /// an unreachable 404 placeholder — not an error.
    pub fn bind_builtins(&self) {
        let doc = self.doc.clone();
        if self.mapper.by_id("oas3.model").is_some() {
            let doc = doc.clone();
            let _ = self.handle_func("oas3.model", move |req| {
                let doc = doc.clone();
                async move { builtin::model(doc, req).await }
            });
        }
        if self.mapper.by_id("oas3.console").is_some() {
            let _ = self.handle_func("oas3.console", move |_req| {
                let doc = doc.clone();
                async move { builtin::console(doc).await }
            });
        }
    }

    /// Binds a TCP listener synchronously (so an ephemeral `:0` port is known
    /// before any request can arrive — §5 "startup race"), reports it on
    /// `ready` if given, then serves until a termination signal arrives.
    pub async fn serve(self, ready: Option<oneshot::Sender<SocketAddr>>) -> Result<(), TransportError> {
        let addr = self.config.address.clone().unwrap_or_else(|| "0.0.0.0:8000".to_string());
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| TransportError::Bind { addr: addr.clone(), source })?;
        let bound = listener
            .local_addr()
            .map_err(|source| TransportError::Bind { addr: addr.clone(), source })?;

        tracing::info!(%bound, "oas3 server listening");
        if let Some(tx) = ready {
            let _ = tx.send(bound);
        }

        let cancel = CancellationToken::new();
        let shutdown_cancel = cancel.clone();
        tokio::spawn(async move {
            wait_for_shutdown().await;
            tracing::info!("shutdown signal received, draining connections");
            shutdown_cancel.cancel();
        });

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move { cancel.cancelled().await })
            .await
            .map_err(TransportError::Serve)
    }

    /// Convenience combining `serve` with no ready-signal observer, matching
    /// the source's blocking `Serve()`.
    pub async fn run(self) -> Result<(), StartupError> {
        self.serve(None).await.map_err(StartupError::from)
    }
}

#[cfg(unix)]
async fn wait_for_shutdown() {
    use tokio::signal::unix::{signal, SignalKind};
    let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
    let mut int = signal(SignalKind::interrupt()).expect("install SIGINT handler");
    tokio::select! {
        _ = term.recv() => {}
        _ = int.recv() => {}
        _ = tokio::signal::ctrl_c() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown() {
    let _ = tokio::signal::ctrl_c().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_yields_empty_mapper() {
        let mut config = Config::default();
        config.init().unwrap();
        let server = Server::new(config).unwrap();
        assert!(server.mapper().is_empty());
    }
}
