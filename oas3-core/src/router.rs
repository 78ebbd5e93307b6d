//! Translates `RouteRegistration`s into an axum `Router`. One dispatch
//! closure is created per `(path, method)` at build time, each already
//! holding the `Arc<Item>` and route key it needs — see `middleware`'s module
//! doc for why that sidesteps needing a live "current route" lookup.

use axum::routing::{MethodFilter, MethodRouter};
use axum::Router;
use indexmap::IndexMap;

use crate::mapping::RouteRegistration;
use crate::middleware::{dispatch, ValidateConfig};
use crate::model::Method;

pub fn build_router(registrations: Vec<RouteRegistration>, validate: ValidateConfig) -> Router {
    let mut by_path: IndexMap<String, Vec<RouteRegistration>> = IndexMap::new();

    for reg in registrations {
        if reg.wildcard {
            let prefix = format!("{}/{{*rest}}", reg.path.trim_end_matches('/'));
            by_path.entry(reg.path.clone()).or_default().push(reg.clone());
            by_path.entry(prefix).or_default().push(reg);
        } else {
            by_path.entry(reg.path.clone()).or_default().push(reg);
        }
    }

    let mut router = Router::new();
    for (path, regs) in by_path {
        let mut method_router = MethodRouter::new();
        for reg in regs {
            let item = reg.item.clone();
            let route = reg.route;
            method_router = method_router.on(method_filter(reg.method), move |req: axum::extract::Request| {
                let item = item.clone();
                async move { dispatch(item, route, validate, req).await }
            });
        }
        router = router.route(&path, method_router);
    }
    router
}

fn method_filter(method: Method) -> MethodFilter {
    match method {
        Method::Get => MethodFilter::GET,
        Method::Put => MethodFilter::PUT,
        Method::Post => MethodFilter::POST,
        Method::Delete => MethodFilter::DELETE,
        Method::Options => MethodFilter::OPTIONS,
        Method::Head => MethodFilter::HEAD,
        Method::Patch => MethodFilter::PATCH,
        Method::Trace => MethodFilter::TRACE,
    }
}
