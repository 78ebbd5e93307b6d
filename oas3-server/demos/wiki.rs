//! Minimal file-backed wiki demonstrating that the wire contract — not
//! application code — drives routing: `view`/`edit`/`save` are declared in an
//! inline OpenAPI document and bound with `Server::handle_func`. Supplements
//! the core kernel (SPEC_FULL.md §10.5); not part of its test surface.
//!
//! Run with `cargo run --example wiki`, then visit `http://127.0.0.1:8080/view/Home`.

use std::collections::HashMap;
use std::path::PathBuf;

use axum::extract::{FromRequestParts, Path, Request};
use axum::response::{Html, IntoResponse, Redirect, Response};
use http_body_util::BodyExt;
use oas3_core::{Config, Document, Server};

const DOCUMENT: &str = r#"
openapi: "3.0.0"
info: { title: wiki, version: "1" }
paths:
  /view/{title}:
    get:
      operationId: view-page
      parameters:
        - name: title
          in: path
          required: true
          schema: { type: string }
      responses: { "200": { description: ok } }
  /edit/{title}:
    get:
      operationId: edit-page
      parameters:
        - name: title
          in: path
          required: true
          schema: { type: string }
      responses: { "200": { description: ok } }
  /save/{title}:
    post:
      operationId: save-page
      parameters:
        - name: title
          in: path
          required: true
          schema: { type: string }
      responses: { "200": { description: ok } }
"#;

fn data_dir() -> PathBuf {
    PathBuf::from("data")
}

async fn path_title(parts: &mut http::request::Parts) -> String {
    Path::<HashMap<String, String>>::from_request_parts(parts, &())
        .await
        .ok()
        .and_then(|Path(m)| m.get("title").cloned())
        .unwrap_or_default()
}

async fn view_page(req: Request) -> Response {
    let (mut parts, _) = req.into_parts();
    let title = path_title(&mut parts).await;
    match std::fs::read_to_string(data_dir().join(format!("{title}.txt"))) {
        Ok(body) => Html(format!("<h1>{title}</h1><pre>{body}</pre>")).into_response(),
        Err(_) => Redirect::to(&format!("/edit/{title}")).into_response(),
    }
}

async fn edit_page(req: Request) -> Response {
    let (mut parts, _) = req.into_parts();
    let title = path_title(&mut parts).await;
    let body = std::fs::read_to_string(data_dir().join(format!("{title}.txt"))).unwrap_or_default();
    Html(format!(
        "<h1>Editing {title}</h1><form method=\"post\" action=\"/save/{title}\">\
         <textarea name=\"body\">{body}</textarea><input type=\"submit\"></form>"
    ))
    .into_response()
}

async fn save_page(req: Request) -> Response {
    let (mut parts, body) = req.into_parts();
    let title = path_title(&mut parts).await;
    let bytes = match BodyExt::collect(body).await {
        Ok(collected) => collected.to_bytes(),
        Err(_) => return Redirect::to(&format!("/edit/{title}")).into_response(),
    };
    let text = String::from_utf8_lossy(&bytes);
    let content = form_urlencoded::parse(text.as_bytes())
        .find(|(k, _)| k == "body")
        .map(|(_, v)| v.into_owned())
        .unwrap_or_default();

    let _ = std::fs::create_dir_all(data_dir());
    let _ = std::fs::write(data_dir().join(format!("{title}.txt")), content);
    Redirect::to(&format!("/view/{title}")).into_response()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let mut config = Config::default();
    config.address = Some("127.0.0.1:8080".to_string());
    config.model = Some(Document::from_yaml_str(DOCUMENT)?);

    let server = Server::new(config)?;
    server.handle_func("view-page", |req| async move { view_page(req).await })?;
    server.handle_func("edit-page", |req| async move { edit_page(req).await })?;
    server.handle_func("save-page", |req| async move { save_page(req).await })?;

    server.run().await?;
    Ok(())
}
