//! Static-file collaborator (§6): serves files under `Config.static_dir`,
//! falling back to `index.html` for directories and re-trying progressively
//! shorter path suffixes so an SPA's client-side router still resolves deep
//! links to the root `index.html`. Grounded on `pkg/server/static.go`.

use std::path::{Path, PathBuf};

use tower_http::services::ServeDir;

/// Builds the `tower_http` service mounted at the configured static
/// directory. Returns `None` if the directory doesn't exist — the source
/// simply skips installing the route in that case (§6).
pub fn service(dir: &str) -> Option<ServeDir> {
    let path = Path::new(dir);
    if !path.is_dir() {
        return None;
    }
    Some(ServeDir::new(path).append_index_html_on_directories(true))
}

/// Resolves a request path against `root` the way the source's `FileSystem`
/// does: trims leading slashes, then tries the full path and progressively
/// shorter suffixes until one exists, finally appending `index.html` if the
/// match is a directory. Exposed for callers that need the same fallback
/// semantics outside of `tower_http::ServeDir` (e.g. a custom 404 page).
pub fn resolve(root: &Path, request_path: &str) -> Option<PathBuf> {
    let trimmed = request_path.trim_start_matches('/');
    let segments: Vec<&str> = trimmed.split('/').collect();

    for start in 0..segments.len() {
        let candidate = root.join(segments[start..].join("/"));
        if candidate.is_file() {
            return Some(candidate);
        }
        if candidate.is_dir() {
            let index = candidate.join("index.html");
            if index.is_file() {
                return Some(index);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn resolves_nested_index_html_for_directory_request() {
        let dir = std::env::temp_dir().join(format!("oas3-static-test-{}", std::process::id()));
        fs::create_dir_all(dir.join("docs")).unwrap();
        fs::write(dir.join("docs/index.html"), "hi").unwrap();

        let resolved = resolve(&dir, "/docs/");
        assert_eq!(resolved, Some(dir.join("docs/index.html")));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn falls_back_to_shorter_suffix_when_full_path_missing() {
        let dir = std::env::temp_dir().join(format!("oas3-static-test2-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("app.js"), "x").unwrap();

        let resolved = resolve(&dir, "/deep/link/app.js");
        assert_eq!(resolved, Some(dir.join("app.js")));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn service_returns_none_for_missing_directory() {
        assert!(service("/definitely/not/a/real/path").is_none());
    }
}
