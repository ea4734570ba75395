//! Bundle file handler.
//!
//! Recompiles the bundle for every request, so edits to the working tree
//! and new commits show up on reload.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{Uri, header};
use axum::response::{IntoResponse, Response};
use percent_encoding::percent_decode_str;

use crate::error::ServerError;
use crate::state::AppState;

/// Rendered bundle file.
#[derive(Debug)]
struct RenderedFile {
    path: String,
    body: Vec<u8>,
}

/// Serve `GET /p` from the first of `p`, `p.html` and `p/index.html` the
/// bundle contains.
pub(crate) async fn serve_file(
    State(state): State<Arc<AppState>>,
    uri: Uri,
) -> Result<Response, ServerError> {
    let path = percent_decode_str(uri.path()).decode_utf8_lossy().into_owned();
    let compile = Arc::clone(&state.compile);

    let file = tokio::task::spawn_blocking(move || render(&*compile, &path)).await??;

    let mime = mime_guess::from_path(&file.path).first_or_octet_stream();
    Ok(([(header::CONTENT_TYPE, mime.to_string())], file.body).into_response())
}

fn render(compile: &crate::CompileFn, path: &str) -> Result<RenderedFile, ServerError> {
    let bundle = compile().map_err(ServerError::Compile)?;

    for candidate in candidates(path) {
        if bundle.mapping(&candidate).is_none() {
            continue;
        }
        let mut body = Vec::new();
        bundle.write_file_to(&candidate, &mut body)?;
        return Ok(RenderedFile {
            path: candidate,
            body,
        });
    }

    Err(ServerError::NotFound(path.to_owned()))
}

/// Destination paths tried for a request path, in order.
fn candidates(path: &str) -> Vec<String> {
    let path = path.trim_matches('/');
    if path.is_empty() {
        return vec!["index.html".to_owned()];
    }
    vec![
        path.to_owned(),
        format!("{path}.html"),
        format!("{path}/index.html"),
    ]
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_candidates() {
        assert_eq!(candidates("/"), vec!["index.html"]);
        assert_eq!(
            candidates("/v1/guide/"),
            vec!["v1/guide", "v1/guide.html", "v1/guide/index.html"]
        );
    }
}
