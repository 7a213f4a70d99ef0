use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use rust_embed::Embed;

#[derive(Embed)]
#[folder = "assets/"]
struct Assets;

/// GET /assets/{*path}: stylesheet and script compiled into the binary
pub async fn serve(Path(path): Path<String>) -> Response {
    let Some(file) = Assets::get(&path) else {
        tracing::debug!(%path, "Unknown asset");
        return StatusCode::NOT_FOUND.into_response();
    };
    let mime = mime_guess::from_path(&path).first_or_octet_stream();
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime.as_ref().to_string()),
            (header::CACHE_CONTROL, "public, max-age=3600".to_string()),
        ],
        file.data.into_owned(),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_assets_are_embedded() {
        assert!(Assets::get("css/site.css").is_some());
        assert!(Assets::get("js/site.js").is_some());
        assert!(Assets::get("css/missing.css").is_none());
    }

    #[test]
    fn signup_script_times_out_requests() {
        let file = Assets::get("js/site.js").unwrap();
        let script = std::str::from_utf8(&file.data).unwrap();
        assert!(script.contains("signal: AbortSignal.timeout(SIGNUP_TIMEOUT_MS)"));
        assert!(script.contains("The request timed out. Please try again."));
    }
}
