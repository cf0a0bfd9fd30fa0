use actix_web::{web, Error, HttpResponse};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::warn;
use std::path::Path;

use crate::config::Config;

const DASHBOARD_HTML: &str = include_str!("../../static/dashboard.html");
const AVATAR_SLOT: &str = "{{AVATAR}}";
const DEFAULT_AVATAR: &str = "🤓";

/// The single-page dashboard
pub async fn index(config: web::Data<Config>) -> Result<HttpResponse, Error> {
    let avatar = config
        .avatar_path
        .as_deref()
        .and_then(avatar_img)
        .unwrap_or_else(|| DEFAULT_AVATAR.to_string());

    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(DASHBOARD_HTML.replace(AVATAR_SLOT, &avatar)))
}

/// Inline `<img>` tag with the avatar embedded as base64
fn avatar_img(path: &Path) -> Option<String> {
    let mime = match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        _ => {
            warn!("⚠️ Unsupported avatar type: {}", path.display());
            return None;
        }
    };

    match std::fs::read(path) {
        Ok(bytes) => Some(format!(
            r#"<img class="avatar" src="data:{};base64,{}" alt="Andy">"#,
            mime,
            STANDARD.encode(bytes)
        )),
        Err(e) => {
            warn!("⚠️ Could not read avatar {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn svg_avatar_is_inlined() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("andy.svg");
        std::fs::write(&path, "<svg/>").unwrap();
        let img = avatar_img(&path).unwrap();
        assert!(img.contains("data:image/svg+xml;base64,PHN2Zy8+"));
    }

    #[test]
    fn missing_avatar_falls_back() {
        assert!(avatar_img(Path::new("/nonexistent/andy.png")).is_none());
        assert!(DASHBOARD_HTML.contains(AVATAR_SLOT));
    }
}
