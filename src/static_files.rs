use axum::{
    body::Body,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use std::{
    collections::HashMap,
    path::{Component, Path, PathBuf},
    sync::Arc,
    time::UNIX_EPOCH,
};
use tokio::{fs::File, sync::RwLock};
use tokio_util::io::ReaderStream;
use tracing::{debug, error, info, warn};

/// Serves the stylesheet, script and images under the static directory and
/// hands out `?v=<mtime>` URLs so browsers can cache them indefinitely.
#[derive(Clone)]
pub struct StaticFileHandler {
    pub static_dir: PathBuf,
    file_versions: Arc<RwLock<HashMap<String, u64>>>,
}

impl StaticFileHandler {
    pub fn new(static_dir: PathBuf) -> Self {
        let handler = Self {
            static_dir,
            file_versions: Arc::new(RwLock::new(HashMap::new())),
        };

        let handler_clone = handler.clone();
        tokio::spawn(async move {
            handler_clone.refresh_file_versions().await;
        });

        handler
    }

    pub async fn refresh_file_versions(&self) {
        let mut versions = HashMap::new();

        let mut entries = match tokio::fs::read_dir(&self.static_dir).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Cannot scan static directory {:?}: {}", self.static_dir, e);
                return;
            }
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            let is_asset = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| matches!(ext, "css" | "js"));
            if !is_asset {
                continue;
            }

            if let Ok(metadata) = entry.metadata().await
                && metadata.is_file()
                && let Ok(modified) = metadata.modified()
                && let Ok(duration) = modified.duration_since(UNIX_EPOCH)
                && let Some(file_name) = path.file_name().and_then(|name| name.to_str())
            {
                debug!("Asset version: {} -> {}", file_name, duration.as_secs());
                versions.insert(file_name.to_string(), duration.as_secs());
            }
        }

        info!("Versioned {} static assets", versions.len());
        *self.file_versions.write().await = versions;
    }

    pub async fn get_file_version(&self, filename: &str) -> Option<u64> {
        self.file_versions.read().await.get(filename).copied()
    }

    pub async fn get_versioned_url(&self, path: &str) -> String {
        let filename = path.rsplit('/').next().unwrap_or(path);

        match self.get_file_version(filename).await {
            Some(version) => format!("{}?v={}", path, version),
            None => path.to_string(),
        }
    }

    /// Maps a request path onto the static directory, refusing anything that
    /// would climb out of it.
    pub fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_)))
        {
            return None;
        }
        Some(self.static_dir.join(relative))
    }

    pub async fn serve(&self, path: &str, has_version: bool) -> Response {
        let Some(file_path) = self.resolve(path) else {
            error!("Path traversal attempt: {:?}", path);
            return (StatusCode::FORBIDDEN, "Forbidden").into_response();
        };

        let metadata = match tokio::fs::metadata(&file_path).await {
            Ok(m) if m.is_file() => m,
            Ok(_) => return (StatusCode::NOT_FOUND, "File not found").into_response(),
            Err(e) => {
                debug!("No static file at {:?}: {}", file_path, e);
                return (StatusCode::NOT_FOUND, "File not found").into_response();
            }
        };

        let file = match File::open(&file_path).await {
            Ok(file) => file,
            Err(e) => {
                debug!("Failed to open {:?}: {}", file_path, e);
                return (StatusCode::NOT_FOUND, "File not found").into_response();
            }
        };

        let content_type = mime_guess::from_path(&file_path)
            .first_or_octet_stream()
            .to_string();

        let cache_control = if has_version {
            "public, max-age=31536000, immutable"
        } else if content_type.starts_with("image/") {
            "public, max-age=86400"
        } else {
            "public, max-age=300, must-revalidate"
        };

        let mut response = Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, content_type)
            .header(header::CACHE_CONTROL, cache_control);

        if let Ok(modified) = metadata.modified()
            && let Ok(duration) = modified.duration_since(UNIX_EPOCH)
        {
            response = response
                .header(header::LAST_MODIFIED, httpdate::fmt_http_date(modified))
                .header(
                    header::ETAG,
                    format!("\"{}-{}\"", duration.as_secs(), metadata.len()),
                );
        }

        match response.body(Body::from_stream(ReaderStream::new(file))) {
            Ok(response) => response,
            Err(e) => {
                error!("Failed to build static response: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
            }
        }
    }

    /// Copies every file under the static directory into `dest`, keeping the
    /// directory layout. Returns the number of files copied.
    pub async fn copy_to(&self, dest: &Path) -> std::io::Result<usize> {
        let mut copied = 0;
        let mut pending = vec![(self.static_dir.clone(), dest.to_path_buf())];

        while let Some((from, to)) = pending.pop() {
            tokio::fs::create_dir_all(&to).await?;
            let mut entries = tokio::fs::read_dir(&from).await?;

            while let Some(entry) = entries.next_entry().await? {
                let file_type = entry.file_type().await?;
                let target = to.join(entry.file_name());

                if file_type.is_dir() {
                    pending.push((entry.path(), target));
                } else if file_type.is_file() {
                    tokio::fs::copy(entry.path(), &target).await?;
                    copied += 1;
                }
            }
        }

        Ok(copied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn handler_for(dir: &TempDir) -> StaticFileHandler {
        StaticFileHandler {
            static_dir: dir.path().to_path_buf(),
            file_versions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    #[tokio::test]
    async fn test_versioned_urls_for_css_and_js() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("site.css"), "body {}").unwrap();
        std::fs::write(dir.path().join("site.js"), "").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();

        let handler = handler_for(&dir);
        handler.refresh_file_versions().await;

        assert!(
            handler
                .get_versioned_url("/static/site.css")
                .await
                .starts_with("/static/site.css?v=")
        );
        assert!(handler.get_file_version("site.js").await.is_some());
        assert_eq!(
            handler.get_versioned_url("/static/notes.txt").await,
            "/static/notes.txt"
        );
    }

    #[tokio::test]
    async fn test_resolve_rejects_traversal() {
        let dir = TempDir::new().unwrap();
        let handler = handler_for(&dir);

        assert_eq!(
            handler.resolve("/img/star.png"),
            Some(dir.path().join("img/star.png"))
        );
        assert!(handler.resolve("../secret").is_none());
        assert!(handler.resolve("img/../../secret").is_none());

        let response = handler.serve("../Cargo.toml", false).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_serve_sets_cache_headers() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("site.css"), "body {}").unwrap();
        let handler = handler_for(&dir);

        let response = handler.serve("site.css", true).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CACHE_CONTROL],
            "public, max-age=31536000, immutable"
        );
        assert!(response.headers().contains_key(header::ETAG));

        let response = handler.serve("site.css", false).await;
        assert_eq!(
            response.headers()[header::CACHE_CONTROL],
            "public, max-age=300, must-revalidate"
        );

        let response = handler.serve("missing.css", false).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_copy_to_keeps_layout() {
        let source = TempDir::new().unwrap();
        std::fs::create_dir_all(source.path().join("img")).unwrap();
        std::fs::write(source.path().join("site.css"), "a").unwrap();
        std::fs::write(source.path().join("img/logo.svg"), "<svg/>").unwrap();

        let dest = TempDir::new().unwrap();
        let copied = handler_for(&source)
            .copy_to(&dest.path().join("static"))
            .await
            .unwrap();

        assert_eq!(copied, 2);
        assert!(dest.path().join("static/site.css").exists());
        assert!(dest.path().join("static/img/logo.svg").exists());
    }
}
