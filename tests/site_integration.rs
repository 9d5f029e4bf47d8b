mod common;

use axum::http::{StatusCode, header};
use axum_test::TestServer;
use common::{test_config, write_sentence};
use onesentence::{Config, create_app};
use tempfile::TempDir;

async fn setup_server(adjust: impl FnOnce(&mut Config)) -> (TempDir, TestServer) {
    let temp_dir = TempDir::new().unwrap();
    let mut config = test_config(&temp_dir, None);
    write_sentence(&config.sentences.data_directory, "2024-05-01", "Hello");
    adjust(&mut config);

    let app = create_app(config).await.unwrap();
    let server = TestServer::new(app.into_make_service()).unwrap();

    (temp_dir, server)
}

#[tokio::test]
async fn test_starfield_svg() {
    let (_temp_dir, server) = setup_server(|_| {}).await;

    let response = server.get("/starfield.svg?width=200&height=100").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.header(header::CONTENT_TYPE), "image/svg+xml");

    let svg = response.text();
    assert!(svg.starts_with("<svg"));
    assert!(svg.contains(r#"viewBox="0 0 256 128""#));

    let again = server.get("/starfield.svg?width=230&height=70").await.text();
    assert_eq!(svg, again);
}

#[tokio::test]
async fn test_starfield_ignores_client_seed() {
    let (_temp_dir, server) = setup_server(|_| {}).await;

    let plain = server.get("/starfield.svg?width=200&height=100").await.text();
    for seed in [1, 2, 99] {
        let response = server
            .get(&format!("/starfield.svg?width=200&height=100&seed={}", seed))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.text(), plain);
    }
}

#[tokio::test]
async fn test_robots_txt() {
    let (_temp_dir, server) = setup_server(|_| {}).await;

    let response = server.get("/robots.txt").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().contains("Disallow: /api/"));
}

#[tokio::test]
async fn test_static_files() {
    let (_temp_dir, server) = setup_server(|_| {}).await;

    let response = server.get("/static/site.css").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(
        response
            .header(header::CONTENT_TYPE)
            .to_str()
            .unwrap()
            .starts_with("text/css")
    );

    let response = server.get("/static/site.js?v=1").await;
    assert_eq!(
        response.header(header::CACHE_CONTROL),
        "public, max-age=31536000, immutable"
    );

    let response = server.get("/static/missing.css").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_site_script_behaviour_hooks() {
    let (_temp_dir, server) = setup_server(|_| {}).await;

    let script = server.get("/static/site.js").await.text();
    // Theme toggle cycles through every theme the server understands.
    assert!(script.contains(r#"["light", "dark", "system"]"#));
    // Pages restored from the back/forward cache keep their panel.
    assert!(script.contains("if (event.persisted) return;"));
    assert!(script.contains(r#"addEventListener("pageshow""#));
    // The panel's own padding is not space for rows.
    assert!(script.contains("paddingTop"));
    assert!(script.contains("paddingBottom"));
}

#[tokio::test]
async fn test_site_under_base_path() {
    let (_temp_dir, server) = setup_server(|config| {
        config.app.base_path = "daily/".to_string();
    })
    .await;

    let response = server.get("/daily").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let html = response.text();
    assert!(html.contains("Hello"));
    assert!(html.contains(r#"href="/daily/static/site.css"#));
    assert!(html.contains(r#"data-base-path="/daily""#));

    let robots = server.get("/daily/robots.txt").await.text();
    assert!(robots.contains("Disallow: /daily/api/"));

    assert_eq!(
        server.get("/api/sentences").await.status_code(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        server.get("/daily/api/sentences").await.status_code(),
        StatusCode::OK
    );
}
