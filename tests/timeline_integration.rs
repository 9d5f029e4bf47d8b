mod common;

use axum::http::{HeaderValue, StatusCode, header};
use axum_test::TestServer;
use common::{
    ranking, spawn_like_service, test_config, unreachable_like_service, write_sentence,
};
use onesentence::create_app;
use tempfile::TempDir;

async fn setup_server(likes_base_url: Option<String>) -> (TempDir, TestServer) {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(&temp_dir, likes_base_url);

    write_sentence(&config.sentences.data_directory, "2024-01-01", "A");
    write_sentence(&config.sentences.data_directory, "2024-01-02", "B **bold**");
    write_sentence(&config.sentences.data_directory, "2024-01-03", "   \n");
    write_sentence(&config.sentences.data_directory, "2024-01-04", "<script>x</script>");

    let app = create_app(config).await.unwrap();
    let server = TestServer::new(app.into_make_service()).unwrap();

    (temp_dir, server)
}

#[tokio::test]
async fn test_timeline_lists_entries_newest_first() {
    let likes_url = spawn_like_service(vec![
        ("2024-01-02".to_string(), 9),
        ("2024-01-01".to_string(), 5),
        ("2023-12-31".to_string(), 1),
    ])
    .await;
    let (_temp_dir, server) = setup_server(Some(likes_url)).await;

    let response = server.get("/").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let html = response.text();

    assert!(html.contains("<title>每天一句话</title>"));
    assert!(html.contains("2024年1月2日"));
    assert!(html.contains("<strong>bold</strong>"));
    assert!(!html.contains(r#"id="d-2024-01-03""#));

    let newest = html.find(r#"id="d-2024-01-04""#).unwrap();
    let middle = html.find(r#"id="d-2024-01-02""#).unwrap();
    let oldest = html.find(r#"id="d-2024-01-01""#).unwrap();
    assert!(newest < middle && middle < oldest);

    assert!(html.contains("♥ 9"));
    assert!(html.contains("♥ 5"));
}

#[tokio::test]
async fn test_timeline_mounts_leaderboard_panel() {
    let likes_url = spawn_like_service(vec![
        ("2024-01-02".to_string(), 9),
        ("2023-12-31".to_string(), 1),
    ])
    .await;
    let (_temp_dir, server) = setup_server(Some(likes_url)).await;

    let html = server.get("/").await.text();

    assert!(html.contains("点赞排行榜"));
    assert!(html.contains("data-panel-id="));
    assert!(html.contains("🥇"));
    assert!(html.contains("B **bold**"));
    // Ranked but with no local entry.
    assert!(html.contains("（内容缺失）"));
    // A single page needs no pager.
    assert!(!html.contains("下一页"));
}

#[tokio::test]
async fn test_leaderboard_content_is_escaped() {
    let likes_url = spawn_like_service(vec![("2024-01-04".to_string(), 2)]).await;
    let (_temp_dir, server) = setup_server(Some(likes_url)).await;

    let html = server.get("/").await.text();
    assert!(html.contains("&lt;script&gt;x&lt;/script&gt;"));
}

#[tokio::test]
async fn test_timeline_survives_like_service_outage() {
    let (_temp_dir, server) = setup_server(Some(unreachable_like_service().await)).await;

    let response = server.get("/").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let html = response.text();
    assert!(html.contains(r#"id="d-2024-01-01""#));
    assert!(html.contains("♥ 0"));
    assert!(html.contains("暂无点赞数据"));
}

#[tokio::test]
async fn test_every_theme_renders_starfield_container() {
    let (_temp_dir, server) = setup_server(None).await;

    for (cookie, theme) in [
        ("theme=dark", "dark"),
        ("theme=light", "light"),
        ("theme=system", "system"),
    ] {
        let html = server
            .get("/")
            .add_header(header::COOKIE, HeaderValue::from_static(cookie))
            .await
            .text();
        assert!(html.contains(&format!(r#"data-theme="{}""#, theme)));
        // Hidden by CSS under light, so switching at runtime needs no reload.
        assert!(html.contains(r#"class="starfield""#));
        assert!(html.contains("theme-toggle-system"));
    }

    let html = server.get("/").await.text();
    assert!(html.contains(r#"data-theme="system""#));
}

#[tokio::test]
async fn test_sentences_api_and_refresh() {
    let (temp_dir, server) = setup_server(Some(spawn_like_service(ranking(0)).await)).await;

    let sentences: serde_json::Value = server.get("/api/sentences").await.json();
    let dates: Vec<&str> = sentences
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["date"].as_str().unwrap())
        .collect();
    assert_eq!(dates, vec!["2024-01-04", "2024-01-02", "2024-01-01"]);

    write_sentence(&temp_dir.path().join("data"), "2024-02-01", "Later");
    let response = server.post("/api/sentences/refresh").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let sentences: serde_json::Value = server.get("/api/sentences").await.json();
    assert_eq!(sentences[0]["date"], "2024-02-01");
    assert_eq!(sentences[0]["content"], "Later");
}
