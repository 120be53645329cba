//! Integration tests for the authenticated download workflow
//!
//! A single mock server plays the account host, the ranking listing, the
//! detail pages, and the image host, so the tests drive login, resolution,
//! streaming, and idempotence end-to-end.

use shiori::config::{
    AuthConfig, Config, CrawlerConfig, DelayRange, HeaderConfig, LevelEntry, OutputConfig,
    RankingConfig, RankingSelectors, VocabConfig, VocabSelectors,
};
use shiori::crawler::run_download_batch;
use shiori::download::destination;
use shiori::extract::MediaItem;
use shiori::session::Credentials;
use shiori::shutdown::ShutdownHandle;
use shiori::ShioriError;
use std::path::Path;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn zero_delay() -> DelayRange {
    DelayRange { min: 0.0, max: 0.0 }
}

fn test_config(base_url: &str, images_dir: &str) -> Config {
    Config {
        crawler: CrawlerConfig {
            max_attempts: 2,
            request_timeout_secs: 5,
            page_bound: 50,
            page_delay: zero_delay(),
            download_delay: zero_delay(),
            retry_backoff: zero_delay(),
            level_pause: zero_delay(),
        },
        headers: HeaderConfig {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) TestShell/1.0".to_string(),
            accept_language: "en-US,en;q=0.8".to_string(),
            accept: "text/html,application/xhtml+xml".to_string(),
        },
        output: OutputConfig {
            words_dir: format!("{}/words", images_dir),
            aggregate_file: "all_jlpt_words.csv".to_string(),
            images_dir: images_dir.to_string(),
        },
        vocab: VocabConfig {
            listing_url_template: format!("{}/jlpt-n{{level}}-vocabulary-list/", base_url),
            levels: vec![LevelEntry {
                level: 5,
                known_pages: 1,
            }],
            marker_pattern: r"Currently viewing page \d+ of (\d+)".to_string(),
            selectors: VocabSelectors {
                table: ".jl-table".to_string(),
                row: "tbody tr".to_string(),
                cell: "td".to_string(),
                pagination_links: ".wp-pagenavi a.page".to_string(),
                min_cells: 4,
                word_cell: 1,
                reading_cell: 2,
                meaning_cell: 3,
            },
        },
        ranking: RankingConfig {
            url: format!("{}/ranking.php", base_url),
            mode: "daily".to_string(),
            limit: 20,
            detail_url_template: format!("{}/artworks/{{id}}", base_url),
            referer: format!("{}/", base_url),
            selectors: RankingSelectors {
                item: "div.ranking-item".to_string(),
                id_attr: "data-id".to_string(),
                title: "h2".to_string(),
                author: "a.user-name".to_string(),
                thumbnail: "img._thumbnail".to_string(),
            },
        },
        auth: AuthConfig {
            login_url: format!("{}/login", base_url),
            fallback_action: format!("{}/api/login", base_url),
            verify_url: format!("{}/dashboard", base_url),
            logout_marker: "logout".to_string(),
            username: Some("someone".to_string()),
            password: Some("hunter2".to_string()),
            extra_fields: Default::default(),
        },
    }
}

fn credentials() -> Credentials {
    Credentials {
        username: "someone".to_string(),
        password: "hunter2".to_string(),
    }
}

/// Mounts a working login flow: form page, submission endpoint, verify page.
async fn mount_login(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<form action="/api/login">
                <input type="hidden" name="post_key" value="tok">
                <input type="text" name="account" autocomplete="username">
                <input type="password" name="secret" autocomplete="current-password">
            </form>"#,
        ))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/dashboard"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<a href='/logout'>Logout</a>"))
        .mount(server)
        .await;
}

/// Mounts a one-item ranking listing and its detail page with an embedded,
/// backslash-escaped original URL.
async fn mount_one_item(server: &MockServer, base_url: &str) {
    let listing = format!(
        r#"<html><body>
        <div class="ranking-item" data-id="9876">
            <h2>Evening Sky</h2>
            <a class="user-name">someone</a>
            <img class="_thumbnail" src="{}/thumb/9876.jpg">
        </div>
        </body></html>"#,
        base_url
    );
    Mock::given(method("GET"))
        .and(path("/ranking.php"))
        .and(query_param("mode", "daily"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing))
        .mount(server)
        .await;

    let escaped = format!("{}/img-original/art_p0.png", base_url).replace('/', "\\/");
    let detail = format!(r#"<script>var p = {{"original":"{}"}};</script>"#, escaped);
    Mock::given(method("GET"))
        .and(path("/artworks/9876"))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail))
        .mount(server)
        .await;
}

fn expected_destination(images_dir: &Path, base_url: &str) -> std::path::PathBuf {
    let item = MediaItem {
        id: "9876".to_string(),
        title: "Evening Sky".to_string(),
        author: "someone".to_string(),
        thumbnail: None,
        detail_url: format!("{}/artworks/9876", base_url),
    };
    destination(
        images_dir,
        &item,
        &format!("{}/img-original/art_p0.png", base_url),
    )
}

#[tokio::test]
async fn test_batch_downloads_with_required_referer() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_login(&mock_server).await;
    mount_one_item(&mock_server, &base_url).await;

    // The resource fetch must carry the detail page as its Referer
    Mock::given(method("GET"))
        .and(path("/img-original/art_p0.png"))
        .and(header("referer", format!("{}/artworks/9876", base_url).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"png-bytes".to_vec()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let images = tempfile::TempDir::new().unwrap();
    let config = test_config(&base_url, images.path().to_str().unwrap());
    let shutdown = ShutdownHandle::default();

    let summary = run_download_batch(&config, credentials(), &shutdown)
        .await
        .unwrap();

    assert_eq!(summary.requested, 1);
    assert_eq!(summary.downloaded, 1);
    assert_eq!(summary.skipped, 0);

    let dest = expected_destination(images.path(), &base_url);
    assert_eq!(
        dest.file_name().unwrap().to_str().unwrap(),
        "9876_Evening Sky_someone.png"
    );
    assert_eq!(std::fs::read(&dest).unwrap(), b"png-bytes");
    // No stray partial file left behind
    assert_eq!(std::fs::read_dir(images.path()).unwrap().count(), 1);
}

#[tokio::test]
async fn test_second_run_fetches_no_resources() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_login(&mock_server).await;
    mount_one_item(&mock_server, &base_url).await;

    // Two full runs, but the resource is transferred exactly once
    Mock::given(method("GET"))
        .and(path("/img-original/art_p0.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"png-bytes".to_vec()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let images = tempfile::TempDir::new().unwrap();
    let config = test_config(&base_url, images.path().to_str().unwrap());
    let shutdown = ShutdownHandle::default();

    let first = run_download_batch(&config, credentials(), &shutdown)
        .await
        .unwrap();
    assert_eq!(first.downloaded, 1);

    let second = run_download_batch(&config, credentials(), &shutdown)
        .await
        .unwrap();
    assert_eq!(second.downloaded, 0);
    assert_eq!(second.already_present, 1);

    let dest = expected_destination(images.path(), &base_url);
    assert_eq!(std::fs::read(&dest).unwrap(), b"png-bytes");
}

#[tokio::test]
async fn test_existing_destination_skips_the_resource_fetch() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_login(&mock_server).await;
    mount_one_item(&mock_server, &base_url).await;

    // The destination already exists, so the resource host sees nothing
    Mock::given(method("GET"))
        .and(path("/img-original/art_p0.png"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let images = tempfile::TempDir::new().unwrap();
    let dest = expected_destination(images.path(), &base_url);
    std::fs::write(&dest, b"earlier-bytes").unwrap();

    let config = test_config(&base_url, images.path().to_str().unwrap());
    let shutdown = ShutdownHandle::default();

    let summary = run_download_batch(&config, credentials(), &shutdown)
        .await
        .unwrap();

    assert_eq!(summary.already_present, 1);
    assert_eq!(summary.downloaded, 0);
    // The earlier file is untouched
    assert_eq!(std::fs::read(&dest).unwrap(), b"earlier-bytes");
}

#[tokio::test]
async fn test_auth_failure_aborts_before_any_download() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<form action="/api/login"><input name="login_id"></form>"#,
        ))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    // Verification shows no signed-in marker
    Mock::given(method("GET"))
        .and(path("/dashboard"))
        .respond_with(ResponseTemplate::new(200).set_body_string("please sign in"))
        .mount(&mock_server)
        .await;

    // The workflow must stop cold: no listing, detail, or resource requests
    Mock::given(method("GET"))
        .and(path("/ranking.php"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/artworks/9876"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let images = tempfile::TempDir::new().unwrap();
    let config = test_config(&base_url, images.path().to_str().unwrap());
    let shutdown = ShutdownHandle::default();

    let result = run_download_batch(&config, credentials(), &shutdown).await;
    assert!(matches!(result, Err(ShioriError::Auth(_))));
}

#[tokio::test]
async fn test_item_without_original_marker_is_skipped() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_login(&mock_server).await;

    let listing = r#"<div class="ranking-item" data-id="555"><h2>Gone</h2></div>"#;
    Mock::given(method("GET"))
        .and(path("/ranking.php"))
        .and(query_param("mode", "daily"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing))
        .mount(&mock_server)
        .await;

    // Detail page without an embedded original marker
    Mock::given(method("GET"))
        .and(path("/artworks/555"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"urls":{"small":"x.jpg"}}"#),
        )
        .mount(&mock_server)
        .await;

    let images = tempfile::TempDir::new().unwrap();
    let config = test_config(&base_url, images.path().to_str().unwrap());
    let shutdown = ShutdownHandle::default();

    let summary = run_download_batch(&config, credentials(), &shutdown)
        .await
        .unwrap();

    assert_eq!(summary.requested, 1);
    assert_eq!(summary.downloaded, 0);
    assert_eq!(summary.skipped, 1);
}

#[tokio::test]
async fn test_limit_truncates_the_batch() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_login(&mock_server).await;

    let listing: String = (1..=5)
        .map(|i| format!(r#"<div class="ranking-item" data-id="{}"><h2>t{}</h2></div>"#, i, i))
        .collect();
    Mock::given(method("GET"))
        .and(path("/ranking.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing))
        .mount(&mock_server)
        .await;

    // Detail pages resolve nowhere so nothing is downloaded; only the first
    // two items (the limit) are visited at all
    for i in 1..=2 {
        Mock::given(method("GET"))
            .and(path(format!("/artworks/{}", i)))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&mock_server)
            .await;
    }
    for i in 3..=5 {
        Mock::given(method("GET"))
            .and(path(format!("/artworks/{}", i)))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;
    }

    let images = tempfile::TempDir::new().unwrap();
    let mut config = test_config(&base_url, images.path().to_str().unwrap());
    config.ranking.limit = 2;
    let shutdown = ShutdownHandle::default();

    let summary = run_download_batch(&config, credentials(), &shutdown)
        .await
        .unwrap();

    assert_eq!(summary.requested, 2);
}
