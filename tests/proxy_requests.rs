//! End-to-end tests for the image proxy request pipeline.

use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::time::Duration;

use imageable_proxy::config::{PlatformConfig, ProxyConfig};
use imageable_proxy::http::HttpServer;
use imageable_proxy::lifecycle::Shutdown;

mod common;

/// Spawn the proxy on an ephemeral port.
async fn spawn_proxy(config: ProxyConfig) -> (SocketAddr, Shutdown) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = HttpServer::new(config).unwrap();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    (addr, shutdown)
}

fn config_with_origin(origin: SocketAddr) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.platforms.insert(
        "default".to_string(),
        PlatformConfig {
            img_url: format!("http://{}", origin),
        },
    );
    config
}

fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

#[tokio::test]
async fn test_resize_returns_transformed_image_with_cache_header() {
    let (origin, _) = common::start_mock_origin(200, "image/png", common::png_fixture(100, 80)).await;
    let (proxy, shutdown) = spawn_proxy(config_with_origin(origin)).await;

    let res = client()
        .get(format!("http://{}/50/40/resize/path/to/pic.png", proxy))
        .send()
        .await
        .expect("Proxy unreachable");

    assert_eq!(res.status(), 200);
    assert_eq!(
        res.headers().get("cache-control").unwrap(),
        "max-age=31557600000"
    );
    assert_eq!(res.headers().get("content-type").unwrap(), "image/png");

    let body = res.bytes().await.unwrap();
    let img = image::load_from_memory(&body).unwrap();
    assert_eq!((img.width(), img.height()), (50, 40));

    shutdown.trigger();
}

#[tokio::test]
async fn test_fit_preserves_aspect_ratio() {
    let (origin, _) = common::start_mock_origin(200, "image/png", common::png_fixture(100, 50)).await;
    let (proxy, shutdown) = spawn_proxy(config_with_origin(origin)).await;

    let res = client()
        .get(format!("http://{}/40/40/fit/pic.png", proxy))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let body = res.bytes().await.unwrap();
    let img = image::load_from_memory(&body).unwrap();
    assert_eq!((img.width(), img.height()), (40, 20));

    shutdown.trigger();
}

#[tokio::test]
async fn test_identify_returns_metadata_without_content_type() {
    let (origin, _) = common::start_mock_origin(200, "image/png", common::png_fixture(12, 34)).await;
    let (proxy, shutdown) = spawn_proxy(config_with_origin(origin)).await;

    let res = client()
        .get(format!("http://{}/0/0/identify/pic.png", proxy))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert!(res.headers().get("content-type").is_none());
    assert_eq!(
        res.headers().get("cache-control").unwrap(),
        "max-age=31557600000"
    );

    let info: serde_json::Value = res.json().await.unwrap();
    assert_eq!(info["format"], "image/png");
    assert_eq!(info["width"], 12);
    assert_eq!(info["height"], 34);

    shutdown.trigger();
}

#[tokio::test]
async fn test_crop_falls_through_to_identify() {
    let (origin, _) = common::start_mock_origin(200, "image/png", common::png_fixture(60, 60)).await;
    let (proxy, shutdown) = spawn_proxy(config_with_origin(origin)).await;

    let res = client()
        .get(format!("http://{}/10/10/crop/pic.png", proxy))
        .send()
        .await
        .unwrap();

    // No cropped image: identify-style metadata, no content type.
    assert_eq!(res.status(), 200);
    assert!(res.headers().get("content-type").is_none());
    let info: serde_json::Value = res.json().await.unwrap();
    assert_eq!(info["width"], 60);
    assert_eq!(info["height"], 60);

    shutdown.trigger();
}

#[tokio::test]
async fn test_post_is_method_not_allowed() {
    let (origin, _) = common::start_mock_origin(200, "image/png", common::png_fixture(8, 8)).await;
    let (proxy, shutdown) = spawn_proxy(config_with_origin(origin)).await;

    let res = client()
        .post(format!("http://{}/100/100/resize/pic.png", proxy))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 405);
    assert_eq!(res.headers().get("allow").unwrap(), "GET");

    shutdown.trigger();
}

#[tokio::test]
async fn test_short_path_gets_usage_hint() {
    let (origin, hits) = common::start_mock_origin(200, "image/png", common::png_fixture(8, 8)).await;
    let (proxy, shutdown) = spawn_proxy(config_with_origin(origin)).await;

    let res = client()
        .get(format!("http://{}/100/100", proxy))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 400);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["code"], 400);
    assert!(body["result"]
        .as_str()
        .unwrap()
        .contains("Please provide following parameters"));
    assert_eq!(hits.load(Ordering::SeqCst), 0, "No fetch for a bad path");

    shutdown.trigger();
}

#[tokio::test]
async fn test_out_of_range_dimensions_name_the_range() {
    let (origin, _) = common::start_mock_origin(200, "image/png", common::png_fixture(8, 8)).await;
    let mut config = config_with_origin(origin);
    config.imageable.image_size_limit = 2000;
    let (proxy, shutdown) = spawn_proxy(config).await;

    let res = client()
        .get(format!("http://{}/5000/100/resize/pic.jpg", proxy))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 400);
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["result"].as_str().unwrap().contains("between 0 and 2000"));

    shutdown.trigger();
}

#[tokio::test]
async fn test_unlisted_host_is_rejected_before_fetch() {
    let (origin, hits) = common::start_mock_origin(200, "image/png", common::png_fixture(8, 8)).await;
    let mut config = config_with_origin(origin);
    config.imageable.whitelist.insert(
        "allowed_hosts".to_string(),
        vec![r"cdn\.example\.com".to_string()],
    );
    let (proxy, shutdown) = spawn_proxy(config).await;

    let res = client()
        .get(format!("http://{}/10/10/resize/pic.png", proxy))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 400);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["result"], "Host is not allowed");
    assert_eq!(hits.load(Ordering::SeqCst), 0, "Rejected host must not be fetched");

    shutdown.trigger();
}

#[tokio::test]
async fn test_matching_allow_list_permits_fetch() {
    let (origin, _) = common::start_mock_origin(200, "image/png", common::png_fixture(30, 30)).await;
    let mut config = config_with_origin(origin);
    config.imageable.whitelist.insert(
        "allowed_hosts".to_string(),
        vec![r"127\.0\.0\.1".to_string()],
    );
    let (proxy, shutdown) = spawn_proxy(config).await;

    let res = client()
        .get(format!("http://{}/10/10/resize/pic.png", proxy))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);

    shutdown.trigger();
}

#[tokio::test]
async fn test_unreachable_origin_names_url() {
    let origin = common::unreachable_addr().await;
    let (proxy, shutdown) = spawn_proxy(config_with_origin(origin)).await;

    let res = client()
        .get(format!("http://{}/10/10/resize/pic.png", proxy))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 400);
    let body: serde_json::Value = res.json().await.unwrap();
    let message = body["result"].as_str().unwrap();
    assert!(message.starts_with("Unable to download the requested image"));
    assert!(message.contains(&format!("http://{}/pic.png", origin)));

    shutdown.trigger();
}

#[tokio::test]
async fn test_origin_error_status_is_download_failure() {
    let (origin, _) = common::start_mock_origin(404, "text/html", b"gone".to_vec()).await;
    let (proxy, shutdown) = spawn_proxy(config_with_origin(origin)).await;

    let res = client()
        .get(format!("http://{}/10/10/resize/pic.png", proxy))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 400);
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["result"]
        .as_str()
        .unwrap()
        .starts_with("Unable to download"));

    shutdown.trigger();
}

#[tokio::test]
async fn test_unsupported_file_type_still_costs_the_fetch() {
    let (origin, hits) = common::start_mock_origin(200, "image/png", common::png_fixture(8, 8)).await;
    let (proxy, shutdown) = spawn_proxy(config_with_origin(origin)).await;

    let res = client()
        .get(format!("http://{}/10/10/resize/pic.xyz", proxy))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 400);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["result"], "Unsupported file type");
    // Type resolution runs after the fetch, so the origin was hit once.
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    shutdown.trigger();
}

#[tokio::test]
async fn test_identical_requests_produce_identical_bytes() {
    let (origin, _) = common::start_mock_origin(200, "image/png", common::png_fixture(64, 64)).await;
    let (proxy, shutdown) = spawn_proxy(config_with_origin(origin)).await;

    let url = format!("http://{}/16/16/resize/pic.png", proxy);
    let first = client().get(&url).send().await.unwrap().bytes().await.unwrap();
    let second = client().get(&url).send().await.unwrap().bytes().await.unwrap();

    assert_eq!(first, second);

    shutdown.trigger();
}
