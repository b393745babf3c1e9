/*
 *  tests/artwork_fetch.rs
 *
 *  Artwork download retry behaviour against a stub image host
 *
 *  SpotPix - now playing, pixel by pixel
 *  (c) 2020-26 Stuart Hunter
 */

use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use spotpix::{ArtworkError, ArtworkFetcher, ArtworkSource, RetryPolicy};

const BASE: Duration = Duration::from_millis(50);

fn fetcher() -> ArtworkFetcher {
    let policy = RetryPolicy { base_delay: BASE, ..RetryPolicy::default() };
    ArtworkFetcher::new(policy, Some(Duration::from_secs(2))).unwrap()
}

fn png_bytes(w: u32, h: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(w, h, Rgb([200, 30, 10]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

async fn received(server: &MockServer) -> usize {
    server.received_requests().await.map(|r| r.len()).unwrap_or(0)
}

#[tokio::test]
async fn test_png_decodes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/image/ok"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png_bytes(64, 64)))
        .mount(&server)
        .await;

    let img = fetcher().fetch(&format!("{}/image/ok", server.uri())).await.unwrap();
    assert_eq!(img.dimensions(), (64, 64));
    assert_eq!(img.get_pixel(3, 3), &Rgb([200, 30, 10]));
}

#[tokio::test]
async fn test_service_unavailable_exhausts_with_backoff() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let started = Instant::now();
    let err = fetcher().fetch(&format!("{}/image/busy", server.uri())).await.unwrap_err();

    match err {
        ArtworkError::Exhausted { attempts, last } => {
            assert_eq!(attempts, 3);
            assert!(last.contains("503"));
        }
        other => panic!("expected Exhausted, got {:?}", other),
    }
    assert_eq!(received(&server).await, 3);
    // waits of base then 2 * base between the three attempts
    assert!(started.elapsed() >= BASE * 3);
}

#[tokio::test]
async fn test_transient_then_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png_bytes(300, 300)))
        .mount(&server)
        .await;

    let img = fetcher().fetch(&format!("{}/image/flaky", server.uri())).await.unwrap();
    assert_eq!(img.dimensions(), (300, 300));
    assert_eq!(received(&server).await, 2);
}

#[tokio::test]
async fn test_not_found_fails_fast() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = fetcher().fetch(&format!("{}/image/gone", server.uri())).await.unwrap_err();
    assert!(matches!(err, ArtworkError::Status(404)));
    assert_eq!(received(&server).await, 1);
}

#[tokio::test]
async fn test_garbage_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"<html>not an image</html>".to_vec()))
        .mount(&server)
        .await;

    let err = fetcher().fetch(&format!("{}/image/html", server.uri())).await.unwrap_err();
    assert!(matches!(err, ArtworkError::Decode(_)));
    assert_eq!(received(&server).await, 1);
}

#[tokio::test]
async fn test_retry_after_is_honoured() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "1"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png_bytes(8, 8)))
        .mount(&server)
        .await;

    let started = Instant::now();
    fetcher().fetch(&format!("{}/image/limited", server.uri())).await.unwrap();
    assert!(started.elapsed() >= Duration::from_secs(1));
}

#[tokio::test]
async fn test_unreachable_host_exhausts() {
    // nothing listens on port 9 of localhost in the test environment
    let err = fetcher().fetch("http://127.0.0.1:9/image/x").await.unwrap_err();
    assert!(matches!(err, ArtworkError::Exhausted { attempts: 3, .. }));
}
