//! API integration tests for the HTTP endpoints.
//!
//! Tests verify:
//! - Health and feature discovery
//! - Upload inspection (base64 + metadata)
//! - Inline processing and attachment download
//! - Error cases (missing file, wrong content type, oversized upload,
//!   invalid parameters, unavailable background removal)

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use http_body_util::BodyExt;
use tower::ServiceExt;

use imgsquish::pipeline::Processor;
use imgsquish::{create_router, RouterConfig};

use super::test_utils::{
    create_test_jpeg, create_test_png, image_upload_body, is_valid_png, is_valid_webp,
    multipart_body, multipart_content_type, BorderSegmenter, FailingSegmenter,
};

fn test_router() -> axum::Router {
    create_router(Processor::new(), RouterConfig::default())
}

fn test_router_with_segmenter() -> axum::Router {
    create_router(
        Processor::with_segmenter(Arc::new(BorderSegmenter)),
        RouterConfig::default(),
    )
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

// =============================================================================
// Health and Features
// =============================================================================

#[tokio::test]
async fn test_health_check() {
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = test_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["features"]["background_removal"], false);
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_features_reflect_segmenter() {
    let request = Request::builder()
        .uri("/features")
        .body(Body::empty())
        .unwrap();
    let json = json_body(test_router().oneshot(request).await.unwrap()).await;
    assert_eq!(json["background_removal"], false);

    let request = Request::builder()
        .uri("/features")
        .body(Body::empty())
        .unwrap();
    let json = json_body(test_router_with_segmenter().oneshot(request).await.unwrap()).await;
    assert_eq!(json["background_removal"], true);
}

// =============================================================================
// Upload Inspection
// =============================================================================

#[tokio::test]
async fn test_upload_returns_info_and_base64() {
    let jpeg = create_test_jpeg(64, 48, 85);
    let request = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(header::CONTENT_TYPE, multipart_content_type())
        .body(image_upload_body("photo.jpg", "image/jpeg", &jpeg))
        .unwrap();

    let response = test_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["filename"], "photo.jpg");
    assert_eq!(json["info"]["width"], 64);
    assert_eq!(json["info"]["height"], 48);
    assert_eq!(json["info"]["format"], "jpeg");
    assert_eq!(json["info"]["size_bytes"], jpeg.len() as u64);

    // The echoed image must round-trip to the original bytes.
    let echoed = BASE64.decode(json["image"].as_str().unwrap()).unwrap();
    assert_eq!(echoed, jpeg);
}

#[tokio::test]
async fn test_upload_missing_file_rejected() {
    let request = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(header::CONTENT_TYPE, multipart_content_type())
        .body(multipart_body("other", "x.jpg", "image/jpeg", b"data"))
        .unwrap();

    let response = test_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = json_body(response).await;
    assert_eq!(json["error"], "invalid_upload");
}

#[tokio::test]
async fn test_upload_non_image_content_type_rejected() {
    let request = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(header::CONTENT_TYPE, multipart_content_type())
        .body(multipart_body("file", "notes.txt", "text/plain", b"hello"))
        .unwrap();

    let response = test_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = json_body(response).await;
    assert_eq!(json["error"], "invalid_upload");
}

#[tokio::test]
async fn test_upload_undecodable_image_rejected() {
    let request = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(header::CONTENT_TYPE, multipart_content_type())
        .body(image_upload_body("fake.png", "image/png", b"not a png"))
        .unwrap();

    let response = test_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = json_body(response).await;
    assert_eq!(json["error"], "decode_error");
}

#[tokio::test]
async fn test_upload_over_limit_rejected() {
    let png = create_test_png(64, 64);
    let router = create_router(
        Processor::new(),
        RouterConfig::default().with_max_upload_size(16),
    );

    let request = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(header::CONTENT_TYPE, multipart_content_type())
        .body(image_upload_body("big.png", "image/png", &png))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = json_body(response).await;
    assert_eq!(json["error"], "file_too_large");
}

// =============================================================================
// Inline Processing
// =============================================================================

#[tokio::test]
async fn test_process_defaults_to_webp() {
    let jpeg = create_test_jpeg(64, 64, 85);
    let request = Request::builder()
        .method("POST")
        .uri("/process")
        .header(header::CONTENT_TYPE, multipart_content_type())
        .body(image_upload_body("photo.jpg", "image/jpeg", &jpeg))
        .unwrap();

    let response = test_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["metadata"]["format"], "webp");
    assert_eq!(json["metadata"]["quality"], 80);
    assert_eq!(json["metadata"]["original_size"], jpeg.len() as u64);

    let output = BASE64.decode(json["image"].as_str().unwrap()).unwrap();
    assert!(is_valid_webp(&output));
    assert_eq!(json["metadata"]["processed_size"], output.len() as u64);
}

#[tokio::test]
async fn test_process_resize_via_query() {
    let jpeg = create_test_jpeg(200, 100, 85);
    let request = Request::builder()
        .method("POST")
        .uri("/process?width=100&format=jpeg&quality=70")
        .header(header::CONTENT_TYPE, multipart_content_type())
        .body(image_upload_body("photo.jpg", "image/jpeg", &jpeg))
        .unwrap();

    let response = test_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["metadata"]["processed_dimensions"][0], 100);
    assert_eq!(json["metadata"]["processed_dimensions"][1], 50);
    assert_eq!(json["metadata"]["format"], "jpeg");
}

#[tokio::test]
async fn test_process_accepts_jpg_alias() {
    let png = create_test_png(32, 32);
    let request = Request::builder()
        .method("POST")
        .uri("/process?format=jpg&quality=70")
        .header(header::CONTENT_TYPE, multipart_content_type())
        .body(image_upload_body("img.png", "image/png", &png))
        .unwrap();

    let response = test_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["metadata"]["format"], "jpeg");
}

#[tokio::test]
async fn test_process_invalid_quality_rejected() {
    let png = create_test_png(16, 16);
    let request = Request::builder()
        .method("POST")
        .uri("/process?quality=0")
        .header(header::CONTENT_TYPE, multipart_content_type())
        .body(image_upload_body("img.png", "image/png", &png))
        .unwrap();

    let response = test_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = json_body(response).await;
    assert_eq!(json["error"], "invalid_parameters");
}

#[tokio::test]
async fn test_process_unknown_format_rejected_as_json() {
    let png = create_test_png(16, 16);
    let request = Request::builder()
        .method("POST")
        .uri("/process?format=avif")
        .header(header::CONTENT_TYPE, multipart_content_type())
        .body(image_upload_body("img.png", "image/png", &png))
        .unwrap();

    let response = test_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Unparseable query parameters use the same JSON error shape as every
    // other failure, not a plain-text rejection.
    let json = json_body(response).await;
    assert_eq!(json["error"], "invalid_parameters");
    assert_eq!(json["status"], 400);
}

#[tokio::test]
async fn test_process_oversized_dimension_rejected() {
    let png = create_test_png(16, 16);
    let request = Request::builder()
        .method("POST")
        .uri("/process?width=10001")
        .header(header::CONTENT_TYPE, multipart_content_type())
        .body(image_upload_body("img.png", "image/png", &png))
        .unwrap();

    let response = test_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = json_body(response).await;
    assert_eq!(json["error"], "invalid_parameters");
}

// =============================================================================
// Background Removal
// =============================================================================

#[tokio::test]
async fn test_process_background_removal_unavailable() {
    let png = create_test_png(16, 16);
    let request = Request::builder()
        .method("POST")
        .uri("/process?remove_background=true")
        .header(header::CONTENT_TYPE, multipart_content_type())
        .body(image_upload_body("img.png", "image/png", &png))
        .unwrap();

    let response = test_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = json_body(response).await;
    assert_eq!(json["error"], "background_removal_unavailable");
}

#[tokio::test]
async fn test_process_background_removal_forces_png() {
    let jpeg = create_test_jpeg(32, 32, 85);
    let request = Request::builder()
        .method("POST")
        .uri("/process?remove_background=true&format=webp")
        .header(header::CONTENT_TYPE, multipart_content_type())
        .body(image_upload_body("photo.jpg", "image/jpeg", &jpeg))
        .unwrap();

    let response = test_router_with_segmenter().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["metadata"]["format"], "png");
    assert_eq!(json["metadata"]["background_removed"], true);

    let output = BASE64.decode(json["image"].as_str().unwrap()).unwrap();
    assert!(is_valid_png(&output));
    let decoded = image::load_from_memory(&output).unwrap().to_rgba8();
    assert_eq!(decoded.get_pixel(0, 0).0[3], 0, "border should be transparent");
}

#[tokio::test]
async fn test_process_segmenter_failure_is_server_error() {
    let router = create_router(
        Processor::with_segmenter(Arc::new(FailingSegmenter)),
        RouterConfig::default(),
    );

    let png = create_test_png(16, 16);
    let request = Request::builder()
        .method("POST")
        .uri("/process?remove_background=true")
        .header(header::CONTENT_TYPE, multipart_content_type())
        .body(image_upload_body("img.png", "image/png", &png))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = json_body(response).await;
    assert_eq!(json["error"], "segmentation_error");
}

// =============================================================================
// Download
// =============================================================================

#[tokio::test]
async fn test_download_headers() {
    let jpeg = create_test_jpeg(64, 64, 85);
    let request = Request::builder()
        .method("POST")
        .uri("/download?quality=70")
        .header(header::CONTENT_TYPE, multipart_content_type())
        .body(image_upload_body("holiday.jpg", "image/jpeg", &jpeg))
        .unwrap();

    let response = test_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/webp"
    );
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=\"holiday_compressed.webp\""
    );

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(is_valid_webp(&body));
}

#[tokio::test]
async fn test_download_nobg_filename() {
    let jpeg = create_test_jpeg(32, 32, 85);
    let request = Request::builder()
        .method("POST")
        .uri("/download?remove_background=true")
        .header(header::CONTENT_TYPE, multipart_content_type())
        .body(image_upload_body("portrait.jpg", "image/jpeg", &jpeg))
        .unwrap();

    let response = test_router_with_segmenter().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/png"
    );
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=\"portrait_nobg.png\""
    );
}
