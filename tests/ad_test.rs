//! Integration tests for the ad endpoints

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;

use common::{create_ad, create_category, create_user, response_json, send, setup_test_app, PAGE_SIZE};

#[tokio::test]
async fn test_create_ad_success() {
    let t = setup_test_app();
    create_user(&t.app, "alice").await;
    create_category(&t.app, "Sport").await;

    let body = create_ad(&t.app, "Bicycle", "alice", "Sport", 1200, true).await;

    assert_eq!(body["id"], 1);
    assert_eq!(body["name"], "Bicycle");
    assert_eq!(body["author"], "alice");
    assert_eq!(body["category"], "Sport");
    assert_eq!(body["price"], 1200);
    assert_eq!(body["description"], "Bicycle for sale");
    assert_eq!(body["is_published"], true);
    assert!(body["image"].is_null());
}

#[tokio::test]
async fn test_create_ad_unknown_author() {
    let t = setup_test_app();
    create_category(&t.app, "Sport").await;

    let (status, body) = send(
        &t.app,
        "POST",
        "/ad/create/",
        Some(json!({
            "name": "Bicycle",
            "author": "ghost",
            "category": "Sport",
            "price": 100,
            "description": "x",
            "is_published": false
        })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("ghost"));
}

#[tokio::test]
async fn test_create_ad_unknown_category() {
    let t = setup_test_app();
    create_user(&t.app, "alice").await;

    let (status, _) = send(
        &t.app,
        "POST",
        "/ad/create/",
        Some(json!({
            "name": "Bicycle",
            "author": "alice",
            "category": "Nowhere",
            "price": 100,
            "description": "x",
            "is_published": false
        })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);

    // Nothing was written
    let (_, list) = send(&t.app, "GET", "/ad/", None).await;
    assert_eq!(list["total"], 0);
}

#[tokio::test]
async fn test_create_ad_negative_price_rejected() {
    let t = setup_test_app();
    create_user(&t.app, "alice").await;
    create_category(&t.app, "Sport").await;

    let response = common::send_raw(
        &t.app,
        "POST",
        "/ad/create/",
        Some(json!({
            "name": "Bicycle",
            "author": "alice",
            "category": "Sport",
            "price": -5,
            "description": "x",
            "is_published": true
        })),
    )
    .await;

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_list_ads_sorted_by_price_and_paginated() {
    let t = setup_test_app();
    create_user(&t.app, "alice").await;
    create_category(&t.app, "Sport").await;

    for (name, price) in [("Ball", 50), ("Bicycle", 1200), ("Skis", 700), ("Helmet", 90), ("Boat", 5000)] {
        create_ad(&t.app, name, "alice", "Sport", price, true).await;
    }

    let (status, page1) = send(&t.app, "GET", "/ad/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page1["total"], 5);
    assert_eq!(page1["per_page"], 3);

    let items = page1["items"].as_array().unwrap();
    assert_eq!(items.len(), PAGE_SIZE);
    assert_eq!(items[0]["name"], "Boat");
    assert_eq!(items[1]["name"], "Bicycle");

    let (_, page2) = send(&t.app, "GET", "/ad/?page=2", None).await;
    let prices: Vec<u64> = page2["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|ad| ad["price"].as_u64().unwrap())
        .collect();
    assert_eq!(prices, vec![700, 90]);

    // Out-of-range goes to the last page, garbage to the first
    let (_, last) = send(&t.app, "GET", "/ad/?page=99", None).await;
    assert_eq!(last["items"].as_array().unwrap().len(), 1);
    assert_eq!(last["items"][0]["name"], "Ball");

    let (_, first) = send(&t.app, "GET", "/ad/?page=abc", None).await;
    assert_eq!(first["items"][0]["name"], "Boat");
}

#[tokio::test]
async fn test_list_ads_empty() {
    let t = setup_test_app();

    let (status, body) = send(&t.app, "GET", "/ad/", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);
    assert_eq!(body["per_page"], 1);
    assert!(body["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_get_ad() {
    let t = setup_test_app();
    create_user(&t.app, "alice").await;
    create_category(&t.app, "Sport").await;
    let created = create_ad(&t.app, "Bicycle", "alice", "Sport", 1200, true).await;

    let (status, body) = send(&t.app, "GET", "/ad/1/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, created);

    let (status, _) = send(&t.app, "GET", "/ad/42/", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_ad_only_changes_given_fields() {
    let t = setup_test_app();
    create_user(&t.app, "alice").await;
    create_category(&t.app, "Sport").await;
    create_ad(&t.app, "Bicycle", "alice", "Sport", 1200, false).await;

    let (status, body) = send(
        &t.app,
        "PATCH",
        "/ad/1/update/",
        Some(json!({ "price": 900, "is_published": true })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["price"], 900);
    assert_eq!(body["is_published"], true);
    assert_eq!(body["name"], "Bicycle");
    assert_eq!(body["description"], "Bicycle for sale");
    assert_eq!(body["author"], "alice");
    assert_eq!(body["category"], "Sport");

    // Author and category are not updatable through this path
    let (_, body) = send(
        &t.app,
        "PATCH",
        "/ad/1/update/",
        Some(json!({ "author": "bob", "category": "Cars", "name": "Road bike" })),
    )
    .await;
    assert_eq!(body["name"], "Road bike");
    assert_eq!(body["author"], "alice");
    assert_eq!(body["category"], "Sport");
    assert_eq!(body["price"], 900);
}

#[tokio::test]
async fn test_update_ad_price_reorders_list() {
    let t = setup_test_app();
    create_user(&t.app, "alice").await;
    create_category(&t.app, "Sport").await;
    create_ad(&t.app, "Cheap", "alice", "Sport", 10, true).await;
    create_ad(&t.app, "Pricey", "alice", "Sport", 1000, true).await;

    send(&t.app, "PATCH", "/ad/1/update/", Some(json!({ "price": 5000 }))).await;

    let (_, list) = send(&t.app, "GET", "/ad/", None).await;
    assert_eq!(list["total"], 2);
    assert_eq!(list["items"][0]["name"], "Cheap");
    assert_eq!(list["items"][0]["price"], 5000);
    assert_eq!(list["items"][1]["name"], "Pricey");
}

#[tokio::test]
async fn test_update_missing_ad() {
    let t = setup_test_app();

    let (status, _) = send(&t.app, "PATCH", "/ad/7/update/", Some(json!({ "price": 1 }))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_ad() {
    let t = setup_test_app();
    create_user(&t.app, "alice").await;
    create_category(&t.app, "Sport").await;
    create_ad(&t.app, "Bicycle", "alice", "Sport", 1200, true).await;

    let (status, body) = send(&t.app, "DELETE", "/ad/1/delete/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "OK" }));

    let (status, _) = send(&t.app, "GET", "/ad/1/", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, list) = send(&t.app, "GET", "/ad/", None).await;
    assert_eq!(list["total"], 0);

    let (status, _) = send(&t.app, "DELETE", "/ad/1/delete/", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

fn multipart_request(uri: &str, field: &str, file_name: &str, data: &[u8]) -> Request<Body> {
    let boundary = "XBOUNDARYX";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: image/jpeg\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_upload_image() {
    let t = setup_test_app();
    create_user(&t.app, "alice").await;
    create_category(&t.app, "Sport").await;
    create_ad(&t.app, "Bicycle", "alice", "Sport", 1200, true).await;

    let response = t
        .app
        .clone()
        .oneshot(multipart_request("/ad/1/upload_image/", "image", "photo.jpg", b"jpegdata"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response.into_body()).await;
    assert_eq!(body["image"], "/media/images/photo.jpg");

    let stored = t.dir.path().join("media/images/photo.jpg");
    assert_eq!(std::fs::read(stored).unwrap(), b"jpegdata");

    // The image sticks to the ad
    let (_, fetched) = send(&t.app, "GET", "/ad/1/", None).await;
    assert_eq!(fetched["image"], "/media/images/photo.jpg");
}

#[tokio::test]
async fn test_upload_image_same_name_gets_new_file() {
    let t = setup_test_app();
    create_user(&t.app, "alice").await;
    create_category(&t.app, "Sport").await;
    create_ad(&t.app, "Bicycle", "alice", "Sport", 1200, true).await;
    create_ad(&t.app, "Skis", "alice", "Sport", 700, true).await;

    let first = t
        .app
        .clone()
        .oneshot(multipart_request("/ad/1/upload_image/", "image", "photo.jpg", b"one"))
        .await
        .unwrap();
    let first = response_json(first.into_body()).await;

    let second = t
        .app
        .clone()
        .oneshot(multipart_request("/ad/2/upload_image/", "image", "photo.jpg", b"two"))
        .await
        .unwrap();
    let second = response_json(second.into_body()).await;

    let first_url = first["image"].as_str().unwrap();
    let second_url = second["image"].as_str().unwrap();
    assert_eq!(first_url, "/media/images/photo.jpg");
    assert_ne!(first_url, second_url);
    assert!(second_url.starts_with("/media/images/photo_"));
    assert!(second_url.ends_with(".jpg"));

    let stored = t
        .dir
        .path()
        .join("media")
        .join(second_url.trim_start_matches("/media/"));
    assert_eq!(std::fs::read(stored).unwrap(), b"two");
}

#[tokio::test]
async fn test_upload_image_missing_field() {
    let t = setup_test_app();
    create_user(&t.app, "alice").await;
    create_category(&t.app, "Sport").await;
    create_ad(&t.app, "Bicycle", "alice", "Sport", 1200, true).await;

    let response = t
        .app
        .clone()
        .oneshot(multipart_request("/ad/1/upload_image/", "picture", "photo.jpg", b"data"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_image_missing_ad() {
    let t = setup_test_app();

    let response = t
        .app
        .clone()
        .oneshot(multipart_request("/ad/9/upload_image/", "image", "photo.jpg", b"data"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(!t.dir.path().join("media/images/photo.jpg").exists());
}

#[tokio::test]
async fn test_upload_image_text_part_is_not_a_file() {
    let t = setup_test_app();
    create_user(&t.app, "alice").await;
    create_category(&t.app, "Sport").await;
    create_ad(&t.app, "Bicycle", "alice", "Sport", 1200, true).await;

    let boundary = "XBOUNDARYX";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"image\"\r\n\r\nnot a file\r\n--{boundary}--\r\n"
    );
    let response = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/ad/1/upload_image/")
                .header("content-type", format!("multipart/form-data; boundary={boundary}"))
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(!t.dir.path().join("media/images/upload").exists());

    let (_, fetched) = send(&t.app, "GET", "/ad/1/", None).await;
    assert!(fetched["image"].is_null());
}
