mod common;

use image::ImageFormat;
use reqwest::{StatusCode, multipart};
use serde_json::{Value, json};
use tempfile::TempDir;

use common::{image_bytes, spawn_app, write_image};

fn png_part(width: u32, height: u32, filename: &str) -> multipart::Part {
    multipart::Part::bytes(image_bytes(width, height, ImageFormat::Png))
        .file_name(filename.to_string())
        .mime_str("image/png")
        .unwrap()
}

#[tokio::test]
async fn test_upload_batch_with_overrides() {
    let root = TempDir::new().unwrap();
    let address = spawn_app(root.path()).await;
    let client = reqwest::Client::new();

    let form = multipart::Form::new()
        .part("avatar", png_part(200, 100, "avatar.png"))
        .part(
            "doc",
            multipart::Part::text("hello").file_name("notes.txt"),
        )
        .text("config", json!({ "file_types": "image" }).to_string())
        .text("comment", "ignored");

    let response = client
        .post(format!("{address}/api/upload"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to upload");

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();

    assert_eq!(body["error"], false);
    assert_eq!(body["uploaded"], 1);
    assert_eq!(body["attempted"], 2);
    assert_eq!(body["files"]["avatar"]["url"], "/uploads/avatar.png");
    assert_eq!(body["files"]["avatar"]["imageDimensions"]["w"], 200);
    assert_eq!(body["files"]["avatar"]["error"], Value::Null);
    assert_eq!(
        body["files"]["doc"]["error"],
        "You must upload an image file."
    );

    // rejected parts do not linger in staging
    let staged = std::fs::read_dir(root.path().join(".staging")).unwrap().count();
    assert_eq!(staged, 0);

    let served = client
        .get(format!("{address}/uploads/avatar.png"))
        .send()
        .await
        .expect("Failed to fetch upload");
    assert_eq!(served.status(), StatusCode::OK);
    assert!(!served.bytes().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_repeated_fields() {
    let root = TempDir::new().unwrap();
    let address = spawn_app(root.path()).await;
    let client = reqwest::Client::new();

    let form = multipart::Form::new()
        .part("photos[]", png_part(10, 10, "one.png"))
        .part("photos[]", png_part(10, 10, "two.png"));

    let body: Value = client
        .post(format!("{address}/api/upload"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to upload")
        .json()
        .await
        .unwrap();

    assert_eq!(body["uploaded"], 2);
    assert_eq!(body["files"]["photos.0"]["filename"], "one.png");
    assert_eq!(body["files"]["photos.1"]["key"], 1);
}

#[tokio::test]
async fn test_upload_single_result() {
    let root = TempDir::new().unwrap();
    let address = spawn_app(root.path()).await;
    let client = reqwest::Client::new();

    let form = multipart::Form::new()
        .part("avatar", png_part(10, 10, "avatar.png"))
        .text("config", json!({ "return_single_result": true }).to_string());

    let body: Value = client
        .post(format!("{address}/api/upload"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to upload")
        .json()
        .await
        .unwrap();

    assert_eq!(body["field"], "avatar");
    assert_eq!(body["filename"], "avatar.png");
    assert!(body.get("files").is_none());
}

#[tokio::test]
async fn test_upload_rejects_invalid_overrides() {
    let root = TempDir::new().unwrap();
    let address = spawn_app(root.path()).await;
    let client = reqwest::Client::new();

    let form = multipart::Form::new()
        .part("avatar", png_part(10, 10, "avatar.png"))
        .text("config", json!({ "no_such_setting": 1 }).to_string());

    let response = client
        .post(format!("{address}/api/upload"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to upload");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().contains("invalid settings"));
    assert!(!root.path().join("uploads/avatar.png").exists());

    let form = multipart::Form::new().text("config", "not json");
    let response = client
        .post(format!("{address}/api/upload"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to upload");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_directories_must_stay_inside_the_root() {
    let root = TempDir::new().unwrap();
    let address = spawn_app(root.path()).await;
    let client = reqwest::Client::new();

    let overrides = [
        json!({ "path": "../escaped" }),
        json!({ "path": "/tmp/escaped" }),
        json!({ "image_thumb": true, "thumbnails_directory": "../../thumbs" }),
    ];
    for config in overrides {
        let form = multipart::Form::new()
            .part("avatar", png_part(10, 10, "escaping-avatar.png"))
            .text("config", config.to_string());

        let response = client
            .post(format!("{address}/api/upload"))
            .multipart(form)
            .send()
            .await
            .expect("Failed to upload");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "accepted {config}");
    }

    assert!(!root.path().join("../escaped/escaping-avatar.png").exists());
    assert!(!root.path().join("uploads/escaping-avatar.png").exists());
    let staged = std::fs::read_dir(root.path().join(".staging")).unwrap().count();
    assert_eq!(staged, 0);
}

#[tokio::test]
async fn test_crop_thumbnail_directory_must_stay_inside_the_root() {
    let root = TempDir::new().unwrap();
    write_image(&root.path().join("uploads/photo.png"), 100, 100);
    let address = spawn_app(root.path()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{address}/api/crop"))
        .json(&json!({
            "path": "uploads",
            "filename": "photo.png",
            "config": { "thumbnails_directory": "/tmp/thumbs" },
        }))
        .send()
        .await
        .expect("Failed to crop");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(root.path().join("uploads/photo.png").is_file());
}

#[tokio::test]
async fn test_crop_endpoint() {
    let root = TempDir::new().unwrap();
    write_image(&root.path().join("uploads/photo.png"), 200, 100);
    let address = spawn_app(root.path()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{address}/api/crop"))
        .json(&json!({
            "path": "uploads",
            "filename": "photo.png",
            "new_filename": "square.png",
            "width": 50,
            "height": 50,
            "config": { "image_crop_thumb": false },
        }))
        .send()
        .await
        .expect("Failed to crop");

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], false);
    assert_eq!(body["name"], "square.png");
    assert_eq!(body["path"], "uploads/");
    assert_eq!(
        image::image_dimensions(root.path().join("uploads/square.png")).unwrap(),
        (50, 50)
    );
    assert!(!root.path().join("uploads/photo.png").exists());

    let response = client
        .post(format!("{address}/api/crop"))
        .json(&json!({ "path": "uploads", "filename": "photo.png" }))
        .send()
        .await
        .expect("Failed to crop");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], true);
    assert_eq!(body["message"], "The file specified was not found (photo.png).");
}

#[tokio::test]
async fn test_paths_must_stay_inside_the_root() {
    let root = TempDir::new().unwrap();
    let address = spawn_app(root.path()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{address}/api/crop"))
        .json(&json!({ "path": "../outside", "filename": "photo.png" }))
        .send()
        .await
        .expect("Failed to crop");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .get(format!("{address}/api/files"))
        .query(&[("path", "/etc")])
        .send()
        .await
        .expect("Failed to list");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_and_delete_files() {
    let root = TempDir::new().unwrap();
    write_image(&root.path().join("uploads/photo.png"), 20, 20);
    write_image(&root.path().join("uploads/photo-small.png"), 5, 5);
    std::fs::write(root.path().join("uploads/notes.txt"), "notes").unwrap();
    let address = spawn_app(root.path()).await;
    let client = reqwest::Client::new();

    let entries: Value = client
        .get(format!("{address}/api/files"))
        .query(&[("file_types", "image")])
        .send()
        .await
        .expect("Failed to list")
        .json()
        .await
        .unwrap();

    let names: Vec<&str> = entries
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["photo-small.png", "photo.png"]);
    assert_eq!(entries[1]["thumbnailUrl"], "/uploads/photo-small.png");

    let response = client
        .delete(format!("{address}/api/files"))
        .query(&[("path", "uploads/photo.png")])
        .send()
        .await
        .expect("Failed to delete");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(!root.path().join("uploads/photo.png").exists());
    assert!(!root.path().join("uploads/photo-small.png").exists());

    let response = client
        .delete(format!("{address}/api/files"))
        .query(&[("path", "uploads/photo.png")])
        .send()
        .await
        .expect("Failed to delete");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_apply_limits() {
    let root = TempDir::new().unwrap();
    let dir = root.path().join("uploads");
    std::fs::create_dir_all(&dir).unwrap();
    for name in ["a.txt", "b.txt", "c.txt", "keep.pdf"] {
        std::fs::write(dir.join(name), name).unwrap();
    }
    let address = spawn_app(root.path()).await;
    let client = reqwest::Client::new();

    let body: Value = client
        .post(format!("{address}/api/maintenance/limits"))
        .json(&json!({ "path": "uploads", "limits": { "txt": 1 } }))
        .send()
        .await
        .expect("Failed to apply limits")
        .json()
        .await
        .unwrap();

    let deleted = body["deleted"].as_array().unwrap();
    assert_eq!(deleted.len(), 2);
    assert!(
        deleted
            .iter()
            .all(|p| p.as_str().unwrap().starts_with("uploads/"))
    );
    assert!(dir.join("keep.pdf").exists());
}
