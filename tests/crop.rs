mod common;

use std::path::Path;

use intake::{
    models::{CropError, CropRequest, CropResult, UploadConfig},
    services::{
        codec::ImageCrateCodec, crop::CropPipeline, messages::Messages, storage::LocalStorage,
    },
    utils::geometry::CropRect,
};
use serde_json::json;
use tempfile::TempDir;

use common::{dimensions_of, test_config, write_image};

fn run(root: &Path, request: &CropRequest, config: &UploadConfig) -> CropResult {
    let storage = LocalStorage::new();
    let codec = ImageCrateCodec;
    let messages = Messages::english();
    CropPipeline::new(root, &storage, &codec, &messages).crop(request, config)
}

fn keep_original() -> UploadConfig {
    test_config(json!({
        "image_crop_thumb": false,
        "image_crop_delete_original": false,
    }))
}

#[test_log::test]
fn test_center_crop_into_new_file() {
    let root = TempDir::new().unwrap();
    write_image(&root.path().join("uploads/photo.jpg"), 400, 300);

    let mut request = CropRequest::new("uploads", "photo.jpg");
    request.new_filename = Some("photo-crop".to_string());
    request.width = Some(100);
    request.height = Some(100);

    let result = run(root.path(), &request, &keep_original());

    assert!(!result.error);
    assert_eq!(result.name.as_deref(), Some("photo_crop.jpg"));
    assert_eq!(result.path.as_deref(), Some("uploads/"));
    assert_eq!(
        dimensions_of(&root.path().join("uploads/photo_crop.jpg")),
        (100, 100)
    );
    assert!(root.path().join("uploads/photo.jpg").is_file());
}

#[test_log::test]
fn test_explicit_rectangle_is_resampled() {
    let root = TempDir::new().unwrap();
    write_image(&root.path().join("uploads/photo.png"), 400, 300);

    let mut request = CropRequest::new("uploads", "photo.png");
    request.new_filename = Some("corner.png".to_string());
    request.width = Some(80);
    request.height = Some(60);
    request.position = Some(CropRect {
        x: 0,
        y: 0,
        width: 200,
        height: 150,
    });

    let result = run(root.path(), &request, &keep_original());

    assert!(!result.error);
    assert_eq!(
        dimensions_of(&root.path().join("uploads/corner.png")),
        (80, 60)
    );
}

#[test_log::test]
fn test_size_defaults_to_resize_dimensions() {
    let root = TempDir::new().unwrap();
    write_image(&root.path().join("uploads/photo.png"), 400, 300);

    let config = test_config(json!({
        "image_crop_thumb": false,
        "image_crop_delete_original": false,
        "image_dimensions": { "w": 120, "h": 90 },
    }));
    let mut request = CropRequest::new("uploads", "photo.png");
    request.new_filename = Some("default.png".to_string());

    run(root.path(), &request, &config);

    assert_eq!(
        dimensions_of(&root.path().join("uploads/default.png")),
        (120, 90)
    );
}

#[test_log::test]
fn test_crop_replaces_original_and_derives_thumbnail() {
    let root = TempDir::new().unwrap();
    write_image(&root.path().join("uploads/photo.jpg"), 400, 300);

    let config = test_config(json!({ "image_dimensions": { "tw": 40, "th": 40 } }));
    let mut request = CropRequest::new("uploads", "photo.jpg");
    request.new_filename = Some("square".to_string());
    request.width = Some(100);
    request.height = Some(100);

    let result = run(root.path(), &request, &config);

    assert_eq!(result.name.as_deref(), Some("square.jpg"));
    assert!(!root.path().join("uploads/photo.jpg").exists());
    assert_eq!(
        dimensions_of(&root.path().join("uploads/square-small.jpg")),
        (40, 40)
    );
}

#[test_log::test]
fn test_cropping_in_place_keeps_the_file() {
    let root = TempDir::new().unwrap();
    write_image(&root.path().join("uploads/photo.jpg"), 400, 300);

    let config = test_config(json!({ "overwrite": true, "image_crop_thumb": false }));
    let mut request = CropRequest::new("uploads", "photo.jpg");
    request.width = Some(50);
    request.height = Some(50);

    let result = run(root.path(), &request, &config);

    assert!(!result.error);
    assert_eq!(dimensions_of(&root.path().join("uploads/photo.jpg")), (50, 50));
}

#[test_log::test]
fn test_missing_source() {
    let root = TempDir::new().unwrap();

    let request = CropRequest::new("uploads", "missing.jpg");
    let result = run(root.path(), &request, &keep_original());

    assert!(result.error);
    assert_eq!(
        result.failure,
        Some(CropError::FileNotFound {
            filename: "missing.jpg".to_string()
        })
    );
    assert_eq!(
        result.message.as_deref(),
        Some("The file specified was not found (missing.jpg).")
    );
}

#[test_log::test]
fn test_source_must_be_an_image() {
    let root = TempDir::new().unwrap();
    std::fs::create_dir_all(root.path().join("uploads")).unwrap();
    std::fs::write(root.path().join("uploads/notes.txt"), "notes").unwrap();

    let request = CropRequest::new("uploads", "notes.txt");
    let result = run(root.path(), &request, &keep_original());

    assert_eq!(
        result.message.as_deref(),
        Some("The file specified was not an image (notes.txt).")
    );
}

#[test_log::test]
fn test_existing_target_without_overwrite() {
    let root = TempDir::new().unwrap();
    write_image(&root.path().join("uploads/photo.png"), 100, 100);
    write_image(&root.path().join("uploads/taken.png"), 10, 10);

    let mut request = CropRequest::new("uploads", "photo.png");
    request.new_filename = Some("taken.png".to_string());
    let result = run(root.path(), &request, &keep_original());

    assert_eq!(
        result.failure,
        Some(CropError::FileAlreadyExists {
            filename: "taken.png".to_string()
        })
    );
    assert_eq!(dimensions_of(&root.path().join("uploads/taken.png")), (10, 10));
}

#[test_log::test]
fn test_target_directory_must_exist_unless_created() {
    let root = TempDir::new().unwrap();
    write_image(&root.path().join("uploads/photo.png"), 100, 100);

    let mut request = CropRequest::new("uploads", "photo.png");
    request.new_path = Some("elsewhere".to_string());
    request.width = Some(20);
    request.height = Some(20);

    let strict = test_config(json!({
        "create_directory": false,
        "image_crop_thumb": false,
        "image_crop_delete_original": false,
    }));
    let result = run(root.path(), &request, &strict);
    assert_eq!(
        result.message.as_deref(),
        Some("The directory specified does not exist (elsewhere).")
    );

    let result = run(root.path(), &request, &keep_original());
    assert!(!result.error);
    assert_eq!(result.path.as_deref(), Some("elsewhere/"));
    assert_eq!(dimensions_of(&root.path().join("elsewhere/photo.png")), (20, 20));
}
