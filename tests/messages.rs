use std::collections::HashMap;

use intake::{
    models::{CropError, DimensionBound, UploadError},
    services::messages::{Messages, Translator},
    utils::geometry::Dimensions,
};
use serde_json::json;

#[test]
fn test_renders_parameters() {
    let messages = Messages::english();

    let rendered = messages.translate("file_already_exists", &[("filename", "a.jpg".to_string())]);
    assert_eq!(rendered, "A file already exists with the name specified (a.jpg).");

    let rendered = messages.upload_error(&UploadError::MaxFileSize {
        threshold: "2MB".to_string(),
    });
    assert_eq!(rendered, "Your file must not exceed 2MB.");
}

#[test]
fn test_dimension_failures_append_actual_size() {
    let messages = Messages::english();

    let failure = UploadError::MinImageDimensions {
        bound: DimensionBound::Width(300),
        actual: Dimensions::new(120, 80),
    };
    assert_eq!(
        messages.upload_error(&failure),
        "Your image must be at least 300 pixels in width. \
         Your uploaded image dimensions were 120 x 80."
    );

    let failure = UploadError::MaxImageDimensions {
        bound: DimensionBound::Size {
            width: 1024,
            height: 768,
        },
        actual: Dimensions::new(2048, 1536),
    };
    assert_eq!(
        messages.upload_error(&failure),
        "Your image must be 1024 x 768 or less. Your uploaded image dimensions were 2048 x 1536."
    );
}

#[test]
fn test_crop_messages() {
    let messages = Messages::english();

    assert_eq!(
        messages.crop_error(&CropError::DirectoryNotFound {
            path: "gallery".to_string()
        }),
        "The directory specified does not exist (gallery)."
    );
    assert_eq!(
        messages.crop_error(&CropError::General),
        "Something went wrong. Please try again."
    );
}

#[test]
fn test_unknown_key_renders_the_key() {
    let messages = Messages::english();
    assert_eq!(messages.translate("no_such_message", &[]), "no_such_message");
}

#[test]
fn test_overrides() {
    let messages = Messages::english().with_overrides(HashMap::from([(
        "general".to_string(),
        "Kaputt.".to_string(),
    )]));
    assert_eq!(messages.upload_error(&UploadError::General), "Kaputt.");
    assert_eq!(
        messages.template("image_required"),
        Some("You must upload an image file.")
    );

    let from_json = Messages::from_json(&json!({ "file_required": "Pick a file!" })).unwrap();
    assert_eq!(from_json.upload_error(&UploadError::FileRequired), "Pick a file!");
    assert!(Messages::from_json(&json!({ "general": 1 })).is_err());
}
