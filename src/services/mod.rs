//! # Capabilities and Pipelines
//!
//! The storage and image codec capabilities, message rendering, and the
//! pipelines built on top of them.
//!
//! ## Available Services
//!
//! - **Storage** (`storage`) - Filesystem abstraction and its local implementation
//! - **Codec** (`codec`) - Image decode/resize/encode abstraction backed by `image`
//! - **Messages** (`messages`) - Failure message templates and translation
//! - **Pipeline** (`pipeline`) - Validation and transform of upload batches
//! - **Thumbnail** (`thumbnail`) - Thumbnail placement and derivation
//! - **Crop** (`crop`) - Cropping of already stored images
//! - **Maintenance** (`maintenance`) - Retention limits, listings and deletion

pub mod codec;
pub mod crop;
pub mod maintenance;
pub mod messages;
pub mod pipeline;
pub mod storage;
pub mod thumbnail;
