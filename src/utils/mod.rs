//! # Utility Modules
//!
//! Leaf policies and constants used throughout the upload pipeline. Nothing
//! in here touches storage or decodes images.
//!
//! ## Available Utilities
//!
//! - **Constants** (`constant`) - Pipeline-wide fixed values
//! - **Filename** (`filename`) - Naming strategies and sanitization
//! - **File types** (`file_types`) - Type categories and extension checks
//! - **Size** (`size`) - Size limit parsing and formatting
//! - **Geometry** (`geometry`) - Resize and crop arithmetic
//! - **Glob** (`glob`) - Filename patterns for listings
//! - **Static objects** (`static_object`) - Environment-driven settings

pub mod constant;
pub mod file_types;
pub mod filename;
pub mod geometry;
pub mod glob;
pub mod size;
pub mod static_object;
