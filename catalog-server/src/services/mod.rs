//! Services
//!
//! - [`CatalogService`] - product/category operations with image lifecycle
//! - [`ImageStore`] - storage of uploaded product images

pub mod catalog_service;
pub mod image_store;

pub use catalog_service::CatalogService;
pub use image_store::{
    ImageStore, ImageStoreError, ImageUpload, LocalImageStore, MemoryImageStore,
};
