//! Uploaded product image storage

mod local;

pub use local::{ImageStore, LocalImageStore, PUBLIC_PREFIX};
