//! Product infrastructure module

mod service;

pub use service::ProductService;
