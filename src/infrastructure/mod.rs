//! Infrastructure layer - storage, hashing, tokens, images and telemetry

pub mod account;
pub mod auth;
pub mod images;
pub mod logging;
pub mod observability;
pub mod product;
pub mod storage;
