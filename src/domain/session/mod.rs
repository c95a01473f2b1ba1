//! Session domain - refresh sessions tracked by the session registry

mod entity;

pub use entity::{RefreshSession, SessionToken};
