//! Authentication infrastructure module
//!
//! Token signing, the refresh session registry and the auth gateway
//! service built on top of them.

mod jwt;
mod service;
mod sessions;

pub use jwt::{
    AccessClaims, JwtConfig, JwtService, RefreshClaims, SignedToken, TokenError, TokenIssuer,
};
pub use service::{AuthService, TokenPair};
pub use sessions::SessionRegistry;
