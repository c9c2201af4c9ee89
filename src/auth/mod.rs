//! Authentication Module
//! Mission: Session-less auth: password sign-in, bearer tokens, role gates

pub mod jwt;
pub mod local;
pub mod middleware;
pub mod models;

pub use jwt::JwtHandler;
pub use local::LocalStrategy;
pub use middleware::{authenticated, authenticated_admin, AuthVerifier, CurrentUser};
