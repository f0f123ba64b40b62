//! Accounts, login sessions and the request extractors built on them.

pub mod handlers;
pub mod middleware;
pub mod password;

pub use handlers::*;
pub use middleware::{AuthUser, MaybeUser, SESSION_COOKIE_NAME};
