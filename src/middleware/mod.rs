pub mod auth;
pub mod roles;

pub use auth::jwt_auth_middleware;
pub use roles::role_guard_middleware;
