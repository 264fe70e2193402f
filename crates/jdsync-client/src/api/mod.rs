//! API endpoint implementations.

mod auth;
mod envs;

pub use auth::AuthApi;
pub use envs::EnvsApi;
