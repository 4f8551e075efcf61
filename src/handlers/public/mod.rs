// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition and liveness endpoints.

pub mod auth;
pub mod status;

pub use status::{api_root, health};
