pub mod auth;
pub mod request_id;
pub mod response;

pub use auth::{require_auth, AuthUser};
pub use request_id::MakeRequestUuid;
pub use response::{ApiResponse, ApiResult};
