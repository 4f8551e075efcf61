// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Every route here sits behind middleware::require_auth and receives the
// caller as an `AuthUser` extractor. Handlers that mutate a resource load it
// through `ownership::load_owned`, which answers 404/403 before any write.

pub mod goal;
pub mod ownership;
pub mod task;
pub mod tasklist;
pub mod user;
