// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) → Protected (bearer JWT, see middleware::require_auth)

pub mod protected; // /api/user, /api/tasklist, /api/task, /api/goal
pub mod public; // /api/, /health, /api/auth/*
