// handlers/public/auth/mod.rs - Public authentication handlers

pub mod login; // POST /api/auth/login - verify credentials, issue JWT
pub mod signup; // POST /api/auth/signup - create account

pub use login::login;
pub use signup::signup;
