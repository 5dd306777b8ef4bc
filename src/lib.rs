// Library exports
pub mod auth;
pub mod models;
pub mod session;
