pub mod user;

pub use user::{Claims, UserRole};
