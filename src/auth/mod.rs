pub mod jwt;

pub use jwt::TokenCodec;
