pub mod auth;

pub use auth::{MaybeUserId, UserId};
