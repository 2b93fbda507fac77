pub mod auth;
pub mod helpers;
pub mod sessions;
pub mod users;
