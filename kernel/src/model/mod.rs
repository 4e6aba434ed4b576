pub mod access;
pub mod auth;
pub mod availability;
pub mod book;
pub mod grant;
pub mod id;
pub mod subscription;
pub mod terms;
pub mod user;
