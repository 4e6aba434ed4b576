pub mod access;
pub mod grant;
pub mod health;
pub mod subscription;
pub mod terms;
