pub mod access;
pub mod grant;
pub mod subscription;
pub mod terms;
