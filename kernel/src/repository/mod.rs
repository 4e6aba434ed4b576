pub mod auth;
pub mod catalog;
pub mod health;
pub mod ledger;
pub mod subscription;
pub mod terms;
