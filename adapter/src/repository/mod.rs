use kernel::model::book::BookFormat;
use shared::error::AppError;

pub mod auth;
pub mod catalog;
pub mod health;
pub mod ledger;
pub mod memory;
pub mod subscription;
pub mod terms;

// 同じ利用者・書籍・形態に PENDING/ACTIVE が既にある
pub(crate) fn duplicate_live_grant(format: BookFormat) -> AppError {
    AppError::Conflict(format!(
        "an active or pending {format} grant already exists for this book"
    ))
}
