use strum::{AsRefStr, EnumString};

// 呼び出し元の種別。決済サービスだけが支払い確定・失敗の通知を送れる
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Member,
    PaymentService,
}
