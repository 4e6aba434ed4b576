use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use super::id::BookId;

/// 書籍の提供形態。
/// 並び順はそのまま推奨の優先順位（電子書籍 > オーディオブック > 紙の本）になっている。
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumString,
    AsRefStr,
    Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum BookFormat {
    Ebook,
    Audiobook,
    Hardcopy,
}

impl BookFormat {
    pub const ALL: [BookFormat; 3] = [BookFormat::Ebook, BookFormat::Audiobook, BookFormat::Hardcopy];

    // 電子書籍は同時貸出数の上限を持たない
    pub fn is_capacity_bounded(self) -> bool {
        !matches!(self, BookFormat::Ebook)
    }
}

/// 金額（通貨の最小単位）。通貨や表示はこのエンジンの責務外
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(pub i64);

// カタログが持つ書籍のうち、エンジンが判断に使う部分
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub id: BookId,
    pub formats: BTreeSet<BookFormat>,
}

impl Book {
    pub fn offers(&self, format: BookFormat) -> bool {
        self.formats.contains(&format)
    }
}
