//! 貸出形態の判断ロジック。I/O を持たない純粋関数だけを置く。

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, Utc};
use shared::config::RentalConfig;

use crate::model::{
    availability::RentalAvailability,
    book::{Book, BookFormat},
};

pub type AvailabilitySnapshot = BTreeMap<BookFormat, RentalAvailability>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RentalRecommendation {
    pub eligible: BTreeSet<BookFormat>,
    pub recommended: Option<BookFormat>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RentalWindow {
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

/// カタログに形態があり、かつ（紙の本・オーディオブックは）空き枠がある形態
pub fn eligible_rental_types(
    book: &Book,
    availability: &AvailabilitySnapshot,
) -> BTreeSet<BookFormat> {
    BookFormat::ALL
        .into_iter()
        .filter(|format| book.offers(*format))
        .filter(|format| {
            !format.is_capacity_bounded()
                || availability
                    .get(format)
                    .is_some_and(RentalAvailability::has_free_slot)
        })
        .collect()
}

/// 推奨形態。空き数の比較ではなく 電子書籍 > オーディオブック > 紙の本 の固定順で選ぶ。
/// 何も借りられなければ None
pub fn recommend_rental_type(
    book: &Book,
    availability: &AvailabilitySnapshot,
) -> Option<BookFormat> {
    let eligible = eligible_rental_types(book, availability);
    BookFormat::ALL
        .into_iter()
        .find(|format| eligible.contains(format))
}

pub fn rental_recommendation(
    book: &Book,
    availability: &AvailabilitySnapshot,
) -> RentalRecommendation {
    RentalRecommendation {
        eligible: eligible_rental_types(book, availability),
        recommended: recommend_rental_type(book, availability),
    }
}

pub fn requires_guarantee_deposit(format: BookFormat) -> bool {
    match format {
        BookFormat::Ebook => false,
        BookFormat::Audiobook | BookFormat::Hardcopy => true,
    }
}

pub fn rental_duration(format: BookFormat, defaults: &RentalConfig) -> Duration {
    match format {
        BookFormat::Ebook => Duration::days(defaults.digital_rental_days),
        BookFormat::Audiobook | BookFormat::Hardcopy => {
            Duration::days(defaults.physical_rental_days)
        }
    }
}

pub fn compute_duration(
    format: BookFormat,
    defaults: &RentalConfig,
    start_at: DateTime<Utc>,
) -> RentalWindow {
    RentalWindow {
        start_at,
        end_at: start_at + rental_duration(format, defaults),
    }
}
