use super::{book::BookFormat, id::BookId};

/// 同時に貸し出せる冊数の上限
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capacity {
    Unbounded,
    Limited(u32),
}

impl Capacity {
    pub fn admits(self, held: u32) -> bool {
        match self {
            Capacity::Unbounded => true,
            Capacity::Limited(max) => held < max,
        }
    }
}

/// (書籍, 形態) ごとの貸出可能数。永続化しない、台帳からの再計算結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RentalAvailability {
    pub book_id: BookId,
    pub format: BookFormat,
    pub capacity: Capacity,
    pub active_count: u32,
    pub pending_count: u32,
}

impl RentalAvailability {
    // 上限なしの場合は None
    pub fn available(&self) -> Option<u32> {
        match self.capacity {
            Capacity::Unbounded => None,
            Capacity::Limited(max) => {
                Some(max.saturating_sub(self.active_count + self.pending_count))
            }
        }
    }

    pub fn has_free_slot(&self) -> bool {
        self.capacity.admits(self.active_count + self.pending_count)
    }
}
