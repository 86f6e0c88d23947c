use serde::Serialize;

/// Paging metadata of a [`Paginated`] response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Paging {
    pub total_records: u64,
    pub page: u64,
    pub total_pages: u64,
}

impl Paging {
    /// `total_pages` is never below 1, so page 1 of an empty table is valid.
    pub fn new(total_records: u64, page: u64, limit: u64) -> Self {
        let total_pages = if limit == 0 {
            1
        } else {
            total_records.div_ceil(limit).max(1)
        };

        Self {
            total_records,
            page,
            total_pages,
        }
    }
}

/// One page of results plus the identity of the next unfetched row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub paging: Paging,
    pub next_cursor: Option<i64>,
}

impl<T> Paginated<T> {
    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }
}
