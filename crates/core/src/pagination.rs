//! Page request / page result shapes shared by repository queries.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// 1-based page request.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationParams {
    pub page: u32,
    pub page_size: u32,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PaginationParams {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }.normalized()
    }

    /// Page 0 becomes 1; page size is clamped to `1..=MAX_PAGE_SIZE`.
    pub fn normalized(self) -> Self {
        Self {
            page: self.page.max(1),
            page_size: self.page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(self) -> usize {
        let p = self.normalized();
        (p.page as usize - 1) * p.page_size as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub total_items: u64,
    pub total_pages: u32,
    pub current_page: u32,
    pub page_size: u32,
}

impl<T> PagedResult<T> {
    /// Slice an already filtered and ordered result set into one page.
    pub fn paginate(all: Vec<T>, params: PaginationParams) -> Self {
        let params = params.normalized();
        let total_items = all.len() as u64;
        let total_pages = total_items.div_ceil(params.page_size as u64) as u32;
        let items = all
            .into_iter()
            .skip(params.offset())
            .take(params.page_size as usize)
            .collect();

        Self {
            items,
            total_items,
            total_pages,
            current_page: params.page,
            page_size: params.page_size,
        }
    }

    pub fn has_next_page(&self) -> bool {
        self.current_page < self.total_pages
    }
}
